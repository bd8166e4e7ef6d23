/// Failures raised by controller operations.
///
/// Lookups that miss (popping to an id that is no longer in the stack) are not
/// errors; they return `None`. The variants here are precondition violations
/// that indicate a mismatch between the caller and the controller's data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// A tab index outside `0..len` was requested.
    #[error("tab index {index} is out of range for {len} tabs")]
    IndexOutOfRange { index: usize, len: usize },

    /// A tab selector was constructed without any view controllers.
    #[error("a tab selector needs at least one view controller")]
    NoTabs,
}
