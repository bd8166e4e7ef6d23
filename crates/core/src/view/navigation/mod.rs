//! Stack navigation.
//!
//! - [`stack`]: the history-ordered [`NavigationStack`] and the [`Navigator`]
//!   capability handed to its screens
//! - [`navigation_bar`]: the data contract consumed by navigation bar chrome
//! - [`navigator`]: the [`StackNavigator`] shell that keeps the bar in sync
//!   with the active screen

pub mod navigation_bar;
pub mod navigator;
pub mod stack;

pub use navigation_bar::{NavigationBar, NavigationBarState, NavigationDescription};
pub use navigator::StackNavigator;
pub use stack::{NavigationStack, Navigator, PopOptions};
