//! Navigation-stack and tab-selection controllers for screen-based UIs.
//!
//! The crate is organised around two controllers that share one data model:
//!
//! - [`view::navigation::NavigationStack`]: an ordered history of screens with
//!   push/pop semantics and a per-screen [`view::navigation::Navigator`]
//!   capability.
//! - [`view::tabs::TabSelector`]: a fixed set of screens with a selected index
//!   and a per-screen [`view::tabs::Tabinator`] capability.
//!
//! Both controllers hand their screens to a [`view::view_manager::ViewManager`],
//! report state changes as [`view::Event`]s over the [`view::Hub`], and defer
//! post-update work onto the [`scheduler::Scheduler`].

pub mod context;
pub mod error;
pub mod logging;
pub mod scheduler;
pub mod settings;
pub mod view;

pub use context::Context;
pub use error::NavigationError;
