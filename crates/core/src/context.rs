use crate::scheduler::Scheduler;
use crate::settings::Settings;
use crate::view::{Hub, Scrollable, ScrollableFactory};
use std::fmt;

/// Shared plumbing handed to every controller at construction.
#[derive(Clone)]
pub struct Context {
    pub hub: Hub,
    pub scheduler: Scheduler,
    pub scrollable_factory: ScrollableFactory,
    pub settings: Settings,
}

impl Context {
    pub fn new(hub: Hub, settings: Settings) -> Context {
        Context {
            hub,
            scheduler: Scheduler::new(),
            scrollable_factory: Scrollable::default_factory(),
            settings,
        }
    }

    pub fn with_scrollable_factory(mut self, factory: ScrollableFactory) -> Context {
        self.scrollable_factory = factory;
        self
    }

    /// Default `animated` flag for push and pop requests.
    pub fn animated(&self) -> bool {
        self.settings.navigator.animated
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("scheduler", &self.scheduler)
            .field("settings", &self.settings)
            .finish()
    }
}
