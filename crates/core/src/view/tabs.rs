//! Tab selection.
//!
//! A [`TabSelector`] owns a fixed list of view controllers and shows exactly
//! one of them. Switching tabs is always instant; each tab keeps its own
//! saved state and scroll handle across switches.

use super::view_controller::{
    prepare_view_controller, ViewControllerId, ViewControllerRecord, ViewControllerSpec,
    ViewControllers,
};
use super::view_manager::{TransitionRequest, ViewManager};
use super::{Action, Capability, Event, Hub, Id, SavedState, Screen, Transition, ID_FEEDER};
use crate::context::Context;
use crate::error::NavigationError;
use crate::scheduler::Scheduler;
use crate::settings::TabPosition;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

struct TabState {
    view_controllers: ViewControllers,
    selected_index: usize,
}

pub(crate) struct TabShared {
    id: Id,
    name: String,
    position: TabPosition,
    state: RefCell<TabState>,
    host: RefCell<ViewManager>,
    hub: Hub,
    scheduler: Scheduler,
}

/// One entry of the tab bar.
#[derive(Clone)]
pub struct TabItem {
    pub label: String,
    pub selected: bool,
    pub on_select: Action,
}

impl fmt::Debug for TabItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabItem")
            .field("label", &self.label)
            .field("selected", &self.selected)
            .finish()
    }
}

/// Shows one view controller out of a fixed set.
///
/// Cloning yields another handle to the same selector.
#[derive(Clone)]
pub struct TabSelector {
    shared: Rc<TabShared>,
}

impl TabSelector {
    /// Creates a selector showing the first tab.
    pub fn new(
        name: &str,
        tabs: Vec<ViewControllerSpec>,
        context: &Context,
    ) -> Result<TabSelector, NavigationError> {
        TabSelector::with_initial_index(name, tabs, 0, context)
    }

    pub fn with_initial_index(
        name: &str,
        tabs: Vec<ViewControllerSpec>,
        selected_index: usize,
        context: &Context,
    ) -> Result<TabSelector, NavigationError> {
        if tabs.is_empty() {
            tracing::error!(tabs = %name, "tab selector needs at least one tab");
            return Err(NavigationError::NoTabs);
        }

        let len = tabs.len();
        if selected_index >= len {
            tracing::error!(tabs = %name, index = selected_index, len, "initial tab index out of range");
            return Err(NavigationError::IndexOutOfRange {
                index: selected_index,
                len,
            });
        }

        let mut view_controllers = ViewControllers::new();
        for spec in tabs {
            view_controllers.push(prepare_view_controller(spec, &context.scrollable_factory));
        }

        let selector = TabSelector {
            shared: Rc::new(TabShared {
                id: ID_FEEDER.next(),
                name: name.to_string(),
                position: context.settings.tabs.position,
                state: RefCell::new(TabState {
                    view_controllers,
                    selected_index,
                }),
                host: RefCell::new(ViewManager::new(name)),
                hub: context.hub.clone(),
                scheduler: context.scheduler.clone(),
            }),
        };

        tracing::debug!(tabs = %name, id = selector.shared.id, len, selected_index, "tab selector created");

        let view = selector.show(selected_index)?;
        selector.notify(Event::ViewChanged {
            owner: selector.id(),
            view,
            transition: None,
        });

        Ok(selector)
    }

    pub fn id(&self) -> Id {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Where the tab bar is laid out relative to the content.
    pub fn position(&self) -> TabPosition {
        self.shared.position
    }

    pub fn selected_index(&self) -> usize {
        self.shared.state.borrow().selected_index
    }

    pub fn tab_count(&self) -> usize {
        self.shared.state.borrow().view_controllers.len()
    }

    pub fn view_controllers(&self) -> Vec<ViewControllerId> {
        self.shared.state.borrow().view_controllers.ids()
    }

    pub fn selected_view(&self) -> Option<ViewControllerId> {
        let state = self.shared.state.borrow();
        state
            .view_controllers
            .get_index(state.selected_index)
            .map(|record| record.id)
    }

    pub fn get_view_controller(&self, id: &ViewControllerId) -> Option<ViewControllerRecord> {
        self.shared.state.borrow().view_controllers.get(id).cloned()
    }

    /// Shows the tab at `index` with an instant transition.
    ///
    /// An out-of-range index is reported and leaves the selection untouched.
    pub fn set_selected_index(&self, index: usize) -> Result<(), NavigationError> {
        let view = self.show(index)?;
        self.shared.state.borrow_mut().selected_index = index;

        tracing::debug!(tabs = %self.shared.name, index, view = %view, "tab selected");
        self.notify(Event::ViewChanged {
            owner: self.id(),
            view,
            transition: Some(Transition::Instant),
        });

        Ok(())
    }

    /// The tab bar entries, in order.
    pub fn tabs(&self) -> Vec<TabItem> {
        let state = self.shared.state.borrow();
        state
            .view_controllers
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let selector = Rc::downgrade(&self.shared);
                let on_select: Action = Rc::new(move || {
                    let Some(shared) = selector.upgrade() else {
                        return;
                    };
                    if let Err(e) = (TabSelector { shared }).set_selected_index(index) {
                        tracing::error!(error = %e, "tab selection failed");
                    }
                });

                TabItem {
                    label: record
                        .tab
                        .clone()
                        .unwrap_or_else(|| record.component.name().to_string()),
                    selected: index == state.selected_index,
                    on_select,
                }
            })
            .collect()
    }

    /// The capability object bound to `view`.
    pub fn tabinator(&self, view: ViewControllerId) -> Tabinator {
        Tabinator {
            tabs: Rc::downgrade(&self.shared),
            view,
        }
    }

    pub fn save_state(&self, id: &ViewControllerId, state: &SavedState) -> bool {
        let saved = self
            .shared
            .state
            .borrow_mut()
            .view_controllers
            .save_state(id, state);
        tracing::trace!(tabs = %self.shared.name, view = %id, saved, "save state");
        saved
    }

    pub fn with_active_screen<R>(
        &self,
        f: impl FnOnce(&(dyn Screen + 'static)) -> R,
    ) -> Option<R> {
        let host = self.shared.host.try_borrow().ok()?;
        host.active_screen().map(f)
    }

    pub fn with_active_screen_mut<R>(
        &self,
        f: impl FnOnce(&mut (dyn Screen + 'static)) -> R,
    ) -> Option<R> {
        let mut host = self.shared.host.try_borrow_mut().ok()?;
        host.active_screen_mut().map(f)
    }

    pub fn mounted_view(&self) -> Option<ViewControllerId> {
        self.shared.host.try_borrow().ok()?.current_view()
    }

    fn show(&self, index: usize) -> Result<ViewControllerId, NavigationError> {
        let request = {
            let state = self.shared.state.borrow();
            let len = state.view_controllers.len();
            let Some(record) = state.view_controllers.get_index(index) else {
                tracing::error!(tabs = %self.shared.name, index, len, "tab index out of range");
                return Err(NavigationError::IndexOutOfRange { index, len });
            };

            TransitionRequest::for_record(
                record,
                Transition::Instant,
                Capability::Tabinator(self.tabinator(record.id)),
            )
        };

        let view = request.view;
        self.request_transition(request);
        Ok(view)
    }

    fn request_transition(&self, request: TransitionRequest) {
        let Ok(mut host) = self.shared.host.try_borrow_mut() else {
            tracing::warn!(tabs = %self.shared.name, view = %request.view, "view manager busy, deferring transition");
            let tabs = Rc::downgrade(&self.shared);
            self.shared.scheduler.defer(move || {
                if let Some(shared) = tabs.upgrade() {
                    TabSelector { shared }.request_transition(request);
                }
            });
            return;
        };

        host.transition_to(request);
    }

    fn notify(&self, event: Event) {
        self.shared.hub.send(event).ok();
    }
}

impl fmt::Debug for TabSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabSelector")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("selected_index", &self.selected_index())
            .finish()
    }
}

/// Capability handed to tab screens: lets them save state without knowing
/// about the selector.
#[derive(Debug, Clone)]
pub struct Tabinator {
    tabs: Weak<TabShared>,
    view: ViewControllerId,
}

impl Tabinator {
    pub fn view_id(&self) -> ViewControllerId {
        self.view
    }

    pub fn save_state(&self, state: &SavedState) {
        match self.tabs.upgrade() {
            Some(shared) => {
                TabSelector { shared }.save_state(&self.view, state);
            }
            None => tracing::trace!(view = %self.view, "tab selector is gone"),
        }
    }
}
