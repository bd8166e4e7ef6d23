//! Mounts the screen a controller asks for.
//!
//! The manager keeps exactly one screen mounted. A transition request for
//! the id that is already mounted updates that screen in place; a request
//! for any other id tears the current screen down (giving it the chance to
//! save its state) and mounts the requested component.

use super::view_controller::{ViewControllerId, ViewControllerRecord};
use super::{Capability, Component, Screen, Transition, ViewProps};
use std::fmt;
use std::rc::Rc;

/// What a controller wants on screen next.
#[derive(Clone)]
pub struct TransitionRequest {
    pub view: ViewControllerId,
    pub component: Rc<dyn Component>,
    pub transition: Transition,
    pub view_props: ViewProps,
}

impl TransitionRequest {
    /// Builds a request that mounts `record` with its props, saved state,
    /// scroll handle and the given capability.
    pub fn for_record(
        record: &ViewControllerRecord,
        transition: Transition,
        capability: Capability,
    ) -> Self {
        TransitionRequest {
            view: record.id,
            component: Rc::clone(&record.component),
            transition,
            view_props: ViewProps {
                props: record.props.clone(),
                initial_state: record.saved_state.clone(),
                scrollable: record.scrollable.clone(),
                capability,
            },
        }
    }
}

impl fmt::Debug for TransitionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRequest")
            .field("view", &self.view)
            .field("component", &self.component.name())
            .field("transition", &self.transition)
            .finish()
    }
}

struct MountedView {
    id: ViewControllerId,
    screen: Box<dyn Screen>,
}

pub struct ViewManager {
    name: String,
    current: Option<MountedView>,
    last_transition: Option<Transition>,
    mount_count: usize,
}

impl ViewManager {
    pub fn new(name: &str) -> Self {
        ViewManager {
            name: name.to_string(),
            current: None,
            last_transition: None,
            mount_count: 0,
        }
    }

    pub fn transition_to(&mut self, request: TransitionRequest) {
        let TransitionRequest {
            view,
            component,
            transition,
            view_props,
        } = request;

        self.last_transition = Some(transition);

        if let Some(mounted) = self.current.as_mut().filter(|mounted| mounted.id == view) {
            tracing::trace!(manager = %self.name, %view, %transition, "updating mounted view");
            mounted.screen.update(view_props);
            return;
        }

        self.unmount();

        tracing::debug!(
            manager = %self.name,
            %view,
            component = component.name(),
            %transition,
            "mounting view"
        );
        let screen = component.mount(view_props);
        self.current = Some(MountedView { id: view, screen });
        self.mount_count += 1;
    }

    /// Tears down the mounted screen, if any.
    pub fn unmount(&mut self) {
        if let Some(mut previous) = self.current.take() {
            tracing::trace!(manager = %self.name, view = %previous.id, "unmounting view");
            previous.screen.will_unmount();
        }
    }

    pub fn current_view(&self) -> Option<ViewControllerId> {
        self.current.as_ref().map(|mounted| mounted.id)
    }

    pub fn active_screen(&self) -> Option<&(dyn Screen + 'static)> {
        self.current.as_ref().map(|mounted| mounted.screen.as_ref())
    }

    pub fn active_screen_mut(&mut self) -> Option<&mut (dyn Screen + 'static)> {
        self.current.as_mut().map(|mounted| mounted.screen.as_mut())
    }

    pub fn last_transition(&self) -> Option<Transition> {
        self.last_transition
    }

    /// Number of screens mounted so far (updates in place don't count).
    pub fn mount_count(&self) -> usize {
        self.mount_count
    }
}

impl fmt::Debug for ViewManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewManager")
            .field("name", &self.name)
            .field("current", &self.current_view())
            .field("last_transition", &self.last_transition)
            .field("mount_count", &self.mount_count)
            .finish()
    }
}

impl Drop for ViewManager {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_helpers::{create_test_context, TestComponent, TestScreen};
    use crate::view::navigation::NavigationStack;
    use crate::view::view_controller::{prepare_view_controller, ViewControllerSpec};
    use crate::view::{Props, Scrollable, SavedState};
    use serde_json::json;

    fn request_for(
        component: Rc<TestComponent>,
        props: Props,
        stack: &NavigationStack,
    ) -> TransitionRequest {
        let record = prepare_view_controller(
            ViewControllerSpec::new(component).props(props),
            &Scrollable::default_factory(),
        );
        TransitionRequest::for_record(
            &record,
            Transition::Forward,
            Capability::Navigator(stack.navigator(record.id)),
        )
    }

    fn stack() -> NavigationStack {
        let (context, _rx) = create_test_context();
        NavigationStack::new("main", ViewControllerSpec::new(TestComponent::new("root")), &context)
    }

    #[test]
    fn mounts_requested_component() {
        let stack = stack();
        let component = TestComponent::new("list");
        let request = request_for(component.clone(), Props::new(), &stack);
        let view = request.view;
        let mut manager = ViewManager::new("test");

        manager.transition_to(request);

        assert_eq!(manager.current_view(), Some(view));
        assert_eq!(manager.last_transition(), Some(Transition::Forward));
        assert_eq!(manager.mount_count(), 1);
        assert_eq!(component.mounts(), 1);
    }

    #[test]
    fn same_view_is_updated_in_place() {
        let stack = stack();
        let component = TestComponent::new("list");
        let first = request_for(component.clone(), Props::new(), &stack);
        let mut again = first.clone();
        again.transition = Transition::Instant;
        again.view_props.props.insert("page".to_string(), json!(2));
        let mut manager = ViewManager::new("test");

        manager.transition_to(first);
        manager.transition_to(again);

        assert_eq!(manager.mount_count(), 1);
        assert_eq!(component.mounts(), 1);
        let screen = manager
            .active_screen()
            .and_then(|screen| screen.downcast_ref::<TestScreen>());
        assert_eq!(screen.map(|screen| screen.updates), Some(1));
        assert_eq!(
            screen.and_then(|screen| screen.props.props.get("page").cloned()),
            Some(json!(2))
        );
    }

    #[test]
    fn switching_views_unmounts_the_previous_screen() {
        let stack = stack();
        let root = stack.root_id();
        let record = stack.get_view_controller(&root).unwrap();
        let first = TransitionRequest::for_record(
            &record,
            Transition::Instant,
            Capability::Navigator(stack.navigator(root)),
        );
        let second = request_for(TestComponent::new("b"), Props::new(), &stack);
        let second_view = second.view;
        let mut manager = ViewManager::new("test");
        manager.transition_to(first);

        let mut state = SavedState::new();
        state.insert("draft".to_string(), json!("hello"));
        if let Some(screen) = manager
            .active_screen_mut()
            .and_then(|screen| screen.downcast_mut::<TestScreen>())
        {
            screen.state = state.clone();
        }

        manager.transition_to(second);

        assert_eq!(manager.current_view(), Some(second_view));
        assert_eq!(manager.mount_count(), 2);
        assert_eq!(
            stack.get_view_controller(&root).and_then(|r| r.saved_state),
            Some(state)
        );
    }

    #[test]
    fn unmount_clears_the_current_view() {
        let stack = stack();
        let mut manager = ViewManager::new("test");
        manager.transition_to(request_for(TestComponent::new("a"), Props::new(), &stack));

        manager.unmount();

        assert_eq!(manager.current_view(), None);
        assert!(manager.active_screen().is_none());
    }
}
