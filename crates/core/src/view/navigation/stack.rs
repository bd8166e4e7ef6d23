use crate::context::Context;
use crate::scheduler::Scheduler;
use crate::view::view_controller::{
    prepare_view_controller, ViewControllerId, ViewControllerRecord, ViewControllerSpec,
    ViewControllers,
};
use crate::view::view_manager::{TransitionRequest, ViewManager};
use crate::view::{
    Capability, Component, Event, Hub, Id, Props, SavedState, Screen, ScrollableFactory,
    Transition, ID_FEEDER,
};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Flags shared by every pop operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopOptions {
    /// Reveal the target with a backward animation instead of switching instantly.
    pub animated: bool,
    /// Emit [`Event::Popped`] once the transition has been requested.
    ///
    /// Pops triggered in reaction to chrome (a back button that already knows
    /// it went back) turn this off to avoid feeding the notification back.
    pub acknowledge: bool,
}

impl Default for PopOptions {
    fn default() -> Self {
        PopOptions {
            animated: true,
            acknowledge: true,
        }
    }
}

impl PopOptions {
    pub fn animated(animated: bool) -> Self {
        PopOptions {
            animated,
            ..Default::default()
        }
    }

    pub fn unacknowledged(self) -> Self {
        PopOptions {
            acknowledge: false,
            ..self
        }
    }
}

struct StackState {
    view_controllers: ViewControllers,
    /// Sequence length seen by the last settle.
    settled_len: usize,
    settle_pending: bool,
}

pub(crate) struct StackShared {
    id: Id,
    name: String,
    root: ViewControllerId,
    state: RefCell<StackState>,
    host: RefCell<ViewManager>,
    hub: Hub,
    scheduler: Scheduler,
    scrollable_factory: ScrollableFactory,
}

/// An ordered history of view controllers.
///
/// Index 0 is the root, which is never removed; the last record is the
/// screen on display once pending transitions have settled. Every mutation
/// follows the same order: the transition is requested from the
/// [`ViewManager`] first (so it still sees the records being left), then the
/// sequence is committed, then listeners are notified. The direction of the
/// resulting update is inferred once per scheduler tick by comparing the
/// committed length with the length at the previous settle, so several
/// operations issued in one tick produce a single [`Event::ViewChanged`].
///
/// Cloning yields another handle to the same stack.
#[derive(Clone)]
pub struct NavigationStack {
    shared: Rc<StackShared>,
}

impl NavigationStack {
    /// Creates a stack holding `root` and mounts it.
    pub fn new(name: &str, root: ViewControllerSpec, context: &Context) -> NavigationStack {
        let root = prepare_view_controller(root, &context.scrollable_factory);

        let mut view_controllers = ViewControllers::new();
        view_controllers.push(root.clone());

        let stack = NavigationStack {
            shared: Rc::new(StackShared {
                id: ID_FEEDER.next(),
                name: name.to_string(),
                root: root.id,
                state: RefCell::new(StackState {
                    view_controllers,
                    settled_len: 1,
                    settle_pending: false,
                }),
                host: RefCell::new(ViewManager::new(name)),
                hub: context.hub.clone(),
                scheduler: context.scheduler.clone(),
                scrollable_factory: Rc::clone(&context.scrollable_factory),
            }),
        };

        tracing::debug!(stack = %stack.shared.name, id = stack.shared.id, root = %root.id, "navigation stack created");

        let capability = Capability::Navigator(stack.navigator(root.id));
        stack.request_transition(TransitionRequest::for_record(
            &root,
            Transition::Instant,
            capability,
        ));
        stack.notify(Event::ViewChanged {
            owner: stack.id(),
            view: root.id,
            transition: None,
        });

        stack
    }

    pub fn id(&self) -> Id {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Number of records, root included.
    pub fn depth(&self) -> usize {
        self.shared.state.borrow().view_controllers.len()
    }

    /// Snapshot of the record ids in navigation order.
    pub fn view_controllers(&self) -> Vec<ViewControllerId> {
        self.shared.state.borrow().view_controllers.ids()
    }

    pub fn root_id(&self) -> ViewControllerId {
        self.shared.root
    }

    /// Id of the most recent record.
    pub fn active_id(&self) -> ViewControllerId {
        self.shared
            .state
            .borrow()
            .view_controllers
            .last()
            .map_or(self.shared.root, |record| record.id)
    }

    /// Creates a record for `component`, appends it and requests a transition
    /// to it. The id is returned right away; the record is part of the
    /// sequence before the transition completes.
    pub fn push(
        &self,
        component: Rc<dyn Component>,
        props: Props,
        animated: bool,
    ) -> ViewControllerId {
        let component_name = component.name().to_string();
        let record = prepare_view_controller(
            ViewControllerSpec::new(component).props(props),
            &self.shared.scrollable_factory,
        );
        let id = record.id;
        let request = TransitionRequest::for_record(
            &record,
            Transition::forward(animated),
            Capability::Navigator(self.navigator(id)),
        );

        self.shared
            .state
            .borrow_mut()
            .view_controllers
            .push(record);
        self.schedule_settle();

        self.request_transition(request);

        tracing::debug!(
            stack = %self.shared.name,
            view = %id,
            component = %component_name,
            animated,
            "pushed view controller"
        );
        self.notify(Event::Pushed {
            owner: self.id(),
            view: id,
        });

        id
    }

    /// Pops the most recent record. Returns the id of the record that
    /// becomes active, or `None` when only the root is left.
    pub fn pop(&self, options: PopOptions) -> Option<ViewControllerId> {
        let previous = {
            let state = self.shared.state.borrow();
            let len = state.view_controllers.len();
            len.checked_sub(2)
                .and_then(|index| state.view_controllers.get_index(index))
                .map(|record| record.id)
        };

        match previous {
            Some(id) => self.pop_to_view(&id, options),
            None => {
                tracing::trace!(stack = %self.shared.name, "nothing to pop");
                None
            }
        }
    }

    /// Pops back to the root. A stack that only holds its root is left
    /// untouched and `None` is returned.
    pub fn pop_to_root(&self, options: PopOptions) -> Option<ViewControllerId> {
        if self.depth() < 2 {
            tracing::trace!(stack = %self.shared.name, "already at root");
            return None;
        }

        self.pop_to_view(&self.shared.root, options)
    }

    /// Pops every record after `target`. Returns `target`, or `None` without
    /// touching anything when `target` isn't in the stack.
    pub fn pop_to_view(
        &self,
        target: &ViewControllerId,
        options: PopOptions,
    ) -> Option<ViewControllerId> {
        let request = {
            let state = self.shared.state.borrow();
            let Some(record) = state.view_controllers.get(target) else {
                tracing::trace!(stack = %self.shared.name, view = %target, "pop target isn't in the stack");
                return None;
            };

            TransitionRequest::for_record(
                record,
                Transition::backward(options.animated),
                Capability::Navigator(self.navigator(*target)),
            )
        };

        self.request_transition(request);

        let removed = self
            .shared
            .state
            .borrow_mut()
            .view_controllers
            .truncate_after(target)
            .unwrap_or(0);
        self.schedule_settle();

        tracing::debug!(
            stack = %self.shared.name,
            view = %target,
            removed,
            animated = options.animated,
            acknowledge = options.acknowledge,
            "popped to view controller"
        );

        if options.acknowledge {
            self.notify(Event::Popped {
                owner: self.id(),
                view: *target,
            });
        }

        Some(*target)
    }

    pub fn get_view_controller(&self, id: &ViewControllerId) -> Option<ViewControllerRecord> {
        self.shared.state.borrow().view_controllers.get(id).cloned()
    }

    /// True when `id` is in the stack above the root.
    pub fn can_go_back(&self, id: &ViewControllerId) -> bool {
        self.shared
            .state
            .borrow()
            .view_controllers
            .position(id)
            .is_some_and(|position| position > 0)
    }

    /// Stores a copy of `state` for `id`. Returns false if the record is gone.
    pub fn save_state(&self, id: &ViewControllerId, state: &SavedState) -> bool {
        let saved = self
            .shared
            .state
            .borrow_mut()
            .view_controllers
            .save_state(id, state);
        tracing::trace!(stack = %self.shared.name, view = %id, saved, "save state");
        saved
    }

    /// Re-announces the active view without changing the stack.
    pub fn refresh_navigation(&self) {
        self.notify(Event::ViewChanged {
            owner: self.id(),
            view: self.active_id(),
            transition: None,
        });
    }

    /// The capability object bound to `view`.
    pub fn navigator(&self, view: ViewControllerId) -> Navigator {
        Navigator {
            stack: Rc::downgrade(&self.shared),
            view,
        }
    }

    /// Runs `f` on the mounted screen. Returns `None` when nothing is mounted
    /// or the view manager is busy mounting.
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

    /// Id of the screen the view manager has mounted.
    pub fn mounted_view(&self) -> Option<ViewControllerId> {
        self.shared.host.try_borrow().ok()?.current_view()
    }

    /// Kind of the last transition handed to the view manager.
    pub fn last_requested_transition(&self) -> Option<Transition> {
        self.shared.host.try_borrow().ok()?.last_transition()
    }

    fn request_transition(&self, request: TransitionRequest) {
        let Ok(mut host) = self.shared.host.try_borrow_mut() else {
            // A screen navigated while being mounted or torn down.
            tracing::warn!(stack = %self.shared.name, view = %request.view, "view manager busy, deferring transition");
            let stack = Rc::downgrade(&self.shared);
            self.shared.scheduler.defer(move || {
                if let Some(shared) = stack.upgrade() {
                    NavigationStack { shared }.request_transition(request);
                }
            });
            return;
        };

        host.transition_to(request);
    }

    fn schedule_settle(&self) {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.settle_pending {
                return;
            }
            state.settle_pending = true;
        }

        let stack = Rc::downgrade(&self.shared);
        self.shared.scheduler.defer(move || {
            if let Some(shared) = stack.upgrade() {
                NavigationStack { shared }.settle();
            }
        });
    }

    fn settle(&self) {
        let (view, previous, current) = {
            let mut state = self.shared.state.borrow_mut();
            state.settle_pending = false;
            let previous = state.settled_len;
            let current = state.view_controllers.len();
            state.settled_len = current;
            let view = state
                .view_controllers
                .last()
                .map_or(self.shared.root, |record| record.id);
            (view, previous, current)
        };

        let transition = Transition::from_length_delta(previous, current);
        tracing::debug!(
            stack = %self.shared.name,
            view = %view,
            previous,
            current,
            transition = ?transition,
            "navigation settled"
        );

        self.notify(Event::ViewChanged {
            owner: self.id(),
            view,
            transition,
        });
    }

    fn notify(&self, event: Event) {
        self.shared.hub.send(event).ok();
    }
}

impl fmt::Debug for NavigationStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationStack")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("depth", &self.depth())
            .finish()
    }
}

/// Navigation capability bound to one view controller.
///
/// Screens receive it in their [`ViewProps`](crate::view::ViewProps) and use it
/// to navigate without knowing about the stack. It holds a weak reference:
/// once the stack is dropped every method is a no-op.
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Weak<StackShared>,
    view: ViewControllerId,
}

impl Navigator {
    /// The view controller this navigator is bound to.
    pub fn view_id(&self) -> ViewControllerId {
        self.view
    }

    fn stack(&self) -> Option<NavigationStack> {
        let stack = self
            .stack
            .upgrade()
            .map(|shared| NavigationStack { shared });
        if stack.is_none() {
            tracing::trace!(view = %self.view, "navigation stack is gone");
        }
        stack
    }

    pub fn push(
        &self,
        component: Rc<dyn Component>,
        props: Props,
        animated: bool,
    ) -> Option<ViewControllerId> {
        self.stack()
            .map(|stack| stack.push(component, props, animated))
    }

    pub fn pop(&self, options: PopOptions) -> Option<ViewControllerId> {
        self.stack()?.pop(options)
    }

    pub fn pop_to_root(&self, options: PopOptions) -> Option<ViewControllerId> {
        self.stack()?.pop_to_root(options)
    }

    pub fn pop_to_view(
        &self,
        target: &ViewControllerId,
        options: PopOptions,
    ) -> Option<ViewControllerId> {
        self.stack()?.pop_to_view(target, options)
    }

    /// True unless the bound record is the root (or no longer in the stack).
    pub fn can_go_back(&self) -> bool {
        self.stack()
            .is_some_and(|stack| stack.can_go_back(&self.view))
    }

    pub fn save_state(&self, state: &SavedState) {
        if let Some(stack) = self.stack() {
            stack.save_state(&self.view, state);
        }
    }

    pub fn refresh_navigation(&self) {
        if let Some(stack) = self.stack() {
            stack.refresh_navigation();
        }
    }

    pub fn get_view_controller(&self, id: &ViewControllerId) -> Option<ViewControllerRecord> {
        self.stack()?.get_view_controller(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_helpers::{create_test_context, drain, TestComponent, TestScreen};
    use crate::view::{ScrollPosition, Scrollable};
    use serde_json::json;

    fn view_changes(events: &[Event]) -> Vec<(ViewControllerId, Option<Transition>)> {
        events
            .iter()
            .filter_map(|event| match *event {
                Event::ViewChanged {
                    view, transition, ..
                } => Some((view, transition)),
                _ => None,
            })
            .collect()
    }

    fn root_stack(context: &Context) -> NavigationStack {
        NavigationStack::new(
            "main",
            ViewControllerSpec::new(TestComponent::new("a")),
            context,
        )
    }

    #[test]
    fn construction_mounts_root_and_announces_it() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);

        let events = drain(&context, &rx);

        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.mounted_view(), Some(stack.root_id()));
        assert_eq!(view_changes(&events), vec![(stack.root_id(), None)]);
    }

    #[test]
    fn push_pop_scenario() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        let id_a = stack.root_id();
        drain(&context, &rx);

        let id_b = stack.push(TestComponent::new("b"), Props::new(), true);
        assert_eq!(stack.view_controllers(), vec![id_a, id_b]);
        assert_eq!(
            view_changes(&drain(&context, &rx)),
            vec![(id_b, Some(Transition::Forward))]
        );

        let id_c = stack.push(TestComponent::new("c"), Props::new(), true);
        assert_eq!(stack.view_controllers(), vec![id_a, id_b, id_c]);
        assert_eq!(
            view_changes(&drain(&context, &rx)),
            vec![(id_c, Some(Transition::Forward))]
        );

        assert_eq!(stack.pop(PopOptions::default()), Some(id_b));
        assert_eq!(stack.view_controllers(), vec![id_a, id_b]);
        assert_eq!(
            view_changes(&drain(&context, &rx)),
            vec![(id_b, Some(Transition::Backward))]
        );

        assert_eq!(stack.pop_to_root(PopOptions::default()), Some(id_a));
        assert_eq!(stack.view_controllers(), vec![id_a]);
        assert_eq!(
            view_changes(&drain(&context, &rx)),
            vec![(id_a, Some(Transition::Backward))]
        );

        assert_eq!(
            stack.pop_to_view(&ViewControllerId::new(), PopOptions::default()),
            None
        );
        assert_eq!(stack.view_controllers(), vec![id_a]);
        assert_eq!(stack.mounted_view(), Some(id_a));
    }

    #[test]
    fn push_appends_one_record_bound_to_the_component() {
        let (context, _rx) = create_test_context();
        let stack = root_stack(&context);
        let component = TestComponent::new("detail");
        let mut props = Props::new();
        props.insert("item".to_string(), json!(42));

        let id = stack.push(component.clone(), props.clone(), true);

        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.active_id(), id);
        let record = stack.get_view_controller(&id);
        assert!(record.as_ref().is_some_and(|record| {
            Rc::ptr_eq(&record.component, &(component.clone() as Rc<dyn Component>))
        }));
        assert_eq!(record.map(|record| record.props), Some(props));
        assert_eq!(component.mounts(), 1);
        assert_eq!(stack.last_requested_transition(), Some(Transition::Forward));
    }

    #[test]
    fn push_emits_pushed_after_requesting_the_transition() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        drain(&context, &rx);

        let id = stack.push(TestComponent::new("b"), Props::new(), false);

        assert_eq!(stack.mounted_view(), Some(id));
        assert_eq!(stack.last_requested_transition(), Some(Transition::Instant));
        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![Event::Pushed {
                owner: stack.id(),
                view: id
            }]
        );
    }

    #[test]
    fn pop_on_root_only_stack_is_a_noop() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        drain(&context, &rx);
        let before = stack.view_controllers();

        assert_eq!(stack.pop(PopOptions::default()), None);
        assert_eq!(stack.pop_to_root(PopOptions::default()), None);

        assert_eq!(stack.view_controllers(), before);
        assert!(drain(&context, &rx).is_empty());
    }

    #[test]
    fn pop_to_view_truncates_after_target() {
        let (context, _rx) = create_test_context();
        let stack = root_stack(&context);
        let ids: Vec<_> = (0..4)
            .map(|i| stack.push(TestComponent::new(&format!("v{}", i)), Props::new(), true))
            .collect();

        assert_eq!(stack.pop_to_view(&ids[1], PopOptions::animated(false)), Some(ids[1]));

        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.view_controllers(), vec![stack.root_id(), ids[0], ids[1]]);
        assert!(stack.get_view_controller(&ids[3]).is_none());
        assert_eq!(stack.mounted_view(), Some(ids[1]));
        assert_eq!(stack.last_requested_transition(), Some(Transition::Instant));
    }

    #[test]
    fn pop_to_unknown_view_leaves_stack_untouched() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        let id = stack.push(TestComponent::new("b"), Props::new(), true);
        drain(&context, &rx);
        let before = stack.view_controllers();

        assert_eq!(
            stack.pop_to_view(&ViewControllerId::new(), PopOptions::default()),
            None
        );

        assert_eq!(stack.view_controllers(), before);
        assert_eq!(stack.mounted_view(), Some(id));
        assert!(drain(&context, &rx).is_empty());
    }

    #[test]
    fn unacknowledged_pop_still_truncates() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        stack.push(TestComponent::new("b"), Props::new(), true);
        drain(&context, &rx);

        let options = PopOptions::default().unacknowledged();
        assert_eq!(stack.pop(options), Some(stack.root_id()));

        assert_eq!(stack.depth(), 1);
        let events = drain(&context, &rx);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::Popped { .. })));
        assert_eq!(
            view_changes(&events),
            vec![(stack.root_id(), Some(Transition::Backward))]
        );
    }

    #[test]
    fn acknowledged_pop_emits_popped() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        stack.push(TestComponent::new("b"), Props::new(), true);
        drain(&context, &rx);

        stack.pop(PopOptions::default());

        let popped: Vec<Event> = rx.try_iter().collect();
        assert_eq!(
            popped,
            vec![Event::Popped {
                owner: stack.id(),
                view: stack.root_id()
            }]
        );
    }

    #[test]
    fn operations_in_one_tick_settle_once() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        drain(&context, &rx);

        stack.push(TestComponent::new("b"), Props::new(), true);
        let id_c = stack.push(TestComponent::new("c"), Props::new(), true);
        assert_eq!(context.scheduler.len(), 1);

        assert_eq!(
            view_changes(&drain(&context, &rx)),
            vec![(id_c, Some(Transition::Forward))]
        );

        stack.push(TestComponent::new("d"), Props::new(), true);
        stack.pop_to_root(PopOptions::default());
        assert_eq!(
            view_changes(&drain(&context, &rx)),
            vec![(stack.root_id(), Some(Transition::Backward))]
        );

        let id_e = stack.push(TestComponent::new("e"), Props::new(), true);
        stack.pop(PopOptions::default());
        stack.push(TestComponent::new("f"), Props::new(), true);
        assert_ne!(stack.active_id(), id_e);
        assert_eq!(
            view_changes(&drain(&context, &rx)),
            vec![(stack.active_id(), Some(Transition::Forward))]
        );
    }

    #[test]
    fn popping_to_the_active_view_settles_without_direction() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        let id = stack.push(TestComponent::new("b"), Props::new(), true);
        drain(&context, &rx);

        assert_eq!(stack.pop_to_view(&id, PopOptions::default()), Some(id));

        assert_eq!(stack.depth(), 2);
        assert_eq!(view_changes(&drain(&context, &rx)), vec![(id, None)]);
        let updates = stack.with_active_screen(|screen| {
            screen.downcast_ref::<TestScreen>().map(|screen| screen.updates)
        });
        assert_eq!(updates.flatten(), Some(1));
    }

    #[test]
    fn root_survives_any_sequence_of_operations() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        let root = stack.root_id();

        for round in 0..5 {
            for i in 0..=round {
                stack.push(TestComponent::new(&format!("{}-{}", round, i)), Props::new(), true);
            }
            for _ in 0..=round + 1 {
                stack.pop(PopOptions::default());
                assert!(stack.depth() >= 1);
            }
            stack.pop_to_root(PopOptions::default());
            drain(&context, &rx);
            assert_eq!(stack.view_controllers().first(), Some(&root));
        }

        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.root_id(), root);
    }

    #[test]
    fn can_go_back_is_false_only_for_root() {
        let (context, _rx) = create_test_context();
        let stack = root_stack(&context);
        let b = stack.push(TestComponent::new("b"), Props::new(), true);
        let c = stack.push(TestComponent::new("c"), Props::new(), true);

        assert!(!stack.navigator(stack.root_id()).can_go_back());
        assert!(stack.navigator(b).can_go_back());
        assert!(stack.navigator(c).can_go_back());

        stack.pop(PopOptions::default());
        assert!(!stack.navigator(c).can_go_back());
    }

    #[test]
    fn saved_state_is_handed_back_on_remount() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        let b = stack.push(TestComponent::new("b"), Props::new(), true);

        let mut blob = SavedState::new();
        blob.insert("query".to_string(), json!("rust"));
        blob.insert("page".to_string(), json!(3));
        let typed = blob.clone();
        stack.with_active_screen_mut(move |screen| {
            if let Some(screen) = screen.downcast_mut::<TestScreen>() {
                screen.state = typed;
            }
        });

        stack.push(TestComponent::new("c"), Props::new(), true);
        assert_eq!(
            stack.get_view_controller(&b).and_then(|record| record.saved_state),
            Some(blob.clone())
        );

        stack.pop_to_view(&b, PopOptions::default());
        drain(&context, &rx);

        let initial_state = stack
            .with_active_screen(|screen| {
                screen
                    .downcast_ref::<TestScreen>()
                    .and_then(|screen| screen.props.initial_state.clone())
            })
            .flatten();
        assert_eq!(initial_state, Some(blob));
    }

    #[test]
    fn save_state_stores_a_copy() {
        let (context, _rx) = create_test_context();
        let stack = root_stack(&context);
        let navigator = stack.navigator(stack.root_id());

        let mut blob = SavedState::new();
        blob.insert("count".to_string(), json!(1));
        navigator.save_state(&blob);
        blob.insert("count".to_string(), json!(2));

        let saved = stack
            .get_view_controller(&stack.root_id())
            .and_then(|record| record.saved_state);
        assert_eq!(saved.and_then(|s| s.get("count").cloned()), Some(json!(1)));
    }

    #[test]
    fn save_state_for_removed_record_is_ignored() {
        let (context, _rx) = create_test_context();
        let stack = root_stack(&context);
        let b = stack.push(TestComponent::new("b"), Props::new(), true);
        let navigator = stack.navigator(b);
        stack.pop(PopOptions::default());

        navigator.save_state(&SavedState::new());

        assert!(!stack.save_state(&b, &SavedState::new()));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn scroll_handle_survives_remount() {
        let (context, _rx) = create_test_context();
        let stack = root_stack(&context);
        let b = stack.push(TestComponent::new("b"), Props::new(), true);

        let scrollable = stack
            .with_active_screen(|screen| {
                screen
                    .downcast_ref::<TestScreen>()
                    .map(|screen| screen.props.scrollable.clone())
            })
            .flatten()
            .unwrap_or_else(Scrollable::new);
        scrollable.scroll_to(ScrollPosition { top: 300, left: 0 });

        stack.push(TestComponent::new("c"), Props::new(), true);
        stack.pop_to_view(&b, PopOptions::default());

        let position = stack
            .with_active_screen(|screen| {
                screen
                    .downcast_ref::<TestScreen>()
                    .map(|screen| screen.props.scrollable.position())
            })
            .flatten();
        assert_eq!(position, Some(ScrollPosition { top: 300, left: 0 }));
    }

    #[test]
    fn supplied_saved_state_reaches_the_first_mount() {
        let (context, _rx) = create_test_context();
        let mut blob = SavedState::new();
        blob.insert("draft".to_string(), json!("unsent"));

        let stack = NavigationStack::new(
            "main",
            ViewControllerSpec::new(TestComponent::new("compose")).saved_state(blob.clone()),
            &context,
        );

        let initial_state = stack
            .with_active_screen(|screen| {
                screen
                    .downcast_ref::<TestScreen>()
                    .and_then(|screen| screen.props.initial_state.clone())
            })
            .flatten();
        assert_eq!(initial_state, Some(blob));
    }

    #[test]
    fn injected_factory_creates_one_handle_per_record() {
        use std::cell::Cell;

        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let factory: ScrollableFactory = Rc::new(move || {
            counter.set(counter.get() + 1);
            Scrollable::new()
        });
        let (context, rx) = create_test_context();
        let context = context.with_scrollable_factory(factory);

        let stack = root_stack(&context);
        assert_eq!(calls.get(), 1);

        let b = stack.push(TestComponent::new("b"), Props::new(), true);
        stack.push(TestComponent::new("c"), Props::new(), true);
        assert_eq!(calls.get(), 3);

        stack.pop_to_view(&b, PopOptions::default());
        stack.pop_to_root(PopOptions::default());
        drain(&context, &rx);
        assert_eq!(calls.get(), 3);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn navigator_delegates_to_its_stack() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        let navigator = stack.navigator(stack.root_id());

        let b = navigator.push(TestComponent::new("b"), Props::new(), true);
        assert_eq!(b, Some(stack.active_id()));
        let b = b.unwrap_or_default();
        assert!(navigator.get_view_controller(&b).is_some());

        let c = stack.navigator(b).push(TestComponent::new("c"), Props::new(), true);
        assert_eq!(stack.depth(), 3);
        assert_eq!(navigator.pop(PopOptions::default()), Some(b));
        assert_eq!(navigator.pop_to_root(PopOptions::default()), Some(stack.root_id()));
        assert_eq!(navigator.pop_to_view(&c.unwrap_or_default(), PopOptions::default()), None);
        drain(&context, &rx);

        navigator.refresh_navigation();
        let events: Vec<Event> = rx.try_iter().collect();
        assert_eq!(view_changes(&events), vec![(stack.root_id(), None)]);
    }

    #[test]
    fn navigator_outliving_its_stack_is_inert() {
        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        let navigator = stack.navigator(stack.root_id());
        drop(stack);
        drain(&context, &rx);

        assert_eq!(navigator.push(TestComponent::new("b"), Props::new(), true), None);
        assert_eq!(navigator.pop(PopOptions::default()), None);
        assert!(!navigator.can_go_back());
        navigator.save_state(&SavedState::new());
        navigator.refresh_navigation();
        assert!(drain(&context, &rx).is_empty());
    }

    #[test]
    fn navigation_from_inside_a_mount_is_deferred() {
        use crate::view::{Screen, ViewProps};

        struct Redirect {
            target: Rc<TestComponent>,
        }

        struct RedirectScreen;

        impl Screen for RedirectScreen {}

        impl Component for Redirect {
            fn name(&self) -> &str {
                "redirect"
            }

            fn mount(&self, props: ViewProps) -> Box<dyn Screen> {
                if let Some(navigator) = props.navigator() {
                    navigator.push(self.target.clone(), Props::new(), false);
                }
                Box::new(RedirectScreen)
            }
        }

        let (context, rx) = create_test_context();
        let stack = root_stack(&context);
        let target = TestComponent::new("target");
        let redirect = Rc::new(Redirect {
            target: target.clone(),
        });

        stack.push(redirect, Props::new(), true);
        assert_eq!(stack.depth(), 3);
        assert_eq!(target.mounts(), 0);

        drain(&context, &rx);
        assert_eq!(target.mounts(), 1);
        assert_eq!(stack.mounted_view(), Some(stack.active_id()));
    }
}
