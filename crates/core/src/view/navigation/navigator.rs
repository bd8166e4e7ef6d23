use super::navigation_bar::{NavigationBar, NavigationBarState, NavigationDescription};
use super::stack::NavigationStack;
use crate::context::Context;
use crate::view::view_controller::{ViewControllerId, ViewControllerSpec};
use crate::view::{Event, Screen, Transition};

/// A [`NavigationStack`] with optional navigation bar chrome.
///
/// The shell listens for the stack's [`Event::ViewChanged`] notifications
/// and recomposes the bar from the active screen's metadata. When the active
/// screen hosts a stack of its own, the bar describes that stack's active
/// screen instead (one level deep).
#[derive(Debug)]
pub struct StackNavigator {
    name: String,
    stack: NavigationStack,
    navigation_bar: Option<NavigationBar>,
}

impl StackNavigator {
    pub fn new(name: &str, root: ViewControllerSpec, context: &Context) -> StackNavigator {
        let show_navigation_bar = context.settings.navigator.show_navigation_bar;
        StackNavigator::with_navigation_bar(name, root, show_navigation_bar, context)
    }

    pub fn with_navigation_bar(
        name: &str,
        root: ViewControllerSpec,
        show_navigation_bar: bool,
        context: &Context,
    ) -> StackNavigator {
        let stack = NavigationStack::new(name, root, context);
        let navigation_bar = show_navigation_bar.then(|| NavigationBar::new(name));

        StackNavigator {
            name: name.to_string(),
            stack,
            navigation_bar,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stack(&self) -> &NavigationStack {
        &self.stack
    }

    pub fn navigation_bar(&self) -> Option<&NavigationBar> {
        self.navigation_bar.as_ref()
    }

    /// Returns true when the event came from this shell's stack.
    pub fn handle_event(&mut self, evt: &Event) -> bool {
        match *evt {
            Event::ViewChanged {
                owner,
                view,
                transition,
            } if owner == self.stack.id() => {
                self.on_view_change(view, transition);
                true
            }
            _ => false,
        }
    }

    fn on_view_change(&mut self, view: ViewControllerId, transition: Option<Transition>) {
        let Some(navigation_bar) = self.navigation_bar.as_mut() else {
            return;
        };

        let description = self
            .stack
            .with_active_screen(describe_active_screen)
            .flatten();
        let Some(description) = description else {
            tracing::trace!(navigator = %self.name, %view, "active screen has no navigation metadata");
            return;
        };

        let navigator = self.stack.navigator(view);
        navigation_bar.update_with_transition(
            NavigationBarState::compose(description, &navigator),
            transition,
        );
    }
}

fn describe_active_screen(screen: &(dyn Screen + 'static)) -> Option<NavigationDescription> {
    match screen.nested_navigator() {
        Some(nested) => nested.with_active_screen(describe).flatten(),
        None => describe(screen),
    }
}

fn describe(screen: &(dyn Screen + 'static)) -> Option<NavigationDescription> {
    screen
        .navigation_metadata()
        .map(|metadata| metadata.navigation())
}
