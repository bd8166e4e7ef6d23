//! Data model shared by the navigation stack and the tab selector.
//!
//! A *component* is a screen implementation; mounting it with a set of
//! [`ViewProps`] yields a *screen* instance. Controllers never talk to screens
//! directly: they describe what to show in a
//! [`TransitionRequest`](view_manager::TransitionRequest) and let the
//! [`ViewManager`](view_manager::ViewManager) mount, update or tear screens
//! down. Screens talk back only through the capability object carried in
//! their props.

pub mod navigation;
pub mod tabs;
pub mod view_controller;
pub mod view_manager;

use self::navigation::{NavigationDescription, NavigationStack, Navigator};
use self::tabs::Tabinator;
use self::view_controller::ViewControllerId;
use downcast_rs::{impl_downcast, Downcast};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;

/// Numeric identifier of a controller instance.
pub type Id = u64;

/// Hands out process-wide unique controller ids.
pub struct IdFeeder(AtomicU64);

impl IdFeeder {
    pub const fn new(start: Id) -> Self {
        IdFeeder(AtomicU64::new(start))
    }

    pub fn next(&self) -> Id {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

pub static ID_FEEDER: IdFeeder = IdFeeder::new(1);

/// Caller-supplied initialization data for a screen instance.
pub type Props = Map<String, Value>;

/// Opaque transient state a screen saves on unmount.
pub type SavedState = Map<String, Value>;

/// Sending half of the controller event channel.
pub type Hub = Sender<Event>;

/// Callback wired into chrome (back buttons, tabs).
pub type Action = Rc<dyn Fn()>;

/// Produces a fresh scroll handle for a new view controller.
pub type ScrollableFactory = Rc<dyn Fn() -> Scrollable>;

/// Visual kind of a transition between two screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transition {
    /// The new screen slides in (`show-from-right`).
    Forward,
    /// The previous screen is revealed (`reveal-from-right`).
    Backward,
    /// No animation.
    Instant,
}

impl Transition {
    pub fn forward(animated: bool) -> Transition {
        if animated {
            Transition::Forward
        } else {
            Transition::Instant
        }
    }

    pub fn backward(animated: bool) -> Transition {
        if animated {
            Transition::Backward
        } else {
            Transition::Instant
        }
    }

    /// Infers the direction of a completed update from the sequence lengths
    /// before and after it. Unchanged length carries no direction.
    pub fn from_length_delta(previous: usize, current: usize) -> Option<Transition> {
        match current.cmp(&previous) {
            std::cmp::Ordering::Less => Some(Transition::Backward),
            std::cmp::Ordering::Greater => Some(Transition::Forward),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Forward => "show-from-right",
            Transition::Backward => "reveal-from-right",
            Transition::Instant => "instant",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notifications emitted by controllers over the [`Hub`].
///
/// `owner` is the [`Id`] of the emitting controller, which lets a shell
/// ignore events coming from nested controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A completed update left `view` active.
    ViewChanged {
        owner: Id,
        view: ViewControllerId,
        transition: Option<Transition>,
    },
    /// A view controller was pushed and its transition requested.
    Pushed { owner: Id, view: ViewControllerId },
    /// The stack was popped back to `view`.
    Popped { owner: Id, view: ViewControllerId },
}

/// Scroll offset of a screen's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub top: i32,
    pub left: i32,
}

/// Scroll handle shared by every mount of the same view controller, so the
/// position survives a screen being torn down and mounted again.
#[derive(Debug, Clone, Default)]
pub struct Scrollable(Rc<Cell<ScrollPosition>>);

impl Scrollable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> ScrollPosition {
        self.0.get()
    }

    pub fn scroll_to(&self, position: ScrollPosition) {
        self.0.set(position);
    }

    /// True when both handles refer to the same underlying position.
    pub fn ptr_eq(&self, other: &Scrollable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn default_factory() -> ScrollableFactory {
        Rc::new(Scrollable::new)
    }
}

/// The capability object injected into a screen's props.
#[derive(Debug, Clone)]
pub enum Capability {
    Navigator(Navigator),
    Tabinator(Tabinator),
}

/// Everything a screen receives when it is mounted or updated.
#[derive(Debug, Clone)]
pub struct ViewProps {
    pub props: Props,
    /// State saved by the previous mount of the same view controller.
    pub initial_state: Option<SavedState>,
    pub scrollable: Scrollable,
    pub capability: Capability,
}

impl ViewProps {
    pub fn navigator(&self) -> Option<&Navigator> {
        match self.capability {
            Capability::Navigator(ref navigator) => Some(navigator),
            Capability::Tabinator(_) => None,
        }
    }

    pub fn tabinator(&self) -> Option<&Tabinator> {
        match self.capability {
            Capability::Tabinator(ref tabinator) => Some(tabinator),
            Capability::Navigator(_) => None,
        }
    }

    /// Saves `state` through whichever capability this screen was given.
    pub fn save_state(&self, state: &SavedState) {
        match self.capability {
            Capability::Navigator(ref navigator) => navigator.save_state(state),
            Capability::Tabinator(ref tabinator) => tabinator.save_state(state),
        }
    }
}

/// A screen implementation, i.e. something that can be rendered with props.
///
/// Controllers compare components by `Rc` identity.
pub trait Component {
    fn name(&self) -> &str;

    fn mount(&self, props: ViewProps) -> Box<dyn Screen>;
}

/// A mounted screen instance.
pub trait Screen: Downcast {
    /// Called when the view manager re-targets the already mounted screen.
    fn update(&mut self, _props: ViewProps) {}

    /// Called right before the screen is torn down. Screens that want their
    /// transient state back on the next mount save it here.
    fn will_unmount(&mut self) {}

    /// Screens that drive navigation chrome expose their metadata here.
    fn navigation_metadata(&self) -> Option<&dyn NavigationMetadata> {
        None
    }

    /// Screens that host a stack of their own return it here, so chrome can
    /// describe the nested active screen instead.
    fn nested_navigator(&self) -> Option<NavigationStack> {
        None
    }
}

impl_downcast!(Screen);

/// Optional capability of a [`Screen`]: describe the navigation bar.
pub trait NavigationMetadata {
    fn navigation(&self) -> NavigationDescription;
}
