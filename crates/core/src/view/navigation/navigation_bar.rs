//! Navigation bar data.
//!
//! Screens describe what the bar should show with a
//! [`NavigationDescription`]; the shell merges it with defaults derived from
//! the screen's [`Navigator`] into a [`NavigationBarState`], which is what the
//! [`NavigationBar`] renders.

use super::stack::{Navigator, PopOptions};
use crate::view::{Action, Transition};
use serde_json::{Map, Value};
use std::fmt;
use std::rc::Rc;

/// Navigation bar metadata declared by a screen. Every field is optional.
#[derive(Clone, Default)]
pub struct NavigationDescription {
    pub title: Option<String>,
    /// Label shown next to the back arrow, when there is somewhere to go back to.
    pub back_label: Option<String>,
    pub left_label: Option<String>,
    pub left_arrow: Option<bool>,
    pub left_action: Option<Action>,
    pub right_label: Option<String>,
    pub right_action: Option<Action>,
    /// Free-form data for custom bar renderers.
    pub custom: Map<String, Value>,
}

impl fmt::Debug for NavigationDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationDescription")
            .field("title", &self.title)
            .field("back_label", &self.back_label)
            .field("left_label", &self.left_label)
            .field("left_arrow", &self.left_arrow)
            .field("left_action", &self.left_action.is_some())
            .field("right_label", &self.right_label)
            .field("right_action", &self.right_action.is_some())
            .field("custom", &self.custom)
            .finish()
    }
}

/// Fully resolved bar contents.
#[derive(Clone, Default)]
pub struct NavigationBarState {
    pub title: Option<String>,
    pub left_arrow: bool,
    pub left_label: Option<String>,
    pub left_action: Option<Action>,
    pub right_label: Option<String>,
    pub right_action: Option<Action>,
    pub custom: Map<String, Value>,
}

impl NavigationBarState {
    /// Merges `description` over the defaults `navigator` implies:
    ///
    /// - `left_action` pops the navigator's stack
    /// - `left_arrow` is shown when the navigator can go back
    /// - `left_label` is the back label, only when the navigator can go back
    ///
    /// Anything set explicitly in the description wins.
    pub fn compose(description: NavigationDescription, navigator: &Navigator) -> Self {
        let can_go_back = navigator.can_go_back();

        let left_action = description.left_action.unwrap_or_else(|| {
            let navigator = navigator.clone();
            let action: Action = Rc::new(move || {
                navigator.pop(PopOptions::default());
            });
            action
        });

        let back_label = if can_go_back {
            description.back_label
        } else {
            None
        };

        NavigationBarState {
            title: description.title,
            left_arrow: description.left_arrow.unwrap_or(can_go_back),
            left_label: description.left_label.or(back_label),
            left_action: Some(left_action),
            right_label: description.right_label,
            right_action: description.right_action,
            custom: description.custom,
        }
    }
}

impl fmt::Debug for NavigationBarState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationBarState")
            .field("title", &self.title)
            .field("left_arrow", &self.left_arrow)
            .field("left_label", &self.left_label)
            .field("left_action", &self.left_action.is_some())
            .field("right_label", &self.right_label)
            .field("right_action", &self.right_action.is_some())
            .field("custom", &self.custom)
            .finish()
    }
}

/// The bar itself: holds the last state it was given and the transition
/// that came with it.
#[derive(Debug)]
pub struct NavigationBar {
    name: String,
    state: Option<NavigationBarState>,
    last_transition: Option<Transition>,
    update_count: usize,
}

impl NavigationBar {
    pub fn new(name: &str) -> Self {
        NavigationBar {
            name: name.to_string(),
            state: None,
            last_transition: None,
            update_count: 0,
        }
    }

    pub fn update_with_transition(
        &mut self,
        state: NavigationBarState,
        transition: Option<Transition>,
    ) {
        tracing::debug!(
            bar = %self.name,
            title = ?state.title,
            left_arrow = state.left_arrow,
            transition = ?transition,
            "navigation bar updated"
        );
        self.state = Some(state);
        self.last_transition = transition;
        self.update_count += 1;
    }

    pub fn state(&self) -> Option<&NavigationBarState> {
        self.state.as_ref()
    }

    pub fn last_transition(&self) -> Option<Transition> {
        self.last_transition
    }

    pub fn update_count(&self) -> usize {
        self.update_count
    }

    /// Runs the left action. Returns false when there is none.
    pub fn tap_left(&self) -> bool {
        let action = self.state.as_ref().and_then(|s| s.left_action.clone());
        run_action(action)
    }

    pub fn tap_right(&self) -> bool {
        let action = self.state.as_ref().and_then(|s| s.right_action.clone());
        run_action(action)
    }
}

fn run_action(action: Option<Action>) -> bool {
    match action {
        Some(action) => {
            action();
            true
        }
        None => false,
    }
}
