//! View controller records and the ordered store both controllers keep them in.

use super::{Component, Props, SavedState, Scrollable, ScrollableFactory};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// Identity of a view controller record.
///
/// UUID v7: unique for the lifetime of the process and never reused, even
/// after the record has been dropped from its controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewControllerId(Uuid);

impl ViewControllerId {
    pub fn new() -> Self {
        ViewControllerId(Uuid::now_v7())
    }
}

impl Default for ViewControllerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One screen instance known to a controller.
///
/// Only `saved_state` changes after creation.
#[derive(Clone)]
pub struct ViewControllerRecord {
    pub id: ViewControllerId,
    pub component: Rc<dyn Component>,
    pub props: Props,
    pub saved_state: Option<SavedState>,
    pub scrollable: Scrollable,
    /// Tab label, only set for records owned by a tab selector.
    pub tab: Option<String>,
}

impl fmt::Debug for ViewControllerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewControllerRecord")
            .field("id", &self.id)
            .field("component", &self.component.name())
            .field("props", &self.props)
            .field("saved_state", &self.saved_state)
            .field("tab", &self.tab)
            .finish()
    }
}

/// Description of a view controller that hasn't been created yet.
///
/// ```
/// use navstack_core::view::view_controller::ViewControllerSpec;
/// # use navstack_core::view::{Component, Screen, ViewProps};
/// # use std::rc::Rc;
/// # struct Inbox;
/// # impl Component for Inbox {
/// #     fn name(&self) -> &str { "inbox" }
/// #     fn mount(&self, _props: ViewProps) -> Box<dyn Screen> { unimplemented!() }
/// # }
///
/// let mut props = serde_json::Map::new();
/// props.insert("folder".to_string(), "archive".into());
///
/// let spec = ViewControllerSpec::new(Rc::new(Inbox))
///     .props(props)
///     .tab("Inbox");
/// ```
#[derive(Clone)]
pub struct ViewControllerSpec {
    component: Rc<dyn Component>,
    props: Props,
    saved_state: Option<SavedState>,
    scrollable: Option<Scrollable>,
    tab: Option<String>,
}

impl ViewControllerSpec {
    pub fn new(component: Rc<dyn Component>) -> Self {
        ViewControllerSpec {
            component,
            props: Props::new(),
            saved_state: None,
            scrollable: None,
            tab: None,
        }
    }

    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    /// Reuse an existing scroll handle instead of asking the factory.
    pub fn scrollable(mut self, scrollable: Scrollable) -> Self {
        self.scrollable = Some(scrollable);
        self
    }

    pub fn saved_state(mut self, state: SavedState) -> Self {
        self.saved_state = Some(state);
        self
    }

    pub fn tab(mut self, label: &str) -> Self {
        self.tab = Some(label.to_string());
        self
    }
}

/// Turns a spec into a record with a fresh id.
///
/// The spec's scroll handle is used when present, otherwise `factory` creates one.
pub fn prepare_view_controller(
    spec: ViewControllerSpec,
    factory: &ScrollableFactory,
) -> ViewControllerRecord {
    let scrollable = spec.scrollable.unwrap_or_else(|| factory());

    ViewControllerRecord {
        id: ViewControllerId::new(),
        component: spec.component,
        props: spec.props,
        saved_state: spec.saved_state,
        scrollable,
        tab: spec.tab,
    }
}

/// Ordered arena of records keyed by id.
///
/// Insertion order is the navigation order: index 0 is the root, the last
/// entry is the most recent one.
#[derive(Debug, Clone, Default)]
pub struct ViewControllers {
    records: IndexMap<ViewControllerId, ViewControllerRecord>,
}

impl ViewControllers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ViewControllerRecord) {
        self.records.insert(record.id, record);
    }

    pub fn get(&self, id: &ViewControllerId) -> Option<&ViewControllerRecord> {
        self.records.get(id)
    }

    pub fn get_index(&self, index: usize) -> Option<&ViewControllerRecord> {
        self.records.get_index(index).map(|(_, record)| record)
    }

    pub fn position(&self, id: &ViewControllerId) -> Option<usize> {
        self.records.get_index_of(id)
    }

    pub fn last(&self) -> Option<&ViewControllerRecord> {
        self.records.last().map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> Vec<ViewControllerId> {
        self.records.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewControllerRecord> {
        self.records.values()
    }

    /// Drops every record after `id`. Returns how many were dropped, or
    /// `None` if `id` isn't present.
    pub fn truncate_after(&mut self, id: &ViewControllerId) -> Option<usize> {
        let index = self.position(id)?;
        let removed = self.records.len() - (index + 1);
        self.records.truncate(index + 1);
        Some(removed)
    }

    /// Stores a copy of `state` as the record's saved state. Returns false
    /// when the record is gone.
    pub fn save_state(&mut self, id: &ViewControllerId, state: &SavedState) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.saved_state = Some(state.clone());
                true
            }
            None => false,
        }
    }
}
