//! History-stack integration.
//!
//! The core never changes the visible view in answer to a back or forward
//! request. It asks the platform to navigate and waits for the platform's own
//! navigation event (`Event::Navigated`), which carries the restored entry.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::Event;
use crate::model::SiteId;

pub const LIST_TITLE: &str = "Site List";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewTag {
    List,
    Details,
}

/// State stored with each history entry: `{ "view": "list" | "details", "siteId"?: string }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub view: ViewTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<SiteId>,
}

impl HistoryEntry {
    pub fn list() -> Self {
        Self {
            view: ViewTag::List,
            site_id: None,
        }
    }

    pub fn details(site_id: SiteId) -> Self {
        Self {
            view: ViewTag::Details,
            site_id: Some(site_id),
        }
    }

    pub fn title(&self) -> String {
        match (&self.view, &self.site_id) {
            (ViewTag::Details, Some(id)) => format!("Details for {id}"),
            _ => LIST_TITLE.to_string(),
        }
    }

    /// URL fragment without the leading `#`. Decorative only: it is never
    /// parsed back into state.
    pub fn fragment(&self) -> Option<String> {
        match (&self.view, &self.site_id) {
            (ViewTag::Details, Some(id)) => Some(format!("details/{id}")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationOperation {
    /// Overwrite the current entry. `fragment: None` clears any fragment and
    /// keeps the page path.
    Replace {
        state: HistoryEntry,
        title: String,
        fragment: Option<String>,
    },
    Push {
        state: HistoryEntry,
        title: String,
        fragment: Option<String>,
    },
    /// Platform-level back navigation.
    Back,
}

impl Operation for NavigationOperation {
    type Output = ();
}

/// The navigation adapter. Selections push, startup replaces, and the back
/// affordance only asks the platform to go back. The platform's answer comes
/// in as `Event::Navigated`.
pub struct Navigation<Ev> {
    context: CapabilityContext<NavigationOperation, Ev>,
}

impl<Ev> Clone for Navigation<Ev> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<Ev> Capability<Ev> for Navigation<Ev> {
    type Operation = NavigationOperation;
    type MappedSelf<MappedEv> = Navigation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Navigation {
            context: self.context.map_event(f),
        }
    }
}

impl<Ev> Navigation<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<NavigationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn replace_view(&self, state: HistoryEntry) {
        self.notify(NavigationOperation::Replace {
            title: state.title(),
            fragment: state.fragment(),
            state,
        });
    }

    pub fn push_view(&self, state: HistoryEntry) {
        self.notify(NavigationOperation::Push {
            title: state.title(),
            fragment: state.fragment(),
            state,
        });
    }

    pub fn go_back(&self) {
        self.notify(NavigationOperation::Back);
    }

    fn notify(&self, operation: NavigationOperation) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(operation).await;
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub state: Option<HistoryEntry>,
    pub title: String,
    pub url: String,
}

/// In-memory history stack with browser semantics. Native shells use it as
/// their history; it also stands in for the browser in tests.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    path: String,
    records: Vec<HistoryRecord>,
    cursor: usize,
}

impl HistoryStack {
    /// A fresh stack holding the page load entry, which has no state yet.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            records: vec![HistoryRecord {
                state: None,
                title: String::new(),
                url: path.clone(),
            }],
            path,
            cursor: 0,
        }
    }

    /// Perform an operation the core asked for. Returns the navigation event
    /// the platform fires in response, if any.
    pub fn apply(&mut self, operation: &NavigationOperation) -> Option<Event> {
        match operation {
            NavigationOperation::Replace {
                state,
                title,
                fragment,
            } => {
                let record = self.record(state, title, fragment.as_deref());
                self.records[self.cursor] = record;
                None
            }
            NavigationOperation::Push {
                state,
                title,
                fragment,
            } => {
                let record = self.record(state, title, fragment.as_deref());
                self.records.truncate(self.cursor + 1);
                self.records.push(record);
                self.cursor += 1;
                None
            }
            NavigationOperation::Back => self.back(),
        }
    }

    pub fn back(&mut self) -> Option<Event> {
        if self.cursor == 0 {
            debug!("back navigation at history root leaves the app");
            return None;
        }
        self.cursor -= 1;
        Some(self.navigated())
    }

    pub fn forward(&mut self) -> Option<Event> {
        if self.cursor + 1 >= self.records.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.navigated())
    }

    pub fn current(&self) -> &HistoryRecord {
        &self.records[self.cursor]
    }

    pub fn root(&self) -> &HistoryRecord {
        &self.records[0]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    fn navigated(&self) -> Event {
        Event::Navigated {
            state: self.records[self.cursor].state.clone(),
        }
    }

    fn record(&self, state: &HistoryEntry, title: &str, fragment: Option<&str>) -> HistoryRecord {
        let url = match fragment {
            Some(fragment) => format!("{}#{fragment}", self.path),
            None => self.path.clone(),
        };
        HistoryRecord {
            state: Some(state.clone()),
            title: title.to_string(),
            url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(stack: &mut HistoryStack, id: &str) {
        let state = HistoryEntry::details(SiteId::new(id));
        stack.apply(&NavigationOperation::Push {
            title: state.title(),
            fragment: state.fragment(),
            state,
        });
    }

    #[test]
    fn entry_serializes_with_platform_keys() {
        let json = serde_json::to_value(HistoryEntry::details(SiteId::new("A"))).unwrap();
        assert_eq!(json, serde_json::json!({ "view": "details", "siteId": "A" }));

        let json = serde_json::to_value(HistoryEntry::list()).unwrap();
        assert_eq!(json, serde_json::json!({ "view": "list" }));
    }

    #[test]
    fn entry_titles_and_fragments() {
        let details = HistoryEntry::details(SiteId::new("NYC-01"));
        assert_eq!(details.title(), "Details for NYC-01");
        assert_eq!(details.fragment().as_deref(), Some("details/NYC-01"));
        assert_eq!(HistoryEntry::list().title(), LIST_TITLE);
        assert_eq!(HistoryEntry::list().fragment(), None);
    }

    #[test]
    fn replace_rewrites_root_without_growing() {
        let mut stack = HistoryStack::new("/SearchSites/");
        let state = HistoryEntry::list();
        stack.apply(&NavigationOperation::Replace {
            title: state.title(),
            fragment: state.fragment(),
            state,
        });
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.root().state, Some(HistoryEntry::list()));
        assert_eq!(stack.root().url, "/SearchSites/");
    }

    #[test]
    fn push_then_back_fires_restored_state() {
        let mut stack = HistoryStack::new("/");
        push(&mut stack, "A");
        assert_eq!(stack.current().url, "/#details/A");

        let event = stack.back();
        assert!(matches!(event, Some(Event::Navigated { state: None })));
        assert_eq!(stack.position(), 0);
    }

    #[test]
    fn back_at_root_fires_nothing() {
        let mut stack = HistoryStack::new("/");
        assert!(stack.back().is_none());
        assert!(stack.apply(&NavigationOperation::Back).is_none());
    }

    #[test]
    fn push_after_back_discards_forward_entries() {
        let mut stack = HistoryStack::new("/");
        push(&mut stack, "A");
        stack.back();
        push(&mut stack, "B");
        assert_eq!(stack.len(), 2);
        assert!(stack.forward().is_none());
        assert_eq!(
            stack.current().state,
            Some(HistoryEntry::details(SiteId::new("B")))
        );
    }

    #[test]
    fn forward_restores_details_entry() {
        let mut stack = HistoryStack::new("/");
        push(&mut stack, "A");
        stack.back();
        match stack.forward() {
            Some(Event::Navigated { state: Some(entry) }) => {
                assert_eq!(entry, HistoryEntry::details(SiteId::new("A")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
