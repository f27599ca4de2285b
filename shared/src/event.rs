use serde::{Deserialize, Serialize};

use crate::capabilities::{HistoryEntry, HttpResult};
use crate::model::SiteId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    AppStarted,

    /// Search box contents changed (every keystroke).
    SearchChanged {
        query: String,
    },

    SiteSelected {
        site_id: SiteId,
    },

    /// The back affordance in the details panel.
    BackRequested,

    /// The platform's navigation (popstate) event. `state` is whatever was
    /// stored with the entry that became current, if anything.
    Navigated {
        state: Option<HistoryEntry>,
    },

    // Capability responses; never sent by the shell.
    #[serde(skip)]
    SitesLoaded(Box<HttpResult>),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::AppStarted => "app_started",
            Event::SearchChanged { .. } => "search_changed",
            Event::SiteSelected { .. } => "site_selected",
            Event::BackRequested => "back_requested",
            Event::Navigated { .. } => "navigated",
            Event::SitesLoaded(_) => "sites_loaded",
        }
    }

    pub fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Event::SearchChanged { .. } | Event::SiteSelected { .. } | Event::BackRequested
        )
    }
}
