// lib.rs - site directory core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod capabilities;
pub mod config;
pub mod event;
pub mod filter;
pub mod model;
pub mod offline_cache;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::AppConfig;
pub use event::Event;
pub use model::{Model, Site, SiteId, SiteStore, ViewState};
pub use view::ViewModel;

/// Broad cause of a failed site-data load, as far as the user is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    NotFound,
    Server,
    Rejected,
    Malformed,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK",
            Self::Timeout => "TIMEOUT",
            Self::NotFound => "NOT_FOUND",
            Self::Server => "SERVER_ERROR",
            Self::Rejected => "REJECTED",
            Self::Malformed => "MALFORMED_DATA",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: BTreeMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            internal_message: None,
            context: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// One sentence for the list area, telling the user what went wrong with
    /// the site list and whether reloading is worth it.
    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "The site list could not be reached. Check your connection and reload."
            }
            ErrorKind::Timeout => "The site list took too long to arrive. Reload to try again.",
            ErrorKind::NotFound => "The site list is missing from the server.",
            ErrorKind::Server => "The server failed to deliver the site list. Reload to try again.",
            ErrorKind::Rejected => "The server refused the request for the site list.",
            ErrorKind::Malformed => "The site list is not in the expected format.",
        }
        .to_string()
    }

    #[must_use]
    pub fn from_http_status(status: u16) -> Self {
        let kind = match status {
            404 | 410 => ErrorKind::NotFound,
            408 | 504 => ErrorKind::Timeout,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Rejected,
        };

        Self::new(kind, format!("HTTP status {status}"))
            .with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " ({internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

pub mod app {
    use tracing::{debug, error, info, warn};

    use crate::capabilities::{Capabilities, HistoryEntry, ViewTag};
    use crate::event::Event;
    use crate::filter::filter_sites;
    use crate::model::{LoadState, Model, SiteNotFound, SiteStore, ViewState};
    use crate::view::{
        render_details, render_list, render_load_failed, render_missing, DetailsContent,
        ListContent, Panel, SearchBar, ViewModel,
    };

    /// The list/details navigation controller.
    ///
    /// The current [`ViewState`] always mirrors the current history entry:
    /// selections push an entry and switch to details, while back and forward
    /// are left to the platform and only observed through `Event::Navigated`.
    #[derive(Default)]
    pub struct App;

    impl App {
        fn start_load(model: &mut Model, caps: &Capabilities) {
            model.load_state = LoadState::Loading;
            caps.http
                .get(&model.config.data_path)
                .header("Accept", "application/json")
                .timeout_ms(model.config.request_timeout_ms)
                .send(|result| Event::SitesLoaded(Box::new(result)));
        }

        fn restored_view(state: Option<HistoryEntry>) -> ViewState {
            match state {
                Some(HistoryEntry {
                    view: ViewTag::Details,
                    site_id: Some(site_id),
                }) => ViewState::Details { site_id },
                Some(HistoryEntry {
                    view: ViewTag::Details,
                    site_id: None,
                }) => {
                    warn!("details history entry without a site id, showing list");
                    ViewState::List
                }
                // The page-load entry may carry no state at all.
                Some(HistoryEntry {
                    view: ViewTag::List,
                    ..
                })
                | None => ViewState::List,
            }
        }

        fn list_content(model: &Model) -> ListContent {
            match &model.load_state {
                LoadState::Idle | LoadState::Loading => ListContent::Loading,
                LoadState::Failed(e) => render_load_failed(e),
                LoadState::Loaded => render_list(&filter_sites(model.sites.sites(), &model.query)),
            }
        }

        fn details_content(model: &Model, site_id: &crate::model::SiteId) -> DetailsContent {
            match &model.load_state {
                LoadState::Idle | LoadState::Loading => DetailsContent::Loading,
                LoadState::Failed(_) => render_missing(&SiteNotFound {
                    site_id: site_id.clone(),
                }),
                LoadState::Loaded => match model.sites.find_by_id(site_id) {
                    Ok(site) => DetailsContent::Site(render_details(site)),
                    Err(missing) => render_missing(&missing),
                },
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            debug!(
                event = event.name(),
                user_initiated = event.is_user_initiated(),
                "update"
            );

            match event {
                Event::AppStarted => {
                    if model.history_ready {
                        debug!("app already started");
                        caps.render.render();
                        return;
                    }

                    caps.navigation.replace_view(HistoryEntry::list());
                    model.history_ready = true;
                    model.view = ViewState::List;

                    if model.load_state == LoadState::Idle {
                        Self::start_load(model, caps);
                    }
                    caps.render.render();
                }

                Event::SitesLoaded(result) => {
                    if model.is_loaded() {
                        warn!("site data already loaded, ignoring response");
                        return;
                    }

                    match SiteStore::load(*result) {
                        Ok(store) => {
                            model.sites = store;
                            model.load_state = LoadState::Loaded;
                        }
                        Err(e) => {
                            error!(error = %e, "could not load site data");
                            model.sites = SiteStore::default();
                            model.load_state = LoadState::Failed(e.into());
                        }
                    }
                    caps.render.render();
                }

                Event::SearchChanged { query } => {
                    model.query = query;
                    if model.view == ViewState::List {
                        caps.render.render();
                    }
                }

                Event::SiteSelected { site_id } => {
                    if let ViewState::Details { site_id: current } = &model.view {
                        warn!(%site_id, %current, "selection while details are shown, ignoring");
                        return;
                    }

                    if let Err(e) = model.sites.find_by_id(&site_id) {
                        warn!(error = %e, "selected site is not in the store");
                    }

                    info!(%site_id, "showing site details");
                    caps.navigation.push_view(HistoryEntry::details(site_id.clone()));
                    model.view = ViewState::Details { site_id };
                    caps.render.render();
                }

                Event::BackRequested => {
                    caps.navigation.go_back();
                }

                Event::Navigated { state } => {
                    let view = Self::restored_view(state);
                    debug!(?view, "history navigation");
                    model.view = view;
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            match &model.view {
                ViewState::List => ViewModel {
                    search: SearchBar {
                        visible: true,
                        query: model.query.clone(),
                    },
                    panel: Panel::List(Self::list_content(model)),
                },

                ViewState::Details { site_id } => ViewModel {
                    search: SearchBar {
                        visible: false,
                        query: model.query.clone(),
                    },
                    panel: Panel::Details(Self::details_content(model, site_id)),
                },
            }
        }
    }
}
