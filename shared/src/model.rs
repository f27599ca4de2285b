use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::capabilities::{HttpError, HttpResult};
use crate::config::AppConfig;
use crate::{AppError, ErrorKind};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub String);

impl SiteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the site data file. Field names follow the file verbatim,
/// including the `Logitude` spelling. Missing fields stay empty instead of
/// failing the whole load.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(rename = "Sites", default)]
    pub id: Option<SiteId>,
    #[serde(rename = "City", default)]
    pub city: Option<String>,
    #[serde(rename = "Devices", default)]
    pub devices: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Address", default)]
    pub address: Option<String>,
    #[serde(rename = "Other Details", default)]
    pub other_details: Option<String>,
    #[serde(rename = "Latitude", default, deserialize_with = "lenient_coordinate")]
    pub latitude: Option<f64>,
    #[serde(
        rename = "Logitude",
        alias = "Longitude",
        default,
        deserialize_with = "lenient_coordinate"
    )]
    pub longitude: Option<f64>,
}

impl Site {
    pub fn id_str(&self) -> &str {
        self.id.as_ref().map_or("", SiteId::as_str)
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

// Coordinates show up as JSON numbers or as numeric strings depending on how
// the spreadsheet was exported. Anything else is treated as absent.
fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(serde_json::Value),
    }

    let value = Option::<Raw>::deserialize(deserializer)?;
    Ok(match value {
        Some(Raw::Number(n)) if n.is_finite() => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    })
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadError {
    #[error("site data request failed with HTTP status {status}")]
    Status { status: u16 },

    #[error("site data request failed: {0}")]
    Transport(HttpError),

    #[error("site data could not be parsed: {reason}")]
    Parse { reason: String },
}

impl From<LoadError> for AppError {
    fn from(e: LoadError) -> Self {
        let kind = match &e {
            LoadError::Status { status } => {
                return AppError::from_http_status(*status).with_internal(e.to_string())
            }
            LoadError::Transport(HttpError::Timeout { .. }) => ErrorKind::Timeout,
            LoadError::Transport(_) => ErrorKind::Network,
            LoadError::Parse { .. } => ErrorKind::Malformed,
        };
        AppError::new(kind, "Error loading site data.").with_internal(e.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no site with identifier '{site_id}'")]
pub struct SiteNotFound {
    pub site_id: SiteId,
}

/// The loaded site collection. Written once when the data file arrives and
/// read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct SiteStore {
    sites: Vec<Site>,
    index: HashMap<SiteId, usize>,
}

impl SiteStore {
    pub fn new(sites: Vec<Site>) -> Self {
        let mut index = HashMap::with_capacity(sites.len());
        for (position, site) in sites.iter().enumerate() {
            let Some(id) = &site.id else { continue };
            if index.contains_key(id) {
                warn!(site_id = %id, position, "duplicate site identifier, keeping first");
                continue;
            }
            index.insert(id.clone(), position);
        }
        Self { sites, index }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, LoadError> {
        let sites: Vec<Site> = serde_json::from_slice(bytes).map_err(|e| LoadError::Parse {
            reason: e.to_string(),
        })?;
        Ok(Self::new(sites))
    }

    /// Turn the outcome of the data request into a store. Non-success status,
    /// transport failure and malformed payloads all fail the whole load.
    pub fn load(result: HttpResult) -> Result<Self, LoadError> {
        let response = result.map_err(LoadError::Transport)?;
        if !response.is_success() {
            return Err(LoadError::Status {
                status: response.status,
            });
        }
        let store = Self::from_json(&response.body)?;
        info!(count = store.len(), "site data loaded");
        Ok(store)
    }

    pub fn find_by_id(&self, id: &SiteId) -> Result<&Site, SiteNotFound> {
        self.index
            .get(id)
            .and_then(|&position| self.sites.get(position))
            .ok_or_else(|| SiteNotFound {
                site_id: id.clone(),
            })
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Which of the two panels is current. Kept in lock-step with the current
/// history entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    List,
    Details { site_id: SiteId },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(AppError),
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: AppConfig,
    pub view: ViewState,
    pub query: String,
    pub sites: SiteStore,
    pub load_state: LoadState,
    /// Set once the root history entry has been replaced with the list state.
    pub history_ready: bool,
}

impl Model {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.load_state == LoadState::Loaded
    }

    pub fn load_error(&self) -> Option<&AppError> {
        match &self.load_state {
            LoadState::Failed(e) => Some(e),
            _ => None,
        }
    }
}
