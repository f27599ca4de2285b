//! Render surface: turns sites into the list and details descriptions the
//! shell draws. Stateless given its inputs.

use serde::{Deserialize, Serialize};

use crate::model::{Site, SiteId, SiteNotFound};
use crate::AppError;

pub const MAP_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";
pub const NO_RESULTS_MESSAGE: &str = "No sites found matching your search.";
pub const LOAD_FAILED_MESSAGE: &str = "Error loading site data. Check console for details.";
pub const NOT_FOUND_MESSAGE: &str = "This site is no longer available.";
pub const MAP_LINK_LABEL: &str = "Open Google Maps";
pub const BACK_LABEL: &str = "Back to List";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SiteRow {
    /// Selection is always by identifier, never by position in the list.
    pub site_id: SiteId,
    pub heading: String,
    pub devices: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListContent {
    Loading,
    LoadFailed { message: String, detail: String },
    Rows { rows: Vec<SiteRow> },
    NoResults { message: String },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DetailField {
    pub label: String,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MapLink {
    pub url: String,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SiteDetails {
    pub site_id: SiteId,
    pub heading: String,
    pub fields: Vec<DetailField>,
    pub map_link: Option<MapLink>,
    /// The back control always goes through platform history.
    pub back_label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetailsContent {
    /// A details entry restored from history before the data arrived.
    Loading,
    Site(SiteDetails),
    NotFound {
        site_id: SiteId,
        message: String,
        back_label: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "panel", content = "content", rename_all = "snake_case")]
pub enum Panel {
    List(ListContent),
    Details(DetailsContent),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchBar {
    pub visible: bool,
    pub query: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub search: SearchBar,
    pub panel: Panel,
}

impl ViewModel {
    pub fn is_list(&self) -> bool {
        matches!(self.panel, Panel::List(_))
    }

    pub fn rows(&self) -> &[SiteRow] {
        match &self.panel {
            Panel::List(ListContent::Rows { rows }) => rows,
            _ => &[],
        }
    }

    pub fn details(&self) -> Option<&SiteDetails> {
        match &self.panel {
            Panel::Details(DetailsContent::Site(details)) => Some(details),
            _ => None,
        }
    }
}

pub fn map_search_url(latitude: f64, longitude: f64) -> String {
    format!("{MAP_SEARCH_URL}{latitude},{longitude}")
}

fn text(value: Option<&str>) -> &str {
    value.unwrap_or_default()
}

fn lines(value: Option<&str>) -> Vec<String> {
    text(value).split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect()
}

fn field(label: &str, lines: Vec<String>) -> DetailField {
    DetailField {
        label: label.to_string(),
        lines,
    }
}

/// A record without an identifier has no row: it could never be selected.
pub fn site_row(site: &Site) -> Option<SiteRow> {
    let site_id = site.id.clone()?;
    Some(SiteRow {
        heading: format!("{site_id} • {}", text(site.city.as_deref())),
        devices: format!("Devices: {}", text(site.devices.as_deref())),
        site_id,
    })
}

/// An empty result set renders the "no results" placeholder rather than an
/// empty list, so the shell can tell "nothing matched" from "not loaded".
pub fn render_list(sites: &[&Site]) -> ListContent {
    let rows: Vec<SiteRow> = sites.iter().filter_map(|site| site_row(site)).collect();
    if rows.is_empty() {
        return ListContent::NoResults {
            message: NO_RESULTS_MESSAGE.to_string(),
        };
    }
    ListContent::Rows { rows }
}

pub fn render_details(site: &Site) -> SiteDetails {
    let id = site.id_str();
    let coordinates = format!(
        "{}, {}",
        site.latitude.map(|v| v.to_string()).unwrap_or_default(),
        site.longitude.map(|v| v.to_string()).unwrap_or_default()
    );

    SiteDetails {
        site_id: site.id.clone().unwrap_or_else(|| SiteId::new("")),
        heading: format!("Details for {id}"),
        fields: vec![
            field("Site", vec![id.to_string()]),
            field("City", vec![text(site.city.as_deref()).to_string()]),
            field("Name", vec![text(site.name.as_deref()).to_string()]),
            field("Address", vec![text(site.address.as_deref()).to_string()]),
            field("Devices", lines(site.devices.as_deref())),
            field("Other Details", lines(site.other_details.as_deref())),
            field("Coordinates", vec![coordinates]),
        ],
        map_link: site.coordinates().map(|(lat, lon)| MapLink {
            url: map_search_url(lat, lon),
            label: MAP_LINK_LABEL.to_string(),
        }),
        back_label: BACK_LABEL.to_string(),
    }
}

pub fn render_missing(missing: &SiteNotFound) -> DetailsContent {
    DetailsContent::NotFound {
        site_id: missing.site_id.clone(),
        message: NOT_FOUND_MESSAGE.to_string(),
        back_label: BACK_LABEL.to_string(),
    }
}

pub fn render_load_failed(error: &AppError) -> ListContent {
    ListContent::LoadFailed {
        message: LOAD_FAILED_MESSAGE.to_string(),
        detail: error.user_facing_message(),
    }
}
