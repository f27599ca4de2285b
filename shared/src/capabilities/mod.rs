mod http;
mod navigation;

pub use self::http::{
    Http, HttpError, HttpHeaders, HttpOperation, HttpRequest, HttpResponse, HttpResult,
    RequestBuilder, ResourceUrl, DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS,
};
pub use self::navigation::{
    HistoryEntry, HistoryRecord, HistoryStack, Navigation, NavigationOperation, ViewTag,
    LIST_TITLE,
};

// Render comes straight from Crux; http and navigation are app-specific.
pub use crux_core::render::{Render, RenderOperation};

use crate::event::Event;
use crate::App;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub navigation: Navigation<Event>,
    pub render: Render<Event>,
}
