#![allow(dead_code)]

use crux_core::testing::AppTester;
use sites_shared::capabilities::{HistoryStack, HttpResponse, HttpResult};
use sites_shared::{App, Effect, Event, Model, ViewModel};

/// A headless shell: browser-style history plus a canned answer for every
/// HTTP request, driving the app through Crux's `AppTester`.
pub struct TestShell {
    pub app: AppTester<App, Effect>,
    pub model: Model,
    pub history: HistoryStack,
    pub requested_urls: Vec<String>,
    pub renders: usize,
    respond: Box<dyn Fn(&str) -> HttpResult>,
}

impl TestShell {
    pub fn new(respond: impl Fn(&str) -> HttpResult + 'static) -> Self {
        Self {
            app: AppTester::default(),
            model: Model::default(),
            history: HistoryStack::new("/SearchSites/index.html"),
            requested_urls: Vec::new(),
            renders: 0,
            respond: Box::new(respond),
        }
    }

    pub fn serving(body: &'static str) -> Self {
        Self::new(move |_| Ok(HttpResponse::with_body(200, body)))
    }

    pub fn started(body: &'static str) -> Self {
        let mut shell = Self::serving(body);
        shell.send(Event::AppStarted);
        shell
    }

    pub fn send(&mut self, event: Event) {
        let update = self.app.update(event, &mut self.model);
        self.perform(update.effects, update.events);
    }

    pub fn browser_back(&mut self) {
        if let Some(event) = self.history.back() {
            self.send(event);
        }
    }

    pub fn browser_forward(&mut self) {
        if let Some(event) = self.history.forward() {
            self.send(event);
        }
    }

    pub fn view(&self) -> ViewModel {
        self.app.view(&self.model)
    }

    fn perform(&mut self, effects: Vec<Effect>, events: Vec<Event>) {
        // Platform and capability events are delivered after the current batch.
        let mut fired = events;

        for effect in effects {
            match effect {
                Effect::Http(mut request) => {
                    let url = request.operation.request().url().as_str().to_string();
                    let result = (self.respond)(&url);
                    self.requested_urls.push(url);
                    let update = self
                        .app
                        .resolve(&mut request, result)
                        .expect("http requests are resolvable");
                    fired.extend(update.events);
                    self.perform(update.effects, Vec::new());
                }
                Effect::Navigation(request) => {
                    if let Some(event) = self.history.apply(&request.operation) {
                        fired.push(event);
                    }
                }
                Effect::Render(_) => self.renders += 1,
            }
        }

        for event in fired {
            self.send(event);
        }
    }
}

pub const TWO_SITES: &str = r#"[
    {"Sites": "A", "City": "X", "Devices": "router", "Name": "Alpha", "Address": "1 Main St",
     "Other Details": "gate code\nring bell", "Latitude": 51.5, "Logitude": -0.12},
    {"Sites": "B", "City": "Y", "Devices": "switch"}
]"#;
