mod common;

use assert_matches::assert_matches;
use common::{TestShell, TWO_SITES};
use sites_shared::capabilities::{HistoryEntry, ViewTag};
use sites_shared::view::{DetailsContent, ListContent, Panel};
use sites_shared::{Event, SiteId, ViewState};

#[test]
fn test_search_select_and_back() {
    let mut shell = TestShell::started(TWO_SITES);

    // Startup replaces the page-load entry rather than adding one.
    assert_eq!(shell.history.len(), 1);
    assert_eq!(shell.history.root().state, Some(HistoryEntry::list()));
    assert_eq!(shell.requested_urls, vec!["Sites.json"]);
    assert_eq!(shell.view().rows().len(), 2);

    shell.send(Event::SearchChanged { query: "a".into() });
    let rows = shell.view().rows().to_vec();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].site_id, SiteId::new("A"));
    assert_eq!(rows[0].heading, "A • X");

    shell.send(Event::SiteSelected {
        site_id: rows[0].site_id.clone(),
    });
    assert_eq!(shell.history.len(), 2);
    let current = shell.history.current();
    assert_eq!(current.state, Some(HistoryEntry::details(SiteId::new("A"))));
    assert_eq!(current.title, "Details for A");
    assert_eq!(current.url, "/SearchSites/index.html#details/A");

    let view = shell.view();
    assert!(!view.search.visible);
    let details = view.details().expect("details for A");
    assert_eq!(details.heading, "Details for A");
    let city = details
        .fields
        .iter()
        .find(|field| field.label == "City")
        .expect("city field");
    assert_eq!(city.lines, vec!["X"]);
    assert!(details.map_link.is_some());

    shell.send(Event::BackRequested);
    assert_eq!(shell.history.position(), 0);
    let view = shell.view();
    assert!(view.is_list());
    assert!(view.search.visible);
    assert_eq!(view.search.query, "a");
    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.rows()[0].site_id, SiteId::new("A"));
}

#[test]
fn test_browser_back_and_forward() {
    let mut shell = TestShell::started(TWO_SITES);
    shell.send(Event::SiteSelected {
        site_id: SiteId::new("B"),
    });

    shell.browser_back();
    assert_eq!(shell.model.view, ViewState::List);

    shell.browser_forward();
    assert_eq!(
        shell.model.view,
        ViewState::Details {
            site_id: SiteId::new("B")
        }
    );
    assert_eq!(
        shell.view().details().map(|d| d.site_id.clone()),
        Some(SiteId::new("B"))
    );
}

#[test]
fn test_back_at_root_stays_on_list() {
    let mut shell = TestShell::started(TWO_SITES);
    shell.send(Event::BackRequested);
    assert_eq!(shell.history.position(), 0);
    assert!(shell.view().is_list());
}

#[test]
fn test_no_match_shows_placeholder() {
    let mut shell = TestShell::started(TWO_SITES);
    shell.send(Event::SearchChanged { query: "zzz".into() });
    assert_matches!(
        shell.view().panel,
        Panel::List(ListContent::NoResults { .. })
    );

    shell.send(Event::SearchChanged {
        query: String::new(),
    });
    assert_eq!(shell.view().rows().len(), 2);
}

#[test]
fn test_new_selection_truncates_forward_entries() {
    let mut shell = TestShell::started(TWO_SITES);
    shell.send(Event::SiteSelected {
        site_id: SiteId::new("A"),
    });
    shell.browser_back();
    shell.send(Event::SiteSelected {
        site_id: SiteId::new("B"),
    });

    assert_eq!(shell.history.len(), 2);
    shell.browser_forward();
    assert_eq!(
        shell.model.view,
        ViewState::Details {
            site_id: SiteId::new("B")
        }
    );
}

#[test]
fn test_stale_details_entry_renders_not_found() {
    let mut shell = TestShell::started(TWO_SITES);
    shell.send(Event::Navigated {
        state: Some(HistoryEntry::details(SiteId::new("retired"))),
    });
    assert_matches!(
        shell.view().panel,
        Panel::Details(DetailsContent::NotFound { site_id, .. }) if site_id == SiteId::new("retired")
    );
}

#[test]
fn test_details_entry_without_id_falls_back_to_list() {
    let mut shell = TestShell::started(TWO_SITES);
    shell.send(Event::Navigated {
        state: Some(HistoryEntry {
            view: ViewTag::Details,
            site_id: None,
        }),
    });
    assert!(shell.view().is_list());
}

#[test]
fn test_every_update_renders() {
    let mut shell = TestShell::started(TWO_SITES);
    let before = shell.renders;
    shell.send(Event::SearchChanged { query: "b".into() });
    shell.send(Event::SiteSelected {
        site_id: SiteId::new("B"),
    });
    shell.browser_back();
    assert_eq!(shell.renders, before + 3);
}

#[test]
fn test_records_without_identifier_are_not_selectable() {
    let mut shell = TestShell::started(
        r#"[{"City": "Nowhere", "Devices": "hub"}, {"Sites": "A", "City": "X"}]"#,
    );
    assert_eq!(shell.model.sites.len(), 2);

    let rows = shell.view().rows().to_vec();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].site_id, SiteId::new("A"));

    // Only identifiers are searched, and the anonymous record has none.
    shell.send(Event::SearchChanged {
        query: "Nowhere".into(),
    });
    assert_matches!(
        shell.view().panel,
        Panel::List(ListContent::NoResults { .. })
    );
}
