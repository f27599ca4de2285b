use crate::model::Site;

/// Sites whose identifier contains `query`, ignoring case, in input order.
/// An empty query keeps every site. A linear scan is plenty for a few
/// hundred records and keeps the function free of state.
pub fn filter_sites<'a>(sites: &'a [Site], query: &str) -> Vec<&'a Site> {
    if query.is_empty() {
        return sites.iter().collect();
    }

    let needle = query.to_lowercase();
    sites
        .iter()
        .filter(|site| {
            site.id
                .as_ref()
                .is_some_and(|id| id.as_str().to_lowercase().contains(&needle))
        })
        .collect()
}
