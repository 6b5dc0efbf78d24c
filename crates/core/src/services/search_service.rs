use crate::models::holding::Holding;

/// Case-insensitive name search over holdings.
///
/// A view, not a reordering: matches come back in the order given.
pub struct SearchService;

impl SearchService {
    pub fn new() -> Self {
        Self
    }

    /// Holdings whose name contains `query`. A blank query matches everything.
    pub fn filter<'a, I>(&self, holdings: I, query: &str) -> Vec<&'a Holding>
    where
        I: IntoIterator<Item = &'a Holding>,
    {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return holdings.into_iter().collect();
        }
        holdings
            .into_iter()
            .filter(|h| h.name.to_lowercase().contains(&q))
            .collect()
    }
}

impl Default for SearchService {
    fn default() -> Self {
        Self::new()
    }
}
