//! Helpers for the delivery-address autocomplete.

use std::collections::HashSet;

/// Shorter queries return nothing without touching the database.
pub const MIN_QUERY_LEN: usize = 2;
pub const DEFAULT_LIMIT: i64 = 10;

/// Trimmed query, or `None` if it is too short to search for.
pub fn normalize_query(query: Option<&str>) -> Option<String> {
    let query = query?.trim();
    (query.chars().count() >= MIN_QUERY_LEN).then(|| query.to_string())
}

pub fn clamp_limit(requested: Option<i64>, max: i64) -> i64 {
    let max = max.max(1);
    requested.unwrap_or(DEFAULT_LIMIT).clamp(1, max)
}

/// `%query%` for `ILIKE`, with LIKE metacharacters escaped.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Collects items with distinct addresses, compared trimmed and
/// case-insensitively, up to a limit. Feed it rows in priority order.
#[derive(Debug)]
pub struct DistinctAddresses<T> {
    seen: HashSet<String>,
    items: Vec<T>,
    limit: usize,
}

impl<T> DistinctAddresses<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
            limit,
        }
    }

    /// Keeps `item` unless its address was already seen or the set is full.
    pub fn offer(&mut self, address: &str, item: T) -> bool {
        if self.is_full() || !self.seen.insert(address.trim().to_lowercase()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.limit
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_queries_are_rejected() {
        assert_eq!(normalize_query(None), None);
        assert_eq!(normalize_query(Some("")), None);
        assert_eq!(normalize_query(Some(" a  ")), None);
        assert_eq!(normalize_query(Some("ул")), Some("ул".to_string()));
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(None, 50), DEFAULT_LIMIT);
        assert_eq!(clamp_limit(Some(0), 50), 1);
        assert_eq!(clamp_limit(Some(500), 50), 50);
        assert_eq!(clamp_limit(Some(5), 50), 5);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn distinct_addresses_fill_across_batches() {
        let mut distinct = DistinctAddresses::new(2);

        for _ in 0..60 {
            distinct.offer("Абая 1", 1);
        }
        assert!(!distinct.is_full());

        assert!(distinct.offer(" АБАЯ 2 ", 2));
        assert!(distinct.is_full());
        assert!(!distinct.offer("Абая 3", 3));
        assert_eq!(distinct.into_vec(), vec![1, 2]);
    }
}
