use indexmap::IndexMap;
use serde::Serialize;

/// Running counts per key.
///
/// Keys keep their first-insertion order; reading a key that was never
/// accumulated returns 0 without inserting it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountData {
    counts: IndexMap<String, u64>,
}

/// Transcriptions per volunteer.
pub type UserGammaData = CountData;
/// Transcriptions per subreddit.
pub type SubGammaData = CountData;
/// Transcriptions per content type.
pub type PostTypeData = CountData;
/// Transcriptions per format.
pub type FormatData = CountData;

impl CountData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for `key`, 0 if it was never accumulated.
    #[must_use]
    pub fn get_or_default(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Add `amount` to the count for `key`.
    pub fn accumulate(&mut self, key: &str, amount: u64) {
        if let Some(count) = self.counts.get_mut(key) {
            *count += amount;
        } else {
            self.counts.insert(key.to_string(), amount);
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(key, count)| (key.as_str(), *count))
    }

    /// Entries sorted by key, ignoring case.
    #[must_use]
    pub fn sorted_by_key(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by_cached_key(|(key, _)| key.to_lowercase());
        entries
    }
}

impl<'a> FromIterator<&'a str> for CountData {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut data = Self::new();
        for key in iter {
            data.accumulate(key, 1);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_zero_without_inserting() {
        let data = CountData::new();

        assert_eq!(data.get_or_default("nobody"), 0);
        assert!(!data.contains("nobody"));
        assert!(data.is_empty());
    }

    #[test]
    fn test_accumulate() {
        let mut data = CountData::new();
        data.accumulate("a", 1);
        data.accumulate("b", 2);
        data.accumulate("a", 3);

        assert_eq!(data.get_or_default("a"), 4);
        assert_eq!(data.get_or_default("b"), 2);
        assert_eq!(data.total(), 6);
        assert_eq!(data.iter().collect::<Vec<_>>(), vec![("a", 4), ("b", 2)]);
    }

    #[test]
    fn test_sorted_by_key_ignores_case() {
        let data: CountData = ["zed", "Bob", "alice", "bob"].into_iter().collect();

        let keys: Vec<_> = data.sorted_by_key().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["alice", "Bob", "bob", "zed"]);
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let data: CountData = ["b", "a", "b"].into_iter().collect();
        assert_eq!(serde_json::to_string(&data).unwrap(), r#"{"b":2,"a":1}"#);
    }
}
