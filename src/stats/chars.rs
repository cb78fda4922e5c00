use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

static EMPTY_ENTRY: UserCharEntry = UserCharEntry {
    char_counts: Vec::new(),
};

/// Character counts of every transcription by one volunteer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserCharEntry {
    char_counts: Vec<usize>,
}

impl UserCharEntry {
    #[must_use]
    pub fn char_counts(&self) -> &[usize] {
        &self.char_counts
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.char_counts.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.char_counts.iter().sum()
    }

    #[must_use]
    pub fn maximum(&self) -> usize {
        self.char_counts.iter().copied().max().unwrap_or(0)
    }

    /// Upper median: for an even number of values, the larger of the two middle ones.
    #[must_use]
    pub fn median(&self) -> usize {
        let mut sorted = self.char_counts.clone();
        sorted.sort_unstable();
        sorted.get(sorted.len() / 2).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.char_counts.is_empty() {
            return 0.0;
        }
        self.total() as f64 / self.char_counts.len() as f64
    }
}

impl Serialize for UserCharEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("UserCharEntry", 4)?;
        state.serialize_field("total", &self.total())?;
        state.serialize_field("maximum", &self.maximum())?;
        state.serialize_field("median", &self.median())?;

        // Whole means are written as integers
        let mean = self.mean();
        if mean.fract() == 0.0 {
            state.serialize_field("mean", &(mean as u64))?;
        } else {
            state.serialize_field("mean", &mean)?;
        }
        state.end()
    }
}

/// Character statistics per volunteer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UserCharData {
    entries: IndexMap<String, UserCharEntry>,
}

impl UserCharData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `username`, empty if nothing was accumulated for them.
    #[must_use]
    pub fn get_or_default(&self, username: &str) -> &UserCharEntry {
        self.entries.get(username).unwrap_or(&EMPTY_ENTRY)
    }

    /// Record one transcription of `characters` characters by `username`.
    pub fn accumulate(&mut self, username: &str, characters: usize) {
        if let Some(entry) = self.entries.get_mut(username) {
            entry.char_counts.push(characters);
        } else {
            self.entries.insert(
                username.to_string(),
                UserCharEntry {
                    char_counts: vec![characters],
                },
            );
        }
    }

    #[must_use]
    pub fn contains(&self, username: &str) -> bool {
        self.entries.contains_key(username)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UserCharEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(counts: &[usize]) -> UserCharEntry {
        UserCharEntry {
            char_counts: counts.to_vec(),
        }
    }

    #[test]
    fn test_entry_statistics() {
        let e = entry(&[300, 100, 200, 400]);

        assert_eq!(e.total(), 1000);
        assert_eq!(e.maximum(), 400);
        assert_eq!(e.median(), 300);
        assert!((e.mean() - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_median_odd_count() {
        assert_eq!(entry(&[5, 1, 3]).median(), 3);
    }

    #[test]
    fn test_empty_entry() {
        let e = UserCharEntry::default();
        assert_eq!(e.total(), 0);
        assert_eq!(e.maximum(), 0);
        assert_eq!(e.median(), 0);
        assert!(e.mean().abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_user_reads_empty_without_inserting() {
        let data = UserCharData::new();

        assert!(data.get_or_default("nobody").is_empty());
        assert!(!data.contains("nobody"));
        assert!(data.is_empty());
    }

    #[test]
    fn test_accumulate_keeps_every_value() {
        let mut data = UserCharData::new();
        data.accumulate("a", 10);
        data.accumulate("b", 5);
        data.accumulate("a", 30);

        assert_eq!(data.get_or_default("a").char_counts(), &[10, 30]);
        assert_eq!(data.get_or_default("b").char_counts(), &[5]);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_serialize_summary() {
        let mut data = UserCharData::new();
        data.accumulate("a", 10);
        data.accumulate("a", 20);
        data.accumulate("b", 1);
        data.accumulate("b", 2);

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "a": { "total": 30, "maximum": 20, "median": 20, "mean": 15 },
                "b": { "total": 3, "maximum": 2, "median": 2, "mean": 1.5 },
            })
        );
    }
}
