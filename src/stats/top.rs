/// One bar or slice of a top-N chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub label: String,
    pub value: u64,
    /// Whether this entry sums up everything outside the top N.
    pub is_other: bool,
}

/// Keep the `top_n` largest entries and fold the rest into one `other_label` entry.
///
/// Entries are returned largest first with the "other" entry last. Equal
/// values keep their input order.
#[must_use]
pub fn compress_top<I>(entries: I, top_n: usize, other_label: &str) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = (String, u64)>,
{
    let mut sorted: Vec<(String, u64)> = entries.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let rest: u64 = sorted.iter().skip(top_n).map(|(_, value)| value).sum();
    let has_rest = sorted.len() > top_n;

    let mut ranked: Vec<RankedEntry> = sorted
        .into_iter()
        .take(top_n)
        .map(|(label, value)| RankedEntry {
            label,
            value,
            is_other: false,
        })
        .collect();

    if has_rest {
        ranked.push(RankedEntry {
            label: other_label.to_string(),
            value: rest,
            is_other: true,
        });
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(values: &[(&str, u64)]) -> Vec<(String, u64)> {
        values.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    fn labels(ranked: &[RankedEntry]) -> Vec<&str> {
        ranked.iter().map(|e| e.label.as_str()).collect()
    }

    #[test]
    fn test_compress_folds_tail() {
        let ranked = compress_top(entries(&[("a", 1), ("b", 5), ("c", 3), ("d", 2)]), 2, "Other");

        assert_eq!(labels(&ranked), vec!["b", "c", "Other"]);
        assert_eq!(ranked[2].value, 3);
        assert!(ranked[2].is_other);
    }

    #[test]
    fn test_no_other_entry_when_everything_fits() {
        let ranked = compress_top(entries(&[("a", 1), ("b", 5)]), 2, "Other");
        assert_eq!(labels(&ranked), vec!["b", "a"]);
        assert!(ranked.iter().all(|e| !e.is_other));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let ranked = compress_top(
            entries(&[("first", 2), ("second", 2), ("big", 9), ("third", 2)]),
            3,
            "Other",
        );

        assert_eq!(labels(&ranked), vec!["big", "first", "second", "Other"]);
        assert_eq!(ranked[3].value, 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(compress_top(Vec::new(), 10, "Other").is_empty());
    }
}
