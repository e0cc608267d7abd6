use crate::types::Record;
use std::collections::HashMap;

/// Entries per region code. Missing codes read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountMap {
    counts: HashMap<String, u32>,
}

pub fn counts_for<'a, I>(records: I) -> CountMap
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.region_code.clone()).or_insert(0) += 1;
    }
    CountMap { counts }
}

impl CountMap {
    pub fn get(&self, code: &str) -> u32 {
        self.counts.get(code).copied().unwrap_or(0)
    }

    pub fn max_count(&self) -> u32 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// `[0, max(1, max_count)]`; the floor keeps an all-zero map from collapsing the scale.
    pub fn scale_domain(&self) -> (u32, u32) {
        (0, self.max_count().max(1))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record;

    fn sample() -> Vec<Record> {
        vec![
            record("PK01", None, Some("A"), None),
            record("PK02", None, Some("B"), None),
            record("PK01", None, Some("C"), None),
            record("PK01", Some("X"), Some("D"), Some("Done")),
        ]
    }

    #[test]
    fn counts_duplicates() {
        let counts = counts_for(&sample());
        assert_eq!(counts.get("PK01"), 3);
        assert_eq!(counts.get("PK02"), 1);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.max_count(), 3);
    }

    #[test]
    fn order_independent() {
        let forward = counts_for(&sample());
        let mut reversed = sample();
        reversed.reverse();
        reversed.swap(0, 2);
        assert_eq!(forward, counts_for(&reversed));
    }

    #[test]
    fn empty_input_gives_empty_map_and_zero_lookups() {
        let counts = counts_for(&[]);
        assert!(counts.is_empty());
        assert_eq!(counts.get("PK01"), 0);
        assert_eq!(counts.get(""), 0);
    }

    #[test]
    fn domain_has_floor_of_one() {
        assert_eq!(counts_for(&[]).scale_domain(), (0, 1));
        assert_eq!(counts_for(&sample()).scale_domain(), (0, 3));
    }
}
