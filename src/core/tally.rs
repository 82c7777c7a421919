//! Insertion-ordered counters
//!
//! Keys keep the order they were first seen in, so ranking with a stable sort
//! breaks ties by encounter order.

use std::collections::HashMap;

/// Ordered `key -> count` mapping
#[derive(Debug, Clone, Default)]
pub struct Tally {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl Tally {
    /// Add one to `key`
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Add `amount` to `key`, registering it on first sight
    pub fn add(&mut self, key: &str, amount: u64) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += amount,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), amount));
            }
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in first-encounter order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), *c))
    }

    /// Keys in first-encounter order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries by count descending, ties in encounter order
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self.iter().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// The `n` highest entries
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// The `n` highest entries formatted as `"{key} ({count} plays)"`
    pub fn top_formatted(&self, n: usize) -> Vec<String> {
        self.top(n)
            .into_iter()
            .map(|(key, count)| format_plays(key, count))
            .collect()
    }

    /// Highest entry, first encountered wins a tie
    pub fn max(&self) -> Option<(&str, u64)> {
        self.ranked().into_iter().next()
    }
}

#[cfg(test)]
impl Tally {
    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map(|&i| self.entries[i].1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn format_plays(key: &str, count: u64) -> String {
    format!("{} ({} plays)", key, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(keys: &[&str]) -> Tally {
        let mut tally = Tally::default();
        for key in keys {
            tally.increment(key);
        }
        tally
    }

    #[test]
    fn test_counts_and_order() {
        let t = tally(&["b", "a", "b", "c"]);
        assert_eq!(t.get("b"), 2);
        assert_eq!(t.get("missing"), 0);
        assert_eq!(t.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let t = tally(&["x", "y", "z", "z"]);
        assert_eq!(t.top(3), vec![("z", 2), ("x", 1), ("y", 1)]);
    }

    #[test]
    fn test_top_limits_and_formats() {
        let t = tally(&["a", "b", "c", "d", "e", "f", "f"]);
        let top = t.top_formatted(5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0], "f (2 plays)");
        assert_eq!(top[4], "d (1 plays)");
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let t = tally(&["a", "b", "b", "c", "c", "c", "d"]);
        let first = t.ranked();

        let mut again = Tally::default();
        for (key, count) in &first {
            again.add(key, *count);
        }

        assert_eq!(again.ranked(), first);
    }

    #[test]
    fn test_max() {
        assert_eq!(Tally::default().max(), None);
        assert_eq!(tally(&["p", "q", "q", "p"]).max(), Some(("p", 2)));
    }
}
