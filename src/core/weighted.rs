//! Weighted random choice over an explicitly ordered table.
//!
//! Entries are kept in insertion order so a seeded RNG always yields the same pick.

use rand::Rng;
use tracing::error;

/// Ordered `(value, weight)` pairs.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    entries: Vec<(T, u32)>,
    total: u64,
}

impl<T> WeightedTable<T> {
    /// Builds a table; zero-weight entries are kept but never chosen.
    #[must_use]
    pub fn new(entries: Vec<(T, u32)>) -> Self {
        let total = entries.iter().map(|(_, weight)| u64::from(*weight)).sum();
        Self { entries, total }
    }

    /// Picks one value with probability proportional to its weight.
    ///
    /// An empty or all-zero table logs an error and returns None instead of panicking.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<&T> {
        if self.total == 0 {
            error!(
                "Weighted table with {} entries has no weight left",
                self.entries.len()
            );
            return None;
        }
        let mut roll = rng.random_range(0..self.total);
        for (value, weight) in &self.entries {
            let weight = u64::from(*weight);
            if roll < weight {
                return Some(value);
            }
            roll -= weight;
        }
        error!("Weighted roll fell outside the table");
        None
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_empty_table_returns_none() {
        let table: WeightedTable<&str> = WeightedTable::new(vec![("never", 0)]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(table.pick(&mut rng).is_none());
        assert!(WeightedTable::<u8>::new(Vec::new()).pick(&mut rng).is_none());
    }

    #[test]
    fn test_zero_weight_entries_are_never_chosen() {
        let table = WeightedTable::new(vec![("a", 0), ("b", 5), ("c", 0)]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(table.pick(&mut rng), Some(&"b"));
        }
    }

    #[test]
    fn test_seeded_picks_are_reproducible() {
        let table = WeightedTable::new(vec![(1, 3), (2, 1), (3, 6)]);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..50)
                .map(|_| *table.pick(&mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_distribution_roughly_follows_weights() {
        let table = WeightedTable::new(vec![("rare", 1), ("common", 9)]);
        let mut rng = StdRng::seed_from_u64(3);
        let common = (0..10_000)
            .filter(|_| table.pick(&mut rng) == Some(&"common"))
            .count();
        assert!((8_500..9_500).contains(&common), "common = {common}");
    }
}
