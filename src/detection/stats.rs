use std::collections::BTreeMap;
use std::time::Duration;

/// Tally of how long each catch took, bucketed to a tenth of a second.
/// For example `{9.2 -> 5}` means five catches took 9.2 seconds each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalHistory {
    /// Keyed by tenths of a second so equal roundings merge exactly.
    buckets: BTreeMap<u64, u64>,
}

impl IntervalHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rounds `elapsed` half-up to one decimal, tallies it and returns the
    /// rounded value in seconds.
    pub fn record(&mut self, elapsed: Duration) -> f64 {
        let tenths = round_to_tenths(elapsed);
        *self.buckets.entry(tenths).or_insert(0) += 1;
        tenths as f64 / 10.0
    }

    pub fn count_for(&self, seconds: f64) -> u64 {
        let tenths = (seconds * 10.0).round() as u64;
        self.buckets.get(&tenths).copied().unwrap_or(0)
    }

    /// Number of distinct rounded durations.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.buckets.values().sum()
    }

    /// `sum(key * count) / sum(count)` in seconds, `None` before the first catch.
    pub fn average_secs(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let weighted: u64 = self
            .buckets
            .iter()
            .map(|(tenths, count)| tenths * count)
            .sum();
        Some(weighted as f64 / 10.0 / total as f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.buckets
            .iter()
            .map(|(tenths, count)| (*tenths as f64 / 10.0, *count))
    }
}

pub fn round_to_tenths(elapsed: Duration) -> u64 {
    let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    millis.saturating_add(50) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_durations_share_a_bucket() {
        let mut history = IntervalHistory::new();
        assert_eq!(history.record(Duration::from_millis(9_150)), 9.2);
        assert_eq!(history.record(Duration::from_millis(9_240)), 9.2);

        assert_eq!(history.len(), 1);
        assert_eq!(history.count_for(9.2), 2);
        assert_eq!(history.average_secs(), Some(9.2));
    }

    #[test]
    fn average_is_weighted_by_count() {
        let mut history = IntervalHistory::new();
        history.record(Duration::from_secs(10));
        history.record(Duration::from_secs(10));
        history.record(Duration::from_secs(4));

        let average = history.average_secs().unwrap();
        assert!((average - 8.0).abs() < 1e-9);
        assert_eq!(history.total(), 3);
        assert_eq!(
            history.iter().collect::<Vec<_>>(),
            vec![(4.0, 1), (10.0, 2)]
        );
    }

    #[test]
    fn empty_history_has_no_average() {
        assert_eq!(IntervalHistory::new().average_secs(), None);
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_to_tenths(Duration::from_millis(9_149)), 91);
        assert_eq!(round_to_tenths(Duration::from_millis(9_150)), 92);
        assert_eq!(round_to_tenths(Duration::from_millis(0)), 0);
    }
}
