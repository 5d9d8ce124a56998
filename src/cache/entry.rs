//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with write-age tracking.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The key this entry is stored under
    pub key: String,
    /// The stored value
    pub value: String,
    /// When the value was last written
    pub last_written: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    pub fn new(key: String, value: String) -> Self {
        Self {
            key,
            value,
            last_written: Instant::now(),
        }
    }

    // == Overwrite ==
    /// Replaces the value in place and refreshes the write timestamp.
    pub fn overwrite(&mut self, value: String) {
        self.value = value;
        self.last_written = Instant::now();
    }

    // == Age ==
    /// Time elapsed since the last write, measured against `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_written)
    }

    // == Is Stale ==
    /// Checks whether the entry is strictly older than `threshold`.
    ///
    /// A zero threshold never marks anything stale.
    pub fn is_stale(&self, now: Instant, threshold: Duration) -> bool {
        !threshold.is_zero() && self.age(now) > threshold
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("key".to_string(), "test_value".to_string());

        assert_eq!(entry.key, "key");
        assert_eq!(entry.value, "test_value");
        assert!(entry.last_written <= Instant::now());
    }

    #[test]
    fn test_age_boundary_is_not_stale() {
        let entry = CacheEntry::new("key".to_string(), "value".to_string());
        let threshold = Duration::from_secs(10);

        // Exactly at the threshold the entry is still live
        assert!(!entry.is_stale(entry.last_written + threshold, threshold));
        assert!(entry.is_stale(
            entry.last_written + threshold + Duration::from_millis(1),
            threshold
        ));
    }

    #[test]
    fn test_zero_threshold_never_stale() {
        let entry = CacheEntry::new("key".to_string(), "value".to_string());
        let later = entry.last_written + Duration::from_secs(3600);

        assert!(!entry.is_stale(later, Duration::ZERO));
    }

    #[test]
    fn test_age_saturates_for_earlier_now() {
        let entry = CacheEntry::new("key".to_string(), "value".to_string());
        let later = entry.last_written + Duration::from_secs(5);
        let mut rewritten = entry.clone();
        rewritten.last_written = later;

        assert_eq!(rewritten.age(entry.last_written), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_timestamp() {
        let mut entry = CacheEntry::new("key".to_string(), "old".to_string());
        let first_write = entry.last_written;

        tokio::time::advance(Duration::from_secs(30)).await;
        entry.overwrite("new".to_string());

        assert_eq!(entry.value, "new");
        assert_eq!(entry.last_written - first_write, Duration::from_secs(30));
        assert_eq!(entry.age(Instant::now()), Duration::ZERO);
    }
}
