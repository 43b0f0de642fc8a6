//! Stabilization filter for scale readings.
//!
//! Keeps a bounded window of the most recent successful readings and reports a
//! weight once the whole window agrees within a threshold. A reported weight is
//! not reported again until a different stable value appears.

use std::collections::VecDeque;

use crate::config::ScaleConfig;

/// Bounded history of readings plus the last value reported as stable.
#[derive(Debug, Clone)]
pub struct StabilizationFilter {
    history: VecDeque<f64>,
    capacity: usize,
    threshold: f64,
    captured_weight: Option<f64>,
}

impl StabilizationFilter {
    /// Creates a filter that needs `capacity` readings whose spread is below
    /// `threshold`. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize, threshold: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            threshold,
            captured_weight: None,
        }
    }

    pub fn from_config(config: &ScaleConfig) -> Self {
        Self::new(config.stability_window, config.stability_threshold)
    }

    /// Feeds one frame's reading into the filter.
    ///
    /// Absent readings leave the history untouched. Returns the newly
    /// stabilized weight when the full window agrees and its latest value
    /// differs from the last one reported.
    pub fn push(&mut self, reading: Option<f64>) -> Option<f64> {
        if let Some(value) = reading {
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(value);
        }

        let spread = self.spread()?;
        if spread >= self.threshold {
            return None;
        }

        let latest = *self.history.back()?;
        if self.captured_weight == Some(latest) {
            return None;
        }

        self.captured_weight = Some(latest);
        Some(latest)
    }

    /// `max - min` of the history, or `None` until the window is full.
    pub fn spread(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        let max = self.history.iter().copied().fold(f64::MIN, f64::max);
        let min = self.history.iter().copied().fold(f64::MAX, f64::min);
        Some(max - min)
    }

    pub fn is_full(&self) -> bool {
        self.history.len() == self.capacity
    }

    /// Readings currently held, oldest first.
    #[cfg(test)]
    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }

    /// Most recent successful reading, if any.
    pub fn latest(&self) -> Option<f64> {
        self.history.back().copied()
    }

    /// Last weight reported as stable.
    #[cfg(test)]
    pub fn captured_weight(&self) -> Option<f64> {
        self.captured_weight
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(filter: &mut StabilizationFilter, readings: &[Option<f64>]) -> Vec<f64> {
        readings.iter().filter_map(|r| filter.push(*r)).collect()
    }

    #[test]
    fn test_history_never_exceeds_capacity() {
        let mut filter = StabilizationFilter::new(5, 0.05);
        for i in 0..20 {
            filter.push(Some(i as f64));
            assert!(filter.history().len() <= 5);
        }
        let held: Vec<f64> = filter.history().iter().copied().collect();
        assert_eq!(held, vec![15.0, 16.0, 17.0, 18.0, 19.0]);
    }

    #[test]
    fn test_no_decision_before_window_full() {
        let mut filter = StabilizationFilter::new(5, 0.05);
        let events = feed(&mut filter, &[Some(1.0), Some(1.0), Some(1.0), Some(1.0)]);
        assert!(events.is_empty());
        assert!(filter.spread().is_none());
        assert!(filter.captured_weight().is_none());
    }

    #[test]
    fn test_five_close_readings_emit_latest() {
        let mut filter = StabilizationFilter::new(5, 0.05);
        let events = feed(
            &mut filter,
            &[Some(12.30), Some(12.31), Some(12.29), Some(12.30), Some(12.32)],
        );
        assert_eq!(events, vec![12.32]);
        assert_eq!(filter.captured_weight(), Some(12.32));
    }

    #[test]
    fn test_repeated_stable_value_not_reemitted() {
        let mut filter = StabilizationFilter::new(5, 0.05);
        let events = feed(&mut filter, &[Some(5.0); 12]);
        assert_eq!(events, vec![5.0]);
    }

    #[test]
    fn test_wide_spread_does_not_emit() {
        let mut filter = StabilizationFilter::new(5, 0.05);
        let events = feed(
            &mut filter,
            &[Some(10.00), Some(10.00), Some(10.00), Some(10.00), Some(10.10)],
        );
        assert!(events.is_empty());
        assert!(filter.spread().unwrap() >= 0.05);
    }

    #[test]
    fn test_absent_readings_neither_count_nor_reset() {
        let mut filter = StabilizationFilter::new(5, 0.05);
        let events = feed(
            &mut filter,
            &[Some(3.0), None, Some(3.0), Some(3.0), Some(3.0)],
        );
        assert!(events.is_empty());
        assert_eq!(filter.history().len(), 4);

        assert_eq!(filter.push(None), None);
        assert_eq!(filter.history().len(), 4);

        assert_eq!(filter.push(Some(3.01)), Some(3.01));
    }

    #[test]
    fn test_stable_state_survives_missed_frames() {
        let mut filter = StabilizationFilter::new(5, 0.05);
        feed(&mut filter, &[Some(7.5); 5]);
        let events = feed(&mut filter, &[None, None, None, Some(7.5)]);
        assert!(events.is_empty());
        assert_eq!(filter.captured_weight(), Some(7.5));
        assert_eq!(filter.latest(), Some(7.5));
    }

    #[test]
    fn test_reference_scenario() {
        let mut filter = StabilizationFilter::new(5, 0.05);
        let events = feed(
            &mut filter,
            &[Some(12.30), Some(12.31), Some(12.29), Some(12.30), Some(12.32)],
        );
        assert_eq!(events, vec![12.32]);

        assert_eq!(filter.push(Some(12.32)), None);

        assert_eq!(filter.push(Some(12.50)), None);
        let held: Vec<f64> = filter.history().iter().copied().collect();
        assert_eq!(held, vec![12.29, 12.30, 12.32, 12.32, 12.50]);
        assert!((filter.spread().unwrap() - 0.21).abs() < 1e-9);
    }

    #[test]
    fn test_new_stable_value_emits_again() {
        let mut filter = StabilizationFilter::new(5, 0.05);
        let mut events = feed(&mut filter, &[Some(1.0); 5]);
        events.extend(feed(&mut filter, &[Some(2.0); 5]));
        assert_eq!(events, vec![1.0, 2.0]);
    }

    #[test]
    fn test_drift_within_band_reports_each_new_latest() {
        let mut filter = StabilizationFilter::new(3, 0.05);
        let events = feed(&mut filter, &[Some(1.00), Some(1.01), Some(1.02), Some(1.03)]);
        assert_eq!(events, vec![1.02, 1.03]);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut filter = StabilizationFilter::new(0, 0.05);
        assert_eq!(filter.capacity(), 1);
        assert_eq!(filter.push(Some(4.2)), Some(4.2));
    }

    #[test]
    fn test_from_config() {
        let filter = StabilizationFilter::from_config(&ScaleConfig::default());
        assert_eq!(filter.capacity(), 5);
        assert_eq!(filter.threshold(), 0.05);
    }
}
