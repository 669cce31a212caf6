use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};

/// One learning rate and how many batches each repetition runs with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleEntry {
    pub alpha: f64,
    pub batches: usize,
}

impl ScheduleEntry {
    pub fn new(alpha: f64, batches: usize) -> Self {
        Self { alpha, batches }
    }
}

/// The learning rates of a sweep, each paired with its batch count.
///
/// Smaller learning rates take longer to reach the stationary regime, so the
/// batch count is chosen per entry instead of being derived from `alpha`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn new(entries: Vec<ScheduleEntry>) -> Self {
        Self { entries }
    }

    /// Learning rates from `1e-5` to `0.128`; the smallest ones get up to 200 batches.
    pub fn reference() -> Self {
        const ALPHAS: [f64; 17] = [
            0.00001, 0.00002, 0.00004, 0.00007, 0.0001, 0.0002, 0.0004, 0.0007, 0.001, 0.002,
            0.004, 0.008, 0.016, 0.032, 0.064, 0.09, 0.128,
        ];
        const BATCHES: [usize; 17] = [200, 100, 50, 30, 20, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 10];

        let entries = ALPHAS
            .into_iter()
            .zip(BATCHES)
            .map(|(alpha, batches)| ScheduleEntry::new(alpha, batches))
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.iter()
    }

    /// Checks every learning rate is finite, non negative and strictly
    /// greater than the previous one. Entries are never reordered.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(ExperimentError::InvalidConfig(
                "schedule must have at least one entry".into(),
            ));
        }

        for (i, entry) in self.entries.iter().enumerate() {
            if !entry.alpha.is_finite() || entry.alpha < 0.0 {
                return Err(ExperimentError::InvalidConfig(format!(
                    "schedule[{i}]: alpha ({}) must be finite and non negative",
                    entry.alpha
                )));
            }
        }

        for (i, pair) in self.entries.windows(2).enumerate() {
            if pair[1].alpha <= pair[0].alpha {
                return Err(ExperimentError::InvalidConfig(format!(
                    "schedule[{}]: alpha ({}) is not greater than the previous one ({})",
                    i + 1,
                    pair[1].alpha,
                    pair[0].alpha
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_valid() {
        let schedule = Schedule::reference();

        assert_eq!(schedule.len(), 17);
        assert!(schedule.validate().is_ok());

        let first = schedule.iter().next().unwrap();
        assert_eq!(*first, ScheduleEntry::new(0.00001, 200));
    }

    #[test]
    fn rejects_empty() {
        assert!(Schedule::new(vec![]).validate().is_err());
    }

    #[test]
    fn rejects_unsorted_without_reordering() {
        let entries = vec![ScheduleEntry::new(0.01, 10), ScheduleEntry::new(0.001, 10)];
        let schedule = Schedule::new(entries.clone());

        let err = schedule.validate().unwrap_err();
        assert!(matches!(err, ExperimentError::InvalidConfig(_)));
        assert_eq!(schedule, Schedule::new(entries));
    }

    #[test]
    fn rejects_duplicates_and_negatives() {
        let duplicated = Schedule::new(vec![ScheduleEntry::new(0.1, 1), ScheduleEntry::new(0.1, 1)]);
        assert!(duplicated.validate().is_err());

        let negative = Schedule::new(vec![ScheduleEntry::new(-0.1, 1)]);
        assert!(negative.validate().is_err());

        let nan = Schedule::new(vec![ScheduleEntry::new(f64::NAN, 1)]);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn zero_alpha_is_allowed() {
        let schedule = Schedule::new(vec![ScheduleEntry::new(0.0, 3), ScheduleEntry::new(0.5, 1)]);
        assert!(schedule.validate().is_ok());
    }
}
