//! Per-template usage counters, persisted in the shared ledger file.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Usage counters for one template.
///
/// `success_rate` is derived but persisted anyway so the ledger file is
/// directly readable; it is recomputed on every update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsRecord {
    /// Completed executions, successful or not.
    pub uses: u64,
    /// Cumulative wall-clock execution time, in seconds.
    pub total_time: f64,
    /// Executions in which every action succeeded.
    pub successes: u64,
    /// Executions with at least one failed action.
    pub failures: u64,
    /// `successes / uses`; 0.0 before any use.
    pub success_rate: f64,
}

impl AnalyticsRecord {
    /// Fold one finished execution into the counters.
    pub fn record(&mut self, elapsed_secs: f64, success: bool) {
        self.uses += 1;
        self.total_time += elapsed_secs;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.success_rate = self.successes as f64 / self.uses as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates() {
        let mut rec = AnalyticsRecord::default();
        rec.record(1.5, true);
        rec.record(0.5, false);
        assert_eq!(rec.uses, 2);
        assert_eq!(rec.successes, 1);
        assert_eq!(rec.failures, 1);
        assert!((rec.total_time - 2.0).abs() < f64::EPSILON);
        assert!((rec.success_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_rate_zero_before_use() {
        let rec = AnalyticsRecord::default();
        assert_eq!(rec.uses, 0);
        assert_eq!(rec.success_rate, 0.0);
    }
}
