//! Aggregation of build outcomes into a batch summary.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::task::BuildOutcome;

/// Prefix for failures that escaped a task instead of being reported by it.
pub const UNHANDLED_PREFIX: &str = "Unhandled: ";

/// Detail recorded for a failed outcome that carried no description.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Summary of a batch run.
///
/// Built incrementally as outcomes arrive in completion order. Sorted
/// collections make the rendered report independent of that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    total: usize,
    successes: BTreeSet<String>,
    failures: BTreeMap<String, String>,
}

impl BatchSummary {
    /// Create an empty summary for a work list of `total` codes.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            successes: BTreeSet::new(),
            failures: BTreeMap::new(),
        }
    }

    /// Record an outcome reported by a task.
    pub fn record(&mut self, outcome: BuildOutcome) {
        if outcome.is_success() {
            self.failures.remove(outcome.code());
            self.successes.insert(outcome.code().to_string());
        } else {
            let detail = outcome.detail().unwrap_or(UNKNOWN_ERROR).to_string();
            self.record_failure(outcome.code(), detail);
        }
    }

    /// Record a task that ended without reporting an outcome.
    pub fn record_unhandled(&mut self, code: &str, detail: &str) {
        self.record_failure(code, format!("{}{}", UNHANDLED_PREFIX, detail));
    }

    fn record_failure(&mut self, code: &str, detail: String) {
        self.successes.remove(code);
        self.failures.insert(code.to_string(), detail);
    }

    /// Size of the work list.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Codes that built and loaded, sorted.
    pub fn successes(&self) -> &BTreeSet<String> {
        &self.successes
    }

    /// Failed codes with their error description, sorted by code.
    pub fn failures(&self) -> &BTreeMap<String, String> {
        &self.failures
    }

    /// Number of outcomes recorded so far.
    pub fn accounted(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Whether every code of the work list has an outcome.
    pub fn is_complete(&self) -> bool {
        self.accounted() == self.total
    }

    /// Whether any code failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== SUMMARY ===")?;
        writeln!(f, "Total regions: {}", self.total)?;
        writeln!(f, "Successful: {}", self.successes.len())?;
        writeln!(f, "Failed: {}", self.failures.len())?;

        if !self.successes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Regions built successfully:")?;
            let codes: Vec<&str> = self.successes.iter().map(String::as_str).collect();
            writeln!(f, "{}", codes.join(", "))?;
        }

        if !self.failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Regions with issues:")?;
            for (code, detail) in &self.failures {
                writeln!(f, "  {}: {}", code, detail)?;
            }
        }

        Ok(())
    }
}
