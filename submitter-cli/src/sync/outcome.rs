//! Per-row outcomes of a batch

use chrono::{DateTime, Local};

use super::error::SyncError;

/// Terminal state of one data row
#[derive(Debug, Clone, PartialEq)]
pub enum RowState {
    Skipped,
    Succeeded,
    Failed(SyncError),
}

/// What happened to one row during a batch
#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub row: usize,
    pub state: RowState,
    /// HTTP status, when the portal answered
    pub status: Option<u16>,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl RowOutcome {
    pub fn skipped(row: usize) -> Self {
        Self {
            row,
            state: RowState::Skipped,
            status: None,
            message: "skipped".to_string(),
            timestamp: Local::now(),
        }
    }

    pub fn succeeded(row: usize, status: u16, message: impl Into<String>) -> Self {
        Self {
            row,
            state: RowState::Succeeded,
            status: Some(status),
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    pub fn failed(row: usize, error: SyncError) -> Self {
        // The status already prefixes the response cell
        let message = match &error {
            SyncError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            row,
            status: error.status(),
            message,
            state: RowState::Failed(error),
            timestamp: Local::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == RowState::Succeeded
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.state, RowState::Failed(_))
    }
}

/// Outcomes of a whole batch, in physical row order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub method: &'static str,
    pub outcomes: Vec<RowOutcome>,
}

impl BatchReport {
    pub fn new(method: &'static str) -> Self {
        Self {
            method,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: RowOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == RowState::Skipped)
            .count()
    }

    pub fn outcome(&self, row: usize) -> Option<&RowOutcome> {
        self.outcomes.iter().find(|o| o.row == row)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut report = BatchReport::new("PUT");
        report.push(RowOutcome::skipped(2));
        report.push(RowOutcome::failed(3, SyncError::IdentifyingKeyMissing));
        report.push(RowOutcome::succeeded(4, 200, "success"));
        report.push(RowOutcome::failed(5, SyncError::RemoteNotFound));

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.outcome(5).and_then(|o| o.status), Some(404));
        assert_eq!(report.outcome(3).map(|o| o.message.as_str()), Some("no identifying property"));
    }
}
