//! Per-window results of a correlation run

use std::fmt;

use crate::types::CorrelationResult;

/// What happened to one lookback window
#[derive(Debug, Clone, PartialEq)]
pub enum WindowOutcome {
    /// Correlations computed and all artifacts written
    Completed {
        aligned_days: usize,
        correlations: CorrelationResult,
    },
    /// Fewer than two assets returned data
    InsufficientData { succeeded: usize },
    /// The reference asset returned no data
    ReferenceMissing { asset: String },
    /// No day is covered by every fetched series
    NoCommonTimeline { reason: String },
    /// An artifact could not be written
    PersistenceFailed { error: String },
}

impl WindowOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, WindowOutcome::Completed { .. })
    }
}

impl fmt::Display for WindowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowOutcome::Completed {
                aligned_days,
                correlations,
            } => write!(
                f,
                "{} correlations over {} days",
                correlations.len(),
                aligned_days
            ),
            WindowOutcome::InsufficientData { succeeded } => {
                write!(f, "not enough token data ({} asset(s) fetched)", succeeded)
            }
            WindowOutcome::ReferenceMissing { asset } => {
                write!(f, "reference asset {} is missing", asset)
            }
            WindowOutcome::NoCommonTimeline { reason } => {
                write!(f, "no common timestamps ({})", reason)
            }
            WindowOutcome::PersistenceFailed { error } => write!(f, "persistence failed: {}", error),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    pub window: String,
    /// Assets whose fetch failed or returned nothing, in configured order
    pub failed_assets: Vec<String>,
    pub outcome: WindowOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub reports: Vec<WindowReport>,
}

impl RunSummary {
    /// Number of windows that produced correlations
    pub fn completed(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.is_completed())
            .count()
    }

    pub fn report(&self, window: &str) -> Option<&WindowReport> {
        self.reports.iter().find(|r| r.window == window)
    }
}
