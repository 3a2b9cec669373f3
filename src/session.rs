//! State of one capture -> analyze -> report session.
//!
//! Holds at most one image and one analysis. Only one operation is in flight
//! at a time, and a report can be submitted successfully at most once per
//! analysis.

use chrono::{DateTime, Utc};

use crate::analysis::{AnalysisResult, ImagePayload};
use crate::error::{LogoVerifyError, Result};
use crate::report::AnalysisReport;

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    NotSubmitted,
    Submitting,
    Submitted {
        report_id: String,
        at: DateTime<Utc>,
    },
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum AnalysisState {
    Empty,
    Analyzing,
    Ready(AnalysisReport),
    Failed(String),
}

#[derive(Debug)]
pub struct AnalysisSession {
    image: Option<ImagePayload>,
    analysis: AnalysisState,
    submission: SubmissionState,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self {
            image: None,
            analysis: AnalysisState::Empty,
            submission: SubmissionState::NotSubmitted,
        }
    }

    /// Select a new image; any previous analysis and submission are discarded
    pub fn select_image(&mut self, image: ImagePayload) {
        self.image = Some(image);
        self.analysis = AnalysisState::Empty;
        self.submission = SubmissionState::NotSubmitted;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    pub fn analysis(&self) -> &AnalysisState {
        &self.analysis
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        match &self.analysis {
            AnalysisState::Ready(report) => Some(report),
            _ => None,
        }
    }

    fn busy(&self) -> bool {
        matches!(self.analysis, AnalysisState::Analyzing)
            || matches!(self.submission, SubmissionState::Submitting)
    }

    /// Start analyzing the selected image and return it
    pub fn begin_analysis(&mut self) -> Result<ImagePayload> {
        if self.busy() {
            return Err(LogoVerifyError::validation("an operation is already in progress"));
        }
        let image = self
            .image
            .clone()
            .ok_or_else(|| LogoVerifyError::validation("no image selected"))?;
        self.analysis = AnalysisState::Analyzing;
        self.submission = SubmissionState::NotSubmitted;
        Ok(image)
    }

    pub fn complete_analysis(&mut self, result: AnalysisResult) -> AnalysisReport {
        let report = AnalysisReport::new(result);
        self.analysis = AnalysisState::Ready(report.clone());
        report
    }

    pub fn fail_analysis(&mut self, message: impl Into<String>) {
        self.analysis = AnalysisState::Failed(message.into());
    }

    /// True when an analysis is held and no report has been accepted yet
    pub fn can_submit(&self) -> bool {
        self.report().is_some()
            && !self.busy()
            && !matches!(self.submission, SubmissionState::Submitted { .. })
    }

    /// Start a submission, returning what to send
    pub fn begin_submission(&mut self) -> Result<(AnalysisResult, ImagePayload)> {
        if matches!(self.submission, SubmissionState::Submitted { .. }) {
            return Err(LogoVerifyError::validation(
                "a report for this analysis was already submitted",
            ));
        }
        if !self.can_submit() {
            return Err(LogoVerifyError::validation("nothing to report yet"));
        }
        let (Some(report), Some(image)) = (self.report(), self.image.as_ref()) else {
            return Err(LogoVerifyError::validation("nothing to report yet"));
        };
        let payload = (report.analysis.clone(), image.clone());
        self.submission = SubmissionState::Submitting;
        Ok(payload)
    }

    pub fn complete_submission(&mut self, report_id: impl Into<String>) {
        self.submission = SubmissionState::Submitted {
            report_id: report_id.into(),
            at: Utc::now(),
        };
    }

    /// A failed submission re-enables the action so the user can retry
    pub fn fail_submission(&mut self, message: impl Into<String>) {
        self.submission = SubmissionState::Failed(message.into());
    }
}
