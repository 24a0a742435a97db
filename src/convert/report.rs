//! Batch report types for the conversion run.
//!
//! Every skip and every dropped shape becomes a structured issue with a
//! stable code, so a run can be audited after the fact.

use serde::Serialize;
use std::fmt;

/// A report covering one conversion run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConvertReport {
    /// Counts over the whole batch.
    pub counts: ConvertCounts,
    /// Class names in assignment (ID) order.
    pub classes: Vec<String>,
    /// Issues recorded during the run.
    pub issues: Vec<ConvertIssue>,
}

impl ConvertReport {
    /// Add an issue to the report.
    pub fn add(&mut self, issue: ConvertIssue) {
        self.issues.push(issue);
    }

    /// Count of warning-level issues (skips and dropped shapes).
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConvertSeverity::Warning)
            .count()
    }

    /// Count of info-level issues (policy notes).
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConvertSeverity::Info)
            .count()
    }
}

impl fmt::Display for ConvertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {} annotation file(s): {} converted, {} skipped",
            self.counts.annotations, self.counts.processed, self.counts.skipped
        )?;

        if self.classes.is_empty() {
            writeln!(f, "  {} label line(s), 0 class(es)", self.counts.label_lines)?;
        } else {
            writeln!(
                f,
                "  {} label line(s), {} class(es): {}",
                self.counts.label_lines,
                self.classes.len(),
                self.classes.join(", ")
            )?;
        }

        if !self.issues.is_empty() {
            let warnings = self.warning_count();
            let infos = self.info_count();

            if warnings > 0 {
                writeln!(f)?;
                writeln!(f, "Warnings ({}):", warnings)?;
                for issue in self
                    .issues
                    .iter()
                    .filter(|i| i.severity == ConvertSeverity::Warning)
                {
                    writeln!(f, "  - {}", issue.message)?;
                }
            }

            if infos > 0 {
                writeln!(f)?;
                writeln!(f, "Notes ({}):", infos)?;
                for issue in self
                    .issues
                    .iter()
                    .filter(|i| i.severity == ConvertSeverity::Info)
                {
                    writeln!(f, "  - {}", issue.message)?;
                }
            }
        }

        Ok(())
    }
}

/// Counts over one conversion run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConvertCounts {
    /// Annotation files discovered in the input directory.
    pub annotations: usize,
    /// Files fully converted (label file written, image copied).
    pub processed: usize,
    /// Files skipped (missing image, malformed input).
    pub skipped: usize,
    /// Label lines written across all label files.
    pub label_lines: usize,
}

/// A single issue recorded during conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConvertIssue {
    pub severity: ConvertSeverity,
    pub code: ConvertIssueCode,
    pub message: String,
}

impl ConvertIssue {
    /// Create a warning-level issue (a skip or a dropped shape).
    pub fn warning(code: ConvertIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConvertSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Create an info-level issue (policy note, does not indicate loss).
    pub fn info(code: ConvertIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConvertSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

/// Severity level for conversion issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvertSeverity {
    /// Something was skipped or dropped.
    Warning,
    /// A policy note describing deterministic behavior.
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report schema and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvertIssueCode {
    /// No image file matched the annotation's base name.
    ImageNotFound,
    /// The annotation JSON could not be parsed.
    AnnotationParse,
    /// The annotation declares a zero width or height.
    InvalidImageDimensions,
    /// A shape carried a geometry kind the converter does not handle.
    UnsupportedGeometry,
    /// A recognized geometry kind carried unusable point data.
    MalformedGeometry,
    /// The annotation's declared size differs from the image header.
    DimensionMismatch,
    /// Annotation files are processed in sorted order; class IDs are
    /// assigned on first sight.
    ClassIdAssignment,
}
