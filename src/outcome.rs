use std::path::PathBuf;

use serde::Serialize;

use crate::error::GeneratorError;

/// Warnings and non-fatal errors collected while a run proceeds. Each entry is
/// also emitted as a `tracing` event.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.errors.push(message);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TemplateStatus {
    Generated { path: PathBuf },
    Failed { kind: String, error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: TemplateStatus,
    pub diagnostics: Diagnostics,
}

impl TemplateOutcome {
    pub fn generated(name: &str, path: PathBuf, diagnostics: Diagnostics) -> Self {
        Self {
            name: name.to_string(),
            status: TemplateStatus::Generated { path },
            diagnostics,
        }
    }

    pub fn failed(name: &str, err: &GeneratorError, diagnostics: Diagnostics) -> Self {
        Self {
            name: name.to_string(),
            status: TemplateStatus::Failed {
                kind: err.kind().to_string(),
                error: err.to_string(),
            },
            diagnostics,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.status, TemplateStatus::Generated { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    Partial,
    Failed,
}

/// Outcome of one generation run over one or more templates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub date_range: Vec<String>,
    pub outcomes: Vec<TemplateOutcome>,
    /// Run-level diagnostics (date range, template selection).
    pub diagnostics: Diagnostics,
}

impl GenerationReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn status(&self) -> BatchStatus {
        match (self.succeeded(), self.failed()) {
            (0, _) => BatchStatus::Failed,
            (_, 0) => BatchStatus::Success,
            _ => BatchStatus::Partial,
        }
    }

    /// Every warning in the run, run-level first.
    pub fn all_warnings(&self) -> Vec<String> {
        let mut all = self.diagnostics.warnings.clone();
        for outcome in &self.outcomes {
            all.extend(outcome.diagnostics.warnings.iter().cloned());
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(name: &str) -> TemplateOutcome {
        TemplateOutcome::generated(name, PathBuf::from(format!("{name}.xlsx")), Diagnostics::new())
    }

    fn bad(name: &str) -> TemplateOutcome {
        let err = GeneratorError::Template("no columns".to_string());
        TemplateOutcome::failed(name, &err, Diagnostics::new())
    }

    #[test]
    fn test_status_all_succeeded() {
        let report = GenerationReport {
            outcomes: vec![ok("a"), ok("b")],
            ..Default::default()
        };
        assert_eq!(report.status(), BatchStatus::Success);
    }

    #[test]
    fn test_status_mixed_is_partial() {
        let report = GenerationReport {
            outcomes: vec![ok("a"), bad("b")],
            ..Default::default()
        };
        assert_eq!(report.status(), BatchStatus::Partial);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_status_none_succeeded_or_empty_is_failed() {
        let report = GenerationReport {
            outcomes: vec![bad("a")],
            ..Default::default()
        };
        assert_eq!(report.status(), BatchStatus::Failed);
        assert_eq!(GenerationReport::default().status(), BatchStatus::Failed);
    }

    #[test]
    fn test_failed_outcome_serializes_kind() {
        let json = serde_json::to_value(bad("Opex")).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "template");
        assert_eq!(json["name"], "Opex");
    }

    #[test]
    fn test_all_warnings_collects_run_and_templates() {
        let mut run = Diagnostics::new();
        run.warn("date range defaulted");
        let mut tpl = Diagnostics::new();
        tpl.warn("Entity: 0 members");
        let report = GenerationReport {
            outcomes: vec![TemplateOutcome::generated("a", PathBuf::from("a.xlsx"), tpl)],
            diagnostics: run,
            ..Default::default()
        };
        assert_eq!(
            report.all_warnings(),
            vec!["date range defaulted", "Entity: 0 members"]
        );
    }
}
