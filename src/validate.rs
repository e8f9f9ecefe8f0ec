use std::collections::HashSet;

use serde::Serialize;

use crate::dimension::{candidate_file_names, find_source_file};
use crate::error::Result;
use crate::store::ProjectStore;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a project's configuration without generating anything. Only
/// unreadable documents are returned as `Err`; everything else is reported.
pub fn validate_project(store: &ProjectStore) -> Result<ValidationReport> {
    let settings = store.load_settings()?;
    let dimensions = store.load_dimensions()?.dimensions;
    let templates = store.load_templates()?.templates;
    let mut report = ValidationReport::default();

    if !settings.base_url_configured() {
        report.warnings.push("SAC base URL not configured".to_string());
    }
    if !settings.model_id_configured() {
        report.warnings.push("Model ID not configured".to_string());
    }

    if dimensions.is_empty() {
        report.errors.push("No dimensions defined".to_string());
    }
    let mut names = HashSet::new();
    for dim in &dimensions {
        if !names.insert(dim.name.as_str()) {
            report.errors.push(format!("Duplicate dimension name '{}'", dim.name));
        }
    }

    if templates.is_empty() {
        report.warnings.push("No templates defined".to_string());
    }
    for tpl in &templates {
        if tpl.columns.is_empty() {
            report.errors.push(format!("Template '{}' has no columns", tpl.name));
        }
        for col in &tpl.columns {
            if !names.contains(col.as_str()) {
                report
                    .errors
                    .push(format!("Template '{}': dimension '{col}' not found", tpl.name));
            }
        }
        for key in tpl.dimension_overrides.keys() {
            if !names.contains(key.as_str()) {
                report.warnings.push(format!(
                    "Template '{}': override for unknown dimension '{key}'",
                    tpl.name
                ));
            }
        }
    }

    let downloads = store.downloads_dir();
    for dim in &dimensions {
        let sac_name = dim.sac_name.trim();
        if sac_name.is_empty() {
            report
                .errors
                .push(format!("Dimension '{}' has no sac_name configured", dim.name));
            continue;
        }
        if find_source_file(&downloads, sac_name, dim.has_hierarchy).is_none() {
            let [expected, ..] = candidate_file_names(sac_name, dim.has_hierarchy);
            report
                .warnings
                .push(format!("CSV missing: {expected} (for '{}')", dim.name));
        }
    }

    tracing::debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated project"
    );
    Ok(report)
}
