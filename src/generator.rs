use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::Serialize;

use crate::dates::{resolve_date_range, DateRange};
use crate::dimension::load_dimension;
use crate::error::{GeneratorError, Result};
use crate::models::{Dimension, DimensionDataset, Template};
use crate::outcome::{Diagnostics, GenerationReport, TemplateOutcome};
use crate::settings::ProjectSettings;
use crate::store::ProjectStore;
use crate::workbook::{render_workbook, write_workbook, LookupColumn, WorkbookLayout};

const PREVIEW_SAMPLE: usize = 5;

/// One project's configuration, loaded once and driven template by template.
pub struct Generator {
    store: ProjectStore,
    settings: ProjectSettings,
    dimensions: Vec<Dimension>,
    templates: Vec<Template>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnPreview {
    pub name: String,
    pub table_name: String,
    pub members: usize,
    pub sample: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplatePreview {
    pub template: String,
    pub output_file: String,
    pub data_rows: u32,
    pub date_range: DateRange,
    pub columns: Vec<ColumnPreview>,
    pub diagnostics: Diagnostics,
}

impl Generator {
    pub fn open(store: ProjectStore) -> Result<Self> {
        let settings = store.load_settings()?;
        let dimensions = store.load_dimensions()?.dimensions;
        let templates = store.load_templates()?.templates;

        let mut seen = HashSet::new();
        for dim in &dimensions {
            if !seen.insert(dim.name.as_str()) {
                return Err(GeneratorError::Configuration(format!(
                    "Duplicate dimension name '{}' in dimensions.json",
                    dim.name
                )));
            }
        }
        tracing::debug!(
            project = %store.name(),
            dimensions = dimensions.len(),
            templates = templates.len(),
            "opened project"
        );
        Ok(Self {
            store,
            settings,
            dimensions,
            templates,
        })
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    fn template(&self, name: &str) -> Result<&Template> {
        self.templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| GeneratorError::Template(format!("Template '{name}' not found")))
    }

    pub fn resolve_dates(&self, diag: &mut Diagnostics) -> DateRange {
        resolve_date_range(&self.settings, &self.store.downloads_dir(), diag)
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Generate the named templates, or every template when `names` is empty.
    /// A failing template never stops the batch.
    pub fn generate(&self, names: &[String]) -> GenerationReport {
        let mut report = GenerationReport::default();
        if self.templates.is_empty() {
            report.diagnostics.error("No templates defined in templates.json");
            return report;
        }

        let dates = self.resolve_dates(&mut report.diagnostics);
        tracing::info!(range = %dates.label(), months = dates.len(), "resolved date range");

        let selected: Vec<&str> = if names.is_empty() {
            self.templates.iter().map(|t| t.name.as_str()).collect()
        } else {
            names.iter().map(String::as_str).collect()
        };

        for name in selected {
            let mut diag = Diagnostics::new();
            let outcome = match self
                .template(name)
                .and_then(|t| self.generate_template(t, &dates, &mut diag))
            {
                Ok(path) => TemplateOutcome::generated(name, path, diag),
                Err(e) => {
                    tracing::error!(template = name, error = %e, "template failed");
                    TemplateOutcome::failed(name, &e, diag)
                }
            };
            report.outcomes.push(outcome);
        }
        report.date_range = dates.into_vec();
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "generation finished"
        );
        report
    }

    fn generate_template(
        &self,
        template: &Template,
        dates: &DateRange,
        diag: &mut Diagnostics,
    ) -> Result<PathBuf> {
        tracing::info!(template = %template.name, "generating template");
        let dimensions = self.template_dimensions(template, diag)?;

        // Keyed by column; dropped at the end of this template.
        let mut cache: HashMap<&str, DimensionDataset> = HashMap::new();
        for (column, dim) in template.columns.iter().zip(&dimensions) {
            if !cache.contains_key(column.as_str()) {
                let dataset = self.load_dataset(dim, diag);
                cache.insert(column.as_str(), dataset);
            }
        }

        let empty = DimensionDataset::empty();
        let columns = template
            .columns
            .iter()
            .zip(&dimensions)
            .map(|(column, dim)| LookupColumn {
                name: column.as_str(),
                table_name: dim.table_name(),
                dataset: cache.get(column.as_str()).unwrap_or(&empty),
            })
            .collect();

        let layout = WorkbookLayout {
            columns,
            dates,
            data_rows: self.data_rows(template),
            palette: &self.settings.colors,
        };
        let bytes = render_workbook(&layout)?;
        let path = self.store.output_path(&template.output_file());
        write_workbook(&bytes, &path)?;
        Ok(path)
    }

    fn data_rows(&self, template: &Template) -> u32 {
        template.data_rows.unwrap_or(self.settings.settings.data_rows)
    }

    /// Check the template's columns and return each column's dimension with
    /// the template's overrides applied.
    fn template_dimensions(&self, template: &Template, diag: &mut Diagnostics) -> Result<Vec<Dimension>> {
        if template.columns.is_empty() {
            return Err(GeneratorError::Template(format!(
                "Template '{}' has no columns",
                template.name
            )));
        }
        let mut seen = HashSet::new();
        for column in &template.columns {
            if !seen.insert(column.as_str()) {
                return Err(GeneratorError::Template(format!(
                    "Template '{}' lists column '{column}' more than once",
                    template.name
                )));
            }
        }
        let undefined: Vec<&str> = template
            .columns
            .iter()
            .filter(|c| self.dimension(c).is_none())
            .map(String::as_str)
            .collect();
        if !undefined.is_empty() {
            return Err(GeneratorError::Template(format!(
                "Template '{}' uses undefined dimensions: {}",
                template.name,
                undefined.join(", ")
            )));
        }
        for key in template.dimension_overrides.keys() {
            if self.dimension(key).is_none() {
                diag.warn(format!(
                    "Template '{}' overrides unknown dimension '{key}'",
                    template.name
                ));
            }
        }

        Ok(template
            .columns
            .iter()
            .filter_map(|c| self.dimension(c))
            .map(|dim| match template.dimension_overrides.get(&dim.name) {
                Some(overrides) => dim.with_overrides(overrides),
                None => dim.clone(),
            })
            .collect())
    }

    fn load_dataset(&self, dimension: &Dimension, diag: &mut Diagnostics) -> DimensionDataset {
        match load_dimension(&self.store.downloads_dir(), dimension, diag) {
            Ok(dataset) => dataset,
            Err(e) => {
                diag.warn(e.to_string());
                DimensionDataset::empty()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Preview
    // -----------------------------------------------------------------------

    /// Resolve everything a template would contain without writing a workbook.
    pub fn preview(&self, name: &str) -> Result<TemplatePreview> {
        let template = self.template(name)?;
        let mut diag = Diagnostics::new();
        let dimensions = self.template_dimensions(template, &mut diag)?;
        let date_range = self.resolve_dates(&mut diag);

        let columns = dimensions
            .iter()
            .map(|dim| {
                let dataset = self.load_dataset(dim, &mut diag);
                ColumnPreview {
                    name: dim.name.clone(),
                    table_name: dim.table_name(),
                    members: dataset.len(),
                    sample: dataset
                        .ids()
                        .into_iter()
                        .take(PREVIEW_SAMPLE)
                        .map(str::to_string)
                        .collect(),
                }
            })
            .collect();

        Ok(TemplatePreview {
            template: template.name.clone(),
            output_file: template.output_file(),
            data_rows: self.data_rows(template),
            date_range,
            columns,
            diagnostics: diag,
        })
    }
}
