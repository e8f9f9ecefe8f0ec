use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One master-data axis as configured in `dimensions.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    #[serde(default)]
    pub sac_name: String,
    #[serde(default = "default_true")]
    pub has_hierarchy: bool,
    #[serde(default, skip_serializing_if = "FilterSpec::is_empty")]
    pub filters: FilterSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract_column: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub numeric_sort: bool,
}

fn default_true() -> bool {
    true
}

impl Dimension {
    /// Name of the lookup table backing this dimension's dropdown.
    pub fn table_name(&self) -> String {
        match self.table_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_table_name(&self.name),
        }
    }

    /// Copy of this dimension with `overrides` merged into its filters.
    pub fn with_overrides(&self, overrides: &FilterSpec) -> Dimension {
        Dimension {
            filters: self.filters.merged(overrides),
            ..self.clone()
        }
    }
}

pub fn default_table_name(dimension_name: &str) -> String {
    static NON_IDENT: OnceLock<Regex> = OnceLock::new();
    let re = NON_IDENT.get_or_init(|| Regex::new(r"[^a-z0-9_]").expect("static pattern"));
    format!("tbl_{}", re.replace_all(&dimension_name.to_lowercase(), "_"))
}

/// Narrowing rules for a dimension. Every key is optional so a template override
/// can name only the keys it replaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_description: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_filter: Option<ParentFilter>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.exclude_description.is_none() && self.id_list.is_none() && self.parent_filter.is_none()
    }

    pub fn exclusions(&self) -> &[String] {
        self.exclude_description.as_deref().unwrap_or_default()
    }

    pub fn allow_list(&self) -> &[String] {
        self.id_list.as_deref().unwrap_or_default()
    }

    pub fn parent_roots(&self) -> Vec<String> {
        self.parent_filter
            .as_ref()
            .map(ParentFilter::ids)
            .unwrap_or_default()
    }

    /// Shallow merge: keys present in `overrides` replace ours.
    pub fn merged(&self, overrides: &FilterSpec) -> FilterSpec {
        FilterSpec {
            exclude_description: overrides
                .exclude_description
                .clone()
                .or_else(|| self.exclude_description.clone()),
            id_list: overrides.id_list.clone().or_else(|| self.id_list.clone()),
            parent_filter: overrides
                .parent_filter
                .clone()
                .or_else(|| self.parent_filter.clone()),
        }
    }
}

/// Root ID(s) of a parent-subtree filter; accepts a string or a list in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParentFilter {
    One(String),
    Many(Vec<String>),
}

impl ParentFilter {
    pub fn ids(&self) -> Vec<String> {
        match self {
            Self::One(id) => vec![id.clone()],
            Self::Many(ids) => ids.clone(),
        }
    }
}

/// One output workbook definition from `templates.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimension_overrides: BTreeMap<String, FilterSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_rows: Option<u32>,
}

impl Template {
    pub fn output_file(&self) -> String {
        match self.output_file.as_deref().map(str::trim) {
            Some(file) if !file.is_empty() => file.to_string(),
            _ => format!("{}.xlsx", self.name),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DimensionsDoc {
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatesDoc {
    #[serde(default)]
    pub templates: Vec<Template>,
}

/// One row of a canonical dimension dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRecord {
    pub id: String,
    pub description: String,
}

/// Ordered canonical `(ID, Description)` rows for one dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DimensionDataset {
    pub members: Vec<MemberRecord>,
}

impl DimensionDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.id.as_str()).collect()
    }
}
