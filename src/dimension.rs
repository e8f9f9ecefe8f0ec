use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::error::{GeneratorError, Result};
use crate::models::{Dimension, DimensionDataset, FilterSpec, MemberRecord};
use crate::outcome::Diagnostics;
use crate::table::{load_table, Table};

pub const ID_COLUMN: &str = "ID";
pub const DESCRIPTION_COLUMN: &str = "Description";
pub const PARENT_SUFFIX: &str = "_PARENTID";

const UNASSIGNED_IDS: &[&str] = &["#", ""];
const UNASSIGNED_DESCRIPTIONS: &[&str] = &["Unassigned", "Not In Hierarchy", ""];
const EXTRACT_SENTINELS: &[&str] = &["#", "Not In Hierarchy"];

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

/// One source row reduced to what the pipeline needs. `description` is `None`
/// when the table has no Description column; `parents` follows
/// `RawDimension::parent_columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMember {
    pub id: String,
    pub description: Option<String>,
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RawDimension {
    pub parent_columns: Vec<String>,
    pub members: Vec<RawMember>,
}

pub fn is_parent_column(name: &str) -> bool {
    name.ends_with(PARENT_SUFFIX)
}

pub fn find_parent_columns(headers: &[String]) -> Vec<String> {
    headers.iter().filter(|h| is_parent_column(h)).cloned().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdColumn {
    Exact(usize),
    /// Substitute column picked by name or position.
    Fallback(usize),
}

impl IdColumn {
    pub fn index(self) -> usize {
        match self {
            Self::Exact(i) | Self::Fallback(i) => i,
        }
    }
}

/// Exact `ID`, then the first non-parent column containing "ID", then the first column.
pub fn resolve_id_column(headers: &[String]) -> Option<IdColumn> {
    if let Some(i) = headers.iter().position(|h| h == ID_COLUMN) {
        return Some(IdColumn::Exact(i));
    }
    if let Some(i) = headers
        .iter()
        .position(|h| !is_parent_column(h) && h.to_uppercase().contains("ID"))
    {
        return Some(IdColumn::Fallback(i));
    }
    if headers.is_empty() {
        None
    } else {
        Some(IdColumn::Fallback(0))
    }
}

/// Cells are kept verbatim; only sentinel checks look past surrounding blanks.
fn cell(row: &[String], i: usize) -> String {
    row.get(i).cloned().unwrap_or_default()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn to_raw(table: &Table, id_col: usize) -> RawDimension {
    let desc_col = table.column_index(DESCRIPTION_COLUMN).filter(|&i| i != id_col);
    let parent_idx: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != id_col && is_parent_column(h))
        .map(|(i, _)| i)
        .collect();
    let members = table
        .rows
        .iter()
        .map(|row| RawMember {
            id: cell(row, id_col),
            description: desc_col.map(|i| cell(row, i)),
            parents: parent_idx.iter().map(|&i| cell(row, i)).collect(),
        })
        .collect();
    RawDimension {
        parent_columns: parent_idx.iter().map(|&i| table.headers[i].clone()).collect(),
        members,
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

pub fn remove_unassigned(members: &[RawMember]) -> Vec<RawMember> {
    members
        .iter()
        .filter(|m| !UNASSIGNED_IDS.contains(&m.id.trim()))
        .filter(|m| match &m.description {
            Some(desc) => !UNASSIGNED_DESCRIPTIONS.contains(&desc.trim()),
            None => true,
        })
        .cloned()
        .collect()
}

/// Description exclusions, then the id allow-list.
pub fn apply_filters(members: &[RawMember], filters: &FilterSpec) -> Vec<RawMember> {
    let patterns: Vec<String> = filters
        .exclusions()
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.to_lowercase())
        .collect();
    let kept: Vec<RawMember> = members
        .iter()
        .filter(|m| match &m.description {
            Some(desc) if !patterns.is_empty() => {
                let desc = desc.to_lowercase();
                !patterns.iter().any(|p| desc.contains(p.as_str()))
            }
            _ => true,
        })
        .cloned()
        .collect();
    apply_id_list(&kept, filters.allow_list())
}

/// Keep only listed IDs, ordered by their position in the list.
pub fn apply_id_list(members: &[RawMember], id_list: &[String]) -> Vec<RawMember> {
    if id_list.is_empty() {
        return members.to_vec();
    }
    let mut position: HashMap<&str, usize> = HashMap::new();
    for (i, id) in id_list.iter().enumerate() {
        position.entry(id.as_str()).or_insert(i);
    }
    let mut kept: Vec<RawMember> = members
        .iter()
        .filter(|m| position.contains_key(m.id.as_str()))
        .cloned()
        .collect();
    kept.sort_by_key(|m| position.get(m.id.as_str()).copied().unwrap_or(usize::MAX));
    kept
}

/// Every ID reachable from `roots` through parent references. Roots are not
/// included unless a cycle leads back to them.
pub fn subtree_ids(members: &[RawMember], roots: &[String]) -> HashSet<String> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for m in members {
        for parent in m.parents.iter().filter(|p| !is_blank(p)) {
            children.entry(parent.as_str()).or_default().push(m.id.as_str());
        }
    }

    let mut found: HashSet<String> = HashSet::new();
    let mut frontier: VecDeque<String> = roots.iter().cloned().collect();
    while let Some(current) = frontier.pop_front() {
        let Some(kids) = children.get(current.as_str()) else {
            continue;
        };
        for kid in kids {
            if found.insert(kid.to_string()) {
                frontier.push_back(kid.to_string());
            }
        }
    }
    found
}

/// Members never referenced as a parent, optionally restricted to the subtree
/// under `roots` first.
pub fn leaf_members(members: &[RawMember], roots: &[String]) -> Vec<RawMember> {
    let scoped: Vec<RawMember> = if roots.is_empty() {
        members.to_vec()
    } else {
        let subtree = subtree_ids(members, roots);
        members
            .iter()
            .filter(|m| subtree.contains(&m.id))
            .cloned()
            .collect()
    };

    let parent_ids: HashSet<&str> = scoped
        .iter()
        .flat_map(|m| m.parents.iter())
        .filter(|p| !is_blank(p))
        .map(String::as_str)
        .collect();

    scoped
        .iter()
        .filter(|m| !parent_ids.contains(m.id.as_str()))
        .cloned()
        .collect()
}

pub fn project(members: &[RawMember]) -> DimensionDataset {
    DimensionDataset {
        members: members
            .iter()
            .filter(|m| !is_blank(&m.id))
            .map(|m| MemberRecord {
                id: m.id.clone(),
                description: m.description.clone().unwrap_or_else(|| m.id.clone()),
            })
            .collect(),
    }
}

/// Run the full reduction for one dimension.
pub fn process(raw: &RawDimension, dimension: &Dimension) -> DimensionDataset {
    let name = dimension.name.as_str();
    let filters = &dimension.filters;

    let original = raw.members.len();
    let members = remove_unassigned(&raw.members);
    tracing::debug!(dimension = name, removed = original - members.len(), "removed unassigned");

    let before = members.len();
    let members = apply_filters(&members, filters);
    tracing::debug!(dimension = name, removed = before - members.len(), "applied filters");

    let members = if dimension.has_hierarchy && !raw.parent_columns.is_empty() {
        let before = members.len();
        let leaves = leaf_members(&members, &filters.parent_roots());
        tracing::debug!(dimension = name, removed = before - leaves.len(), "kept leaf members");
        leaves
    } else {
        members
    };

    let members = apply_id_list(&members, filters.allow_list());
    project(&members)
}

// ---------------------------------------------------------------------------
// Column-value extraction
// ---------------------------------------------------------------------------

/// Distinct non-empty values, sorted numerically when asked and possible.
pub fn distinct_values(values: &[&str], numeric_sort: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut distinct: Vec<String> = values
        .iter()
        .filter(|v| !is_blank(v) && !EXTRACT_SENTINELS.contains(&v.trim()))
        .filter(|v| seen.insert(v.to_string()))
        .map(|v| v.to_string())
        .collect();

    if numeric_sort {
        let parsed: Option<Vec<i64>> = distinct
            .iter()
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
            .collect();
        if let Some(keys) = parsed {
            let mut keyed: Vec<(i64, String)> = keys.into_iter().zip(distinct).collect();
            keyed.sort_by_key(|(k, _)| *k);
            return keyed.into_iter().map(|(_, v)| v).collect();
        }
        tracing::debug!("numeric sort failed, falling back to lexical");
    }
    distinct.sort();
    distinct
}

pub fn extract_column_values(table: &Table, column: &str, numeric_sort: bool) -> Option<DimensionDataset> {
    let values = table.column_values(column)?;
    Some(DimensionDataset {
        members: distinct_values(&values, numeric_sort)
            .into_iter()
            .map(|v| MemberRecord {
                id: v.clone(),
                description: v,
            })
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

pub fn candidate_file_names(sac_name: &str, has_hierarchy: bool) -> [String; 3] {
    let with_hierarchy = format!("{sac_name}MasterWithHierarchy.csv");
    let master = format!("{sac_name}Master.csv");
    let bare = format!("{sac_name}.csv");
    if has_hierarchy {
        [with_hierarchy, master, bare]
    } else {
        [master, bare, with_hierarchy]
    }
}

pub fn find_source_file(downloads_dir: &Path, sac_name: &str, has_hierarchy: bool) -> Option<PathBuf> {
    candidate_file_names(sac_name, has_hierarchy)
        .iter()
        .map(|name| downloads_dir.join(name))
        .find(|path| path.is_file())
}

/// Load one dimension's canonical dataset. Only a dimension without a source
/// identifier is an error; every other problem degrades to an empty dataset
/// recorded in `diag`.
pub fn load_dimension(
    downloads_dir: &Path,
    dimension: &Dimension,
    diag: &mut Diagnostics,
) -> Result<DimensionDataset> {
    let name = dimension.name.as_str();
    let sac_name = dimension.sac_name.trim();
    if sac_name.is_empty() {
        return Err(GeneratorError::Dimension(format!(
            "Dimension '{name}' has no sac_name configured"
        )));
    }
    tracing::info!(dimension = name, sac_name, "loading dimension");

    let Some(path) = find_source_file(downloads_dir, sac_name, dimension.has_hierarchy) else {
        diag.warn(format!("CSV file not found for {sac_name} (dimension '{name}')"));
        return Ok(DimensionDataset::empty());
    };

    let table = match load_table(&path) {
        Ok(table) => table,
        Err(e) => {
            diag.warn(format!("Could not load CSV for dimension '{name}': {e}"));
            return Ok(DimensionDataset::empty());
        }
    };

    let dataset = match dimension.extract_column.as_deref().map(str::trim) {
        Some(column) if !column.is_empty() => {
            match extract_column_values(&table, column, dimension.numeric_sort) {
                Some(dataset) => dataset,
                None => {
                    diag.warn(format!(
                        "Column '{column}' not found in {} (dimension '{name}')",
                        path.display()
                    ));
                    return Ok(DimensionDataset::empty());
                }
            }
        }
        _ => {
            let Some(id_col) = resolve_id_column(&table.headers) else {
                diag.error(format!(
                    "No ID column found in {sac_name} (available: {:?})",
                    table.headers
                ));
                return Ok(DimensionDataset::empty());
            };
            if let IdColumn::Fallback(i) = id_col {
                diag.warn(format!(
                    "Using column '{}' as ID for dimension '{name}'",
                    table.headers[i]
                ));
            }
            process(&to_raw(&table, id_col.index()), dimension)
        }
    };

    if dataset.is_empty() {
        diag.warn(format!("Dimension {name} has 0 members after filtering"));
    } else {
        tracing::info!(dimension = name, members = dataset.len(), "loaded dimension");
    }
    Ok(dataset)
}
