use std::collections::HashSet;

use serde::Serialize;

use crate::error::{GeneratorError, Result};
use crate::models::Dimension;
use crate::settings::ProjectSettings;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadUrl {
    pub name: String,
    pub url: String,
    pub hierarchy: bool,
}

fn export_url(base_url: &str, model_id: &str, provider: &str) -> String {
    format!(
        "{}/api/v1/dataexport/providers/sac/{model_id}/{provider}?$format=text/csv",
        base_url.trim_end_matches('/')
    )
}

/// Data-export URLs for every configured dimension, one per `sac_name`, plus
/// the version table when a version model is configured.
pub fn download_urls(settings: &ProjectSettings, dimensions: &[Dimension]) -> Result<Vec<DownloadUrl>> {
    let conn = &settings.sac_connection;
    let (base_url, model_id) = (conn.base_url.trim(), conn.model_id.trim());
    if base_url.is_empty() || model_id.is_empty() {
        return Err(GeneratorError::Configuration(
            "SAC connection not configured (base_url and model_id are required)".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for dim in dimensions {
        let sac_name = dim.sac_name.trim();
        if sac_name.is_empty() || !seen.insert(sac_name) {
            continue;
        }
        let suffix = if dim.has_hierarchy { "MasterWithHierarchy" } else { "Master" };
        urls.push(DownloadUrl {
            name: sac_name.to_string(),
            url: export_url(base_url, model_id, &format!("{sac_name}{suffix}")),
            hierarchy: dim.has_hierarchy,
        });
    }

    let version_model = conn.version_model_id.trim();
    if !version_model.is_empty() {
        urls.push(DownloadUrl {
            name: "Version".to_string(),
            url: export_url(base_url, version_model, "VersionMaster"),
            hierarchy: false,
        });
    }
    Ok(urls)
}
