use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{GeneratorError, Result};
use crate::models::{DimensionsDoc, TemplatesDoc};
use crate::settings::ProjectSettings;

pub const PROJECT_FILE: &str = "project.json";
pub const DIMENSIONS_FILE: &str = "dimensions.json";
pub const TEMPLATES_FILE: &str = "templates.json";

/// Filesystem-backed project: `config/` holds the three JSON documents,
/// `downloads/` the source CSVs and `output/` the generated workbooks.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
}

/// Keep only characters that are safe in a directory name.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

impl ProjectStore {
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(GeneratorError::Configuration(format!(
                "Project not found: {}",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn open_named(projects_dir: &Path, name: &str) -> Result<Self> {
        let safe = sanitize_name(name);
        if safe.is_empty() {
            return Err(GeneratorError::Configuration("Project name required".to_string()));
        }
        Self::open(&projects_dir.join(safe))
    }

    /// Create a new project directory with starter configuration documents.
    pub fn create(projects_dir: &Path, name: &str) -> Result<Self> {
        let safe = sanitize_name(name);
        if safe.is_empty() || safe != name.trim() {
            return Err(GeneratorError::Configuration(format!(
                "Invalid project name '{name}' (use letters, digits, '_' or '-')"
            )));
        }
        let root = projects_dir.join(&safe);
        if root.exists() {
            return Err(GeneratorError::Configuration(format!(
                "Project '{safe}' already exists"
            )));
        }
        let store = Self { root };
        store.ensure_dirs()?;
        store.save_settings(&ProjectSettings::starter(&safe))?;
        store.save_dimensions(&DimensionsDoc::default())?;
        store.save_templates(&TemplatesDoc::default())?;
        tracing::info!(project = %safe, "created project");
        Ok(store)
    }

    pub fn list(projects_dir: &Path) -> Result<Vec<String>> {
        if !projects_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(projects_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.config_dir())?;
        std::fs::create_dir_all(self.downloads_dir())?;
        std::fs::create_dir_all(self.output_dir())?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloads")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    // -----------------------------------------------------------------------
    // JSON documents
    // -----------------------------------------------------------------------

    fn load_json<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        let path = self.config_dir().join(file);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(T::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| {
            GeneratorError::Configuration(format!("Cannot read {file}: {e}"))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            GeneratorError::Configuration(format!(
                "Invalid JSON in {file}: {e} (line {}, column {})",
                e.line(),
                e.column()
            ))
        })
    }

    fn save_json<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(self.config_dir())?;
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| GeneratorError::Configuration(format!("Cannot serialize {file}: {e}")))?;
        let path = self.config_dir().join(file);
        std::fs::write(&path, format!("{json}\n")).map_err(|e| {
            GeneratorError::Configuration(format!("Cannot write {file}: {e}"))
        })?;
        tracing::info!(path = %path.display(), "saved config");
        Ok(())
    }

    pub fn load_settings(&self) -> Result<ProjectSettings> {
        self.load_json(PROJECT_FILE)
    }

    pub fn save_settings(&self, settings: &ProjectSettings) -> Result<()> {
        self.save_json(PROJECT_FILE, settings)
    }

    pub fn load_dimensions(&self) -> Result<DimensionsDoc> {
        self.load_json(DIMENSIONS_FILE)
    }

    pub fn save_dimensions(&self, doc: &DimensionsDoc) -> Result<()> {
        self.save_json(DIMENSIONS_FILE, doc)
    }

    pub fn load_templates(&self) -> Result<TemplatesDoc> {
        self.load_json(TEMPLATES_FILE)
    }

    pub fn save_templates(&self, doc: &TemplatesDoc) -> Result<()> {
        self.save_json(TEMPLATES_FILE, doc)
    }

    // -----------------------------------------------------------------------
    // Source and output files
    // -----------------------------------------------------------------------

    pub fn source_path(&self, file_name: &str) -> PathBuf {
        self.downloads_dir().join(file_name)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir().join(file_name)
    }

    pub fn list_source_files(&self) -> Result<Vec<SourceFile>> {
        let dir = self.downloads_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.to_lowercase().ends_with(".csv") {
                continue;
            }
            files.push(SourceFile {
                name,
                size: entry.metadata()?.len(),
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    /// Copy a CSV into `downloads/`, replacing any file of the same name.
    pub fn add_source_file(&self, source: &Path) -> Result<PathBuf> {
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !file_name.to_lowercase().ends_with(".csv") {
            return Err(GeneratorError::Csv(format!(
                "Only .csv files can be added: {}",
                source.display()
            )));
        }
        if !source.is_file() {
            return Err(GeneratorError::Csv(format!(
                "File not found: {}",
                source.display()
            )));
        }
        std::fs::create_dir_all(self.downloads_dir())?;
        let dest = self.source_path(&file_name);
        std::fs::copy(source, &dest)?;
        tracing::info!(file = %file_name, "added source file");
        Ok(dest)
    }

    pub fn read_source(&self, file_name: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.source_path(file_name))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Template;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Budget_2025-v2"), "Budget_2025-v2");
        assert_eq!(sanitize_name("../etc passwd"), "etcpasswd");
    }

    #[test]
    fn test_create_writes_starter_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::create(dir.path(), "demo").unwrap();
        assert!(store.config_dir().join(PROJECT_FILE).exists());
        assert!(store.downloads_dir().is_dir());
        assert!(store.output_dir().is_dir());
        let settings = store.load_settings().unwrap();
        assert_eq!(settings.name, "demo");
        assert_eq!(settings.settings.data_rows, 200);
        assert!(store.load_dimensions().unwrap().dimensions.is_empty());
    }

    #[test]
    fn test_create_rejects_existing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        ProjectStore::create(dir.path(), "demo").unwrap();
        assert!(matches!(
            ProjectStore::create(dir.path(), "demo"),
            Err(GeneratorError::Configuration(_))
        ));
        assert!(ProjectStore::create(dir.path(), "bad name").is_err());
        assert!(ProjectStore::create(dir.path(), "").is_err());
    }

    #[test]
    fn test_list_projects_sorted() {
        let dir = tempfile::tempdir().unwrap();
        ProjectStore::create(dir.path(), "zeta").unwrap();
        ProjectStore::create(dir.path(), "alpha").unwrap();
        assert_eq!(ProjectStore::list(dir.path()).unwrap(), vec!["alpha", "zeta"]);
        assert!(ProjectStore::list(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_missing_documents_load_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path()).unwrap();
        assert!(store.load_templates().unwrap().templates.is_empty());
        assert_eq!(store.load_settings().unwrap().settings.data_rows, 200);
    }

    #[test]
    fn test_invalid_json_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path()).unwrap();
        std::fs::create_dir_all(store.config_dir()).unwrap();
        std::fs::write(store.config_dir().join(TEMPLATES_FILE), "{\n  \"templates\": [,]\n}").unwrap();
        let err = store.load_templates().unwrap_err();
        assert!(matches!(err, GeneratorError::Configuration(_)));
        assert!(err.to_string().contains("templates.json"));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_templates_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::create(dir.path(), "p").unwrap();
        let doc = TemplatesDoc {
            templates: vec![serde_json::from_value::<Template>(serde_json::json!({
                "name": "Opex",
                "columns": ["Entity", "Account"],
                "dimension_overrides": {"Account": {"id_list": ["A1"]}}
            }))
            .unwrap()],
        };
        store.save_templates(&doc).unwrap();
        let loaded = store.load_templates().unwrap();
        assert_eq!(loaded.templates[0].columns, vec!["Entity", "Account"]);
        assert_eq!(
            loaded.templates[0].dimension_overrides["Account"].allow_list(),
            ["A1".to_string()]
        );
    }

    #[test]
    fn test_open_missing_project_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectStore::open(&dir.path().join("nope")).is_err());
        assert!(ProjectStore::open_named(dir.path(), "!!").is_err());
    }

    #[test]
    fn test_add_and_list_source_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::create(dir.path(), "p").unwrap();
        let src = dir.path().join("EntityMaster.csv");
        std::fs::write(&src, "ID,Description\nE1,One\n").unwrap();
        store.add_source_file(&src).unwrap();
        std::fs::write(store.downloads_dir().join("notes.txt"), "x").unwrap();

        let files = store.list_source_files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "EntityMaster.csv");
        assert_eq!(files[0].size, 22);
        assert_eq!(store.read_source("EntityMaster.csv").unwrap().len(), 22);

        let txt = dir.path().join("readme.txt");
        std::fs::write(&txt, "x").unwrap();
        assert!(matches!(store.add_source_file(&txt), Err(GeneratorError::Csv(_))));
    }
}
