//! Case files available in the cases directory.
use anyhow::{bail, Context};
use casesim_core::{load_case, Case, CaseKey};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CASE_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Sorted case files in `dir`.
pub fn list_case_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!(
            "cases directory {} not found. Put one or more case files \
             (keys: id, title, summary, stages) into it.",
            dir.display()
        );
    }

    let mut files = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_case = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| CASE_EXTENSIONS.iter().any(|c| ext.eq_ignore_ascii_case(c)));
        if is_case && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        bail!(
            "no case files found in {}. Files must have keys: id, title, summary, stages.",
            dir.display()
        );
    }
    Ok(files)
}

/// A case opened from the catalog, keyed by its file name
#[derive(Debug, Clone)]
pub struct OpenCase {
    pub key: CaseKey,
    pub case: Arc<Case>,
}

#[derive(Debug, Clone)]
pub struct CaseCatalog {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl CaseCatalog {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        let files = list_case_files(&dir)?;
        tracing::debug!(dir = %dir.display(), cases = files.len(), "case catalog loaded");
        Ok(Self { dir, files })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names in display order
    pub fn names(&self) -> Vec<String> {
        self.files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Load the `index`-th case file (0-based).
    pub fn load_index(&self, index: usize) -> anyhow::Result<OpenCase> {
        let Some(path) = self.files.get(index) else {
            bail!("no case number {}", index + 1);
        };
        Self::load_path(path)
    }

    /// Load a case by file name.
    pub fn load_name(&self, name: &str) -> anyhow::Result<OpenCase> {
        let Some(path) = self
            .files
            .iter()
            .find(|p| p.file_name().is_some_and(|n| n.to_string_lossy() == name))
        else {
            bail!("case file {} not found in {}", name, self.dir.display());
        };
        Self::load_path(path)
    }

    /// Cases are re-read on every open so edits on disk are picked up.
    fn load_path(path: &Path) -> anyhow::Result<OpenCase> {
        let case = load_case(path)
            .with_context(|| format!("failed to load case {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(OpenCase {
            key: CaseKey::new(name),
            case: Arc::new(case),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_only_case_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let case = r#"{"title": "T", "stages": []}"#;
        std::fs::write(dir.path().join("b.json"), case).unwrap();
        std::fs::write(dir.path().join("a.yaml"), "title: T\nstages: []\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let catalog = CaseCatalog::open(dir.path()).unwrap();
        assert_eq!(catalog.names(), vec!["a.yaml", "b.json"]);
    }

    #[test]
    fn test_empty_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_case_files(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no case files"));
    }

    #[test]
    fn test_missing_dir_is_an_error() {
        let err = list_case_files(Path::new("/nonexistent/cases")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_by_name_keys_on_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("demo.json"),
            r#"{"id": "demo_id", "title": "T", "stages": []}"#,
        )
        .unwrap();

        let catalog = CaseCatalog::open(dir.path()).unwrap();
        let open = catalog.load_name("demo.json").unwrap();
        assert_eq!(open.key.as_str(), "demo.json");
        assert_eq!(open.case.id(), "demo_id");
        assert!(catalog.load_name("other.json").is_err());
        assert!(catalog.load_index(3).is_err());
    }

    #[test]
    fn test_malformed_case_names_field() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), r#"{"stages": []}"#).unwrap();

        let catalog = CaseCatalog::open(dir.path()).unwrap();
        let err = catalog.load_index(0).unwrap_err();
        assert!(format!("{:#}", err).contains("title"));
    }
}
