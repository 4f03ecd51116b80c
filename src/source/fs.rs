//! Filesystem-backed module source.
//!
//! An [`FsRoot`] maps dependency names onto a directory tree: `name.json` and
//! `name.toml` files load as value units (TOML content is normalized to a JSON
//! value, so consumers downcast to [`serde_json::Value`] either way), and a
//! subdirectory loads as a directory unit whose eligible members are its
//! value files. Constructors cannot come from disk; they are registered through
//! [`super::RegistryRoot`].

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{FoundUnit, ModuleSource, PATH_SEPARATOR, Resolution};
use crate::module::{DirectoryUnit, LoadableUnit, ModuleValue};

/// File extensions recognized as value units, in probe order.
const VALUE_EXTENSIONS: &[&str] = &["json", "toml"];

/// A root rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FsRoot {
    base: PathBuf,
    label: String,
}

impl FsRoot {
    /// Create a root for the given base directory.
    ///
    /// The directory does not have to exist yet; probes against a missing base
    /// simply report not-found.
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let label = base.display().to_string();
        Self { base, label }
    }

    /// The base directory this root probes under.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn relative_path(&self, key: &str) -> Result<PathBuf> {
        let mut rel = PathBuf::new();
        for segment in key.split(PATH_SEPARATOR) {
            // A traversing key could escape the root; that is a caller bug,
            // not a miss.
            if segment.is_empty() || segment == "." || segment == ".." {
                anyhow::bail!("refusing to probe traversing key \"{key}\"");
            }
            rel.push(segment);
        }
        Ok(rel)
    }

    fn load_value_file(path: &Path) -> Result<ModuleValue> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let value: serde_json::Value = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                let parsed: toml::Value = toml::from_str(&content)
                    .with_context(|| format!("invalid TOML in {}", path.display()))?;
                serde_json::to_value(parsed)
                    .with_context(|| format!("unrepresentable TOML in {}", path.display()))?
            }
            _ => serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON in {}", path.display()))?,
        };
        Ok(ModuleValue::new(value))
    }

    /// Eligible members of a directory: value files with content, by base name.
    fn directory_members(path: &Path) -> Result<Vec<String>> {
        let mut members = Vec::new();
        for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("failed to list directory {}", path.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file = entry.path();
            let recognized = file
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| VALUE_EXTENSIONS.contains(&ext));
            if !recognized {
                continue;
            }
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            if content.trim().is_empty() {
                continue;
            }
            if let Some(stem) = file.file_stem().and_then(|stem| stem.to_str()) {
                members.push(stem.to_string());
            }
        }
        Ok(members)
    }
}

impl ModuleSource for FsRoot {
    fn label(&self) -> &str {
        &self.label
    }

    fn lookup(&self, key: &str) -> Result<Resolution> {
        let path = self.base.join(self.relative_path(key)?);
        let mut attempted = Vec::new();

        for ext in VALUE_EXTENSIONS {
            let mut candidate = OsString::from(path.as_os_str());
            candidate.push(".");
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                let value = Self::load_value_file(&candidate)?;
                return Ok(Resolution::Found(FoundUnit {
                    unit: LoadableUnit::Value(value),
                    origin: candidate.display().to_string(),
                }));
            }
            attempted.push(candidate.display().to_string());
        }

        if path.is_dir() {
            let origin = path.display().to_string();
            let members = Self::directory_members(&path)?;
            return Ok(Resolution::Found(FoundUnit {
                unit: LoadableUnit::Directory(DirectoryUnit::new(origin.clone(), members)),
                origin,
            }));
        }
        attempted.push(path.display().to_string());

        Ok(Resolution::NotFound { attempted })
    }
}
