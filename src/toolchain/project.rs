//! Project catalog - typed capability queries over the solution's projects

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

const MANIFEST_EXTENSION: &str = "csproj";

/// Directories never scanned for manifests
const IGNORED_DIRS: &[&str] = &["bin", "obj", "node_modules", ".git"];

/// Project capabilities targets may ask about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    /// Packaged as an installable tool
    PackAsTool,
    Packable,
}

impl Capability {
    /// Manifest property that carries this capability
    pub fn property(&self) -> &'static str {
        match self {
            Capability::PackAsTool => "PackAsTool",
            Capability::Packable => "IsPackable",
        }
    }
}

/// A project found in the solution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub path: PathBuf,
    pub properties: HashMap<String, String>,
}

impl ProjectInfo {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            properties: HashMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.property(capability.property())
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

/// Read-only view of the solution's projects
pub trait ProjectCatalog: Send + Sync {
    fn projects(&self) -> &[ProjectInfo];

    fn project(&self, name: &str) -> Option<&ProjectInfo> {
        self.projects().iter().find(|p| p.name == name)
    }

    fn project_has_capability(&self, name: &str, capability: Capability) -> bool {
        self.project(name).is_some_and(|p| p.has_capability(capability))
    }

    fn projects_with_capability(&self, capability: Capability) -> Vec<&ProjectInfo> {
        self.projects()
            .iter()
            .filter(|p| p.has_capability(capability))
            .collect()
    }

    fn any_with_capability(&self, capability: Capability) -> bool {
        self.projects().iter().any(|p| p.has_capability(capability))
    }
}

/// Catalog built from project manifests on disk
#[derive(Debug, Clone, Default)]
pub struct ManifestCatalog {
    projects: Vec<ProjectInfo>,
}

impl ManifestCatalog {
    pub fn from_projects(projects: Vec<ProjectInfo>) -> Self {
        Self { projects }
    }

    /// Scan `dir` recursively for project manifests
    ///
    /// Unreadable files and a missing directory yield fewer projects rather
    /// than an error.
    pub fn scan(dir: &Path) -> Self {
        let parser = match ManifestParser::new() {
            Ok(parser) => parser,
            Err(e) => {
                warn!("Manifest parser unavailable: {}", e);
                return Self::default();
            }
        };

        let projects = collect_manifests(dir)
            .into_iter()
            .filter_map(|path| match fs::read_to_string(&path) {
                Ok(text) => Some(parser.project(&path, &text)),
                Err(e) => {
                    warn!("Could not read {}: {}", path.display(), e);
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!("Found {} projects under {}", projects.len(), dir.display());
        Self { projects }
    }
}

impl ProjectCatalog for ManifestCatalog {
    fn projects(&self) -> &[ProjectInfo] {
        &self.projects
    }
}

fn collect_manifests(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_ignored_dir(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == MANIFEST_EXTENSION))
        .map(DirEntry::into_path)
        .collect()
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

/// Extracts simple `<Key>value</Key>` properties from a manifest
struct ManifestParser {
    property: Regex,
}

impl ManifestParser {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            property: Regex::new(r"<([A-Za-z_][\w.]*)>([^<]*)</([A-Za-z_][\w.]*)>")?,
        })
    }

    fn project(&self, path: &Path, text: &str) -> ProjectInfo {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        ProjectInfo {
            name,
            path: path.to_path_buf(),
            properties: self.properties(text),
        }
    }

    fn properties(&self, text: &str) -> HashMap<String, String> {
        self.property
            .captures_iter(text)
            .filter(|caps| caps[1] == caps[3])
            .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
            .collect()
    }
}
