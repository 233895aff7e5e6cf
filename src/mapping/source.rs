// Source enumeration for mapping generation
// Every source resolves to an ordered list of candidate media paths. Any
// failure here aborts generation before anything is written.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::constants::{EXPORT_MANIFEST, EXPORT_SCENES_PREFIX, SKIP_EXTENSIONS};
use crate::error::{MapperError, Result};

/// Where candidate media paths come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Every file directly under a directory
    Directory(PathBuf),
    /// Catalog export zip
    ExportArchive(PathBuf),
    /// Unpacked catalog export
    ExportDirectory(PathBuf),
}

impl Source {
    pub fn location(&self) -> &Path {
        match self {
            Source::Directory(p) | Source::ExportArchive(p) | Source::ExportDirectory(p) => p,
        }
    }

    /// Default mapping file location for this source
    pub fn default_output(&self, filename: &str) -> PathBuf {
        match self {
            Source::Directory(dir) => dir.join(filename),
            Source::ExportArchive(p) | Source::ExportDirectory(p) => p
                .parent()
                .map(|parent| parent.join(filename))
                .unwrap_or_else(|| PathBuf::from(filename)),
        }
    }

    /// List candidate media paths in source order
    pub fn enumerate(&self) -> Result<Vec<String>> {
        let paths = match self {
            Source::Directory(dir) => list_directory(dir)?,
            Source::ExportArchive(zip_path) => list_export_archive(zip_path)?,
            Source::ExportDirectory(dir) => list_export_directory(dir)?,
        };
        Ok(dedupe(paths))
    }
}

/// Files directly under `dir`, sorted by path
pub fn list_directory(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(MapperError::SourceUnreadable(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            MapperError::SourceUnreadable(format!("error listing {}: {}", dir.display(), e))
        })?;
        if entry.file_type().is_file() {
            files.push(entry.path().to_string_lossy().to_string());
        }
    }

    Ok(files)
}

/// Subdirectories directly under `root`, sorted by name
pub fn list_subdirectories(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(MapperError::SourceUnreadable(format!(
            "not a directory: {}",
            root.display()
        )));
    }

    let mut dirs = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            MapperError::SourceUnreadable(format!("error listing {}: {}", root.display(), e))
        })?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }

    Ok(dirs)
}

/// Paths named by an export zip
pub fn list_export_archive(zip_path: &Path) -> Result<Vec<String>> {
    let unreadable = |e: &dyn std::fmt::Display| {
        MapperError::SourceUnreadable(format!("{}: {}", zip_path.display(), e))
    };

    let file = File::open(zip_path).map_err(|e| unreadable(&e))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| unreadable(&e))?;

    // Preferred: single manifest at the archive root
    if let Ok(mut entry) = archive.by_name(EXPORT_MANIFEST) {
        let mut text = String::new();
        entry.read_to_string(&mut text).map_err(|e| unreadable(&e))?;
        return paths_from_manifest(&text, EXPORT_MANIFEST);
    }

    // Fallback: one json document per scene under the scenes prefix
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(EXPORT_SCENES_PREFIX) && n.ends_with(".json"))
        .map(String::from)
        .collect();
    names.sort();

    if names.is_empty() {
        return Err(unreadable(&format!(
            "no {} or {}*.json entries",
            EXPORT_MANIFEST, EXPORT_SCENES_PREFIX
        )));
    }

    let mut paths = Vec::with_capacity(names.len());
    for name in &names {
        let mut entry = archive.by_name(name).map_err(|e| unreadable(&e))?;
        let mut text = String::new();
        entry.read_to_string(&mut text).map_err(|e| unreadable(&e))?;
        paths.push(path_from_scene_file(&text, name)?);
    }

    Ok(paths)
}

/// Paths named by an unpacked export directory (same layout as the zip)
pub fn list_export_directory(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(MapperError::SourceUnreadable(format!(
            "not a directory: {}",
            dir.display()
        )));
    }

    let manifest = dir.join(EXPORT_MANIFEST);
    if manifest.is_file() {
        let text = std::fs::read_to_string(&manifest)
            .map_err(|e| MapperError::SourceUnreadable(format!("{}: {}", manifest.display(), e)))?;
        return paths_from_manifest(&text, &manifest.to_string_lossy());
    }

    let scenes_dir = dir.join(EXPORT_SCENES_PREFIX.trim_end_matches('/'));
    if !scenes_dir.is_dir() {
        return Err(MapperError::SourceUnreadable(format!(
            "{}: no {} or {} directory",
            dir.display(),
            EXPORT_MANIFEST,
            EXPORT_SCENES_PREFIX
        )));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(&scenes_dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| MapperError::SourceUnreadable(e.to_string()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| MapperError::SourceUnreadable(format!("{}: {}", path.display(), e)))?;
        paths.push(path_from_scene_file(&text, &path.to_string_lossy())?);
    }

    Ok(paths)
}

#[derive(Debug, Deserialize)]
struct ExportManifest {
    scenes: Vec<ManifestScene>,
}

#[derive(Debug, Deserialize)]
struct ManifestScene {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SceneFile {
    path: Option<String>,
    #[serde(default)]
    files: Vec<String>,
}

fn paths_from_manifest(text: &str, origin: &str) -> Result<Vec<String>> {
    let manifest: ExportManifest = serde_json::from_str(text)
        .map_err(|e| MapperError::SourceUnreadable(format!("{}: {}", origin, e)))?;

    manifest
        .scenes
        .into_iter()
        .enumerate()
        .map(|(i, scene)| {
            scene.path.filter(|p| !p.is_empty()).ok_or_else(|| {
                MapperError::SourceUnreadable(format!("{}: scene {} has no path", origin, i))
            })
        })
        .collect()
}

fn path_from_scene_file(text: &str, origin: &str) -> Result<String> {
    let scene: SceneFile = serde_json::from_str(text)
        .map_err(|e| MapperError::SourceUnreadable(format!("{}: {}", origin, e)))?;

    scene
        .path
        .filter(|p| !p.is_empty())
        .or_else(|| scene.files.into_iter().find(|p| !p.is_empty()))
        .ok_or_else(|| MapperError::SourceUnreadable(format!("{}: scene has no path", origin)))
}

fn dedupe(paths: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    paths.into_iter().filter(|p| seen.insert(p.clone())).collect()
}

/// Sidecar images, text and metadata files are never mapping entries
pub fn is_skipped_extension(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => SKIP_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}
