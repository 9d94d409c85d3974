//! Artifact filesystem helpers: directory cleaning, archives, file lookup

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Create the directory if it is missing, otherwise delete everything in it
pub fn create_or_clean_dir(path: &Path) -> Result<(), ArtifactError> {
    if !path.exists() {
        debug!("Creating {}", path.display());
        return fs::create_dir_all(path).map_err(io_err(path));
    }
    if !path.is_dir() {
        return Err(ArtifactError::NotADirectory(path.to_path_buf()));
    }

    debug!("Cleaning {}", path.display());
    for entry in fs::read_dir(path).map_err(io_err(path))? {
        let entry = entry.map_err(io_err(path))?;
        let entry_path = entry.path();
        let file_type = entry.file_type().map_err(io_err(&entry_path))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&entry_path).map_err(io_err(&entry_path))?;
        } else {
            fs::remove_file(&entry_path).map_err(io_err(&entry_path))?;
        }
    }
    Ok(())
}

/// Zip a directory's contents to `dest`, overwriting any existing archive
pub fn zip_dir(src: &Path, dest: &Path) -> Result<PathBuf, ArtifactError> {
    if !src.is_dir() {
        return Err(ArtifactError::NotADirectory(src.to_path_buf()));
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let file = File::create(dest).map_err(io_err(dest))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let name = entry_name(src, path);
        if entry.file_type().is_dir() {
            writer.add_directory(format!("{}/", name), options)?;
        } else if path.is_file() {
            writer.start_file(name, options)?;
            let mut input = File::open(path).map_err(io_err(path))?;
            io::copy(&mut input, &mut writer).map_err(io_err(path))?;
        } else {
            debug!("Not archiving {}", path.display());
        }
    }

    writer.finish()?;
    debug!("Archived {} to {}", src.display(), dest.display());
    Ok(dest.to_path_buf())
}

/// Archive entry name: path relative to the root, `/`-separated
fn entry_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Find the shallowest file named `file_name` at most `max_depth` levels below `dir`
pub fn find_file(dir: &Path, file_name: &str, max_depth: usize) -> Option<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth + 1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .min_by_key(|entry| entry.depth())
        .map(|entry| entry.into_path())
}
