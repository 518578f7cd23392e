//! Access to the files a MAS unit refers to.
//!
//! Analyzers only ask whether a resource exists and what its first bytes
//! are; [`DiskProbe`] answers from a directory and [`MemoryProbe`] from a
//! map, so checks run the same way in tools and tests.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Signature of a zip (and therefore jar) archive.
pub const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub trait ResourceProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Up to `len` leading bytes of the resource.
    fn read_prefix(&self, path: &Path, len: usize) -> Result<Vec<u8>, ProbeError>;

    /// Whether the resource starts with a zip signature.
    fn is_archive(&self, path: &Path) -> Result<bool, ProbeError> {
        let prefix = self.read_prefix(path, ZIP_MAGIC.len())?;
        Ok(prefix.as_slice() == ZIP_MAGIC)
    }
}

/// Resolves relative paths against a base directory, usually the directory
/// of the file being analyzed.
#[derive(Debug, Clone)]
pub struct DiskProbe {
    base_dir: PathBuf,
}

impl DiskProbe {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl ResourceProbe for DiskProbe {
    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn read_prefix(&self, path: &Path, len: usize) -> Result<Vec<u8>, ProbeError> {
        let full = self.resolve(path);
        let file = File::open(&full).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ProbeError::Missing(full.clone()),
            _ => ProbeError::Io {
                path: full.clone(),
                source,
            },
        })?;

        let mut prefix = Vec::with_capacity(len);
        file.take(len as u64)
            .read_to_end(&mut prefix)
            .map_err(|source| ProbeError::Io { path: full, source })?;
        Ok(prefix)
    }
}

/// In-memory resources keyed by path as written in the source.
///
/// ```rust
/// use mas2g_resolver::probe::{MemoryProbe, ResourceProbe, ZIP_MAGIC};
/// use std::path::Path;
///
/// let probe = MemoryProbe::new()
///     .with_file("env.jar", ZIP_MAGIC.to_vec())
///     .with_file("bob.goal", b"init module {}".to_vec());
/// assert!(probe.is_archive(Path::new("env.jar")).unwrap());
/// assert!(!probe.is_archive(Path::new("bob.goal")).unwrap());
/// assert!(!probe.exists(Path::new("alice.goal")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryProbe {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: Vec<u8>) {
        self.files.insert(path.into(), contents);
    }
}

impl ResourceProbe for MemoryProbe {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_prefix(&self, path: &Path, len: usize) -> Result<Vec<u8>, ProbeError> {
        let contents = self
            .files
            .get(path)
            .ok_or_else(|| ProbeError::Missing(path.to_path_buf()))?;
        Ok(contents.iter().take(len).copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mas2g-probe-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_disk_probe_relative_paths() {
        let dir = scratch_dir("relative");
        fs::write(dir.join("env.jar"), b"PK\x03\x04rest").unwrap();
        fs::write(dir.join("fake.jar"), b"not a zip").unwrap();

        let probe = DiskProbe::new(&dir);
        assert!(probe.exists(Path::new("env.jar")));
        assert!(!probe.exists(Path::new("missing.jar")));
        assert!(probe.is_archive(Path::new("env.jar")).unwrap());
        assert!(!probe.is_archive(Path::new("fake.jar")).unwrap());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_disk_probe_missing_file() {
        let dir = scratch_dir("missing");
        let probe = DiskProbe::new(&dir);
        let err = probe.read_prefix(Path::new("nope.jar"), 4).unwrap_err();
        assert!(matches!(err, ProbeError::Missing(_)));
        assert!(err.to_string().contains("nope.jar"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_short_file_is_not_an_archive() {
        let probe = MemoryProbe::new().with_file("tiny.jar", b"PK".to_vec());
        assert!(!probe.is_archive(Path::new("tiny.jar")).unwrap());
    }

    #[test]
    fn test_memory_probe_missing() {
        let probe = MemoryProbe::new();
        assert!(probe.is_archive(Path::new("x.jar")).is_err());
    }
}
