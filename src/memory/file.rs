//! File-backed regions, e.g. `/dev/shm/acpmf_physics`.
//!
//! When the simulator runs under Wine/Proton its `Local\acpmf_*` mappings
//! are not visible to native processes; bridge tools mirror them as files
//! named after the mapping. This backend maps those files read-only.

use super::{RegionBackend, RegionMapping};
use crate::{BridgeError, Region, Result};
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory searched when none is configured.
pub const DEFAULT_SHM_DIR: &str = "/dev/shm";

/// Backend mapping one file per region from a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `region`.
    pub fn region_path(&self, region: Region) -> PathBuf {
        self.dir.join(region.local_name())
    }
}

impl Default for FileBackend {
    fn default() -> Self {
        Self::new(DEFAULT_SHM_DIR)
    }
}

impl RegionBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn attach(&self, region: Region) -> Result<Option<Box<dyn RegionMapping>>> {
        let path = self.region_path(region);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BridgeError::memory_map(region, "open", e)),
        };

        let len = region.record_size();
        let found = file.metadata().map_err(|e| BridgeError::memory_map(region, "stat", e))?.len();
        if found < len as u64 {
            return Err(BridgeError::layout(region, len, found as usize));
        }

        // SAFETY: the map is read-only and only ever copied out of. The file
        // length is re-checked before each copy so a truncated file is never
        // touched past its end.
        let map = unsafe { MmapOptions::new().len(len).map(&file) }
            .map_err(|e| BridgeError::memory_map(region, "mmap", e))?;

        debug!(region = %region, path = %path.display(), "Mapped region file");
        Ok(Some(Box::new(FileMapping { region, path, file, map })))
    }
}

struct FileMapping {
    region: Region,
    path: PathBuf,
    file: File,
    map: Mmap,
}

impl FileMapping {
    /// The path still names the file we mapped.
    #[cfg(unix)]
    fn same_file(&self, current: &std::fs::Metadata) -> bool {
        use std::os::unix::fs::MetadataExt;
        self.file
            .metadata()
            .map(|ours| ours.ino() == current.ino() && ours.dev() == current.dev())
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn same_file(&self, _current: &std::fs::Metadata) -> bool {
        true
    }
}

impl RegionMapping for FileMapping {
    fn read_into(&self, buf: &mut [u8]) -> Result<()> {
        let current =
            self.file.metadata().map_err(|e| BridgeError::memory_map(self.region, "stat", e))?;
        if current.len() < buf.len() as u64 || self.map.len() < buf.len() {
            return Err(BridgeError::layout(self.region, buf.len(), current.len() as usize));
        }
        buf.copy_from_slice(&self.map[..buf.len()]);
        Ok(())
    }

    fn is_live(&self) -> bool {
        match std::fs::metadata(&self.path) {
            Ok(current) => current.len() >= self.map.len() as u64 && self.same_file(&current),
            Err(_) => false,
        }
    }
}
