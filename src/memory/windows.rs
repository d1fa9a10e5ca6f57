//! Assetto Corsa's named file mappings (`Local\acpmf_*`).
//!
//! The simulator creates the mappings; the bridge only opens them with
//! `FILE_MAP_READ` and maps a view of exactly one record.

use super::{RegionBackend, RegionMapping};
use crate::{BridgeError, Region, Result};
use std::ptr::NonNull;
use tracing::{debug, trace};
use windows::Win32::Foundation::{CloseHandle, ERROR_FILE_NOT_FOUND, HANDLE};
use windows::Win32::System::Memory::{
    FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS, MapViewOfFile, OpenFileMappingW, UnmapViewOfFile,
};
use windows::core::PCWSTR;

/// Backend opening the simulator's Windows file mappings.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsBackend;

impl WindowsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl RegionBackend for WindowsBackend {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn attach(&self, region: Region) -> Result<Option<Box<dyn RegionMapping>>> {
        trace!(name = region.mapping_name(), "Opening file mapping");

        let wide_name = wide_string(region.mapping_name());
        let mapping =
            match unsafe { OpenFileMappingW(FILE_MAP_READ.0, false, PCWSTR::from_raw(wide_name.as_ptr())) } {
                Ok(mapping) => mapping,
                Err(e) if e.code() == ERROR_FILE_NOT_FOUND.to_hresult() => return Ok(None),
                Err(e) => return Err(BridgeError::windows_api_error(region, "OpenFileMappingW", e)),
            };

        let len = region.record_size();
        let view = unsafe { MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, len) };
        let Some(base) = NonNull::new(view.Value as *mut u8) else {
            let win_err = windows::core::Error::from_thread();
            unsafe {
                let _ = CloseHandle(mapping);
            }
            return Err(BridgeError::windows_api_error(region, "MapViewOfFile", win_err));
        };

        debug!(region = %region, len, "Mapped simulator region");
        Ok(Some(Box::new(WindowsMapping { region, mapping, base, len })))
    }
}

struct WindowsMapping {
    region: Region,
    mapping: HANDLE,
    base: NonNull<u8>,
    len: usize,
}

impl RegionMapping for WindowsMapping {
    fn read_into(&self, buf: &mut [u8]) -> Result<()> {
        if buf.len() != self.len {
            return Err(BridgeError::layout(self.region, buf.len(), self.len));
        }
        // SAFETY: the view is at least `self.len` bytes and stays mapped until
        // drop. The simulator may be writing concurrently; torn values are
        // accepted by the record format.
        unsafe { std::ptr::copy_nonoverlapping(self.base.as_ptr(), buf.as_mut_ptr(), self.len) };
        Ok(())
    }
}

impl Drop for WindowsMapping {
    fn drop(&mut self) {
        unsafe {
            let addr = MEMORY_MAPPED_VIEW_ADDRESS { Value: self.base.as_ptr() as *mut _ };
            let _ = UnmapViewOfFile(addr);
            let _ = CloseHandle(self.mapping);
        }
    }
}

// SAFETY: the mapping only holds a handle and a pointer to a read-only view,
// both usable from any thread.
unsafe impl Send for WindowsMapping {}
unsafe impl Sync for WindowsMapping {}

/// Convert string to null-terminated wide string for Windows APIs
fn wide_string(s: &str) -> Vec<u16> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}
