//! Process-local regions that can be published and withdrawn at runtime.

use super::{RegionBackend, RegionMapping};
use crate::layout::Record;
use crate::{BridgeError, Region, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

struct Segment {
    bytes: RwLock<Vec<u8>>,
    live: AtomicBool,
}

/// Backend whose regions live in this process.
///
/// Plays the simulator's part: [`publish`](Self::publish) creates or
/// overwrites a region in place, [`withdraw`](Self::withdraw) removes it and
/// invalidates every mapping attached to it.
#[derive(Default)]
pub struct InMemoryBackend {
    segments: RwLock<HashMap<Region, Arc<Segment>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `record` into its region, creating the region if needed.
    pub fn publish<R: Record>(&self, record: &R) {
        self.publish_bytes(R::REGION, record.encode());
    }

    /// Publish raw bytes into `region`; the size is not checked.
    pub fn publish_bytes(&self, region: Region, bytes: Vec<u8>) {
        let mut segments = self.segments.write().unwrap_or_else(PoisonError::into_inner);
        match segments.get(&region) {
            Some(segment) => {
                *segment.bytes.write().unwrap_or_else(PoisonError::into_inner) = bytes;
            }
            None => {
                let segment =
                    Arc::new(Segment { bytes: RwLock::new(bytes), live: AtomicBool::new(true) });
                segments.insert(region, segment);
            }
        }
    }

    /// Remove `region`, as if the simulator had exited.
    pub fn withdraw(&self, region: Region) {
        let removed =
            self.segments.write().unwrap_or_else(PoisonError::into_inner).remove(&region);
        if let Some(segment) = removed {
            segment.live.store(false, Ordering::Release);
        }
    }

    pub fn is_published(&self, region: Region) -> bool {
        self.segments.read().unwrap_or_else(PoisonError::into_inner).contains_key(&region)
    }
}

impl RegionBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    fn attach(&self, region: Region) -> Result<Option<Box<dyn RegionMapping>>> {
        let segments = self.segments.read().unwrap_or_else(PoisonError::into_inner);
        Ok(segments.get(&region).map(|segment| {
            Box::new(InMemoryMapping { region, segment: Arc::clone(segment) })
                as Box<dyn RegionMapping>
        }))
    }
}

struct InMemoryMapping {
    region: Region,
    segment: Arc<Segment>,
}

impl RegionMapping for InMemoryMapping {
    fn read_into(&self, buf: &mut [u8]) -> Result<()> {
        let bytes = self.segment.bytes.read().unwrap_or_else(PoisonError::into_inner);
        if bytes.len() != buf.len() {
            return Err(BridgeError::layout(self.region, buf.len(), bytes.len()));
        }
        buf.copy_from_slice(&bytes);
        Ok(())
    }

    fn is_live(&self) -> bool {
        self.segment.live.load(Ordering::Acquire)
    }
}
