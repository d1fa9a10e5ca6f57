//! Attaching to and polling the simulator's shared memory regions.
//!
//! A [`RegionBackend`] knows how to open a named region; what it returns is a
//! [`RegionMapping`] that can copy the region's current bytes out. On top of
//! that sit three layers:
//!
//! - [`RegionHandle`]: one attached mapping, typed by the record it holds
//! - [`RegionReader`]: the attach/read/reattach state machine for one region
//! - [`SimReader`]: the three readers together, producing a snapshot per poll
//!
//! A missing region is the normal state while the simulator is not running.
//! Attachment reports it as `Ok(None)` and the next poll simply tries again.
//! Each region is attached and retried on its own; a missing physics page
//! does not detach graphics or static.
//!
//! # Backends
//!
//! - [`WindowsBackend`]: the real `Local\acpmf_*` file mappings (Windows only)
//! - [`FileBackend`]: files such as `/dev/shm/acpmf_physics`, as exposed by
//!   shared memory bridges for simulators running under Wine/Proton
//! - [`InMemoryBackend`]: process-local regions for tests and demos

mod file;
mod in_memory;
#[cfg(windows)]
mod windows;

pub use file::{DEFAULT_SHM_DIR, FileBackend};
pub use in_memory::InMemoryBackend;
#[cfg(windows)]
pub use windows::WindowsBackend;

use crate::layout::{GraphicsRecord, PhysicsRecord, Record, StaticRecord};
use crate::snapshot::{TelemetrySnapshot, assemble};
use crate::{Region, Result};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Consecutive failures between repeated warnings for the same region.
const WARN_EVERY: u32 = 100;

/// Source of named shared memory regions.
pub trait RegionBackend: Send + Sync + 'static {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Open `region`, mapping exactly [`Region::record_size`] bytes.
    ///
    /// Returns `Ok(None)` when the region does not exist. Any other failure
    /// is an error.
    fn attach(&self, region: Region) -> Result<Option<Box<dyn RegionMapping>>>;
}

/// An attached view of one region.
pub trait RegionMapping: Send + Sync {
    /// Copy the current bytes of the region into `buf`.
    fn read_into(&self, buf: &mut [u8]) -> Result<()>;

    /// Whether the mapping still refers to a published region.
    ///
    /// Backends whose mappings stay valid for as long as they are held
    /// keep the default.
    fn is_live(&self) -> bool {
        true
    }
}

/// An attached region holding records of type `R`.
pub struct RegionHandle<R: Record> {
    mapping: Box<dyn RegionMapping>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> RegionHandle<R> {
    /// Attach to the region holding `R`; `Ok(None)` if it is not published.
    pub fn try_attach(backend: &dyn RegionBackend) -> Result<Option<Self>> {
        let mapping = backend.attach(R::REGION)?;
        Ok(mapping.map(|mapping| Self { mapping, _record: PhantomData }))
    }

    /// Decode the record from the region's current bytes.
    pub fn read_latest(&self) -> Result<R> {
        let mut bytes = vec![0u8; R::SIZE];
        self.mapping.read_into(&mut bytes)?;
        R::decode(&bytes)
    }

    pub fn is_live(&self) -> bool {
        self.mapping.is_live()
    }
}

/// Polls one region, attaching on demand.
pub struct RegionReader<R: Record> {
    backend: Arc<dyn RegionBackend>,
    handle: Option<RegionHandle<R>>,
    failures: u32,
}

impl<R: Record> RegionReader<R> {
    pub fn new(backend: Arc<dyn RegionBackend>) -> Self {
        Self { backend, handle: None, failures: 0 }
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Read the freshest record, or `None` if the region is unavailable.
    ///
    /// An unattached region is attached first. A mapping that stopped being
    /// live, or that fails to read, is dropped so the next poll reattaches.
    pub fn poll(&mut self) -> Option<R> {
        if self.handle.as_ref().is_some_and(|handle| !handle.is_live()) {
            info!(region = %R::REGION, "Region withdrawn, detaching");
            self.handle = None;
            return None;
        }

        if self.handle.is_none() {
            match RegionHandle::<R>::try_attach(self.backend.as_ref()) {
                Ok(Some(handle)) => {
                    info!(region = %R::REGION, backend = self.backend.name(), "Attached region");
                    self.handle = Some(handle);
                }
                Ok(None) => {
                    trace!(region = %R::REGION, "Region not published");
                    self.failures = 0;
                    return None;
                }
                Err(e) => {
                    self.record_failure(&e);
                    return None;
                }
            }
        }

        let handle = self.handle.as_ref()?;
        match handle.read_latest() {
            Ok(record) => {
                self.failures = 0;
                Some(record)
            }
            Err(e) => {
                self.record_failure(&e);
                self.handle = None;
                None
            }
        }
    }

    fn record_failure(&mut self, error: &crate::BridgeError) {
        if self.failures % WARN_EVERY == 0 {
            warn!(region = %R::REGION, failures = self.failures + 1, "Region unavailable: {}", error);
        } else {
            debug!(region = %R::REGION, "Region still failing: {}", error);
        }
        self.failures = self.failures.saturating_add(1);
    }
}

/// Reads all three regions of one simulator instance.
pub struct SimReader {
    physics: RegionReader<PhysicsRecord>,
    graphics: RegionReader<GraphicsRecord>,
    statics: RegionReader<StaticRecord>,
}

impl SimReader {
    pub fn new(backend: Arc<dyn RegionBackend>) -> Self {
        Self {
            physics: RegionReader::new(Arc::clone(&backend)),
            graphics: RegionReader::new(Arc::clone(&backend)),
            statics: RegionReader::new(backend),
        }
    }

    /// Poll every region once and assemble the result.
    pub fn poll(&mut self) -> TelemetrySnapshot {
        let physics = self.physics.poll();
        let graphics = self.graphics.poll();
        let statics = self.statics.poll();
        assemble(physics.as_ref(), graphics.as_ref(), statics.as_ref())
    }

    /// Attachment state of physics, graphics and static, in that order.
    pub fn attached(&self) -> [bool; 3] {
        [self.physics.is_attached(), self.graphics.is_attached(), self.statics.is_attached()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BridgeError;
    use crate::layout::WideStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn publish_all(backend: &InMemoryBackend) {
        let mut physics = PhysicsRecord::zeroed();
        physics.speed_kmh = 88.0;
        backend.publish(&physics);
        backend.publish(&GraphicsRecord::zeroed());
        let mut statics = StaticRecord::zeroed();
        statics.track = WideStr::new("spa");
        backend.publish(&statics);
    }

    #[test]
    fn absent_region_is_not_attached() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut reader = RegionReader::<PhysicsRecord>::new(backend);

        assert!(reader.poll().is_none());
        assert!(!reader.is_attached());
    }

    #[test]
    fn reattaches_when_region_appears() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut reader = RegionReader::<PhysicsRecord>::new(backend.clone());
        assert!(reader.poll().is_none());

        let mut physics = PhysicsRecord::zeroed();
        physics.rpms = 4200;
        backend.publish(&physics);

        assert_eq!(reader.poll().map(|p| p.rpms), Some(4200));
        assert!(reader.is_attached());
    }

    #[test]
    fn reads_are_never_cached() {
        let backend = Arc::new(InMemoryBackend::new());
        let mut physics = PhysicsRecord::zeroed();
        backend.publish(&physics);
        let mut reader = RegionReader::<PhysicsRecord>::new(backend.clone());

        for gear in 0..5 {
            physics.gear = gear;
            backend.publish(&physics);
            assert_eq!(reader.poll().map(|p| p.gear), Some(gear));
        }
    }

    #[test]
    fn detaches_when_region_is_withdrawn() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.publish(&StaticRecord::zeroed());
        let mut reader = RegionReader::<StaticRecord>::new(backend.clone());
        assert!(reader.poll().is_some());

        backend.withdraw(Region::Static);
        assert!(reader.poll().is_none());
        assert!(!reader.is_attached());

        backend.publish(&StaticRecord::zeroed());
        assert!(reader.poll().is_some());
    }

    #[test]
    fn layout_mismatch_reads_as_absent() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.publish_bytes(Region::Graphics, vec![0u8; 1000]);
        let mut reader = RegionReader::<GraphicsRecord>::new(backend);

        assert!(reader.poll().is_none());
        assert!(!reader.is_attached());
    }

    struct FailingBackend {
        attempts: AtomicUsize,
    }

    impl RegionBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn attach(&self, region: Region) -> Result<Option<Box<dyn RegionMapping>>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(BridgeError::memory_map(region, "open", "access denied"))
        }
    }

    #[test]
    fn os_failures_are_retried_every_poll() {
        let backend = Arc::new(FailingBackend { attempts: AtomicUsize::new(0) });
        let mut reader = SimReader::new(backend.clone());

        for _ in 0..3 {
            assert!(!reader.poll().is_available());
        }
        assert_eq!(backend.attempts.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn regions_attach_independently() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.publish(&GraphicsRecord::zeroed());
        backend.publish(&StaticRecord::zeroed());
        let mut reader = SimReader::new(backend.clone());

        assert!(!reader.poll().is_available());
        assert_eq!(reader.attached(), [false, true, true]);

        publish_all(&backend);
        let snapshot = reader.poll();
        assert!(snapshot.is_available());
        assert_eq!(reader.attached(), [true, true, true]);
    }

    #[test]
    fn simulator_exit_degrades_to_unavailable() {
        let backend = Arc::new(InMemoryBackend::new());
        publish_all(&backend);
        let mut reader = SimReader::new(backend.clone());
        assert!(reader.poll().is_available());

        backend.withdraw(Region::Physics);
        assert!(!reader.poll().is_available());
        assert_eq!(reader.attached(), [false, true, true]);
    }
}
