//! The three shared memory pages published by Assetto Corsa.

use crate::layout::{GraphicsRecord, PhysicsRecord, Record, StaticRecord};
use std::fmt;

/// A named shared memory region published by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// `SPageFilePhysics`, updated every physics step.
    Physics,
    /// `SPageFileGraphic`, session and lap state.
    Graphics,
    /// `SPageFileStatic`, written once per session.
    Static,
}

impl Region {
    /// All regions in polling order.
    pub const ALL: [Region; 3] = [Region::Physics, Region::Graphics, Region::Static];

    /// Windows kernel object name of the mapping.
    pub const fn mapping_name(self) -> &'static str {
        match self {
            Region::Physics => "Local\\acpmf_physics",
            Region::Graphics => "Local\\acpmf_graphics",
            Region::Static => "Local\\acpmf_static",
        }
    }

    /// Mapping name without the `Local\` namespace prefix.
    ///
    /// Used as the file name by file-backed mappings (`/dev/shm/acpmf_physics`).
    pub const fn local_name(self) -> &'static str {
        match self {
            Region::Physics => "acpmf_physics",
            Region::Graphics => "acpmf_graphics",
            Region::Static => "acpmf_static",
        }
    }

    /// Exact size in bytes of the record stored in this region.
    pub const fn record_size(self) -> usize {
        match self {
            Region::Physics => PhysicsRecord::SIZE,
            Region::Graphics => GraphicsRecord::SIZE,
            Region::Static => StaticRecord::SIZE,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Region::Physics => "physics",
            Region::Graphics => "graphics",
            Region::Static => "static",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
