//! Snapshot assembly and the JSON wire message.

use crate::Result;
use crate::layout::{GraphicsRecord, PhysicsRecord, StaticRecord};
use serde::Serialize;

/// Message sent while the simulator is unavailable, unless configured.
pub const DEFAULT_WAITING_MESSAGE: &str = "Waiting for Assetto Corsa...";

/// Driver inputs and engine state.
///
/// Non-finite floats in the page (NaN, infinities) are sent as `0.0` so the
/// JSON always carries numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsSummary {
    pub speed_kmh: f32,
    pub rpms: i32,
    pub gear: i32,
    pub gas: f32,
    pub brake: f32,
}

/// Lap timing and race state. Times are integer milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphicsSummary {
    pub current_time: i32,
    pub last_time: i32,
    pub best_time: i32,
    pub completed_laps: i32,
    pub position: i32,
    pub flag: i32,
}

/// Car, track and driver identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticSummary {
    pub max_rpm: i32,
    pub car_model: String,
    pub track: String,
    pub player_name: String,
}

/// Values from one poll cycle in which every region was read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveTelemetry {
    pub physics: PhysicsSummary,
    pub graphics: GraphicsSummary,
    #[serde(rename = "static")]
    pub statics: StaticSummary,
}

/// One poll cycle's view of the simulator.
///
/// Either every region was read in the same cycle, or the snapshot is
/// unavailable as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetrySnapshot {
    Unavailable,
    Available(Box<LiveTelemetry>),
}

impl TelemetrySnapshot {
    pub fn is_available(&self) -> bool {
        matches!(self, TelemetrySnapshot::Available(_))
    }

    pub fn live(&self) -> Option<&LiveTelemetry> {
        match self {
            TelemetrySnapshot::Available(live) => Some(&**live),
            TelemetrySnapshot::Unavailable => None,
        }
    }

    /// Encode the snapshot as the JSON text message sent to clients.
    pub fn to_wire_json(&self, waiting_message: &str) -> Result<String> {
        let json = match self {
            TelemetrySnapshot::Available(live) => {
                serde_json::to_string(&AvailableMessage { connected: true, live })?
            }
            TelemetrySnapshot::Unavailable => serde_json::to_string(&UnavailableMessage {
                connected: false,
                message: waiting_message,
            })?,
        };
        Ok(json)
    }
}

#[derive(Serialize)]
struct AvailableMessage<'a> {
    connected: bool,
    #[serde(flatten)]
    live: &'a LiveTelemetry,
}

#[derive(Serialize)]
struct UnavailableMessage<'a> {
    connected: bool,
    message: &'a str,
}

/// Combine the records read in one poll cycle.
///
/// Any missing record makes the whole snapshot unavailable.
pub fn assemble(
    physics: Option<&PhysicsRecord>,
    graphics: Option<&GraphicsRecord>,
    statics: Option<&StaticRecord>,
) -> TelemetrySnapshot {
    let (Some(physics), Some(graphics), Some(statics)) = (physics, graphics, statics) else {
        return TelemetrySnapshot::Unavailable;
    };

    TelemetrySnapshot::Available(Box::new(LiveTelemetry {
        physics: PhysicsSummary {
            speed_kmh: finite_or_zero(physics.speed_kmh),
            rpms: physics.rpms,
            gear: physics.gear,
            gas: finite_or_zero(physics.gas),
            brake: finite_or_zero(physics.brake),
        },
        graphics: GraphicsSummary {
            current_time: graphics.i_current_time,
            last_time: graphics.i_last_time,
            best_time: graphics.i_best_time,
            completed_laps: graphics.completed_laps,
            position: graphics.position,
            flag: graphics.flag,
        },
        statics: StaticSummary {
            max_rpm: statics.max_rpm,
            car_model: statics.car_model.to_string_lossy(),
            track: statics.track.to_string_lossy(),
            player_name: statics.player_name.to_string_lossy(),
        },
    }))
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}
