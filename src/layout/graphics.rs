//! `SPageFileGraphic`: session, lap and flag state.

use super::{WideStr, layout_record};
use crate::Region;

/// Number of car slots in `carCoordinates` / `carID`.
pub const MAX_CARS: usize = 60;

layout_record! {
    /// Graphics page, updated at the simulator's render rate.
    ///
    /// Lap timers are published twice: as formatted text (`currentTime`)
    /// and as integer milliseconds (`iCurrentTime`). Prefer the integers.
    pub struct GraphicsRecord in Region::Graphics {
        packet_id: i32 => "packetId",
        status: i32 => "status",
        session: i32 => "session",
        current_time: WideStr<15> => "currentTime",
        last_time: WideStr<15> => "lastTime",
        best_time: WideStr<15> => "bestTime",
        split: WideStr<15> => "split",
        completed_laps: i32 => "completedLaps",
        position: i32 => "position",
        i_current_time: i32 => "iCurrentTime",
        i_last_time: i32 => "iLastTime",
        i_best_time: i32 => "iBestTime",
        session_time_left: f32 => "sessionTimeLeft",
        distance_traveled: f32 => "distanceTraveled",
        is_in_pit: i32 => "isInPit",
        current_sector_index: i32 => "currentSectorIndex",
        last_sector_time: i32 => "lastSectorTime",
        number_of_laps: i32 => "numberOfLaps",
        tyre_compound: WideStr<33> => "tyreCompound",
        replay_time_multiplier: f32 => "replayTimeMultiplier",
        normalized_car_position: f32 => "normalizedCarPosition",
        active_cars: i32 => "activeCars",
        car_coordinates: [[f32; 3]; MAX_CARS] => "carCoordinates",
        car_id: [i32; MAX_CARS] => "carID",
        player_car_id: i32 => "playerCarID",
        penalty_time: f32 => "penaltyTime",
        flag: i32 => "flag",
        penalty: i32 => "penalty",
        ideal_line_on: i32 => "idealLineOn",
        is_in_pit_lane: i32 => "isInPitLane",
        surface_grip: f32 => "surfaceGrip",
        mandatory_pit: i32 => "mandatoryPit",
        wind_speed: f32 => "windSpeed",
        wind_direction: f32 => "windDirection",
        is_setup_menu_visible: i32 => "isSetupMenuVisible",
        main_display_index: i32 => "mainDisplayIndex",
        secondary_display_index: i32 => "secondaryDisplayIndex",
        tc: i32 => "TC",
        tc_cut: i32 => "TCCut",
        engine_map: i32 => "EngineMap",
        abs: i32 => "ABS",
        fuel_x_lap: f32 => "fuelXLap",
        rain_lights: i32 => "rainLights",
        flashing_lights: i32 => "flashingLights",
        lights_stage: i32 => "lightsStage",
        exhaust_temperature: f32 => "exhaustTemperature",
        wiper_lv: i32 => "wiperLV",
        driver_name: WideStr<33> => "DriverName",
    }
}

const _: () = assert!(<GraphicsRecord as super::Record>::SIZE == 1376);

/// `AC_STATUS`: what the simulator is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStatus {
    Off,
    Replay,
    Live,
    Pause,
    Unknown(i32),
}

impl From<i32> for SimStatus {
    fn from(value: i32) -> Self {
        match value {
            0 => SimStatus::Off,
            1 => SimStatus::Replay,
            2 => SimStatus::Live,
            3 => SimStatus::Pause,
            other => SimStatus::Unknown(other),
        }
    }
}

/// `AC_FLAG_TYPE`: flag currently shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagType {
    None,
    Blue,
    Yellow,
    Black,
    White,
    Checkered,
    Penalty,
    Unknown(i32),
}

impl From<i32> for FlagType {
    fn from(value: i32) -> Self {
        match value {
            0 => FlagType::None,
            1 => FlagType::Blue,
            2 => FlagType::Yellow,
            3 => FlagType::Black,
            4 => FlagType::White,
            5 => FlagType::Checkered,
            6 => FlagType::Penalty,
            other => FlagType::Unknown(other),
        }
    }
}

/// `AC_SESSION_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionType {
    Unknown,
    Practice,
    Qualify,
    Race,
    Hotlap,
    TimeAttack,
    Drift,
    Drag,
    Other(i32),
}

impl From<i32> for SessionType {
    fn from(value: i32) -> Self {
        match value {
            -1 => SessionType::Unknown,
            0 => SessionType::Practice,
            1 => SessionType::Qualify,
            2 => SessionType::Race,
            3 => SessionType::Hotlap,
            4 => SessionType::TimeAttack,
            5 => SessionType::Drift,
            6 => SessionType::Drag,
            other => SessionType::Other(other),
        }
    }
}

impl GraphicsRecord {
    pub fn status(&self) -> SimStatus {
        SimStatus::from(self.status)
    }

    pub fn flag_type(&self) -> FlagType {
        FlagType::from(self.flag)
    }

    pub fn session_type(&self) -> SessionType {
        SessionType::from(self.session)
    }
}
