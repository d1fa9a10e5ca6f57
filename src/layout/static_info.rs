//! `SPageFileStatic`: session-invariant car and track metadata.

use super::{WideStr, layout_record};
use crate::Region;

layout_record! {
    /// Static page, written when a session starts or the car changes.
    pub struct StaticRecord in Region::Static {
        sm_version: WideStr<15> => "smVersion",
        ac_version: WideStr<15> => "acVersion",
        number_of_sessions: i32 => "numberOfSessions",
        num_cars: i32 => "numCars",
        car_model: WideStr<33> => "carModel",
        track: WideStr<33> => "track",
        player_name: WideStr<33> => "playerName",
        player_surname: WideStr<33> => "playerSurname",
        player_nick: WideStr<33> => "playerNick",
        sector_count: i32 => "sectorCount",
        max_torque: f32 => "maxTorque",
        max_power: f32 => "maxPower",
        max_rpm: i32 => "maxRpm",
        max_fuel: f32 => "maxFuel",
        suspension_max_travel: [f32; 4] => "suspensionMaxTravel",
        tyre_radius: [f32; 4] => "tyreRadius",
        max_turbo_boost: f32 => "maxTurboBoost",
        deprecated_1: f32 => "deprecated_1",
        deprecated_2: f32 => "deprecated_2",
        penalties_enabled: i32 => "penaltiesEnabled",
        aid_fuel_rate: f32 => "aidFuelRate",
        aid_tire_rate: f32 => "aidTireRate",
        aid_mechanical_damage: f32 => "aidMechanicalDamage",
        aid_allow_tyre_blankets: i32 => "aidAllowTyreBlankets",
        aid_stability: f32 => "aidStability",
        aid_auto_clutch: i32 => "aidAutoClutch",
        aid_auto_blip: i32 => "aidAutoBlip",
        has_drs: i32 => "hasDRS",
        has_ers: i32 => "hasERS",
        has_kers: i32 => "hasKERS",
        kers_max_j: f32 => "kersMaxJ",
        engine_brake_settings_count: i32 => "engineBrakeSettingsCount",
        ers_power_controller_count: i32 => "ersPowerControllerCount",
        track_spline_length: f32 => "trackSPlineLength",
        track_configuration: WideStr<33> => "trackConfiguration",
        ers_max_j: f32 => "ersMaxJ",
        is_timed_race: i32 => "isTimedRace",
        has_extra_lap: i32 => "hasExtraLap",
        car_skin: WideStr<33> => "carSkin",
        reversed_grid_positions: i32 => "reversedGridPositions",
        pit_window_start: i32 => "pitWindowStart",
        pit_window_end: i32 => "pitWindowEnd",
        is_online: i32 => "isOnline",
    }
}

const _: () = assert!(<StaticRecord as super::Record>::SIZE == 688);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Record;

    #[test]
    fn well_known_offsets() {
        let offset = |name| StaticRecord::field(name).map(|spec| spec.offset);
        assert_eq!(offset("carModel"), Some(68));
        assert_eq!(offset("track"), Some(134));
        assert_eq!(offset("playerName"), Some(200));
        // playerNick ends at 398, two bytes of padding follow
        assert_eq!(offset("sectorCount"), Some(400));
        assert_eq!(offset("maxRpm"), Some(412));
        assert_eq!(offset("trackConfiguration"), Some(524));
        assert_eq!(offset("ersMaxJ"), Some(592));
        assert_eq!(offset("carSkin"), Some(604));
        assert_eq!(offset("reversedGridPositions"), Some(672));
        assert_eq!(offset("isOnline"), Some(684));
    }

    #[test]
    fn padding_bytes_encode_as_zero() {
        let mut statics = StaticRecord::zeroed();
        statics.player_nick = WideStr::new("abcdefghijklmnopqrstuvwxyzabcdefghij");
        statics.sector_count = -1;

        let bytes = statics.encode();
        assert_eq!(&bytes[398..400], &[0, 0]);
        assert_eq!(&bytes[400..404], &[0xFF; 4]);
    }

    #[test]
    fn decodes_car_and_track() {
        let mut statics = StaticRecord::zeroed();
        statics.car_model = WideStr::new("ks_mazda_mx5_cup");
        statics.track = WideStr::new("magione");
        statics.player_name = WideStr::new("Player");
        statics.max_rpm = 7500;

        let decoded = StaticRecord::decode(&statics.encode()).unwrap();
        assert_eq!(decoded, statics);
        assert_eq!(decoded.car_model.to_string_lossy(), "ks_mazda_mx5_cup");
        assert_eq!(decoded.max_rpm, 7500);
    }
}
