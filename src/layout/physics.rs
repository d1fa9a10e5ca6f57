//! `SPageFilePhysics`: per-step vehicle dynamics.

use super::layout_record;
use crate::Region;

layout_record! {
    /// Physics page, rewritten by the simulator on every physics step.
    ///
    /// Per-wheel arrays are ordered front-left, front-right, rear-left,
    /// rear-right.
    pub struct PhysicsRecord in Region::Physics {
        packet_id: i32 => "packetId",
        gas: f32 => "gas",
        brake: f32 => "brake",
        fuel: f32 => "fuel",
        gear: i32 => "gear",
        rpms: i32 => "rpms",
        steer_angle: f32 => "steerAngle",
        speed_kmh: f32 => "speedKmh",
        velocity: [f32; 3] => "velocity",
        acc_g: [f32; 3] => "accG",
        wheel_slip: [f32; 4] => "wheelSlip",
        wheel_load: [f32; 4] => "wheelLoad",
        wheels_pressure: [f32; 4] => "wheelsPressure",
        wheel_angular_speed: [f32; 4] => "wheelAngularSpeed",
        tyre_wear: [f32; 4] => "tyreWear",
        tyre_dirty_level: [f32; 4] => "tyreDirtyLevel",
        tyre_core_temperature: [f32; 4] => "tyreCoreTemperature",
        camber_rad: [f32; 4] => "camberRAD",
        suspension_travel: [f32; 4] => "suspensionTravel",
        drs: f32 => "drs",
        tc: f32 => "tc",
        heading: f32 => "heading",
        pitch: f32 => "pitch",
        roll: f32 => "roll",
        cg_height: f32 => "cgHeight",
        /// Front, rear, left, right, centre.
        car_damage: [f32; 5] => "carDamage",
        number_of_tyres_out: i32 => "numberOfTyresOut",
        pit_limiter_on: i32 => "pitLimiterOn",
        abs: f32 => "abs",
        kers_charge: f32 => "kersCharge",
        kers_input: f32 => "kersInput",
        auto_shifter_on: i32 => "autoShifterOn",
        ride_height: [f32; 2] => "rideHeight",
        turbo_boost: f32 => "turboBoost",
        ballast: f32 => "ballast",
        air_density: f32 => "airDensity",
        air_temp: f32 => "airTemp",
        road_temp: f32 => "roadTemp",
        local_angular_vel: [f32; 3] => "localAngularVel",
        final_ff: f32 => "finalFF",
        performance_meter: f32 => "performanceMeter",
        engine_brake: i32 => "engineBrake",
        ers_recovery_level: i32 => "ersRecoveryLevel",
        ers_power_level: i32 => "ersPowerLevel",
        ers_heat_charging: i32 => "ersHeatCharging",
        ers_is_charging: i32 => "ersIsCharging",
        kers_current_kj: f32 => "kersCurrentKJ",
        drs_available: i32 => "drsAvailable",
        drs_enabled: i32 => "drsEnabled",
        brake_temp: [f32; 4] => "brakeTemp",
        clutch: f32 => "clutch",
        tyre_temp_i: [f32; 4] => "tyreTempI",
        tyre_temp_m: [f32; 4] => "tyreTempM",
        tyre_temp_o: [f32; 4] => "tyreTempO",
        is_ai_controlled: i32 => "isAIControlled",
        /// World-space xyz per wheel.
        tyre_contact_point: [[f32; 3]; 4] => "tyreContactPoint",
        tyre_contact_normal: [[f32; 3]; 4] => "tyreContactNormal",
        tyre_contact_heading: [[f32; 3]; 4] => "tyreContactHeading",
        brake_bias: f32 => "brakeBias",
        local_velocity: [f32; 3] => "localVelocity",
        p2p_activations: i32 => "P2PActivations",
        p2p_status: i32 => "P2PStatus",
        current_max_rpm: i32 => "currentMaxRpm",
        mz: [f32; 4] => "mz",
        fx: [f32; 4] => "fx",
        fy: [f32; 4] => "fy",
        slip_ratio: [f32; 4] => "slipRatio",
        slip_angle: [f32; 4] => "slipAngle",
        tc_in_action: i32 => "tcinAction",
        abs_in_action: i32 => "absInAction",
        suspension_damage: [f32; 4] => "suspensionDamage",
        tyre_temp: [f32; 4] => "tyreTemp",
    }
}

const _: () = assert!(<PhysicsRecord as super::Record>::SIZE == 712);
