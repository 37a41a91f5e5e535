//! Castle Pop - arcade simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pools, spawning, collisions, scoring, round flow)
//! - `presentation`: Callbacks consumed by whatever draws and plays sounds
//! - `tuning`: Data-driven game balance
//! - `error`: Error kinds reported by the simulation

pub mod error;
pub mod presentation;
pub mod sim;
pub mod tuning;

pub use error::SimError;
pub use presentation::{NullPresenter, PresentationEvent, PresentationRef, Presenter, RecordingPresenter};
pub use tuning::{ConfigError, Tuning};

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Host timestep (display refresh at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock frame the host feeds into the accumulator
    pub const MAX_FRAME_TIME: f32 = 0.1;

    /// Combo multiplier ceiling
    pub const COMBO_MAX: f32 = 5.0;
    /// Seconds without a hit before the combo drops back to 1
    pub const COMBO_RESET_SECONDS: f32 = 3.0;
    /// Combo gained per hit (doubled for facility-launched shots)
    pub const COMBO_STEP: f32 = 0.25;
    /// Score and combo multiplier for facility-launched shots
    pub const FACILITY_BONUS: u32 = 2;

    /// Downward acceleration on gravity-affected projectiles
    pub const GRAVITY: f32 = 9.8;

    /// Largest pool ceiling (and round population) a tuning file may ask for
    pub const MAX_POOL_CAPACITY: usize = 65_536;
}

/// Normalized angle to [-π, π). Non-finite input maps to 0.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to exactly TAU
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}

/// Unit direction from yaw (around +Y, 0 = looking down -Z) and pitch (up positive)
#[inline]
pub fn direction_from_angles(yaw: f32, pitch: f32) -> Vec3 {
    let (sy, cy) = yaw.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    Vec3::new(sy * cp, sp, -cy * cp)
}

/// Yaw/pitch pair that looks from `from` toward `to`
#[inline]
pub fn angles_toward(from: Vec3, to: Vec3) -> (f32, f32) {
    let dir = (to - from).normalize_or_zero();
    let yaw = dir.x.atan2(-dir.z);
    let pitch = dir.y.clamp(-1.0, 1.0).asin();
    (yaw, pitch)
}

/// Rotate a vector about the +Y axis
#[inline]
pub fn rotate_y(v: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(v.x * c + v.z * s, v.y, -v.x * s + v.z * c)
}
