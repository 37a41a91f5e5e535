//! Data-driven game balance
//!
//! Every gameplay constant lives here so a host can load a JSON file and
//! rebalance without rebuilding. Missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(&'static str),
}

/// Point values per target type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointValues {
    pub balloon: u32,
    pub balloon_high_value: u32,
    pub objective_body: u32,
    pub objective_sub_target: u32,
}

impl Default for PointValues {
    fn default() -> Self {
        Self {
            balloon: 100,
            balloon_high_value: 200,
            objective_body: 250,
            objective_sub_target: 500,
        }
    }
}

/// Shooting-mode (radial spawn) balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiegeTuning {
    /// Population before the per-level adjustment
    pub base_population: u32,
    /// Extra balloons per level above 1
    pub population_per_level: u32,
    /// Lower bound on the round's population
    pub min_population: u32,
    /// Center of the radial spawn band
    pub focal_point: [f32; 3],
    pub radius_min: f32,
    pub radius_max: f32,
    pub height_min: f32,
    pub height_max: f32,
    pub balloon_radius: f32,
    /// Probability of a high-value balloon
    pub high_value_chance: f32,
    /// Balloons sinking below this height are recycled
    pub floor_y: f32,
    /// Vertical sway speed amplitude (units/s)
    pub sway_vertical: f32,
    /// Lateral sway speed amplitude (units/s)
    pub sway_lateral: f32,
    pub projectile_radius: f32,
    pub projectile_life: f32,
    pub player_shot_speed: f32,
    pub facility_shot_speed: f32,
    /// Objective body center
    pub objective_center: [f32; 3],
    pub objective_radius: f32,
    /// Sub-target offsets from the objective center
    pub sub_target_offsets: Vec<[f32; 3]>,
    /// Random extra height added to each sub-target
    pub sub_target_jitter: f32,
    pub sub_target_radius: f32,
    /// Facility (cannon) positions
    pub facilities: Vec<[f32; 3]>,
    pub facility_muzzle: [f32; 3],
    pub facility_interval_min: f32,
    pub facility_interval_jitter: f32,
    /// Viewpoint origin at round start
    pub viewpoint_origin: [f32; 3],
    /// Point the viewpoint looks at on round start
    pub viewpoint_look_at: [f32; 3],
    pub max_pitch: f32,
}

impl Default for SiegeTuning {
    fn default() -> Self {
        Self {
            base_population: 10,
            population_per_level: 2,
            min_population: 5,
            focal_point: [0.0, 0.0, -9.0],
            radius_min: 3.0,
            radius_max: 8.0,
            height_min: 3.0,
            height_max: 9.0,
            balloon_radius: 0.6,
            high_value_chance: 0.25,
            floor_y: -2.0,
            sway_vertical: 0.6,
            sway_lateral: 0.3,
            projectile_radius: 0.15,
            projectile_life: 2.5,
            player_shot_speed: 42.0,
            facility_shot_speed: 30.0,
            objective_center: [0.0, 6.0, -6.0],
            objective_radius: 3.0,
            sub_target_offsets: vec![
                [-2.0, 2.2, -2.0],
                [2.0, 2.2, -2.0],
                [-2.0, 2.2, 2.0],
                [2.0, 2.2, 2.0],
            ],
            sub_target_jitter: 0.2,
            sub_target_radius: 0.25,
            facilities: vec![[-4.0, 2.5, -2.0], [5.0, 3.2, -3.0]],
            facility_muzzle: [0.6, 0.4, 0.0],
            facility_interval_min: 3.0,
            facility_interval_jitter: 2.0,
            viewpoint_origin: [0.0, 7.0, 14.0],
            viewpoint_look_at: [0.0, 6.0, -6.0],
            max_pitch: 1.2,
        }
    }
}

impl SiegeTuning {
    /// Balloons spawned at the start of a round at `level` (1-based)
    pub fn population_for_level(&self, level: u32) -> u32 {
        let base = self.base_population.saturating_sub(4).max(self.min_population);
        base.saturating_add(level.saturating_sub(1).saturating_mul(self.population_per_level))
            .min(MAX_POOL_CAPACITY as u32)
    }
}

/// Dodge-mode (lane scroll) balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DodgeTuning {
    /// Lateral lane positions
    pub lanes: Vec<f32>,
    pub hazard_count: u32,
    /// Offset of the first hazard in front of the avatar
    pub initial_offset: f32,
    pub spacing: f32,
    /// Travel-axis coordinate past which a hazard counts as passed
    pub near_threshold: f32,
    pub respawn_base: f32,
    pub respawn_jitter: f32,
    pub hazard_radius: f32,
    pub crash_lateral: f32,
    pub crash_longitudinal: f32,
    pub max_lateral: f32,
    pub steer_rate: f32,
    pub base_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub accel_rate: f32,
    pub brake_rate: f32,
    /// Speed follows the target at this rate (per second)
    pub speed_response: f32,
}

impl Default for DodgeTuning {
    fn default() -> Self {
        Self {
            lanes: vec![-3.0, 0.0, 3.0],
            hazard_count: 22,
            initial_offset: 30.0,
            spacing: 20.0,
            near_threshold: 6.0,
            respawn_base: 220.0,
            respawn_jitter: 140.0,
            hazard_radius: 1.0,
            crash_lateral: 1.0,
            crash_longitudinal: 1.8,
            max_lateral: 3.0,
            steer_rate: 10.0,
            base_speed: 12.0,
            min_speed: 6.0,
            max_speed: 26.0,
            accel_rate: 20.0,
            brake_rate: 30.0,
            speed_response: 2.0,
        }
    }
}

/// Complete balance sheet for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub combo_max: f32,
    pub combo_reset_seconds: f32,
    pub combo_step: f32,
    pub facility_bonus: u32,
    pub gravity: f32,
    pub points: PointValues,
    pub siege: SiegeTuning,
    pub dodge: DodgeTuning,
    /// Hard ceilings per pool (`None` = grow as needed)
    pub projectile_capacity: Option<usize>,
    pub target_capacity: Option<usize>,
    pub hazard_capacity: Option<usize>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            combo_max: COMBO_MAX,
            combo_reset_seconds: COMBO_RESET_SECONDS,
            combo_step: COMBO_STEP,
            facility_bonus: FACILITY_BONUS,
            gravity: GRAVITY,
            points: PointValues::default(),
            siege: SiegeTuning::default(),
            dodge: DodgeTuning::default(),
            projectile_capacity: Some(64),
            target_capacity: Some(64),
            hazard_capacity: Some(32),
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning overrides");
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.combo_max < 1.0 {
            return Err(ConfigError::Invalid("combo_max must be at least 1"));
        }
        if self.combo_reset_seconds <= 0.0 {
            return Err(ConfigError::Invalid("combo_reset_seconds must be positive"));
        }
        if self.combo_step < 0.0 {
            return Err(ConfigError::Invalid("combo_step must not be negative"));
        }
        if self.facility_bonus == 0 {
            return Err(ConfigError::Invalid("facility_bonus must be at least 1"));
        }

        let ceilings = [self.projectile_capacity, self.target_capacity, self.hazard_capacity];
        if ceilings.iter().flatten().any(|&c| c > MAX_POOL_CAPACITY) {
            return Err(ConfigError::Invalid("pool capacities must not exceed 65536"));
        }

        let s = &self.siege;
        if s.balloon_radius <= 0.0 || s.projectile_radius <= 0.0 || s.objective_radius <= 0.0 {
            return Err(ConfigError::Invalid("radii must be positive"));
        }
        if s.projectile_life <= 0.0 {
            return Err(ConfigError::Invalid("projectile_life must be positive"));
        }
        if s.radius_min < 0.0 || s.radius_max < s.radius_min || s.height_max < s.height_min {
            return Err(ConfigError::Invalid("radial spawn band is empty"));
        }
        if !(0.0..=1.0).contains(&s.high_value_chance) {
            return Err(ConfigError::Invalid("high_value_chance must be within 0..=1"));
        }

        let d = &self.dodge;
        if d.lanes.is_empty() {
            return Err(ConfigError::Invalid("lane set must not be empty"));
        }
        if d.near_threshold <= 0.0 {
            return Err(ConfigError::Invalid("near_threshold must be positive"));
        }
        if d.respawn_base <= d.near_threshold {
            return Err(ConfigError::Invalid("respawn_base must lie beyond near_threshold"));
        }
        if d.min_speed > d.base_speed || d.base_speed > d.max_speed {
            return Err(ConfigError::Invalid("speeds must satisfy min <= base <= max"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "combo_max": 3.0, "dodge": { "lanes": [-2.0, 2.0] } }"#).unwrap();
        assert_eq!(tuning.combo_max, 3.0);
        assert_eq!(tuning.dodge.lanes, vec![-2.0, 2.0]);
        assert_eq!(tuning.dodge.near_threshold, 6.0);
        assert_eq!(tuning.combo_reset_seconds, COMBO_RESET_SECONDS);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Tuning::from_json(r#"{ "combo_max": 0.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = Tuning::from_json(r#"{ "dodge": { "lanes": [] } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_population_for_level() {
        let siege = SiegeTuning::default();
        assert_eq!(siege.population_for_level(1), 6);
        assert_eq!(siege.population_for_level(3), 10);
        assert_eq!(siege.population_for_level(0), 6);
        assert_eq!(siege.population_for_level(u32::MAX), MAX_POOL_CAPACITY as u32);
    }

    #[test]
    fn test_absurd_capacity_is_rejected() {
        let err = Tuning::from_json(r#"{ "projectile_capacity": 18446744073709551615 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(Tuning::from_json(r#"{ "hazard_capacity": null }"#).is_ok());
    }

    #[test]
    fn test_json_round_trip_preserves_capacities() {
        let json = Tuning::default().to_json().unwrap();
        let back = Tuning::from_json(&json).unwrap();
        assert_eq!(back.projectile_capacity, Some(64));
    }
}
