//! Fixed emplacements (cannons) that launch facility projectiles
//!
//! Unfocused cannons fire on their own every few seconds in a random
//! heading. A focused cannon stops auto-firing and fires where the player aims.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::rotate_y;
use crate::tuning::SiegeTuning;

/// A cannon's request to fire this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireOrder {
    pub origin: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: usize,
    pub position: Vec3,
    /// Muzzle offset from `position`
    pub muzzle: Vec3,
    /// Seconds until the next automatic shot
    pub fire_timer: f32,
    /// Under player control
    pub focused: bool,
}

impl Facility {
    pub fn new(id: usize, position: Vec3, muzzle: Vec3) -> Self {
        Self {
            id,
            position,
            muzzle,
            fire_timer: 0.0,
            focused: false,
        }
    }

    pub fn muzzle_position(&self) -> Vec3 {
        self.position + self.muzzle
    }

    /// Count down and, when due, produce an automatic shot.
    ///
    /// The timer starts at zero, so a fresh cannon fires on its first tick.
    pub fn update(&mut self, dt: f32, tuning: &SiegeTuning, rng: &mut impl Rng) -> Option<FireOrder> {
        self.fire_timer -= dt;
        if self.focused || self.fire_timer > 0.0 {
            return None;
        }
        self.fire_timer = tuning.facility_interval_min + rng.random::<f32>() * tuning.facility_interval_jitter;
        let heading = rng.random::<f32>() * std::f32::consts::TAU;
        let direction = rotate_y(Vec3::new(1.0, 0.2, 0.0), heading).normalize();
        Some(FireOrder {
            origin: self.muzzle_position(),
            direction,
        })
    }

    /// Player-aimed shot from a focused cannon
    pub fn aimed(&self, direction: Vec3) -> FireOrder {
        FireOrder {
            origin: self.muzzle_position(),
            direction: direction.normalize_or_zero(),
        }
    }
}

/// Build the cannon set from tuning
pub fn facilities_from_tuning(tuning: &SiegeTuning) -> Vec<Facility> {
    let muzzle = Vec3::from_array(tuning.facility_muzzle);
    tuning
        .facilities
        .iter()
        .enumerate()
        .map(|(id, &p)| Facility::new(id, Vec3::from_array(p), muzzle))
        .collect()
}
