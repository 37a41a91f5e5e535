//! Pooled simulation objects
//!
//! One struct for every pooled object; what differs per kind lives in the
//! `EntityKind` payload so collision code can match on it exhaustively.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::pool::Poolable;
use crate::presentation::PresentationRef;

/// Where an attack entity was fired from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Launcher {
    /// Fired straight from the player's viewpoint
    #[default]
    Player,
    /// Fired from a fixed emplacement (earns the facility bonus)
    Facility,
}

impl Launcher {
    pub fn is_facility(&self) -> bool {
        matches!(self, Launcher::Facility)
    }
}

/// Entity kinds with their per-kind payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Attack entity
    Projectile { launcher: Launcher },
    /// Pop target floating around the objective
    Balloon { high_value: bool, sway: f32 },
    /// Lane-scroll obstacle the avatar must dodge
    Hazard,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Projectile { .. } => "projectile",
            EntityKind::Balloon { .. } => "balloon",
            EntityKind::Hazard => "hazard",
        }
    }
}

/// A pooled simulation object
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Seconds left before expiry; infinite for objects that only leave on hit or recycle
    pub remaining_life: f32,
    /// Collision extent
    pub radius: f32,
    /// Pulled down by gravity each tick
    pub gravity: bool,
    /// Opaque ref handed out by the presenter on activation
    pub presentation: Option<PresentationRef>,
}

impl Entity {
    pub fn projectile(launcher: Launcher, origin: Vec3, velocity: Vec3, life: f32, radius: f32) -> Self {
        Self {
            kind: EntityKind::Projectile { launcher },
            position: origin,
            velocity,
            remaining_life: life,
            radius,
            gravity: launcher.is_facility(),
            presentation: None,
        }
    }

    pub fn balloon(position: Vec3, radius: f32, high_value: bool, sway: f32) -> Self {
        Self {
            kind: EntityKind::Balloon { high_value, sway },
            position,
            velocity: Vec3::ZERO,
            remaining_life: f32::INFINITY,
            radius,
            gravity: false,
            presentation: None,
        }
    }

    pub fn hazard(position: Vec3, radius: f32) -> Self {
        Self {
            kind: EntityKind::Hazard,
            position,
            velocity: Vec3::ZERO,
            remaining_life: f32::INFINITY,
            radius,
            gravity: false,
            presentation: None,
        }
    }

    /// Integrate one step. Gravity is applied to velocity before position moves.
    pub fn integrate(&mut self, dt: f32, gravity: f32) {
        if self.gravity {
            self.velocity.y -= gravity * dt;
        }
        self.position += self.velocity * dt;
    }

    /// Count down the lifetime; true once it has run out
    pub fn age(&mut self, dt: f32) -> bool {
        self.remaining_life -= dt;
        self.remaining_life <= 0.0
    }
}

impl Poolable for Entity {
    fn reset(&mut self) {
        self.position = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.remaining_life = 0.0;
        self.gravity = false;
        self.presentation = None;
        self.kind = match self.kind {
            EntityKind::Projectile { .. } => EntityKind::Projectile {
                launcher: Launcher::Player,
            },
            EntityKind::Balloon { .. } => EntityKind::Balloon {
                high_value: false,
                sway: 0.0,
            },
            EntityKind::Hazard => EntityKind::Hazard,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_applies_before_position() {
        let mut e = Entity::projectile(Launcher::Facility, Vec3::ZERO, Vec3::ZERO, 1.0, 0.15);
        e.integrate(1.0, 10.0);
        // Velocity updated first, so the position already reflects the pull
        assert_eq!(e.velocity.y, -10.0);
        assert_eq!(e.position.y, -10.0);
    }

    #[test]
    fn test_player_projectile_flies_straight() {
        let mut e = Entity::projectile(Launcher::Player, Vec3::ZERO, Vec3::new(0.0, 0.0, -42.0), 2.5, 0.15);
        e.integrate(0.5, 9.8);
        assert_eq!(e.position, Vec3::new(0.0, 0.0, -21.0));
    }

    #[test]
    fn test_age_expires_at_zero() {
        let mut e = Entity::projectile(Launcher::Player, Vec3::ZERO, Vec3::ZERO, 0.5, 0.15);
        assert!(!e.age(0.25));
        assert!(e.age(0.25));
    }

    #[test]
    fn test_balloons_never_expire() {
        let mut e = Entity::balloon(Vec3::ZERO, 0.6, false, 0.0);
        assert!(!e.age(1_000.0));
    }

    #[test]
    fn test_reset_clears_flags() {
        let mut e = Entity::balloon(Vec3::ONE, 0.6, true, 2.0);
        e.presentation = Some(PresentationRef(3));
        e.reset();
        assert_eq!(e.kind, EntityKind::Balloon { high_value: false, sway: 0.0 });
        assert_eq!(e.position, Vec3::ZERO);
        assert!(e.presentation.is_none());
    }
}
