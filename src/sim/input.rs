//! Abstract input for a single tick
//!
//! Hosts turn keys, pointers and touches into `Intent`s; the simulation never
//! sees a device event.

use serde::{Deserialize, Serialize};

/// A discrete player intention
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Steer left (held)
    Left,
    /// Steer right (held)
    Right,
    /// Raise target speed (held)
    Accelerate,
    /// Lower target speed (held)
    Brake,
    /// Turn the aim by yaw/pitch radians
    AimDelta { yaw: f32, pitch: f32 },
    /// Launch a projectile along the aim
    Fire,
    /// Take control of a facility
    Focus(usize),
    /// Release the focused facility
    Unfocus,
    /// Abandon the round at the end of this tick
    Abort,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// -1 (full left) .. 1 (full right)
    pub steer: f32,
    pub accelerate: bool,
    pub brake: bool,
    pub aim_yaw: f32,
    pub aim_pitch: f32,
    pub fire: bool,
    /// `Some(Some(id))` focus a facility, `Some(None)` release focus
    pub focus: Option<Option<usize>>,
    pub abort: bool,
}

impl TickInput {
    /// Fold a tick's worth of intents. Later focus intents override earlier ones.
    pub fn from_intents(intents: &[Intent]) -> Self {
        let mut input = TickInput::default();
        for intent in intents {
            match *intent {
                Intent::Left => input.steer -= 1.0,
                Intent::Right => input.steer += 1.0,
                Intent::Accelerate => input.accelerate = true,
                Intent::Brake => input.brake = true,
                Intent::AimDelta { yaw, pitch } => {
                    input.aim_yaw += yaw;
                    input.aim_pitch += pitch;
                }
                Intent::Fire => input.fire = true,
                Intent::Focus(id) => input.focus = Some(Some(id)),
                Intent::Unfocus => input.focus = Some(None),
                Intent::Abort => input.abort = true,
            }
        }
        input.steer = input.steer.clamp(-1.0, 1.0);
        input
    }

    /// Copy with non-finite axes zeroed and steering clamped to -1..=1
    pub fn sanitized(&self) -> Self {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        Self {
            steer: finite(self.steer).clamp(-1.0, 1.0),
            aim_yaw: finite(self.aim_yaw),
            aim_pitch: finite(self.aim_pitch),
            ..self.clone()
        }
    }

    pub fn firing() -> Self {
        Self {
            fire: true,
            ..Default::default()
        }
    }
}
