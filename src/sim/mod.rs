//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (pool activation order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entity;
pub mod facility;
pub mod input;
pub mod pool;
pub mod round;
pub mod score;
pub mod spawner;
pub mod state;
pub mod target;
pub mod tick;

pub use collision::{Hit, Struck, find_crash, resolve_hits, spheres_overlap};
pub use entity::{Entity, EntityKind, Launcher};
pub use facility::{Facility, FireOrder};
pub use input::{Intent, TickInput};
pub use pool::{EntityHandle, Pool, Poolable};
pub use round::{CompletionPolicy, GameMode, Round, RoundParams, RoundPhase, UnknownName};
pub use score::ScoreTracker;
pub use spawner::{LaneScroll, Radial, SpawnPolicy};
pub use state::{Avatar, Session, Viewpoint};
pub use target::{HitTarget, SubTarget, TargetHit};
pub use tick::tick;
