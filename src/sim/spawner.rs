//! Placement policies for new entities
//!
//! - Lane scroll: a fixed belt of hazards that are repositioned far ahead
//!   once they pass the viewer, never destroyed.
//! - Radial: a one-off population of balloons scattered around a focal point.

use glam::Vec3;
use rand::Rng;

use super::entity::Entity;
use super::pool::{EntityHandle, Pool};
use crate::error::SimError;
use crate::presentation::Presenter;
use crate::tuning::{DodgeTuning, SiegeTuning};

/// Acquire a pool slot for `entity` and announce it to the presenter
pub fn spawn(pool: &mut Pool<Entity>, entity: Entity, presenter: &mut impl Presenter) -> Result<EntityHandle, SimError> {
    let kind = entity.kind;
    let position = entity.position;
    let handle = pool.acquire(entity)?;
    let presentation = presenter.on_entity_activated(handle, &kind, position);
    if let Some(e) = pool.get_mut(handle) {
        e.presentation = Some(presentation);
    }
    Ok(handle)
}

/// Uniform sample in `[min, max)`; collapses to `min` for an empty band
fn sample(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

/// Dodge-mode belt of hazards
#[derive(Debug, Clone)]
pub struct LaneScroll {
    pub lanes: Vec<f32>,
    pub hazard_count: u32,
    pub initial_offset: f32,
    pub spacing: f32,
    pub near_threshold: f32,
    pub respawn_base: f32,
    pub respawn_jitter: f32,
    pub hazard_radius: f32,
    /// Height of the hazard's center above the road
    pub ride_height: f32,
}

impl LaneScroll {
    pub fn from_tuning(tuning: &DodgeTuning) -> Self {
        Self {
            lanes: tuning.lanes.clone(),
            hazard_count: tuning.hazard_count,
            initial_offset: tuning.initial_offset,
            spacing: tuning.spacing,
            near_threshold: tuning.near_threshold,
            respawn_base: tuning.respawn_base,
            respawn_jitter: tuning.respawn_jitter,
            hazard_radius: tuning.hazard_radius,
            ride_height: 0.4,
        }
    }

    /// Uniform pick from the lane set (repeats allowed)
    pub fn random_lane(&self, rng: &mut impl Rng) -> f32 {
        if self.lanes.is_empty() {
            return 0.0;
        }
        self.lanes[rng.random_range(0..self.lanes.len())]
    }

    /// Pre-seed the belt at increasing negative offsets. Returns how many were placed.
    pub fn seed(&self, hazards: &mut Pool<Entity>, rng: &mut impl Rng, presenter: &mut impl Presenter) -> usize {
        let mut placed = 0;
        for i in 0..self.hazard_count {
            let z = -(self.initial_offset + i as f32 * self.spacing);
            let x = self.random_lane(rng);
            let hazard = Entity::hazard(Vec3::new(x, self.ride_height, z), self.hazard_radius);
            match spawn(hazards, hazard, presenter) {
                Ok(_) => placed += 1,
                Err(err) => {
                    // A full pool stays full for the rest of the batch
                    err.report();
                    break;
                }
            }
        }
        log::debug!("Seeded {placed} lane hazards");
        placed
    }

    /// Move every hazard that crossed the near threshold back behind the
    /// horizon on a fresh lane. Returns the number of passes.
    pub fn recycle_passed(&self, hazards: &mut Pool<Entity>, rng: &mut impl Rng) -> u32 {
        let mut passes = 0;
        hazards.for_each_active_mut(|_, hazard| {
            if hazard.position.z > self.near_threshold {
                hazard.position.z = -self.respawn_base - rng.random::<f32>() * self.respawn_jitter;
                hazard.position.x = self.random_lane(rng);
                passes += 1;
            }
        });
        passes
    }
}

/// Siege-mode balloon scatter
#[derive(Debug, Clone)]
pub struct Radial {
    pub focal_point: Vec3,
    pub radius_min: f32,
    pub radius_max: f32,
    pub height_min: f32,
    pub height_max: f32,
    pub balloon_radius: f32,
    pub high_value_chance: f32,
}

impl Radial {
    pub fn from_tuning(tuning: &SiegeTuning) -> Self {
        Self {
            focal_point: Vec3::from_array(tuning.focal_point),
            radius_min: tuning.radius_min,
            radius_max: tuning.radius_max,
            height_min: tuning.height_min,
            height_max: tuning.height_max,
            balloon_radius: tuning.balloon_radius,
            high_value_chance: tuning.high_value_chance,
        }
    }

    /// Random angle, radius band and vertical offset around the focal point
    pub fn placement(&self, rng: &mut impl Rng) -> Vec3 {
        let angle = rng.random::<f32>() * std::f32::consts::TAU;
        let radius = sample(rng, self.radius_min, self.radius_max);
        let height = sample(rng, self.height_min, self.height_max);
        self.focal_point + Vec3::new(angle.cos() * radius, height, angle.sin() * radius)
    }

    /// Spawn the round's population. Returns how many were placed.
    pub fn seed(
        &self,
        count: u32,
        targets: &mut Pool<Entity>,
        rng: &mut impl Rng,
        presenter: &mut impl Presenter,
    ) -> usize {
        let mut placed = 0;
        for _ in 0..count {
            let position = self.placement(rng);
            let high_value = rng.random::<f32>() < self.high_value_chance;
            let sway = rng.random::<f32>() * std::f32::consts::TAU;
            let balloon = Entity::balloon(position, self.balloon_radius, high_value, sway);
            match spawn(targets, balloon, presenter) {
                Ok(_) => placed += 1,
                Err(err) => {
                    // A full pool stays full for the rest of the batch
                    err.report();
                    break;
                }
            }
        }
        log::debug!("Seeded {placed}/{count} balloons");
        placed
    }
}

/// Spawn policy selected by the active round's mode
#[derive(Debug, Clone)]
pub enum SpawnPolicy {
    LaneScroll(LaneScroll),
    Radial(Radial),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::RecordingPresenter;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn lanes() -> LaneScroll {
        LaneScroll::from_tuning(&DodgeTuning::default())
    }

    #[test]
    fn test_lane_seed_layout() {
        let policy = lanes();
        let mut pool = Pool::new("hazard", None);
        let mut rng = Pcg32::seed_from_u64(7);
        let mut presenter = RecordingPresenter::new();

        assert_eq!(policy.seed(&mut pool, &mut rng, &mut presenter), 22);
        assert_eq!(presenter.activated_count(), 22);

        let zs: Vec<f32> = pool.iter_active().map(|(_, e)| e.position.z).collect();
        assert_eq!(zs[0], -30.0);
        assert_eq!(zs[1], -50.0);
        assert!(zs.windows(2).all(|w| w[1] < w[0]));
        for (_, e) in pool.iter_active() {
            assert!(policy.lanes.contains(&e.position.x));
            assert!(e.presentation.is_some());
        }
    }

    #[test]
    fn test_passed_hazard_respawns_behind() {
        let policy = lanes();
        let mut pool = Pool::new("hazard", None);
        let mut rng = Pcg32::seed_from_u64(1);
        let passed = pool.acquire(Entity::hazard(Vec3::new(0.0, 0.4, 7.0), 1.0)).unwrap();
        let waiting = pool.acquire(Entity::hazard(Vec3::new(3.0, 0.4, 5.0), 1.0)).unwrap();

        assert_eq!(policy.recycle_passed(&mut pool, &mut rng), 1);

        let e = pool.get(passed).unwrap();
        assert!(e.position.z < -policy.near_threshold);
        assert!(e.position.z <= -policy.respawn_base);
        assert!(policy.lanes.contains(&e.position.x));
        // Still the same live entity: repositioned, not recycled through the pool
        assert_eq!(pool.total_allocated(), 2);
        assert_eq!(pool.get(waiting).unwrap().position.z, 5.0);
    }

    #[test]
    fn test_radial_placement_in_band() {
        let policy = Radial::from_tuning(&SiegeTuning::default());
        let mut rng = Pcg32::seed_from_u64(99);
        for _ in 0..200 {
            let p = policy.placement(&mut rng);
            let offset = p - policy.focal_point;
            let planar = Vec3::new(offset.x, 0.0, offset.z).length();
            assert!(planar >= policy.radius_min - 1e-4 && planar <= policy.radius_max + 1e-4);
            assert!(offset.y >= policy.height_min && offset.y <= policy.height_max);
        }
    }

    #[test]
    fn test_radial_seed_respects_capacity() {
        let policy = Radial::from_tuning(&SiegeTuning::default());
        let mut pool = Pool::new("balloon", Some(4));
        let mut rng = Pcg32::seed_from_u64(3);
        let mut presenter = RecordingPresenter::new();

        assert_eq!(policy.seed(6, &mut pool, &mut rng, &mut presenter), 4);
        assert_eq!(pool.active_count(), 4);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let policy = lanes();
        let layout = |seed| {
            let mut pool = Pool::new("hazard", None);
            let mut rng = Pcg32::seed_from_u64(seed);
            policy.seed(&mut pool, &mut rng, &mut RecordingPresenter::new());
            pool.iter_active().map(|(_, e)| e.position).collect::<Vec<_>>()
        };
        assert_eq!(layout(42), layout(42));
    }
}
