//! Collision detection for the frame's scoring and fatal passes
//!
//! Both passes only read the pools and write their findings into a caller
//! owned buffer; releasing entities and scoring happen afterwards, so the
//! active set never changes while it is being walked.

use glam::Vec3;

use super::entity::{Entity, EntityKind, Launcher};
use super::pool::{EntityHandle, Pool};
use super::target::{HitTarget, TargetHit};
use crate::tuning::PointValues;

/// Point-vs-sphere / sphere-vs-sphere overlap (strict)
#[inline]
pub fn spheres_overlap(a: Vec3, a_radius: f32, b: Vec3, b_radius: f32) -> bool {
    a.distance(b) < a_radius + b_radius
}

/// What an attack entity struck
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Struck {
    /// The static objective (body or sub-target)
    Objective(TargetHit),
    /// A pooled pop target
    Target { handle: EntityHandle, high_value: bool },
}

/// One resolved score-affecting hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub attacker: EntityHandle,
    pub launcher: Launcher,
    pub struck: Struck,
    /// Value before combo and facility multipliers
    pub base_points: u32,
}

/// Scoring pass: at most one hit per attack entity.
///
/// Each projectile tests the static objective first, then the dynamic targets
/// in pool order, and stops at the first hit. A target already claimed by an
/// earlier projectile this frame is skipped so nothing is released twice.
pub fn resolve_hits(
    projectiles: &Pool<Entity>,
    objective: Option<&HitTarget>,
    targets: &Pool<Entity>,
    points: &PointValues,
    hits: &mut Vec<Hit>,
) {
    hits.clear();

    for (attacker, shot) in projectiles.iter_active() {
        let launcher = match shot.kind {
            EntityKind::Projectile { launcher } => launcher,
            EntityKind::Balloon { .. } | EntityKind::Hazard => continue,
        };

        if let Some(hit) = objective.and_then(|o| o.hit_test(shot.position, shot.radius)) {
            let base_points = match hit {
                TargetHit::Body => points.objective_body,
                TargetHit::SubTarget(_) => points.objective_sub_target,
            };
            hits.push(Hit {
                attacker,
                launcher,
                struck: Struck::Objective(hit),
                base_points,
            });
            continue;
        }

        for (handle, target) in targets.iter_active() {
            let high_value = match target.kind {
                EntityKind::Balloon { high_value, .. } => high_value,
                EntityKind::Projectile { .. } | EntityKind::Hazard => continue,
            };
            if !spheres_overlap(shot.position, shot.radius, target.position, target.radius) {
                continue;
            }
            let claimed = hits
                .iter()
                .any(|h| matches!(h.struck, Struck::Target { handle: taken, .. } if taken == handle));
            if claimed {
                continue;
            }
            hits.push(Hit {
                attacker,
                launcher,
                struck: Struck::Target { handle, high_value },
                base_points: if high_value {
                    points.balloon_high_value
                } else {
                    points.balloon
                },
            });
            break;
        }
    }
}

/// Fatal pass for dodge mode: first hazard inside the lateral/longitudinal box around the avatar
pub fn find_crash(
    avatar: Vec3,
    hazards: &Pool<Entity>,
    lateral: f32,
    longitudinal: f32,
) -> Option<EntityHandle> {
    hazards
        .iter_active()
        .find(|(_, hazard)| {
            (hazard.position.x - avatar.x).abs() < lateral
                && (hazard.position.z - avatar.z).abs() < longitudinal
        })
        .map(|(handle, _)| handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shot(pool: &mut Pool<Entity>, launcher: Launcher, at: Vec3) -> EntityHandle {
        pool.acquire(Entity::projectile(launcher, at, Vec3::ZERO, 2.5, 0.15))
            .unwrap()
    }

    fn balloon(pool: &mut Pool<Entity>, at: Vec3, high_value: bool) -> EntityHandle {
        pool.acquire(Entity::balloon(at, 0.6, high_value, 0.0)).unwrap()
    }

    fn castle() -> HitTarget {
        HitTarget::new(Vec3::new(0.0, 6.0, -6.0), 3.0).with_sub_target(
            "banner",
            Vec3::new(2.0, 8.2, -4.0),
            0.25,
        )
    }

    #[test]
    fn test_overlap_is_strict() {
        assert!(!spheres_overlap(Vec3::ZERO, 0.5, Vec3::new(1.0, 0.0, 0.0), 0.5));
        assert!(spheres_overlap(Vec3::ZERO, 0.5, Vec3::new(0.99, 0.0, 0.0), 0.5));
    }

    #[test]
    fn test_objective_checked_before_targets() {
        let mut projectiles = Pool::new("projectile", None);
        let mut targets = Pool::new("balloon", None);
        let at = Vec3::new(0.0, 6.0, -4.0);
        shot(&mut projectiles, Launcher::Player, at);
        balloon(&mut targets, at, false);

        let mut hits = Vec::new();
        resolve_hits(&projectiles, Some(&castle()), &targets, &PointValues::default(), &mut hits);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].struck, Struck::Objective(TargetHit::Body));
        assert_eq!(hits[0].base_points, 250);
    }

    #[test]
    fn test_sub_target_value() {
        let mut projectiles = Pool::new("projectile", None);
        let targets = Pool::new("balloon", None);
        shot(&mut projectiles, Launcher::Facility, Vec3::new(2.0, 8.2, -4.0));

        let mut hits = Vec::new();
        resolve_hits(&projectiles, Some(&castle()), &targets, &PointValues::default(), &mut hits);

        assert_eq!(hits[0].base_points, 500);
        assert_eq!(hits[0].launcher, Launcher::Facility);
    }

    #[test]
    fn test_one_hit_per_attacker() {
        let mut projectiles = Pool::new("projectile", None);
        let mut targets = Pool::new("balloon", None);
        let at = Vec3::new(10.0, 5.0, -10.0);
        shot(&mut projectiles, Launcher::Player, at);
        let first = balloon(&mut targets, at, true);
        balloon(&mut targets, at + Vec3::X * 0.2, false);

        let mut hits = Vec::new();
        resolve_hits(&projectiles, None, &targets, &PointValues::default(), &mut hits);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].struck, Struck::Target { handle: first, high_value: true });
        assert_eq!(hits[0].base_points, 200);
    }

    #[test]
    fn test_target_not_claimed_twice() {
        let mut projectiles = Pool::new("projectile", None);
        let mut targets = Pool::new("balloon", None);
        let at = Vec3::new(10.0, 5.0, -10.0);
        shot(&mut projectiles, Launcher::Player, at);
        shot(&mut projectiles, Launcher::Player, at);
        balloon(&mut targets, at, false);

        let mut hits = Vec::new();
        resolve_hits(&projectiles, None, &targets, &PointValues::default(), &mut hits);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_hits_bounded_by_attackers() {
        let mut projectiles = Pool::new("projectile", None);
        let mut targets = Pool::new("balloon", None);
        for i in 0..3 {
            shot(&mut projectiles, Launcher::Player, Vec3::new(i as f32 * 0.1, 0.0, 0.0));
        }
        for i in 0..10 {
            balloon(&mut targets, Vec3::new(i as f32 * 0.05, 0.0, 0.0), false);
        }

        let mut hits = Vec::new();
        resolve_hits(&projectiles, None, &targets, &PointValues::default(), &mut hits);
        assert!(hits.len() <= projectiles.active_count());
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_crash_box() {
        let mut hazards = Pool::new("hazard", None);
        hazards.acquire(Entity::hazard(Vec3::new(3.0, 0.4, -1.0), 1.0)).unwrap();
        assert_eq!(find_crash(Vec3::ZERO, &hazards, 1.0, 1.8), None);

        let close = hazards.acquire(Entity::hazard(Vec3::new(0.5, 0.4, 1.5), 1.0)).unwrap();
        assert_eq!(find_crash(Vec3::ZERO, &hazards, 1.0, 1.8), Some(close));
    }

    proptest! {
        #[test]
        fn prop_hits_bounded_and_targets_unique(
            shots in proptest::collection::vec((-3.0f32..3.0, -3.0f32..3.0, any::<bool>()), 0..24),
            balloons in proptest::collection::vec((-3.0f32..3.0, -3.0f32..3.0, any::<bool>()), 0..24),
            with_objective in any::<bool>(),
        ) {
            let mut projectiles = Pool::new("projectile", None);
            let mut targets = Pool::new("balloon", None);
            for (x, y, facility) in shots {
                let launcher = if facility { Launcher::Facility } else { Launcher::Player };
                shot(&mut projectiles, launcher, Vec3::new(x, y, -6.0));
            }
            for (x, y, high_value) in balloons {
                balloon(&mut targets, Vec3::new(x, y, -6.0), high_value);
            }
            let castle = HitTarget::new(Vec3::new(0.0, 0.0, -6.0), 1.0);
            let objective = with_objective.then_some(&castle);

            let mut hits = Vec::new();
            resolve_hits(&projectiles, objective, &targets, &PointValues::default(), &mut hits);

            prop_assert!(hits.len() <= projectiles.active_count());
            let mut attackers: Vec<EntityHandle> = hits.iter().map(|h| h.attacker).collect();
            attackers.sort();
            attackers.dedup();
            prop_assert_eq!(attackers.len(), hits.len());

            let mut struck: Vec<EntityHandle> = hits
                .iter()
                .filter_map(|h| match h.struck {
                    Struck::Target { handle, .. } => Some(handle),
                    Struck::Objective(_) => None,
                })
                .collect();
            let claimed = struck.len();
            struck.sort();
            struck.dedup();
            prop_assert_eq!(struck.len(), claimed);
        }
    }
}
