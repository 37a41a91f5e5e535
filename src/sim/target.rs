//! Static hit-targets: a coarse body plus higher-value sub-targets

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::spheres_overlap;

/// A named sphere on the target that scores as a higher-value hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTarget {
    pub name: String,
    pub center: Vec3,
    pub radius: f32,
}

/// How a probe struck a `HitTarget`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetHit {
    /// Only the coarse body
    Body,
    /// A sub-target (index into `sub_targets`); the body hit is implied, not counted again
    SubTarget(usize),
}

impl TargetHit {
    pub fn is_sub_target(&self) -> bool {
        matches!(self, TargetHit::SubTarget(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitTarget {
    pub center: Vec3,
    pub radius: f32,
    pub sub_targets: Vec<SubTarget>,
}

impl HitTarget {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            sub_targets: Vec::new(),
        }
    }

    pub fn with_sub_target(mut self, name: impl Into<String>, center: Vec3, radius: f32) -> Self {
        self.sub_targets.push(SubTarget {
            name: name.into(),
            center,
            radius,
        });
        self
    }

    /// Test a probe sphere against the target.
    ///
    /// Sub-targets are checked first and win the classification; a probe
    /// touching both a sub-target and the body is a single sub-target hit.
    pub fn hit_test(&self, point: Vec3, probe_radius: f32) -> Option<TargetHit> {
        if let Some(index) = self
            .sub_targets
            .iter()
            .position(|t| spheres_overlap(point, probe_radius, t.center, t.radius))
        {
            return Some(TargetHit::SubTarget(index));
        }
        if spheres_overlap(point, probe_radius, self.center, self.radius) {
            return Some(TargetHit::Body);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn castle() -> HitTarget {
        HitTarget::new(Vec3::new(0.0, 6.0, -6.0), 3.0).with_sub_target(
            "banner",
            Vec3::new(2.0, 8.2, -4.0),
            0.25,
        )
    }

    #[test]
    fn test_body_hit() {
        let hit = castle().hit_test(Vec3::new(0.0, 6.0, -4.0), 0.15);
        assert_eq!(hit, Some(TargetHit::Body));
    }

    #[test]
    fn test_sub_target_takes_precedence() {
        // Banner sits just outside the body; nudge a probe into both
        let target = HitTarget::new(Vec3::ZERO, 3.0).with_sub_target("banner", Vec3::new(2.9, 0.0, 0.0), 0.25);
        let hit = target.hit_test(Vec3::new(2.8, 0.0, 0.0), 0.1);
        assert_eq!(hit, Some(TargetHit::SubTarget(0)));
    }

    #[test]
    fn test_sub_target_outside_body() {
        let hit = castle().hit_test(Vec3::new(2.0, 8.3, -4.0), 0.15);
        assert_eq!(hit, Some(TargetHit::SubTarget(0)));
    }

    #[test]
    fn test_miss() {
        assert_eq!(castle().hit_test(Vec3::new(10.0, 0.0, 0.0), 0.15), None);
    }
}
