//! Point accumulation with a time-decaying combo multiplier

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTracker {
    pub points: u64,
    /// Always within `[1, combo_max]`
    pub combo: f32,
    pub combo_timer: f32,
    combo_max: f32,
    combo_step: f32,
    combo_reset_seconds: f32,
    facility_bonus: u32,
}

impl ScoreTracker {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            points: 0,
            combo: 1.0,
            combo_timer: 0.0,
            combo_max: tuning.combo_max,
            combo_step: tuning.combo_step,
            combo_reset_seconds: tuning.combo_reset_seconds,
            facility_bonus: tuning.facility_bonus,
        }
    }

    /// Register a hit worth `base_points` before multipliers
    pub fn on_hit(&mut self, base_points: u32, launched_from_facility: bool) {
        let bonus = if launched_from_facility { self.facility_bonus } else { 1 };
        let awarded = (base_points as f32 * self.combo * bonus as f32).floor() as u64;
        self.points += awarded;
        self.combo = (self.combo + self.combo_step * bonus as f32).min(self.combo_max);
        self.combo_timer = self.combo_reset_seconds;
    }

    /// Flat point for a dodged hazard; no multiplier, no combo change
    pub fn on_pass(&mut self) {
        self.points += 1;
    }

    /// Run the combo timer down; the combo snaps back to 1 when it expires
    pub fn decay(&mut self, dt: f32) {
        if self.combo > 1.0 {
            self.combo_timer -= dt;
            if self.combo_timer <= 0.0 {
                self.combo = 1.0;
                self.combo_timer = 0.0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.points = 0;
        self.combo = 1.0;
        self.combo_timer = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tracker() -> ScoreTracker {
        ScoreTracker::new(&Tuning::default())
    }

    #[test]
    fn test_hit_then_decay() {
        let mut score = tracker();
        score.on_hit(100, false);
        assert_eq!(score.points, 100);
        assert_eq!(score.combo, 1.25);

        // Not yet expired
        score.decay(2.5);
        assert_eq!(score.combo, 1.25);

        score.decay(0.5);
        assert_eq!(score.combo, 1.0);
        assert_eq!(score.combo_timer, 0.0);
    }

    #[test]
    fn test_facility_bonus() {
        let mut score = tracker();
        score.on_hit(100, true);
        assert_eq!(score.points, 200);
        assert_eq!(score.combo, 1.5);
    }

    #[test]
    fn test_points_are_floored_per_hit() {
        let mut score = tracker();
        score.on_hit(100, false); // combo now 1.25
        score.on_hit(3, false); // 3 * 1.25 = 3.75
        assert_eq!(score.points, 103);
    }

    #[test]
    fn test_combo_caps_at_max() {
        let mut score = tracker();
        for _ in 0..40 {
            score.on_hit(10, true);
        }
        assert_eq!(score.combo, 5.0);
    }

    #[test]
    fn test_hit_refreshes_timer() {
        let mut score = tracker();
        score.on_hit(100, false);
        score.decay(2.0);
        score.on_hit(100, false);
        score.decay(2.0);
        assert_eq!(score.combo, 1.5);
    }

    #[test]
    fn test_pass_scores_flat_point() {
        let mut score = tracker();
        score.on_hit(100, false);
        score.on_pass();
        assert_eq!(score.points, 101);
        assert_eq!(score.combo, 1.25);
    }

    #[test]
    fn test_reset() {
        let mut score = tracker();
        score.on_hit(500, true);
        score.reset();
        assert_eq!(score.points, 0);
        assert_eq!(score.combo, 1.0);
        assert_eq!(score.combo_timer, 0.0);
    }

    proptest! {
        #[test]
        fn prop_combo_stays_in_bounds(
            steps in proptest::collection::vec((any::<bool>(), 0u32..1000, any::<bool>(), 0.0f32..2.0), 0..100)
        ) {
            let mut score = tracker();
            for (hit, base, facility, dt) in steps {
                let before = score.combo;
                if hit {
                    score.on_hit(base, facility);
                    prop_assert!(score.combo >= before);
                } else {
                    score.decay(dt);
                    prop_assert!(score.combo <= before);
                }
                prop_assert!(score.combo >= 1.0 && score.combo <= 5.0);
            }
        }
    }
}
