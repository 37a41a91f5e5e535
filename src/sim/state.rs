//! Session state and round lifecycle
//!
//! One `Session` owns everything the simulation mutates: pools, score, round
//! phase, RNG. Hosts create it once and drive it with `advance`.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Hit;
use super::entity::{Entity, Launcher};
use super::facility::{Facility, FireOrder, facilities_from_tuning};
use super::input::TickInput;
use super::pool::{EntityHandle, Pool};
use super::round::{GameMode, Round, RoundParams, RoundPhase};
use super::score::ScoreTracker;
use super::spawner::{LaneScroll, Radial, SpawnPolicy, spawn};
use super::target::HitTarget;
use crate::error::SimError;
use crate::presentation::Presenter;
use crate::tuning::{DodgeTuning, SiegeTuning, Tuning};
use crate::{angles_toward, direction_from_angles};

/// The dodge-mode vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Avatar {
    /// Lateral offset from the road center
    pub lateral: f32,
    pub speed: f32,
    pub target_speed: f32,
}

impl Avatar {
    pub fn new(tuning: &DodgeTuning) -> Self {
        Self {
            lateral: 0.0,
            speed: tuning.base_speed,
            target_speed: tuning.base_speed,
        }
    }

    /// The avatar sits at the origin of the travel axis; hazards come to it
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.lateral, 0.4, 0.0)
    }

    /// Apply steering and throttle for one tick
    pub fn drive(&mut self, input: &TickInput, tuning: &DodgeTuning, dt: f32) {
        self.lateral = (self.lateral + input.steer * tuning.steer_rate * dt)
            .clamp(-tuning.max_lateral, tuning.max_lateral);

        if input.accelerate {
            self.target_speed = (self.target_speed + tuning.accel_rate * dt).min(tuning.max_speed);
        } else {
            self.target_speed = tuning.base_speed;
        }
        if input.brake {
            self.target_speed = (self.target_speed - tuning.brake_rate * dt).max(tuning.min_speed);
        }

        let blend = (tuning.speed_response * dt).min(1.0);
        self.speed += (self.target_speed - self.speed) * blend;
    }
}

/// Where viewpoint shots come from and where they go
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewpoint {
    pub origin: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Viewpoint {
    pub fn looking_at(origin: Vec3, target: Vec3) -> Self {
        let (yaw, pitch) = angles_toward(origin, target);
        Self { origin, yaw, pitch }
    }

    pub fn aim(&self) -> Vec3 {
        direction_from_angles(self.yaw, self.pitch)
    }

    /// Apply an aim delta. Non-finite deltas are ignored.
    pub fn turn(&mut self, yaw: f32, pitch: f32, max_pitch: f32) {
        if yaw.is_finite() {
            self.yaw = crate::normalize_angle(self.yaw + yaw);
        }
        if pitch.is_finite() {
            self.pitch = (self.pitch + pitch).clamp(-max_pitch, max_pitch);
        }
    }
}

/// Buffers reused every frame so steady-state play allocates nothing
#[derive(Debug, Clone, Default)]
pub(crate) struct FrameScratch {
    pub expired: Vec<EntityHandle>,
    pub hits: Vec<Hit>,
}

/// Session context: all mutable simulation state
#[derive(Debug, Clone)]
pub struct Session {
    /// Session seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    pub round: Round,
    pub score: ScoreTracker,
    /// Attack entities
    pub projectiles: Pool<Entity>,
    /// Pop targets (balloons)
    pub targets: Pool<Entity>,
    /// Lane-scroll obstacles
    pub hazards: Pool<Entity>,
    /// Static objective (castle)
    pub objective: HitTarget,
    pub facilities: Vec<Facility>,
    pub avatar: Avatar,
    pub viewpoint: Viewpoint,
    /// Spawn policy of the current round
    pub policy: Option<SpawnPolicy>,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub(crate) scratch: FrameScratch,
}

impl Session {
    /// Create a session with the given seed (`new_session`)
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let objective = build_objective(&tuning.siege, &mut rng);
        let facilities = facilities_from_tuning(&tuning.siege);
        log::info!("New session, seed {seed}, {} facilities", facilities.len());

        Self {
            seed,
            rng,
            score: ScoreTracker::new(&tuning),
            round: Round::new(),
            projectiles: Pool::new("projectile", tuning.projectile_capacity),
            targets: Pool::new("balloon", tuning.target_capacity),
            hazards: Pool::new("hazard", tuning.hazard_capacity),
            objective,
            facilities,
            avatar: Avatar::new(&tuning.dodge),
            viewpoint: viewpoint_for(&tuning.siege),
            policy: None,
            time_ticks: 0,
            scratch: FrameScratch::default(),
            tuning,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.round.phase
    }

    /// Live pop targets
    pub fn population(&self) -> usize {
        self.targets.active_count()
    }

    /// Selecting -> Active: clear leftovers, reset score, seed the mode's spawner
    pub fn start_round(&mut self, params: RoundParams, presenter: &mut impl Presenter) -> Result<(), SimError> {
        self.round.begin(params)?;
        self.clear_entities(presenter);
        self.score.reset();
        self.exit_focus_mode();
        for facility in &mut self.facilities {
            facility.fire_timer = 0.0;
        }
        self.avatar = Avatar::new(&self.tuning.dodge);
        self.viewpoint = viewpoint_for(&self.tuning.siege);

        let policy = match params.mode {
            GameMode::Siege => {
                let radial = Radial::from_tuning(&self.tuning.siege);
                let count = self.tuning.siege.population_for_level(params.level);
                radial.seed(count, &mut self.targets, &mut self.rng, presenter);
                SpawnPolicy::Radial(radial)
            }
            GameMode::Dodge => {
                let lanes = LaneScroll::from_tuning(&self.tuning.dodge);
                lanes.seed(&mut self.hazards, &mut self.rng, presenter);
                SpawnPolicy::LaneScroll(lanes)
            }
        };
        self.policy = Some(policy);

        log::info!(
            "Round started: {} level {} ({:?}), population {}",
            params.mode.as_str(),
            params.level,
            params.completion,
            self.population()
        );
        presenter.on_score_changed(self.score.points, self.score.combo);
        presenter.on_round_state_changed(self.round.phase);
        Ok(())
    }

    /// Active -> Selecting, force-recycling everything in flight
    pub fn abort_round(&mut self, presenter: &mut impl Presenter) -> Result<(), SimError> {
        self.round.abort()?;
        self.enter_selecting(presenter);
        log::info!("Round aborted");
        Ok(())
    }

    /// Resolved | Crashed -> Selecting
    pub fn return_to_menu(&mut self, presenter: &mut impl Presenter) -> Result<(), SimError> {
        self.round.return_to_menu()?;
        self.enter_selecting(presenter);
        log::info!("Back to round selection");
        Ok(())
    }

    fn enter_selecting(&mut self, presenter: &mut impl Presenter) {
        self.clear_entities(presenter);
        self.exit_focus_mode();
        self.policy = None;
        presenter.on_round_state_changed(self.round.phase);
    }

    /// Force-recycle every active entity in every pool
    pub fn clear_entities(&mut self, presenter: &mut impl Presenter) {
        let mut notify = |_: EntityHandle, e: &Entity| {
            if let Some(presentation) = e.presentation {
                presenter.on_entity_released(presentation);
            }
        };
        self.projectiles.release_all(&mut notify);
        self.targets.release_all(&mut notify);
        self.hazards.release_all(&mut notify);
    }

    /// Hand a facility to the player (siege rounds only)
    pub fn enter_focus_mode(&mut self, facility_id: usize) -> Result<(), SimError> {
        if !self.round.is_active() || self.round.mode() != Some(GameMode::Siege) {
            return Err(SimError::IllegalTransition {
                from: self.round.phase,
                request: "enter focus mode",
            });
        }
        if facility_id >= self.facilities.len() {
            return Err(SimError::UnknownFacility(facility_id));
        }
        for facility in &mut self.facilities {
            facility.focused = facility.id == facility_id;
        }
        log::debug!("Focused facility {facility_id}");
        Ok(())
    }

    pub fn exit_focus_mode(&mut self) {
        for facility in &mut self.facilities {
            facility.focused = false;
        }
    }

    pub fn focused_facility(&self) -> Option<usize> {
        self.facilities.iter().find(|f| f.focused).map(|f| f.id)
    }

    /// Player fire in an active siege round: from the focused facility if any,
    /// else from the viewpoint
    pub fn fire(&mut self, presenter: &mut impl Presenter) -> Result<EntityHandle, SimError> {
        if !self.round.is_active() || self.round.mode() != Some(GameMode::Siege) {
            return Err(SimError::IllegalTransition {
                from: self.round.phase,
                request: "fire",
            });
        }
        let aim = self.viewpoint.aim();
        let (order, launcher) = match self.facilities.iter().find(|f| f.focused) {
            Some(facility) => (facility.aimed(aim), Launcher::Facility),
            None => (
                FireOrder {
                    origin: self.viewpoint.origin,
                    direction: aim,
                },
                Launcher::Player,
            ),
        };
        launch(&mut self.projectiles, &self.tuning.siege, order, launcher, presenter)
    }

    /// Advance one timestep
    pub fn advance(&mut self, input: &TickInput, presenter: &mut impl Presenter, dt: f32) {
        super::tick::tick(self, input, presenter, dt);
    }
}

/// Spawn a projectile for a fire order
pub(crate) fn launch(
    projectiles: &mut Pool<Entity>,
    tuning: &SiegeTuning,
    order: FireOrder,
    launcher: Launcher,
    presenter: &mut impl Presenter,
) -> Result<EntityHandle, SimError> {
    let speed = match launcher {
        Launcher::Player => tuning.player_shot_speed,
        Launcher::Facility => tuning.facility_shot_speed,
    };
    let shot = Entity::projectile(
        launcher,
        order.origin,
        order.direction * speed,
        tuning.projectile_life,
        tuning.projectile_radius,
    );
    spawn(projectiles, shot, presenter)
}

/// Release `handle` and tell the presenter its visual can go
pub(crate) fn release_entity(
    pool: &mut Pool<Entity>,
    handle: EntityHandle,
    presenter: &mut impl Presenter,
) -> Result<(), SimError> {
    let presentation = pool.get(handle).and_then(|e| e.presentation);
    pool.release(handle)?;
    if let Some(presentation) = presentation {
        presenter.on_entity_released(presentation);
    }
    Ok(())
}

fn build_objective(tuning: &SiegeTuning, rng: &mut Pcg32) -> HitTarget {
    use rand::Rng;

    let center = Vec3::from_array(tuning.objective_center);
    let mut objective = HitTarget::new(center, tuning.objective_radius);
    for (i, offset) in tuning.sub_target_offsets.iter().enumerate() {
        let jitter = rng.random::<f32>() * tuning.sub_target_jitter;
        let sub_center = center + Vec3::from_array(*offset) + Vec3::Y * jitter;
        objective = objective.with_sub_target(format!("banner-{i}"), sub_center, tuning.sub_target_radius);
    }
    objective
}

fn viewpoint_for(tuning: &SiegeTuning) -> Viewpoint {
    Viewpoint::looking_at(
        Vec3::from_array(tuning.viewpoint_origin),
        Vec3::from_array(tuning.viewpoint_look_at),
    )
}
