//! Fixed timestep simulation tick
//!
//! Frame order while a round is active:
//! 1. apply input (focus, steering, aim, fire)
//! 2. spawner bookkeeping (lane recycling, cannon auto-fire, hazard scroll speed)
//! 3. motion
//! 4. lifetime and floor expiry
//! 5. scoring collisions
//! 6. fatal collision (dodge only)
//! 7. combo decay
//! 8. round evaluation, then any requested abort
//!
//! Passes 4 to 6 collect first and release afterwards, so no pool changes
//! while it is being walked.

use glam::Vec3;

use super::collision::{Struck, find_crash, resolve_hits};
use super::entity::{Entity, EntityKind, Launcher};
use super::input::TickInput;
use super::pool::EntityHandle;
use super::round::{GameMode, RoundPhase};
use super::spawner::SpawnPolicy;
use super::state::{Session, launch, release_entity};
use crate::presentation::Presenter;

/// Advance the session by one fixed timestep
pub fn tick(session: &mut Session, input: &TickInput, presenter: &mut impl Presenter, dt: f32) {
    session.time_ticks += 1;

    // Nothing moves outside an active round
    if !session.round.is_active() {
        return;
    }
    let Some(mode) = session.round.mode() else {
        return;
    };
    session.round.elapsed += dt;

    let input = &input.sanitized();
    apply_input(session, input, mode, presenter, dt);
    spawner_step(session, mode, presenter, dt);
    motion_step(session, presenter, dt);
    expiry_step(session, presenter, dt);
    scoring_step(session, mode, presenter);
    if mode == GameMode::Dodge {
        fatal_step(session);
    }

    let combo = session.score.combo;
    session.score.decay(dt);
    if session.score.combo != combo {
        presenter.on_score_changed(session.score.points, session.score.combo);
    }

    evaluate_step(session, presenter);

    if input.abort && session.round.is_active() {
        if let Err(err) = session.abort_round(presenter) {
            err.report();
        }
    }
}

fn apply_input(session: &mut Session, input: &TickInput, mode: GameMode, presenter: &mut impl Presenter, dt: f32) {
    match mode {
        GameMode::Dodge => {
            session.avatar.drive(input, &session.tuning.dodge, dt);
        }
        GameMode::Siege => {
            match input.focus {
                Some(Some(id)) => {
                    if let Err(err) = session.enter_focus_mode(id) {
                        err.report();
                    }
                }
                Some(None) => session.exit_focus_mode(),
                None => {}
            }

            let max_pitch = session.tuning.siege.max_pitch;
            session.viewpoint.turn(input.aim_yaw, input.aim_pitch, max_pitch);

            if input.fire {
                if let Err(err) = session.fire(presenter) {
                    err.report();
                }
            }
        }
    }
}

fn spawner_step(session: &mut Session, mode: GameMode, presenter: &mut impl Presenter, dt: f32) {
    match (&session.policy, mode) {
        (Some(SpawnPolicy::LaneScroll(lanes)), GameMode::Dodge) => {
            let passes = lanes.recycle_passed(&mut session.hazards, &mut session.rng);
            if passes > 0 {
                for _ in 0..passes {
                    session.score.on_pass();
                }
                presenter.on_score_changed(session.score.points, session.score.combo);
            }

            // The world scrolls toward the avatar at its current speed
            let scroll = Vec3::new(0.0, 0.0, session.avatar.speed);
            session.hazards.for_each_active_mut(|_, hazard| hazard.velocity = scroll);
        }
        (_, GameMode::Siege) => {
            for facility in &mut session.facilities {
                let Some(order) = facility.update(dt, &session.tuning.siege, &mut session.rng) else {
                    continue;
                };
                if let Err(err) = launch(
                    &mut session.projectiles,
                    &session.tuning.siege,
                    order,
                    Launcher::Facility,
                    presenter,
                ) {
                    err.report();
                }
            }
        }
        _ => {}
    }
}

fn motion_step(session: &mut Session, presenter: &mut impl Presenter, dt: f32) {
    let gravity = session.tuning.gravity;
    let sway_lateral = session.tuning.siege.sway_lateral;
    let sway_vertical = session.tuning.siege.sway_vertical;

    let mut step = |_: EntityHandle, e: &mut Entity| {
        if let EntityKind::Balloon { sway, .. } = &mut e.kind {
            *sway += dt;
            let phase = *sway;
            e.velocity = Vec3::new(phase.sin() * sway_lateral, (phase * 1.5).sin() * sway_vertical, 0.0);
        }
        e.integrate(dt, gravity);
        if let Some(presentation) = e.presentation {
            presenter.on_entity_moved(presentation, e.position);
        }
    };
    session.projectiles.for_each_active_mut(&mut step);
    session.targets.for_each_active_mut(&mut step);
    session.hazards.for_each_active_mut(&mut step);
}

fn expiry_step(session: &mut Session, presenter: &mut impl Presenter, dt: f32) {
    let expired = &mut session.scratch.expired;

    expired.clear();
    session.projectiles.for_each_active_mut(|handle, shot| {
        if shot.age(dt) {
            expired.push(handle);
        }
    });
    for &handle in expired.iter() {
        if let Err(err) = release_entity(&mut session.projectiles, handle, presenter) {
            err.report();
        }
    }

    // Balloons that sink below the floor leave the round for good
    let floor = session.tuning.siege.floor_y;
    expired.clear();
    session.targets.for_each_active_mut(|handle, target| {
        if target.age(dt) || target.position.y < floor {
            expired.push(handle);
        }
    });
    if !expired.is_empty() {
        session.round.population_check = true;
    }
    for &handle in expired.iter() {
        if let Err(err) = release_entity(&mut session.targets, handle, presenter) {
            err.report();
        }
    }
}

fn scoring_step(session: &mut Session, mode: GameMode, presenter: &mut impl Presenter) {
    let objective = (mode == GameMode::Siege).then_some(&session.objective);
    resolve_hits(
        &session.projectiles,
        objective,
        &session.targets,
        &session.tuning.points,
        &mut session.scratch.hits,
    );

    for hit in &session.scratch.hits {
        if let Err(err) = release_entity(&mut session.projectiles, hit.attacker, presenter) {
            err.report();
        }
        match hit.struck {
            Struck::Objective(target) => {
                session.round.objective_hit = true;
                presenter.on_objective_hit(target.is_sub_target());
                log::debug!("Objective hit ({target:?}) by {:?}", hit.launcher);
            }
            Struck::Target { handle, .. } => {
                if let Err(err) = release_entity(&mut session.targets, handle, presenter) {
                    err.report();
                }
                session.round.population_check = true;
            }
        }
        session.score.on_hit(hit.base_points, hit.launcher.is_facility());
        presenter.on_score_changed(session.score.points, session.score.combo);
    }
}

fn fatal_step(session: &mut Session) {
    let dodge = &session.tuning.dodge;
    let avatar = session.avatar.position();
    if let Some(hazard) = find_crash(avatar, &session.hazards, dodge.crash_lateral, dodge.crash_longitudinal) {
        log::debug!("Avatar struck hazard {hazard:?} at lateral {:.2}", avatar.x);
        session.round.crash_pending = true;
    }
}

fn evaluate_step(session: &mut Session, presenter: &mut impl Presenter) {
    let population = session.population();
    let Some(phase) = session.round.evaluate(population) else {
        return;
    };
    match phase {
        RoundPhase::Crashed => log::info!(
            "Crashed after {:.1}s with {} points",
            session.round.elapsed,
            session.score.points
        ),
        _ => log::info!(
            "Round resolved after {:.1}s with {} points",
            session.round.elapsed,
            session.score.points
        ),
    }
    session.exit_focus_mode();
    presenter.on_round_state_changed(phase);
}
