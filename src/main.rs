//! Castle Pop headless runner
//!
//! Drives a session with a scripted autopilot through the same fixed-step
//! accumulator a windowed host would use, and logs how each round went.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use anyhow::{Context, Result, bail};
    use clap::Parser;
    use glam::Vec3;

    use castle_pop::consts::*;
    use castle_pop::sim::{
        CompletionPolicy, EntityHandle, EntityKind, GameMode, Intent, RoundParams, RoundPhase, Session, TickInput,
    };
    use castle_pop::{PresentationRef, Presenter, Tuning, angles_toward};

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Run Castle Pop rounds without a window", long_about = None)]
    struct Args {
        /// Session seed
        #[arg(long, default_value_t = 12345)]
        seed: u64,
        /// siege or dodge
        #[arg(long, default_value = "siege")]
        mode: GameMode,
        /// Starting level (siege population grows with it)
        #[arg(long, default_value_t = 1)]
        level: u32,
        /// Siege completion: objective, population or endless
        #[arg(long, default_value = "objective")]
        completion: CompletionPolicy,
        /// Rounds to play back to back
        #[arg(long, default_value_t = 1)]
        rounds: u32,
        /// Wall-clock budget per round
        #[arg(long, default_value_t = 60.0)]
        seconds: f32,
        /// Host frame rate fed into the accumulator
        #[arg(long, default_value_t = 60.0)]
        fps: f32,
        /// JSON tuning overrides
        #[arg(long)]
        tuning: Option<PathBuf>,
    }

    /// Counts what a renderer would have drawn
    #[derive(Debug, Default)]
    struct Tally {
        next_ref: u64,
        live: i64,
        objective_hits: u32,
        points: u64,
    }

    impl Presenter for Tally {
        fn on_entity_activated(&mut self, _handle: EntityHandle, _kind: &EntityKind, _position: Vec3) -> PresentationRef {
            self.next_ref += 1;
            self.live += 1;
            PresentationRef(self.next_ref)
        }

        fn on_entity_released(&mut self, _presentation: PresentationRef) {
            self.live -= 1;
        }

        fn on_score_changed(&mut self, points: u64, _combo: f32) {
            self.points = points;
        }

        fn on_objective_hit(&mut self, bonus: bool) {
            self.objective_hits += 1;
            log::debug!("Objective struck{}", if bonus { " (banner)" } else { "" });
        }
    }

    /// Scripted player: shoots balloons in siege, dodges hazards in dodge
    struct Autopilot {
        ticks: u64,
    }

    impl Autopilot {
        fn intents(&mut self, session: &Session) -> Vec<Intent> {
            self.ticks += 1;
            match session.round.mode() {
                Some(GameMode::Siege) => self.siege(session),
                Some(GameMode::Dodge) => self.dodge(session),
                None => Vec::new(),
            }
        }

        fn siege(&self, session: &Session) -> Vec<Intent> {
            let mut intents = Vec::new();
            let Some(target) = session.targets.iter_active().next().map(|(_, b)| b.position) else {
                return intents;
            };
            let view = &session.viewpoint;
            let (yaw, pitch) = angles_toward(view.origin, target);
            intents.push(Intent::AimDelta {
                yaw: castle_pop::normalize_angle(yaw - view.yaw),
                pitch: pitch - view.pitch,
            });
            if self.ticks % 20 == 0 {
                intents.push(Intent::Fire);
            }
            intents
        }

        fn dodge(&self, session: &Session) -> Vec<Intent> {
            let tuning = &session.tuning.dodge;
            let avatar = session.avatar.lateral;
            let blocked = |lane: f32| {
                session.hazards.iter_active().any(|(_, h)| {
                    (h.position.x - lane).abs() < tuning.crash_lateral && h.position.z < 2.0 && h.position.z > -25.0
                })
            };

            // Head for the closest open lane
            let goal = tuning
                .lanes
                .iter()
                .copied()
                .filter(|&lane| !blocked(lane))
                .min_by(|a, b| (a - avatar).abs().total_cmp(&(b - avatar).abs()));

            let mut intents = vec![Intent::Accelerate];
            match goal {
                Some(lane) if lane < avatar - 0.1 => intents.push(Intent::Left),
                Some(lane) if lane > avatar + 0.1 => intents.push(Intent::Right),
                Some(_) => {}
                None => intents = vec![Intent::Brake],
            }
            intents
        }
    }

    /// Fixed-step host loop state
    struct Host {
        session: Session,
        presenter: Tally,
        autopilot: Autopilot,
        accumulator: f32,
    }

    impl Host {
        /// Feed one host frame; returns the number of simulation steps taken
        fn update(&mut self, frame_time: f32) -> u32 {
            self.accumulator += frame_time.min(MAX_FRAME_TIME);

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = TickInput::from_intents(&self.autopilot.intents(&self.session));
                self.session.advance(&input, &mut self.presenter, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
            substeps
        }
    }

    fn load_tuning(path: Option<&PathBuf>) -> Result<Tuning> {
        let Some(path) = path else {
            return Ok(Tuning::default());
        };
        let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let tuning = Tuning::from_json(&json).with_context(|| format!("loading tuning {}", path.display()))?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn run() -> Result<()> {
        let args = Args::parse();
        let (mode, completion) = (args.mode, args.completion);
        if !args.fps.is_finite() || args.fps < 1.0 || args.fps > 1000.0 {
            bail!("--fps must be within 1..=1000, got {}", args.fps);
        }

        let tuning = load_tuning(args.tuning.as_ref())?;

        log::info!("Castle Pop (headless) starting, seed {}", args.seed);
        let mut host = Host {
            session: Session::new(args.seed, tuning),
            presenter: Tally::default(),
            autopilot: Autopilot { ticks: 0 },
            accumulator: 0.0,
        };
        let frame_time = 1.0 / args.fps;

        for round in 0..args.rounds {
            let level = args.level.saturating_add(round);
            let params = match mode {
                GameMode::Siege => RoundParams::siege(level, completion),
                GameMode::Dodge => RoundParams::dodge(level),
            };
            host.session
                .start_round(params, &mut host.presenter)
                .with_context(|| format!("starting round {}", round + 1))?;

            let mut clock = 0.0;
            while clock < args.seconds && host.session.phase() == RoundPhase::Active {
                host.update(frame_time);
                clock += frame_time;
            }

            let phase = host.session.phase();
            log::info!(
                "Round {} ({} level {level}): {:?} after {:.1}s, {} points, {} objective hits, {} balloons left",
                round + 1,
                mode.as_str(),
                phase,
                host.session.round.elapsed,
                host.presenter.points,
                host.presenter.objective_hits,
                host.session.population()
            );

            match phase {
                RoundPhase::Active => host.session.abort_round(&mut host.presenter),
                _ => host.session.return_to_menu(&mut host.presenter),
            }
            .context("leaving the round")?;
            if phase == RoundPhase::Crashed {
                break;
            }
        }

        log::debug!(
            "{} ticks simulated, {} visuals still live",
            host.session.time_ticks,
            host.presenter.live
        );
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match headless::run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web hosts link the library and drive `Session::advance` themselves
}
