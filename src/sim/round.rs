//! Round state machine
//!
//! ```text
//! Selecting --start--> Active --resolve--> Resolved --return--> Selecting
//!                        |  \--crash----> Crashed  --return--> Selecting
//!                        \----abort---------------------------> Selecting
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SimError;

/// Current phase of the round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Idle, browsing available rounds
    Selecting,
    /// Simulation running
    Active,
    /// Outcome reached (objective struck or population emptied)
    Resolved,
    /// Fatal collision in dodge mode; needs an explicit return to Selecting
    Crashed,
}

/// Which simulation a round runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Shooting mode: radial balloons around a castle, cannons, viewpoint fire
    Siege,
    /// Dodge mode: endless lane-scroll hazards
    Dodge,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Siege => "siege",
            GameMode::Dodge => "dodge",
        }
    }

}

/// A mode or completion name that matches nothing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{name}'")]
pub struct UnknownName {
    pub kind: &'static str,
    pub name: String,
}

impl FromStr for GameMode {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "siege" | "shoot" => Ok(GameMode::Siege),
            "dodge" | "drive" => Ok(GameMode::Dodge),
            _ => Err(UnknownName {
                kind: "mode",
                name: s.to_string(),
            }),
        }
    }
}

/// What ends an active round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionPolicy {
    /// First objective hit resolves the round
    OnObjectiveHit,
    /// Objective hits are bonus points; the round resolves once no targets remain
    OnPopulationExhausted,
    /// Only a crash or an abort ends the round
    Endless,
}

impl FromStr for CompletionPolicy {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "objective" => Ok(CompletionPolicy::OnObjectiveHit),
            "population" => Ok(CompletionPolicy::OnPopulationExhausted),
            "endless" => Ok(CompletionPolicy::Endless),
            _ => Err(UnknownName {
                kind: "completion policy",
                name: s.to_string(),
            }),
        }
    }
}

/// Parameters chosen when a round is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundParams {
    /// 1-based level
    pub level: u32,
    pub mode: GameMode,
    pub completion: CompletionPolicy,
}

impl RoundParams {
    pub fn siege(level: u32, completion: CompletionPolicy) -> Self {
        Self {
            level: level.max(1),
            mode: GameMode::Siege,
            completion,
        }
    }

    pub fn dodge(level: u32) -> Self {
        Self {
            level: level.max(1),
            mode: GameMode::Dodge,
            completion: CompletionPolicy::Endless,
        }
    }
}

/// Round bookkeeping. Lives for the whole session; fields are reset per round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub phase: RoundPhase,
    pub params: Option<RoundParams>,
    /// Seconds spent in the current round
    pub elapsed: f32,
    /// Objective was struck this round
    pub objective_hit: bool,
    /// A population-driven target left the pool; check for exhaustion at evaluation time
    pub population_check: bool,
    /// Fatal collision detected this frame
    pub crash_pending: bool,
}

impl Default for Round {
    fn default() -> Self {
        Self::new()
    }
}

impl Round {
    pub fn new() -> Self {
        Self {
            phase: RoundPhase::Selecting,
            params: None,
            elapsed: 0.0,
            objective_hit: false,
            population_check: false,
            crash_pending: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == RoundPhase::Active
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.params.map(|p| p.mode)
    }

    fn illegal(&self, request: &'static str) -> SimError {
        SimError::IllegalTransition {
            from: self.phase,
            request,
        }
    }

    /// Selecting -> Active
    pub fn begin(&mut self, params: RoundParams) -> Result<(), SimError> {
        if self.phase != RoundPhase::Selecting {
            return Err(self.illegal("start a round"));
        }
        self.phase = RoundPhase::Active;
        self.params = Some(params);
        self.elapsed = 0.0;
        self.objective_hit = false;
        self.population_check = false;
        self.crash_pending = false;
        Ok(())
    }

    /// Active -> Resolved
    pub fn resolve(&mut self) -> Result<(), SimError> {
        if self.phase != RoundPhase::Active {
            return Err(self.illegal("resolve the round"));
        }
        self.phase = RoundPhase::Resolved;
        Ok(())
    }

    /// Active -> Crashed (dodge mode only)
    pub fn crash(&mut self) -> Result<(), SimError> {
        if self.phase != RoundPhase::Active || self.mode() != Some(GameMode::Dodge) {
            return Err(self.illegal("crash"));
        }
        self.phase = RoundPhase::Crashed;
        Ok(())
    }

    /// Active -> Selecting
    pub fn abort(&mut self) -> Result<(), SimError> {
        if self.phase != RoundPhase::Active {
            return Err(self.illegal("abort the round"));
        }
        self.phase = RoundPhase::Selecting;
        Ok(())
    }

    /// Resolved | Crashed -> Selecting
    pub fn return_to_menu(&mut self) -> Result<(), SimError> {
        match self.phase {
            RoundPhase::Resolved | RoundPhase::Crashed => {
                self.phase = RoundPhase::Selecting;
                Ok(())
            }
            _ => Err(self.illegal("return to the menu")),
        }
    }

    /// Decide the end-of-frame transition, if any.
    ///
    /// `population` is the number of live targets; only consulted when a
    /// population check was scheduled this frame.
    pub fn evaluate(&mut self, population: usize) -> Option<RoundPhase> {
        if self.phase != RoundPhase::Active {
            return None;
        }
        let Some(params) = self.params else {
            return None;
        };

        if self.crash_pending {
            self.crash_pending = false;
            if self.crash().is_ok() {
                return Some(self.phase);
            }
        }

        let check = std::mem::take(&mut self.population_check);
        let done = match params.completion {
            CompletionPolicy::OnObjectiveHit => self.objective_hit || (check && population == 0),
            CompletionPolicy::OnPopulationExhausted => check && population == 0,
            CompletionPolicy::Endless => false,
        };
        if done && self.resolve().is_ok() {
            return Some(self.phase);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(params: RoundParams) -> Round {
        let mut round = Round::new();
        round.begin(params).unwrap();
        round
    }

    #[test]
    fn test_start_only_from_selecting() {
        let mut round = active(RoundParams::dodge(1));
        let err = round.begin(RoundParams::dodge(1)).unwrap_err();
        assert_eq!(
            err,
            SimError::IllegalTransition {
                from: RoundPhase::Active,
                request: "start a round"
            }
        );
        assert_eq!(round.phase, RoundPhase::Active);
    }

    #[test]
    fn test_objective_policy_resolves_on_hit() {
        let mut round = active(RoundParams::siege(1, CompletionPolicy::OnObjectiveHit));
        round.objective_hit = true;
        assert_eq!(round.evaluate(5), Some(RoundPhase::Resolved));
    }

    #[test]
    fn test_population_policy_ignores_objective() {
        let mut round = active(RoundParams::siege(1, CompletionPolicy::OnPopulationExhausted));
        round.objective_hit = true;
        assert_eq!(round.evaluate(3), None);

        round.population_check = true;
        assert_eq!(round.evaluate(1), None);
        assert!(!round.population_check);

        round.population_check = true;
        assert_eq!(round.evaluate(0), Some(RoundPhase::Resolved));
    }

    #[test]
    fn test_population_only_checked_when_scheduled() {
        let mut round = active(RoundParams::siege(1, CompletionPolicy::OnPopulationExhausted));
        assert_eq!(round.evaluate(0), None);
    }

    #[test]
    fn test_crash_needs_explicit_return() {
        let mut round = active(RoundParams::dodge(1));
        round.crash_pending = true;
        assert_eq!(round.evaluate(0), Some(RoundPhase::Crashed));

        assert!(round.begin(RoundParams::dodge(1)).is_err());
        assert!(round.abort().is_err());
        assert!(round.return_to_menu().is_ok());
        assert_eq!(round.phase, RoundPhase::Selecting);
    }

    #[test]
    fn test_crash_rejected_in_siege() {
        let mut round = active(RoundParams::siege(1, CompletionPolicy::OnObjectiveHit));
        assert!(round.crash().is_err());
        assert_eq!(round.phase, RoundPhase::Active);
    }

    #[test]
    fn test_endless_never_resolves() {
        let mut round = active(RoundParams::dodge(2));
        round.population_check = true;
        round.objective_hit = true;
        assert_eq!(round.evaluate(0), None);
    }

    #[test]
    fn test_abort_only_from_active() {
        let mut round = Round::new();
        assert!(round.abort().is_err());
        round.begin(RoundParams::dodge(1)).unwrap();
        assert!(round.abort().is_ok());
        assert!(round.return_to_menu().is_err());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Dodge".parse(), Ok(GameMode::Dodge));
        assert_eq!("siege".parse(), Ok(GameMode::Siege));
        let err = "kart".parse::<GameMode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown mode 'kart'");
        assert_eq!(GameMode::Siege.as_str(), "siege");
        assert_eq!(GameMode::Dodge.as_str().parse(), Ok(GameMode::Dodge));
    }

    #[test]
    fn test_completion_names() {
        assert_eq!("objective".parse(), Ok(CompletionPolicy::OnObjectiveHit));
        assert_eq!("Population".parse(), Ok(CompletionPolicy::OnPopulationExhausted));
        assert_eq!("endless".parse(), Ok(CompletionPolicy::Endless));
        assert!("forever".parse::<CompletionPolicy>().is_err());
    }
}
