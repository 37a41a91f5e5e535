//! Presentation seam
//!
//! Drawing, audio and HUD live outside the simulation. The simulation reports
//! what happened through `Presenter`; it keeps nothing but the opaque
//! `PresentationRef` it was handed for each activated entity.

use glam::Vec3;

use crate::sim::entity::EntityKind;
use crate::sim::pool::EntityHandle;
use crate::sim::round::RoundPhase;

/// Opaque token identifying a visual owned by the presenter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresentationRef(pub u64);

/// Callbacks the simulation fires toward the presentation layer
pub trait Presenter {
    fn on_entity_activated(&mut self, handle: EntityHandle, kind: &EntityKind, position: Vec3) -> PresentationRef;

    fn on_entity_moved(&mut self, _presentation: PresentationRef, _position: Vec3) {}

    fn on_entity_released(&mut self, _presentation: PresentationRef) {}

    fn on_score_changed(&mut self, _points: u64, _combo: f32) {}

    fn on_round_state_changed(&mut self, _phase: RoundPhase) {}

    fn on_objective_hit(&mut self, _bonus: bool) {}
}

/// Presenter that draws nothing; hands out sequential refs
#[derive(Debug, Default)]
pub struct NullPresenter {
    next_ref: u64,
}

impl Presenter for NullPresenter {
    fn on_entity_activated(&mut self, _handle: EntityHandle, _kind: &EntityKind, _position: Vec3) -> PresentationRef {
        self.next_ref += 1;
        PresentationRef(self.next_ref)
    }
}

/// Everything a presenter can be told, as data
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    Activated {
        presentation: PresentationRef,
        kind: &'static str,
        position: Vec3,
    },
    Released(PresentationRef),
    ScoreChanged { points: u64, combo: f32 },
    RoundStateChanged(RoundPhase),
    ObjectiveHit { bonus: bool },
}

/// Presenter that records events (headless runs and tests).
///
/// Movement is not recorded; it fires for every active entity every tick.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    next_ref: u64,
    pub events: Vec<PresentationEvent>,
    pub moves: u64,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activated_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PresentationEvent::Activated { .. }))
            .count()
    }

    pub fn released_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PresentationEvent::Released(_)))
            .count()
    }

    pub fn phases(&self) -> Vec<RoundPhase> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresentationEvent::RoundStateChanged(phase) => Some(*phase),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.moves = 0;
    }
}

impl Presenter for RecordingPresenter {
    fn on_entity_activated(&mut self, _handle: EntityHandle, kind: &EntityKind, position: Vec3) -> PresentationRef {
        self.next_ref += 1;
        let presentation = PresentationRef(self.next_ref);
        self.events.push(PresentationEvent::Activated {
            presentation,
            kind: kind.name(),
            position,
        });
        presentation
    }

    fn on_entity_moved(&mut self, _presentation: PresentationRef, _position: Vec3) {
        self.moves += 1;
    }

    fn on_entity_released(&mut self, presentation: PresentationRef) {
        self.events.push(PresentationEvent::Released(presentation));
    }

    fn on_score_changed(&mut self, points: u64, combo: f32) {
        self.events.push(PresentationEvent::ScoreChanged { points, combo });
    }

    fn on_round_state_changed(&mut self, phase: RoundPhase) {
        self.events.push(PresentationEvent::RoundStateChanged(phase));
    }

    fn on_objective_hit(&mut self, bonus: bool) {
        self.events.push(PresentationEvent::ObjectiveHit { bonus });
    }
}
