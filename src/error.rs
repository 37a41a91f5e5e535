//! Error kinds reported by the simulation
//!
//! All of them are local and recoverable: the frame driver logs them and
//! carries on with the rest of the frame.

use thiserror::Error;

use crate::sim::pool::EntityHandle;
use crate::sim::round::RoundPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimError {
    /// Pool is at its configured ceiling; the spawn request is dropped
    #[error("{pool} pool is at its capacity of {capacity}, spawn dropped")]
    CapacityExceeded { pool: &'static str, capacity: usize },

    /// Double release or use of a stale handle
    #[error("invalid entity handle {0:?} (stale or already released)")]
    InvalidHandle(EntityHandle),

    /// Round transition not valid from the current phase; state unchanged
    #[error("cannot {request} while {from:?}")]
    IllegalTransition {
        from: RoundPhase,
        request: &'static str,
    },

    /// Focus request named a facility that does not exist
    #[error("no facility with id {0}")]
    UnknownFacility(usize),
}

impl SimError {
    /// Log the error at the level its kind calls for.
    ///
    /// Handle misuse is a programming error: it trips a debug assertion in
    /// development builds and is a logged no-op in release builds.
    pub fn report(&self) {
        match self {
            SimError::InvalidHandle(_) => {
                log::error!("{self}");
                debug_assert!(false, "{self}");
            }
            _ => log::warn!("{self}"),
        }
    }
}
