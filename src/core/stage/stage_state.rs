//=========================================================================
// Stage State
//=========================================================================
//
// The single value naming the active stage.
//
// Stages write requests during their render call. The frame loop commits
// the last request at the frame boundary, so a change is only observed
// from the next frame on.
//
//   frame N:   current = A   render(A) → request(B)
//   boundary:  commit()  → current = B
//   frame N+1: current = B   render(B)
//
//=========================================================================

//=== External Dependencies ===============================================

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use super::StageKey;

//=== StageTransition =====================================================

/// A committed change of the active stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTransition {
    pub from: StageKey,
    pub to: StageKey,
}

//=== StageState ==========================================================

/// Explicit stage state machine owned by the frame loop.
///
/// There is no terminal state; the loop ends on the window's close flag,
/// independent of the stage value.
#[derive(Debug, Clone)]
pub struct StageState {
    current: StageKey,
    pending: Option<StageKey>,
    frames_in_stage: u64,
}

impl StageState {
    /// Creates the state with its one-time initial value.
    pub fn new(initial: StageKey) -> Self {
        Self {
            current: initial,
            pending: None,
            frames_in_stage: 0,
        }
    }

    /// The stage selected for the current frame.
    ///
    /// Unaffected by requests made during this frame.
    pub fn current(&self) -> StageKey {
        self.current
    }

    /// The stage requested for the next frame, if any.
    pub fn pending(&self) -> Option<StageKey> {
        self.pending
    }

    /// Number of committed frames spent in the current stage.
    pub fn frames_in_stage(&self) -> u64 {
        self.frames_in_stage
    }

    /// Requests `next` as the active stage from the next frame on.
    ///
    /// Repeated requests within one frame overwrite each other.
    pub fn request(&mut self, next: StageKey) {
        if let Some(previous) = self.pending.replace(next) {
            if previous != next {
                debug!("Stage request {} overwritten by {}", previous, next);
            }
        }
    }

    /// Applies the pending request at the frame boundary.
    ///
    /// Returns the transition when the active stage actually changed.
    pub(crate) fn commit(&mut self) -> Option<StageTransition> {
        let Some(next) = self.pending.take() else {
            self.frames_in_stage += 1;
            return None;
        };

        if next == self.current {
            self.frames_in_stage += 1;
            return None;
        }

        let transition = StageTransition {
            from: self.current,
            to: next,
        };

        if StageKey::is_declared_transition(transition.from, transition.to) {
            info!("Stage transition: {} -> {}", transition.from, transition.to);
        } else {
            warn!(
                "Undeclared stage transition: {} -> {}",
                transition.from, transition.to
            );
        }

        self.current = next;
        self.frames_in_stage = 0;
        Some(transition)
    }
}

impl Default for StageState {
    fn default() -> Self {
        Self::new(StageKey::default())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
