//=========================================================================
// Stage System
//=========================================================================
//
// Mutually exclusive presentation stages and their lifecycle contract.
//
// Architecture:
//   StageRegistry
//     ├─ stages: Vec<Box<dyn Stage>>   (init order)
//     └─ slots:  HashMap<StageKey, usize>
//
// Flow:
//   init_all() → [frame: dispatch(StageState::current())]* → free_all()
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::frame_loop::FrameContext;
use crate::core::subsystems::{AudioError, Subsystems};

//=== Module Declarations =================================================

mod stage_registry;
mod stage_state;

//=== Public API ==========================================================

pub use stage_registry::StageRegistry;
pub use stage_state::{StageState, StageTransition};

//=== StageKey ============================================================

/// Identifies one of the top-level presentation stages.
///
/// Exactly one key is active at any instant. `MainMenu` and `Game` are
/// reserved slots: they can be selected, but no stage is registered for
/// them, so dispatching them does nothing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageKey {
    #[default]
    Launcher,
    Splash,
    Preload,
    MainMenu,
    Game,
}

impl StageKey {
    /// Every key, in declaration order.
    pub const ALL: [StageKey; 5] = [
        StageKey::Launcher,
        StageKey::Splash,
        StageKey::Preload,
        StageKey::MainMenu,
        StageKey::Game,
    ];

    /// Human-readable name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            StageKey::Launcher => "Launcher",
            StageKey::Splash => "Splash",
            StageKey::Preload => "Preload",
            StageKey::MainMenu => "MainMenu",
            StageKey::Game => "Game",
        }
    }

    /// Returns true for the transitions the shipped stages are known to make.
    ///
    /// Other transitions are still honored by [`StageState`]; this only
    /// drives a warning in the log.
    pub fn is_declared_transition(from: StageKey, to: StageKey) -> bool {
        matches!(
            (from, to),
            (StageKey::Launcher, StageKey::Splash)
                | (StageKey::Splash, StageKey::Preload)
                | (StageKey::Preload, StageKey::MainMenu)
        )
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//=== StageError ==========================================================

/// Fatal failure raised by a stage's `init`.
#[derive(Debug, Error)]
pub enum StageError {
    /// A required asset or asset directory does not exist.
    #[error("required asset missing: {}", .0.display())]
    MissingAsset(PathBuf),

    /// An asset exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The audio engine rejected a stage resource.
    #[error(transparent)]
    Audio(#[from] AudioError),
}

//=== Stage Trait =========================================================

/// Lifecycle contract for one presentation stage.
///
/// All registered stages are initialized eagerly at startup, before the
/// first frame, and freed at shutdown in reverse registration order,
/// whether or not they were ever active.
///
/// # Minimal Implementation
///
/// ```rust
/// # use breach_engine::prelude::*;
/// struct Credits;
///
/// impl Stage for Credits {
///     fn key(&self) -> StageKey { StageKey::MainMenu }
///
///     fn render(&mut self, frame: &mut FrameContext<'_>, state: &mut StageState) {
///         egui::CentralPanel::default().show(frame.ui, |ui| ui.label("Credits"));
///         if frame.frame_index > 600 {
///             state.request(StageKey::Game);
///         }
///     }
/// }
/// ```
pub trait Stage {
    /// The key this stage answers to.
    fn key(&self) -> StageKey;

    /// Allocates stage-owned resources.
    ///
    /// Subsystems are live when this runs and the `"Game"` and `"Music"`
    /// channel groups already exist. Returning an error aborts startup.
    fn init(&mut self, _subsystems: &mut Subsystems) -> Result<(), StageError> {
        Ok(())
    }

    /// Draws one frame. Called at most once per frame and only while this
    /// stage is active.
    ///
    /// Must not block. A stage requests a transition with
    /// [`StageState::request`]; the new stage is dispatched next frame.
    fn render(&mut self, frame: &mut FrameContext<'_>, state: &mut StageState);

    /// Releases stage-owned resources.
    ///
    /// Must tolerate a partially completed `init` and repeated calls.
    fn free(&mut self, _subsystems: &mut Subsystems) {}
}

//=========================================================================
// Unit Tests
//=========================================================================
