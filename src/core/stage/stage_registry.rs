//=========================================================================
// Stage Registry
//=========================================================================
//
// Owns every registered stage, drives their eager init/free lifecycle,
// and dispatches each frame to the single active stage.
//
// Stages are stored in registration order, which is also init order.
// Free runs in reverse. Dispatch is a keyed lookup: keys without a
// registered stage are empty slots and dispatch to nothing.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::{debug, info, trace, warn};

//=== Internal Dependencies ===============================================

use super::{Stage, StageError, StageKey, StageState};
use crate::core::frame_loop::FrameContext;
use crate::core::subsystems::Subsystems;

//=== StageRegistry =======================================================

/// Ordered collection of stages with keyed dispatch.
pub struct StageRegistry {
    stages: Vec<Box<dyn Stage>>,
    slots: HashMap<StageKey, usize>,
    /// Number of stages (from the front) whose `init` has been entered.
    initialized: usize,
}

impl StageRegistry {
    //--- Construction -----------------------------------------------------

    /// Creates an empty registry. Every key is an empty slot.
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            slots: HashMap::new(),
            initialized: 0,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers a stage under its own key.
    ///
    /// Registering a key twice replaces the earlier stage but keeps its
    /// position in the init order.
    ///
    /// # Panics
    ///
    /// Panics if called after [`StageRegistry::init_all`].
    pub fn register(&mut self, stage: Box<dyn Stage>) {
        assert!(
            self.initialized == 0,
            "Stages must be registered before init_all"
        );

        let key = stage.key();
        match self.slots.get(&key) {
            Some(&index) => {
                warn!("Stage {} was already registered and has been replaced", key);
                self.stages[index] = stage;
            }
            None => {
                debug!("Registered stage {}", key);
                self.slots.insert(key, self.stages.len());
                self.stages.push(stage);
            }
        }
    }

    /// Returns true if a stage is registered for `key`.
    pub fn contains(&self, key: StageKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Registered keys in init order.
    pub fn keys(&self) -> impl Iterator<Item = StageKey> + '_ {
        self.stages.iter().map(|stage| stage.key())
    }

    /// Number of registered stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if no stage is registered.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    //--- Lifecycle --------------------------------------------------------

    /// Initializes every stage in registration order.
    ///
    /// Stops at the first failure. The failing stage counts as touched, so
    /// a following [`StageRegistry::free_all`] frees it along with every
    /// stage before it.
    pub fn init_all(&mut self, subsystems: &mut Subsystems) -> Result<(), StageError> {
        for (index, stage) in self.stages.iter_mut().enumerate().skip(self.initialized) {
            info!("Initializing stage {}", stage.key());
            self.initialized = index + 1;
            stage.init(subsystems)?;
        }

        info!("{} stage(s) initialized", self.initialized);
        Ok(())
    }

    /// Frees every touched stage in reverse init order.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn free_all(&mut self, subsystems: &mut Subsystems) {
        for stage in self.stages[..self.initialized].iter_mut().rev() {
            info!("Freeing stage {}", stage.key());
            stage.free(subsystems);
        }
        self.initialized = 0;
    }

    //--- Dispatch ---------------------------------------------------------

    /// Renders the stage selected by `state` for this frame.
    ///
    /// Returns the key that was dispatched, or `None` when the key names an
    /// empty slot. The key is read once, before the call, so a request made
    /// by the stage cannot cause a second dispatch this frame.
    pub fn dispatch(
        &mut self,
        frame: &mut FrameContext<'_>,
        state: &mut StageState,
    ) -> Option<StageKey> {
        let key = state.current();

        let Some(&index) = self.slots.get(&key) else {
            trace!("Stage {} has no render behavior", key);
            return None;
        };

        self.stages[index].render(frame, state);
        Some(key)
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
