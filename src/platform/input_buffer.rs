//=========================================================================
// Input Buffer
//
// Holds window events between event pumps and the next UI pass.
//
// Responsibilities:
// - Keep discrete events (keys, clicks, text) in arrival order
// - Coalesce bursts of continuous events (cursor motion, resizes) so a
//   long pump does not flood the UI with stale positions
// - Hand everything over in one `drain()` at the frame boundary
//
//=========================================================================

//=== Standard Library Imports ============================================
use std::mem;

//=== External Crates =====================================================
use winit::event::WindowEvent;

//=== InputBuffer Struct ==================================================

pub(crate) struct InputBuffer {
    events: Vec<WindowEvent>,
}

impl InputBuffer {
    //--- Construction -----------------------------------------------------
    pub(crate) fn new() -> Self {
        const BASE_CAPACITY: usize = 64;

        Self {
            events: Vec::with_capacity(BASE_CAPACITY),
        }
    }

    //--- Push -------------------------------------------------------------
    //
    // A continuous event replaces the previous one only when it directly
    // follows an event of the same kind; anything in between keeps both,
    // so clicks land where the cursor was at the time.
    //
    pub(crate) fn push(&mut self, event: WindowEvent) {
        if is_continuous(&event) {
            if let Some(last) = self.events.last_mut() {
                if mem::discriminant(last) == mem::discriminant(&event) {
                    *last = event;
                    return;
                }
            }
        }
        self.events.push(event);
    }

    //--- Drain ------------------------------------------------------------
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = WindowEvent> + '_ {
        self.events.drain(..)
    }

    //--- Utilities --------------------------------------------------------
    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn is_continuous(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CursorMoved { .. } | WindowEvent::Resized(_) | WindowEvent::Moved(_)
    )
}

//=========================================================================
// Unit Tests
//=========================================================================
