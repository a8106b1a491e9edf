//=========================================================================
// UI Layout Persistence
//=========================================================================
//
// Saves and restores the UI context's memory (window positions, collapsed
// headers, widget state) as JSON next to the executable's working dir.
//
// Failures never stop the engine; they are logged and the UI starts from
// its default layout.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, info, warn};

//=== Constants ===========================================================

/// Fixed relative file the layout is persisted to.
pub const UI_LAYOUT_FILE: &str = "uicfg.json";

//=== Load / Save =========================================================

/// Restores UI memory from `path`. Returns true if a layout was applied.
pub fn load_layout(ui: &egui::Context, path: &Path) -> bool {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No UI layout at {}, using defaults", path.display());
            return false;
        }
        Err(e) => {
            warn!("Failed to read UI layout {}: {}", path.display(), e);
            return false;
        }
    };

    match serde_json::from_str::<egui::Memory>(&text) {
        Ok(memory) => {
            ui.memory_mut(|current| *current = memory);
            info!("Restored UI layout from {}", path.display());
            true
        }
        Err(e) => {
            warn!("Ignoring unreadable UI layout {}: {}", path.display(), e);
            false
        }
    }
}

/// Writes UI memory to `path`. Returns true on success.
pub fn save_layout(ui: &egui::Context, path: &Path) -> bool {
    let json = match ui.memory(serde_json::to_string) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize UI layout: {}", e);
            return false;
        }
    };

    match fs::write(path, json) {
        Ok(()) => {
            info!("Saved UI layout to {}", path.display());
            true
        }
        Err(e) => {
            warn!("Failed to write UI layout {}: {}", path.display(), e);
            false
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
