//=========================================================================
// Core
//=========================================================================
//
// Platform-independent host logic.
//
// Components:
// - `stage`: stage trait, registry and state machine
// - `subsystems`: audio, localization, options, platform service
// - `frame_loop`: per-frame orchestration
// - `platform_bridge`: window/renderer traits implemented by `platform`
// - `ui_layout`: UI memory persistence
//
//=========================================================================

//=== Module Declarations =================================================

pub mod frame_loop;
pub mod platform_bridge;
pub mod stage;
pub mod subsystems;
pub mod ui_layout;

#[cfg(test)]
pub(crate) mod test_support;
