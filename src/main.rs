//=========================================================================
// breach — game executable
//
// Wires the shipped startup stages into the engine and runs it on the
// desktop backend. Log level is taken from `RUST_LOG` (default `info`).
//
//=========================================================================

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::process::ExitCode;

use breach_engine::prelude::*;
use breach_engine::WinitBackend;
use env_logger::Env;

const ASSET_ROOT: &str = "assets";
const ICON_PATH: &str = "assets/icon.png";

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    EngineBuilder::new()
        .with_title("SCP - Containment Breach")
        .with_icon(ICON_PATH)
        .with_stage(LauncherStage::new())
        .with_stage(SplashStage::new())
        .with_stage(PreloadStage::new(ASSET_ROOT))
        .build()
        .run(WinitBackend::new())
        .into()
}
