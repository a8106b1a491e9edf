//=========================================================================
// Preload Stage
//=========================================================================
//
// Reads every file under the asset root into memory, a few files per
// frame so the progress bar keeps moving, then hands over to the main
// menu.
//
// Lifecycle:
//   init   → walk the asset root, queue every regular file
//   render → read up to `files_per_frame` files, draw progress;
//            queue empty → request MainMenu
//   free   → drop the cache
//
// Unreadable files are recorded and skipped. Only a missing asset root
// is fatal.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

//=== Internal Dependencies ===============================================

use crate::core::frame_loop::FrameContext;
use crate::core::stage::{Stage, StageError, StageKey, StageState};
use crate::core::subsystems::Subsystems;

//=== Constants ===========================================================

/// Files read per frame unless configured otherwise.
pub const DEFAULT_FILES_PER_FRAME: usize = 8;

//=== PreloadFailure ======================================================

/// A file that was queued but could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadFailure {
    pub path: PathBuf,
    pub reason: String,
}

//=== PreloadStage ========================================================

pub struct PreloadStage {
    root: PathBuf,
    files_per_frame: usize,
    queue: VecDeque<PathBuf>,
    total: usize,
    cache: HashMap<PathBuf, Vec<u8>>,
    failures: Vec<PreloadFailure>,
    requested: bool,
}

impl PreloadStage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files_per_frame: DEFAULT_FILES_PER_FRAME,
            queue: VecDeque::new(),
            total: 0,
            cache: HashMap::new(),
            failures: Vec::new(),
            requested: false,
        }
    }

    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn with_files_per_frame(mut self, count: usize) -> Self {
        assert!(count > 0, "Preload must read at least one file per frame");
        self.files_per_frame = count;
        self
    }

    //--- Progress ---------------------------------------------------------

    /// Reads the next batch of queued files. Returns true once the queue
    /// is empty.
    pub fn step(&mut self) -> bool {
        for _ in 0..self.files_per_frame {
            let Some(path) = self.queue.pop_front() else {
                break;
            };

            match fs::read(&path) {
                Ok(bytes) => {
                    debug!("Preloaded {} ({} bytes)", path.display(), bytes.len());
                    self.cache.insert(path, bytes);
                }
                Err(e) => {
                    warn!("Failed to preload {}: {}", path.display(), e);
                    self.failures.push(PreloadFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.queue.is_empty()
    }

    /// Fraction of queued files processed, `1.0` when nothing was queued.
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            return 1.0;
        }
        (self.total - self.queue.len()) as f32 / self.total as f32
    }

    /// Number of files found at init.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Contents of a preloaded file, keyed by its path under the root.
    pub fn cached(&self, path: &Path) -> Option<&[u8]> {
        self.cache.get(path).map(Vec::as_slice)
    }

    pub fn loaded_count(&self) -> usize {
        self.cache.len()
    }

    pub fn failures(&self) -> &[PreloadFailure] {
        &self.failures
    }

    fn scan(&mut self) {
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    self.queue.push_back(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!("Skipping unreadable asset entry {}: {}", path.display(), e);
                    self.failures.push(PreloadFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
        self.total = self.queue.len();
    }

    fn finish(&mut self, state: &mut StageState) {
        if self.requested {
            return;
        }
        self.requested = true;

        info!(
            "Preload complete: {} of {} file(s) cached, {} failure(s)",
            self.cache.len(),
            self.total,
            self.failures.len()
        );
        state.request(StageKey::MainMenu);
    }
}

impl Stage for PreloadStage {
    fn key(&self) -> StageKey {
        StageKey::Preload
    }

    fn init(&mut self, _subsystems: &mut Subsystems) -> Result<(), StageError> {
        if !self.root.is_dir() {
            return Err(StageError::MissingAsset(self.root.clone()));
        }

        self.queue.clear();
        self.failures.clear();
        self.requested = false;
        self.scan();

        info!(
            "Preload queued {} file(s) from {}",
            self.total,
            self.root.display()
        );
        Ok(())
    }

    fn render(&mut self, frame: &mut FrameContext<'_>, state: &mut StageState) {
        if self.step() {
            self.finish(state);
        }

        let title = frame.subsystems.text("preload.title").to_owned();
        let failed_label = frame.subsystems.text("preload.failed").to_owned();
        let processed = self.total - self.queue.len();

        egui::CentralPanel::default().show(frame.ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(title.as_str());
            });
            ui.add_space(8.0);
            ui.add(
                egui::ProgressBar::new(self.progress())
                    .text(format!("{} / {}", processed, self.total))
                    .animate(!self.requested),
            );

            if !self.failures.is_empty() {
                ui.add_space(8.0);
                ui.label(failed_label.as_str());
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for failure in &self.failures {
                        ui.label(
                            egui::RichText::new(failure.path.display().to_string()).weak(),
                        )
                        .on_hover_text(failure.reason.as_str());
                    }
                });
            }
        });

        frame.ui.request_repaint();
    }

    fn free(&mut self, _subsystems: &mut Subsystems) {
        if !self.cache.is_empty() {
            debug!("Dropping {} preloaded file(s)", self.cache.len());
        }
        self.cache.clear();
        self.queue.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support;

    fn asset_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sfx/doors")).unwrap();
        fs::write(dir.path().join("readme.txt"), b"hello").unwrap();
        fs::write(dir.path().join("sfx/step.ogg"), b"step").unwrap();
        fs::write(dir.path().join("sfx/doors/open.ogg"), b"open").unwrap();
        dir
    }

    fn render_once(stage: &mut PreloadStage, subsystems: &mut Subsystems, state: &mut StageState) {
        let ui = egui::Context::default();
        test_support::render_stage(&ui, stage, subsystems, state, egui::RawInput::default());
    }

    //=====================================================================
    // Scanning
    //=====================================================================

    #[test]
    fn missing_root_fails_init() {
        let log = test_support::call_log();
        let mut subsystems = test_support::subsystems(&log);
        let mut stage = PreloadStage::new("no/such/assets");

        match stage.init(&mut subsystems) {
            Err(StageError::MissingAsset(path)) => {
                assert_eq!(path, PathBuf::from("no/such/assets"));
            }
            other => panic!("Expected MissingAsset, found {:?}", other),
        }
    }

    #[test]
    fn init_queues_nested_files() {
        let assets = asset_tree();
        let log = test_support::call_log();
        let mut subsystems = test_support::subsystems(&log);
        let mut stage = PreloadStage::new(assets.path());

        stage.init(&mut subsystems).unwrap();

        assert_eq!(stage.total(), 3);
        assert_eq!(stage.progress(), 0.0);
    }

    #[test]
    fn empty_root_is_immediately_complete() {
        let dir = tempfile::tempdir().unwrap();
        let log = test_support::call_log();
        let mut subsystems = test_support::subsystems(&log);
        let mut stage = PreloadStage::new(dir.path());
        stage.init(&mut subsystems).unwrap();

        assert_eq!(stage.progress(), 1.0);
        assert!(stage.step());
    }

    //=====================================================================
    // Loading
    //=====================================================================

    #[test]
    fn step_reads_a_bounded_batch() {
        let assets = asset_tree();
        let log = test_support::call_log();
        let mut subsystems = test_support::subsystems(&log);
        let mut stage = PreloadStage::new(assets.path()).with_files_per_frame(2);
        stage.init(&mut subsystems).unwrap();

        assert!(!stage.step());
        assert_eq!(stage.loaded_count(), 2);

        assert!(stage.step());
        assert_eq!(stage.loaded_count(), 3);
        assert_eq!(stage.progress(), 1.0);
        assert_eq!(
            stage.cached(&assets.path().join("sfx/doors/open.ogg")),
            Some(&b"open"[..])
        );
    }

    #[test]
    fn unreadable_file_is_recorded_and_skipped() {
        let assets = asset_tree();
        let log = test_support::call_log();
        let mut subsystems = test_support::subsystems(&log);
        let mut stage = PreloadStage::new(assets.path());
        stage.init(&mut subsystems).unwrap();

        let removed = assets.path().join("readme.txt");
        fs::remove_file(&removed).unwrap();

        assert!(stage.step());
        assert_eq!(stage.loaded_count(), 2);
        assert_eq!(stage.failures().len(), 1);
        assert_eq!(stage.failures()[0].path, removed);
    }

    #[test]
    #[should_panic(expected = "at least one file per frame")]
    fn zero_batch_panics() {
        let _ = PreloadStage::new("assets").with_files_per_frame(0);
    }

    //=====================================================================
    // Transitions
    //=====================================================================

    #[test]
    fn render_requests_main_menu_when_done() {
        let assets = asset_tree();
        let log = test_support::call_log();
        let mut subsystems = test_support::subsystems(&log);
        let mut stage = PreloadStage::new(assets.path()).with_files_per_frame(2);
        let mut state = StageState::new(StageKey::Preload);
        stage.init(&mut subsystems).unwrap();

        render_once(&mut stage, &mut subsystems, &mut state);
        assert_eq!(state.pending(), None);

        render_once(&mut stage, &mut subsystems, &mut state);
        assert_eq!(state.pending(), Some(StageKey::MainMenu));
    }

    #[test]
    fn free_drops_the_cache() {
        let assets = asset_tree();
        let log = test_support::call_log();
        let mut subsystems = test_support::subsystems(&log);
        let mut stage = PreloadStage::new(assets.path());
        stage.init(&mut subsystems).unwrap();
        stage.step();

        stage.free(&mut subsystems);
        stage.free(&mut subsystems);

        assert_eq!(stage.loaded_count(), 0);
    }
}
