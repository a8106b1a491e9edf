//=========================================================================
// Options Store
//=========================================================================
//
// Persisted user options, stored as a TOML document of sections:
//
//   [Audio]
//   GameVolume = 50
//   MusicVolume = 80
//
//   [General]
//   Language = "en"
//
// Reads never fail. A missing file, an unparsable file, a missing key or
// a value of the wrong type all read as "absent", and callers fall back to
// the documented default.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;
use toml::{Table, Value};

//=== Defaults ============================================================

/// Audio section name.
pub const AUDIO_SECTION: &str = "Audio";

/// General section name.
pub const GENERAL_SECTION: &str = "General";

/// Key holding the UI language code.
pub const LANGUAGE_KEY: &str = "Language";

/// Volume used when a persisted percentage is missing or unreadable.
pub const DEFAULT_VOLUME_PERCENT: i64 = 100;

/// Language used when none is persisted.
pub const DEFAULT_LANGUAGE: &str = "en";

//=== OptionsError ========================================================

/// Failure while persisting options. Reads have no error type.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// The store has no backing file.
    #[error("options store has no backing file")]
    NoPath,

    #[error("failed to serialize options: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

//=== OptionsStore ========================================================

/// Section/key option store backed by a TOML file.
#[derive(Debug, Clone, Default)]
pub struct OptionsStore {
    path: Option<PathBuf>,
    table: Table,
    dirty: bool,
}

impl OptionsStore {
    //--- Construction -----------------------------------------------------

    /// Creates an empty store with no backing file.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the store from `path`.
    ///
    /// A missing or unparsable file yields an empty store that will still
    /// save to `path`.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let table = match fs::read_to_string(&path) {
            Ok(text) => match text.parse::<Table>() {
                Ok(table) => {
                    info!("Loaded options from {}", path.display());
                    table
                }
                Err(e) => {
                    warn!("Ignoring unparsable options file {}: {}", path.display(), e);
                    Table::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No options file at {}, using defaults", path.display());
                Table::new()
            }
            Err(e) => {
                warn!("Failed to read options file {}: {}", path.display(), e);
                Table::new()
            }
        };

        Self {
            path: Some(path),
            table,
            dirty: false,
        }
    }

    /// Parses a store from TOML text. Unparsable text yields an empty store.
    pub fn from_toml_str(text: &str) -> Self {
        let table = text.parse::<Table>().unwrap_or_else(|e| {
            warn!("Ignoring unparsable options: {}", e);
            Table::new()
        });

        Self {
            path: None,
            table,
            dirty: false,
        }
    }

    //--- Reads ------------------------------------------------------------

    /// Reads an integer option.
    ///
    /// Integer strings such as `"75"` are accepted. Anything else reads as
    /// absent.
    pub fn read_int_option(&self, section: &str, key: &str) -> Option<i64> {
        match self.value(section, key)? {
            Value::Integer(value) => Some(*value),
            Value::String(text) => text.trim().parse().ok(),
            other => {
                debug!(
                    "Option [{}] {} is not an integer: {:?}",
                    section, key, other
                );
                None
            }
        }
    }

    /// Reads a string option.
    pub fn read_string_option(&self, section: &str, key: &str) -> Option<&str> {
        self.value(section, key)?.as_str()
    }

    /// Reads a volume percentage clamped to `0..=100`.
    ///
    /// Falls back to [`DEFAULT_VOLUME_PERCENT`].
    pub fn volume_percent(&self, key: &str) -> i64 {
        self.read_int_option(AUDIO_SECTION, key)
            .map(|percent| percent.clamp(0, 100))
            .unwrap_or(DEFAULT_VOLUME_PERCENT)
    }

    /// The configured UI language, falling back to [`DEFAULT_LANGUAGE`].
    pub fn language(&self) -> &str {
        self.read_string_option(GENERAL_SECTION, LANGUAGE_KEY)
            .filter(|code| !code.trim().is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    //--- Writes -----------------------------------------------------------

    /// Writes an integer option.
    pub fn write_int_option(&mut self, section: &str, key: &str, value: i64) {
        self.set(section, key, Value::Integer(value));
    }

    /// Writes a string option.
    pub fn write_string_option(&mut self, section: &str, key: &str, value: &str) {
        self.set(section, key, Value::String(value.to_owned()));
    }

    /// Returns true if options changed since load or last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the store to its backing file.
    pub fn save(&mut self) -> Result<(), OptionsError> {
        let path = self.path.as_ref().ok_or(OptionsError::NoPath)?;
        let text = toml::to_string_pretty(&self.table)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| OptionsError::Write {
                path: path.clone(),
                source,
            })?;
        }

        fs::write(path, text).map_err(|source| OptionsError::Write {
            path: path.clone(),
            source,
        })?;

        info!("Saved options to {}", path.display());
        self.dirty = false;
        Ok(())
    }

    //--- Internal Helpers -------------------------------------------------

    fn value(&self, section: &str, key: &str) -> Option<&Value> {
        self.table.get(section)?.as_table()?.get(key)
    }

    fn set(&mut self, section: &str, key: &str, value: Value) {
        let entry = self
            .table
            .entry(section.to_owned())
            .or_insert_with(|| Value::Table(Table::new()));

        if !entry.is_table() {
            warn!(
                "Option section [{}] was not a table and has been replaced",
                section
            );
            *entry = Value::Table(Table::new());
        }

        if let Value::Table(table) = entry {
            if table.get(key) != Some(&value) {
                table.insert(key.to_owned(), value);
                self.dirty = true;
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
