//=========================================================================
// Localization
//=========================================================================
//
// String table subsystem.
//
// Tables are TOML documents whose nested tables flatten to dotted keys:
//
//   [launcher]
//   title = "Containment Breach"     → "launcher.title"
//
// The English table is compiled in. A language without a file on disk
// falls back to it; a file that exists but does not parse is an error.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;
use toml::{Table, Value};

//=== Built-in Table ======================================================

/// Language code of the compiled-in table.
pub const BUILTIN_LANGUAGE: &str = "en";

const BUILTIN_TABLE: &str = include_str!("../../../assets/lang/en.toml");

//=== LocalizationError ===================================================

/// Localization bootstrap failures. All are fatal.
#[derive(Debug, Error)]
pub enum LocalizationError {
    #[error("failed to read string table {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse string table '{language}': {source}")]
    Parse {
        language: String,
        #[source]
        source: toml::de::Error,
    },
}

//=== Localization Trait ==================================================

/// Lookup interface stages use to display text.
pub trait Localization {
    /// Active language code.
    fn language(&self) -> &str;

    /// Localized text for `key`, or `key` itself when it has no entry.
    fn text<'a>(&'a self, key: &'a str) -> &'a str;

    /// Releases the table. Later calls do nothing.
    fn shutdown(&mut self);
}

//=== StringTable =========================================================

/// TOML-backed [`Localization`] implementation.
#[derive(Debug, Clone)]
pub struct StringTable {
    language: String,
    entries: HashMap<String, String>,
}

impl StringTable {
    /// The compiled-in English table.
    pub fn builtin() -> Self {
        // The compiled-in table is covered by tests; fall back to an empty
        // table rather than abort if it were ever broken.
        Self::parse(BUILTIN_LANGUAGE, BUILTIN_TABLE).unwrap_or_else(|e| {
            warn!("Built-in string table is invalid: {}", e);
            Self {
                language: BUILTIN_LANGUAGE.to_owned(),
                entries: HashMap::new(),
            }
        })
    }

    /// Loads `<dir>/<language>.toml`.
    ///
    /// Falls back to the built-in table when the file does not exist or
    /// `language` is not a valid code.
    pub fn load(dir: &Path, language: &str) -> Result<Self, LocalizationError> {
        if !is_language_code(language) {
            warn!(
                "Invalid language code '{}', using built-in '{}'",
                language, BUILTIN_LANGUAGE
            );
            return Ok(Self::builtin());
        }

        let path = dir.join(format!("{language}.toml"));

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(
                    "No string table for '{}' at {}, using built-in '{}'",
                    language,
                    path.display(),
                    BUILTIN_LANGUAGE
                );
                return Ok(Self::builtin());
            }
            Err(source) => return Err(LocalizationError::Read { path, source }),
        };

        let table = Self::parse(language, &text)?;
        info!(
            "Loaded {} localized strings for '{}'",
            table.entries.len(),
            language
        );
        Ok(table)
    }

    /// Parses a table from TOML text.
    pub fn parse(language: &str, text: &str) -> Result<Self, LocalizationError> {
        let table = text
            .parse::<Table>()
            .map_err(|source| LocalizationError::Parse {
                language: language.to_owned(),
                source,
            })?;

        let mut entries = HashMap::new();
        flatten("", &table, &mut entries);

        Ok(Self {
            language: language.to_owned(),
            entries,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Localization for StringTable {
    fn language(&self) -> &str {
        &self.language
    }

    fn text<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }

    fn shutdown(&mut self) {
        if !self.entries.is_empty() {
            info!("Localization '{}' released", self.language);
            self.entries.clear();
        }
    }
}

/// Returns true for codes made of ASCII letters, digits, `_` and `-`.
///
/// Codes name files inside the language directory, so anything that could
/// form a path (separators, `..`) is rejected.
pub fn is_language_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn flatten(prefix: &str, table: &Table, out: &mut HashMap<String, String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        match value {
            Value::Table(inner) => flatten(&full_key, inner, out),
            Value::String(text) => {
                out.insert(full_key, text.clone());
            }
            other => {
                out.insert(full_key, other.to_string());
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses_and_has_launcher_strings() {
        let table = StringTable::parse(BUILTIN_LANGUAGE, BUILTIN_TABLE).unwrap();
        assert!(!table.is_empty());
        assert_ne!(table.text("launcher.title"), "launcher.title");
        assert_ne!(table.text("launcher.launch"), "launcher.launch");
    }

    #[test]
    fn skip_hint_names_the_skip_keys() {
        let table = StringTable::builtin();
        let hint = table.text("splash.skip");
        for key in ["Enter", "Space", "Escape"] {
            assert!(hint.contains(key), "{:?} missing from {:?}", key, hint);
        }
    }

    #[test]
    fn shipped_russian_skip_hint_names_the_skip_keys() {
        let lang_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/lang");
        let table = StringTable::load(&lang_dir, "ru").unwrap();
        let hint = table.text("splash.skip");

        assert_eq!(table.language(), "ru");
        for key in ["Enter", "Escape"] {
            assert!(hint.contains(key), "{:?} missing from {:?}", key, hint);
        }
    }

    #[test]
    fn nested_tables_flatten_to_dotted_keys() {
        let table = StringTable::parse(
            "xx",
            "greeting = \"hi\"\n[menu]\nstart = \"Go\"\n[menu.sub]\nback = \"Back\"\n",
        )
        .unwrap();

        assert_eq!(table.text("greeting"), "hi");
        assert_eq!(table.text("menu.start"), "Go");
        assert_eq!(table.text("menu.sub.back"), "Back");
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn missing_key_returns_key() {
        let table = StringTable::parse("xx", "a = \"b\"").unwrap();
        assert_eq!(table.text("does.not.exist"), "does.not.exist");
    }

    #[test]
    fn non_string_values_are_rendered() {
        let table = StringTable::parse("xx", "count = 3").unwrap();
        assert_eq!(table.text("count"), "3");
    }

    #[test]
    fn missing_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let table = StringTable::load(dir.path(), "pl").unwrap();
        assert_eq!(table.language(), BUILTIN_LANGUAGE);
    }

    #[test]
    fn loads_language_file_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let table = "[launcher]\ntitle = \"Eindämmung\"\n";
        fs::write(dir.path().join("de.toml"), table).unwrap();

        let table = StringTable::load(dir.path(), "de").unwrap();
        assert_eq!(table.language(), "de");
        assert_eq!(table.text("launcher.title"), "Eindämmung");
    }

    #[test]
    fn language_codes_reject_path_characters() {
        assert!(is_language_code("en"));
        assert!(is_language_code("pt-BR"));
        assert!(is_language_code("zh_Hant"));
        assert!(!is_language_code(""));
        assert!(!is_language_code("../../x"));
        assert!(!is_language_code("lang/en"));
        assert!(!is_language_code("en.toml"));
    }

    #[test]
    fn traversing_language_falls_back_to_builtin() {
        let root = tempfile::tempdir().unwrap();
        let lang_dir = root.path().join("lang");
        fs::create_dir(&lang_dir).unwrap();
        let secret = "[launcher]\ntitle = \"leaked\"\n";
        fs::write(root.path().join("secret.toml"), secret).unwrap();

        let table = StringTable::load(&lang_dir, "../secret").unwrap();

        assert_eq!(table.language(), BUILTIN_LANGUAGE);
        assert_ne!(table.text("launcher.title"), "leaked");
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ru.toml"), "[launcher\n").unwrap();

        let result = StringTable::load(dir.path(), "ru");
        assert!(matches!(result, Err(LocalizationError::Parse { .. })));
    }

    #[test]
    fn shutdown_releases_entries() {
        let mut table = StringTable::parse("xx", "a = \"b\"").unwrap();
        table.shutdown();
        table.shutdown();
        assert_eq!(table.text("a"), "a");
    }
}
