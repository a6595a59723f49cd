//! Loading pipeline: find the game file, parse it, resolve it.
//!
//! Format is chosen by extension (RON/TOML/JSON). A directory with the
//! same base name in two formats is rejected rather than guessed at.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tycoon_game::definition::GameDefinition;

use crate::resolve::resolve;
use crate::schema::GameData;

/// Base name of the game file inside a data directory.
pub const GAME_FILE: &str = "game";

/// Stand-in path used in errors for definitions loaded from a string.
const INLINE_SOURCE: &str = "<inline>";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: &'static str, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate name was found.
    #[error("duplicate {kind} name '{name}' in {file}")]
    DuplicateName {
        file: PathBuf,
        name: String,
        kind: &'static str,
    },

    /// A value parsed but cannot be used (non-finite, out of range, ...).
    #[error("invalid value in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let ext = path.extension().and_then(|e| e.to_str());
    Format::ALL
        .into_iter()
        .find(|f| Some(f.extension()) == ext)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Look for `{base_name}.ron`, `.toml` and `.json` in `dir`.
///
/// Returns `Ok(None)` if none exists, or `Err(ConflictingFormats)` if more
/// than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;
    for format in Format::ALL {
        let candidate = dir.join(format!("{base_name}.{}", format.extension()));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = &found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing.clone(),
                b: candidate,
            });
        }
        found = Some(candidate);
    }
    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &'static str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name,
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` in `format`. `file` only labels errors.
pub fn deserialize_str<T: DeserializeOwned>(content: &str, format: Format, file: &Path) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Entry points
// ===========================================================================

/// Load the game definition from `dir/game.{ron,toml,json}`.
pub fn load_definition(dir: &Path) -> Result<GameDefinition, DataLoadError> {
    let path = require_data_file(dir, GAME_FILE)?;
    let data: GameData = deserialize_file(&path)?;
    let definition = resolve(data, &path)?;
    tracing::info!(
        path = %path.display(),
        businesses = definition.businesses.len(),
        components = definition.factory.components.len(),
        machines = definition.factory.machines.len(),
        "game definition loaded"
    );
    Ok(definition)
}

/// Load a game definition from text, e.g. content embedded in a binary.
pub fn load_definition_str(content: &str, format: Format) -> Result<GameDefinition, DataLoadError> {
    let file = Path::new(INLINE_SOURCE);
    let data: GameData = deserialize_str(content, format, file)?;
    resolve(data, file)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tycoon_core::id::{BusinessId, ComponentId};

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tycoon_data_test_{suffix}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    /// The definition shipped with the repository.
    fn shipped_data_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data")
    }

    const MINIMAL_RON: &str = r#"(
        businesses: [
            (name: "Kiosk", income_per_level: 2, upgrade_cost: 5, cost_growth: 1.1),
        ],
        prestige: (curve: linear(base: 10, increment: 2)),
    )"#;

    const MINIMAL_JSON: &str = r#"{
        "businesses": [
            {"name": "Kiosk", "income_per_level": 2, "upgrade_cost": 5, "cost_growth": 1.1}
        ],
        "prestige": {"curve": {"linear": {"base": 10, "increment": 2}}}
    }"#;

    const MINIMAL_TOML: &str = r#"
[[businesses]]
name = "Kiosk"
income_per_level = 2
upgrade_cost = 5
cost_growth = 1.1

[prestige.curve.linear]
base = 10
increment = 2
"#;

    // -----------------------------------------------------------------------
    // Test 1: Format detection by extension
    // -----------------------------------------------------------------------
    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("game.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("game.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("game.json")).unwrap(), Format::Json);
        assert!(matches!(
            detect_format(Path::new("game.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            detect_format(Path::new("game")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Test 2: The same minimal game parses from every format
    // -----------------------------------------------------------------------
    #[test]
    fn minimal_game_in_every_format() {
        let ron = load_definition_str(MINIMAL_RON, Format::Ron).unwrap();
        let json = load_definition_str(MINIMAL_JSON, Format::Json).unwrap();
        let toml = load_definition_str(MINIMAL_TOML, Format::Toml).unwrap();

        assert_eq!(ron, json);
        assert_eq!(ron, toml);
        let kiosk = &ron.businesses[&BusinessId(0)];
        assert_eq!(kiosk.name, "Kiosk");
        assert_eq!(kiosk.upgrade_cost_growth, rust_decimal::Decimal::new(11, 1));
    }

    // -----------------------------------------------------------------------
    // Test 3: Two formats side by side are a conflict
    // -----------------------------------------------------------------------
    #[test]
    fn conflicting_formats_rejected() {
        let dir = make_test_dir("conflict");
        fs::write(dir.join("game.ron"), MINIMAL_RON).unwrap();
        fs::write(dir.join("game.json"), MINIMAL_JSON).unwrap();

        let result = load_definition(&dir);
        assert!(matches!(result, Err(DataLoadError::ConflictingFormats { .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Test 4: A directory without a game file
    // -----------------------------------------------------------------------
    #[test]
    fn missing_game_file() {
        let dir = make_test_dir("missing");
        let result = load_definition(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::MissingRequired { file: "game", .. })
        ));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Test 5: Loading from a directory
    // -----------------------------------------------------------------------
    #[test]
    fn load_from_directory() {
        let dir = make_test_dir("load_toml");
        fs::write(dir.join("game.toml"), MINIMAL_TOML).unwrap();

        let def = load_definition(&dir).unwrap();
        assert_eq!(def.businesses.len(), 1);

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Test 6: Syntax errors carry the file name
    // -----------------------------------------------------------------------
    #[test]
    fn parse_error_names_file() {
        let dir = make_test_dir("parse_err");
        let path = dir.join("game.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        let err = load_definition(&dir).unwrap_err();
        assert!(matches!(err, DataLoadError::Parse { .. }));
        assert!(err.to_string().contains("game.ron"));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Test 7: The shipped definition loads and is playable
    // -----------------------------------------------------------------------
    #[test]
    fn shipped_definition_loads() {
        let def = load_definition(&shipped_data_dir()).unwrap();
        assert!(def.businesses.len() >= 3);
        assert!(!def.power.generators.is_empty());
        assert!(!def.power.collectors.is_empty());
        assert!(!def.skills.is_empty());
        assert!(!def.hq_levels.is_empty());

        // Every recipe input resolves to a lower-tier component.
        for component in def.factory.components.values() {
            for input in &component.inputs {
                let dep = &def.factory.components[&input.component];
                assert!(dep.tier < component.tier, "{} depends upward", component.name);
            }
        }
        assert!(def.factory.components.contains_key(&ComponentId(0)));
    }

    // -----------------------------------------------------------------------
    // Test 8: Io error conversion
    // -----------------------------------------------------------------------
    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let data_err: DataLoadError = io_err.into();
        assert!(matches!(data_err, DataLoadError::Io(_)));
        assert!(format!("{data_err}").contains("file not found"));
    }
}
