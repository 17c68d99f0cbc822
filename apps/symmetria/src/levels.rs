//! # Level Files
//!
//! Loads JSON level definitions from disk and merges them over the built-in
//! catalog. Files are read in file-name order; a file whose `level_id`
//! matches a built-in level replaces it.

use crate::config::LevelsConfig;
use std::path::{Path, PathBuf};
use symmetria_core::{LevelCatalog, LevelDefinition, LevelId, SymmetriaError};

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), SymmetriaError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SymmetriaError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(SymmetriaError::SerializationError(format!(
            "File '{}' is {} bytes, maximum allowed is {} bytes",
            path.display(),
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Read and parse one level file.
pub fn read_level_file(path: &Path, max_size: u64) -> Result<LevelDefinition, SymmetriaError> {
    validate_file_size(path, max_size)?;
    let content = std::fs::read_to_string(path).map_err(|e| {
        SymmetriaError::IoError(format!("Cannot read level file '{}': {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        SymmetriaError::SerializationError(format!(
            "Invalid level file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// `*.json` files directly inside `dir`, sorted by file name.
pub fn level_files(dir: &Path) -> Result<Vec<PathBuf>, SymmetriaError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        SymmetriaError::IoError(format!("Cannot read levels dir '{}': {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| SymmetriaError::IoError(format!("Cannot read dir entry: {}", e)))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Built-in catalog plus every level file in the configured directory.
///
/// A single invalid file fails the whole load, naming the file. That includes
/// a file whose declared automorphism count disagrees with its graph.
pub fn load_catalog(config: &LevelsConfig) -> Result<LevelCatalog, SymmetriaError> {
    let mut catalog = LevelCatalog::builtin();
    let Some(dir) = &config.dir else {
        return Ok(catalog);
    };

    for path in level_files(dir)? {
        let definition = read_level_file(&path, config.max_file_bytes)?;
        let replaced = catalog.contains(&LevelId::new(&definition.level_id));
        let id = catalog.insert(&definition).map_err(|e| match e {
            SymmetriaError::InvalidLevel { level, reason } => SymmetriaError::InvalidLevel {
                level,
                reason: format!("{} (file '{}')", reason, path.display()),
            },
            other => other,
        })?;
        tracing::info!(
            level = %id,
            file = %path.display(),
            replaced,
            "loaded level file"
        );
    }
    Ok(catalog)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PATH_LEVEL: &str = r#"{
        "level_id": "custom_path",
        "title": "Custom path",
        "group_name": "Z2",
        "expected_automorphism_count": 2,
        "crystals": [
            {"id": 0, "color": "red"},
            {"id": 1, "color": "red"}
        ],
        "edges": [{"a": 0, "b": 1}]
    }"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).expect("create");
        file.write_all(content.as_bytes()).expect("write");
        path
    }

    #[test]
    fn without_dir_only_builtins() {
        let catalog = load_catalog(&LevelsConfig::default()).expect("load");
        assert_eq!(catalog.len(), LevelCatalog::builtin().len());
    }

    #[test]
    fn files_are_merged_and_non_json_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "10_custom.json", PATH_LEVEL);
        write(dir.path(), "notes.txt", "not a level");

        let config = LevelsConfig {
            dir: Some(dir.path().to_path_buf()),
            ..LevelsConfig::default()
        };
        let catalog = load_catalog(&config).expect("load");
        assert_eq!(catalog.len(), LevelCatalog::builtin().len() + 1);
        assert!(catalog.contains(&LevelId::new("custom_path")));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "big.json", PATH_LEVEL);
        assert!(read_level_file(&path, 8).is_err());
    }

    #[test]
    fn wrong_automorphism_count_fails_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(
            dir.path(),
            "undercounted.json",
            &PATH_LEVEL.replace(
                "\"expected_automorphism_count\": 2",
                "\"expected_automorphism_count\": 1",
            ),
        );

        let config = LevelsConfig {
            dir: Some(dir.path().to_path_buf()),
            ..LevelsConfig::default()
        };
        let err = load_catalog(&config).expect_err("count is 2, not 1");
        let message = err.to_string();
        assert!(message.contains("custom_path"));
        assert!(message.contains("undercounted.json"));
    }
}
