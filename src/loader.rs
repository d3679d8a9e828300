//! Reading the JSON exports from disk.
//!
//! Malformed input fails here, with the offending path, and never reaches
//! the analysis code.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::{OverviewRecord, UserRecord};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the whole-population overview: a JSON array of contributor rows.
pub fn load_overview(path: impl AsRef<Path>) -> Result<Vec<OverviewRecord>, LoadError> {
    let path = path.as_ref();
    let records: Vec<OverviewRecord> = load_json(path)?;
    info!("loaded {} contributors from {}", records.len(), path.display());
    Ok(records)
}

/// Loads the full record of a single contributor.
pub fn load_userdata(path: impl AsRef<Path>) -> Result<UserRecord, LoadError> {
    let path = path.as_ref();
    let record: UserRecord = load_json(path)?;
    info!(
        "loaded {} commits for {} from {}",
        record.commits.len(),
        record.identity.printable_name(),
        path.display()
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_load_overview() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("overview.json");
        fs::write(
            &path,
            r#"[{"identifier": "a", "commitCount": 2}, {"identifier": "b", "reviewCommentRatio": 0.5}]"#,
        )
        .unwrap();

        let records = load_overview(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].commit_count, 2);
        assert_eq!(records[1].review_comment_ratio, 0.5);
    }

    #[test]
    fn test_malformed_json_names_the_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, r#"[{"identifier": "a", "commitCount": "many"}]"#).unwrap();

        let err = load_overview(&path).unwrap_err();
        assert!(matches!(err, LoadError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_missing_file() {
        let temp = tempdir().unwrap();
        let err = load_userdata(temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
