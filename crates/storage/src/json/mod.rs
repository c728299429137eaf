use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use quiz_core::model::{ChapterKey, QuestionType};
use tracing::warn;

use crate::repository::{Storage, StorageError};

mod mapping;
mod progress_repo;
mod question_repo;
mod settings_repo;

pub use mapping::QuestionRecord;

/// Where the flat-file backend keeps its files.
///
/// - questions: `<data_dir>/quiz_<chapter>_<type>.json`
/// - progress: `<data_dir>/progress/learned_<chapter>_<type>.json`
/// - settings: `settings_path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    data_dir: PathBuf,
    settings_path: PathBuf,
}

impl StoreLayout {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, settings_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            settings_path: settings_path.into(),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn progress_dir(&self) -> PathBuf {
        self.data_dir.join("progress")
    }

    #[must_use]
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    #[must_use]
    pub fn question_path(&self, chapter: &ChapterKey, question_type: QuestionType) -> PathBuf {
        self.data_dir
            .join(format!("quiz_{chapter}_{}.json", question_type.as_str()))
    }

    #[must_use]
    pub fn progress_path(&self, chapter: &ChapterKey, question_type: QuestionType) -> PathBuf {
        self.progress_dir()
            .join(format!("learned_{chapter}_{}.json", question_type.as_str()))
    }
}

/// Repository backed by one JSON file per chapter/type.
#[derive(Debug, Clone)]
pub struct JsonRepository {
    layout: StoreLayout,
}

impl JsonRepository {
    #[must_use]
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    #[must_use]
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }
}

impl Storage {
    /// Build a `Storage` backed by JSON files under `layout`.
    #[must_use]
    pub fn json(layout: StoreLayout) -> Self {
        Self::from_repository(JsonRepository::new(layout))
    }
}

/// Read a file, treating absence and read failures as "no data".
async fn read_optional(path: &Path) -> Option<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(bytes),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "unreadable file, treating as empty");
            None
        }
    }
}

async fn exists(path: &Path) -> Result<bool, StorageError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| StorageError::Io(e.to_string()))
}

/// Replace `path` with `bytes` via a sibling temp file and rename.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| StorageError::Io(e.to_string()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| StorageError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_file_naming() {
        let layout = StoreLayout::new("data", "state/settings.json");
        let chapter = ChapterKey::new("history").unwrap();

        assert_eq!(
            layout.question_path(&chapter, QuestionType::Multi),
            PathBuf::from("data/quiz_history_multi.json")
        );
        assert_eq!(
            layout.progress_path(&chapter, QuestionType::Single),
            PathBuf::from("data/progress/learned_history_single.json")
        );
    }
}
