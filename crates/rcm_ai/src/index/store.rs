use std::fs;
use std::path::{Path, PathBuf};

use rcm_core::clock::now_rfc3339_utc;
use rcm_core::domain::CorpusTag;
use rcm_core::error::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::vector::{IndexEntry, VectorIndex};

pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Manifest written next to the entries of a persisted index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStatus {
    pub format_version: u32,
    pub corpus_tag: CorpusTag,
    pub model: String,
    pub dims: u32,
    pub chunk_count: u32,
    pub updated_at: String,
}

/// One directory per corpus tag under `root`: `index_status.json` + `index_entries.json`.
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    fn index_dir(&self, tag: CorpusTag) -> PathBuf {
        self.root.join(tag.as_str())
    }

    fn status_path(&self, tag: CorpusTag) -> PathBuf {
        self.index_dir(tag).join("index_status.json")
    }

    fn entries_path(&self, tag: CorpusTag) -> PathBuf {
        self.index_dir(tag).join("index_entries.json")
    }

    /// Manifest of the persisted index, if one exists.
    pub fn status(&self, tag: CorpusTag) -> Result<Option<IndexStatus>, AppError> {
        let path = self.status_path(tag);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path, "index status").map(Some)
    }

    /// Entries are written before the manifest, so a manifest always describes complete entries.
    pub fn save(&self, index: &VectorIndex) -> Result<IndexStatus, AppError> {
        let tag = index.corpus_tag();
        let dir = self.index_dir(tag);
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::io("AI_INDEX_PERSIST_FAILED", "Failed to create index directory", &dir, e)
        })?;

        write_json(&self.entries_path(tag), index.entries(), "index entries")?;
        let status = IndexStatus {
            format_version: INDEX_FORMAT_VERSION,
            corpus_tag: tag,
            model: index.embedding_model().to_string(),
            dims: index.dims() as u32,
            chunk_count: index.len() as u32,
            updated_at: now_rfc3339_utc()?,
        };
        write_json(&self.status_path(tag), &status, "index status")?;
        tracing::info!(
            corpus = %tag,
            chunks = status.chunk_count,
            dims = status.dims,
            path = %dir.display(),
            "index persisted"
        );
        Ok(status)
    }

    pub fn load(&self, tag: CorpusTag) -> Result<Option<VectorIndex>, AppError> {
        let Some(status) = self.status(tag)? else {
            return Ok(None);
        };
        if status.format_version != INDEX_FORMAT_VERSION || status.corpus_tag != tag {
            return Err(AppError::new("AI_INDEX_LOAD_FAILED", "Unsupported index manifest")
                .with_details(format!(
                    "format_version={}; corpus={}",
                    status.format_version, status.corpus_tag
                )));
        }
        let entries: Vec<IndexEntry> = read_json(&self.entries_path(tag), "index entries")?;
        if entries.len() != status.chunk_count as usize {
            return Err(AppError::new(
                "AI_INDEX_LOAD_FAILED",
                "Index entry count does not match manifest",
            )
            .with_details(format!(
                "expected={}; got={}",
                status.chunk_count,
                entries.len()
            )));
        }
        VectorIndex::from_entries(tag, status.model, status.dims as usize, entries).map(Some)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::io("AI_INDEX_LOAD_FAILED", format!("Failed to read {what}"), path, e)
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        AppError::io("AI_INDEX_LOAD_FAILED", format!("Failed to decode {what}"), path, e)
    })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, what: &str) -> Result<(), AppError> {
    let tmp = path.with_extension("tmp");
    let json = serde_json::to_vec(value).map_err(|e| {
        AppError::new("AI_INDEX_PERSIST_FAILED", format!("Failed to encode {what}"))
            .with_details(e.to_string())
    })?;
    fs::write(&tmp, &json).map_err(|e| {
        AppError::io("AI_INDEX_PERSIST_FAILED", format!("Failed to write {what}"), &tmp, e)
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        AppError::new("AI_INDEX_PERSIST_FAILED", format!("Failed to finalize {what} write"))
            .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
    })
}
