use std::fs;
use std::path::{Path, PathBuf};

use rcm_core::domain::DocumentUnit;
use rcm_core::error::AppError;
use rcm_core::ingest::text::decode_legacy_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" | "md" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }
}

/// Extract every page of every supported document under `folder`.
///
/// A missing folder is created and yields nothing. Files are visited in name order;
/// a file that cannot be read is skipped with a warning.
pub fn load_corpus(folder: &Path) -> Result<Vec<DocumentUnit>, AppError> {
    if !folder.exists() {
        fs::create_dir_all(folder).map_err(|e| {
            AppError::io("AI_CORPUS_DIR_FAILED", "Failed to create corpus folder", folder, e)
        })?;
        tracing::warn!(folder = %folder.display(), "corpus folder was missing; created it empty");
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(folder)
        .map_err(|e| AppError::io("AI_CORPUS_DIR_FAILED", "Failed to list corpus folder", folder, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let mut units = Vec::new();
    for path in files {
        let Some(kind) = DocumentKind::from_path(&path) else {
            tracing::debug!(path = %path.display(), "unsupported document type; skipped");
            continue;
        };
        let loaded = match kind {
            DocumentKind::Pdf => load_pdf(&path),
            DocumentKind::PlainText => load_text(&path),
        };
        match loaded {
            Ok(mut pages) => {
                tracing::info!(path = %path.display(), pages = pages.len(), "document loaded");
                units.append(&mut pages);
            }
            Err(e) => tracing::warn!(path = %path.display(), err = %e.describe(), "document skipped"),
        }
    }
    Ok(units)
}

fn source_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn load_pdf(path: &Path) -> Result<Vec<DocumentUnit>, AppError> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| AppError::io("AI_CORPUS_PDF_FAILED", "Failed to open PDF", path, e))?;
    let source_id = source_id(path);

    let mut units = Vec::new();
    // get_pages is keyed by 1-based page number.
    for page_number in doc.get_pages().into_keys() {
        match doc.extract_text(&[page_number]) {
            Ok(raw_text) => units.push(DocumentUnit {
                source_id: source_id.clone(),
                page_number,
                raw_text,
            }),
            Err(e) => tracing::warn!(
                path = %path.display(),
                page = page_number,
                err = %e,
                "PDF page text extraction failed; page skipped"
            ),
        }
    }
    Ok(units)
}

fn load_text(path: &Path) -> Result<Vec<DocumentUnit>, AppError> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::io("AI_CORPUS_READ_FAILED", "Failed to read document", path, e))?;
    let (text, _) = decode_legacy_text(&bytes);
    Ok(split_pages(&source_id(path), &text))
}

/// Form feeds separate pages in plain-text exports.
pub(crate) fn split_pages(source_id: &str, text: &str) -> Vec<DocumentUnit> {
    let text = text.replace("\r\n", "\n");
    text.split('\u{000C}')
        .enumerate()
        .map(|(i, page)| DocumentUnit {
            source_id: source_id.to_string(),
            page_number: i as u32 + 1,
            raw_text: page.to_string(),
        })
        .collect()
}
