use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Run configuration, loaded once by the binary and handed to each component constructor.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub rag_settings: RagSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub llm_settings: LlmSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    #[serde(default = "default_documents_folder")]
    pub documents_folder: PathBuf,
    #[serde(default = "default_regulations_folder")]
    pub regulations_folder: PathBuf,
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
    #[serde(default = "default_input_csv")]
    pub input_csv: PathBuf,
    #[serde(default = "default_output_json")]
    pub output_json: PathBuf,
    #[serde(default = "default_client_summary")]
    pub client_summary: PathBuf,
    #[serde(default = "default_expert_answers_csv")]
    pub expert_answers_csv: PathBuf,
    #[serde(default = "default_comparison_report_csv")]
    pub comparison_report_csv: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            documents_folder: default_documents_folder(),
            regulations_folder: default_regulations_folder(),
            index_dir: default_index_dir(),
            input_csv: default_input_csv(),
            output_json: default_output_json(),
            client_summary: default_client_summary(),
            expert_answers_csv: default_expert_answers_csv(),
            comparison_report_csv: default_comparison_report_csv(),
        }
    }
}

impl PathsConfig {
    fn resolve_against(&mut self, base: &Path) {
        for p in [
            &mut self.documents_folder,
            &mut self.regulations_folder,
            &mut self.index_dir,
            &mut self.input_csv,
            &mut self.output_json,
            &mut self.client_summary,
            &mut self.expert_answers_csv,
            &mut self.comparison_report_csv,
        ] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Language the source documents are written in; HyDE passages are generated in it.
    #[serde(default = "default_document_language")]
    pub document_language: String,
    #[serde(default = "default_vocabulary_domain")]
    pub vocabulary_domain: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_evidence_citations")]
    pub evidence_citations: usize,
    #[serde(default = "default_ingest_batch_size")]
    pub ingest_batch_size: usize,
    #[serde(default = "default_ingest_batch_delay_secs")]
    pub ingest_batch_delay_secs: u64,
    #[serde(default = "default_row_delay_secs")]
    pub row_delay_secs: u64,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            document_language: default_document_language(),
            vocabulary_domain: default_vocabulary_domain(),
            top_k: default_top_k(),
            evidence_citations: default_evidence_citations(),
            ingest_batch_size: default_ingest_batch_size(),
            ingest_batch_delay_secs: default_ingest_batch_delay_secs(),
            row_delay_secs: default_row_delay_secs(),
        }
    }
}

impl RagSettings {
    pub fn ingest_batch_delay(&self) -> Duration {
        Duration::from_secs(self.ingest_batch_delay_secs)
    }

    pub fn row_delay(&self) -> Duration {
        Duration::from_secs(self.row_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_secs: default_base_delay_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    #[serde(alias = "open_ai")]
    OpenAi,
    #[serde(alias = "gemini")]
    Google,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_openai")]
    pub openai: ProviderSettings,
    #[serde(default = "default_google")]
    pub google: ProviderSettings,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            temperature: 0.0,
            openai: default_openai(),
            google: default_google(),
        }
    }
}

impl LlmSettings {
    /// Settings block of the selected provider.
    pub fn active(&self) -> &ProviderSettings {
        match self.provider {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Google => &self.google,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderSettings {
    pub model: String,
    pub embedding_model: String,
    pub base_url: String,
}

impl AppConfig {
    /// Load a YAML config. A missing file yields defaults; relative paths resolve against the
    /// directory holding the config file.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        let base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = if path.exists() {
            let raw = fs::read_to_string(path).map_err(|e| {
                AppError::io("CONFIG_READ_FAILED", "Failed to read config file", path, e)
            })?;
            Self::from_yaml_str(&raw)?
        } else {
            tracing::warn!(path = %path.display(), "config file not found; using defaults");
            Self::default()
        };

        config.paths.resolve_against(&base);
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, AppError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| {
            AppError::new("CONFIG_PARSE_FAILED", "Failed to parse config YAML")
                .with_details(e.to_string())
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let rag = &self.rag_settings;
        if rag.chunk_size == 0 {
            return Err(AppError::new("CONFIG_INVALID", "chunk_size must be greater than zero"));
        }
        if rag.chunk_overlap >= rag.chunk_size {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "chunk_overlap must be smaller than chunk_size",
            )
            .with_details(format!(
                "chunk_size={}; chunk_overlap={}",
                rag.chunk_size, rag.chunk_overlap
            )));
        }
        if rag.ingest_batch_size == 0 {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "ingest_batch_size must be greater than zero",
            ));
        }
        if rag.top_k == 0 {
            return Err(AppError::new("CONFIG_INVALID", "top_k must be greater than zero"));
        }
        if self.retry.max_retries == 0 {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "retry.max_retries must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_documents_folder() -> PathBuf {
    PathBuf::from("documents")
}

fn default_regulations_folder() -> PathBuf {
    PathBuf::from("regulations")
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("indexes")
}

fn default_input_csv() -> PathBuf {
    PathBuf::from("inputs/rcm.csv")
}

fn default_output_json() -> PathBuf {
    PathBuf::from("outputs/audit_results.json")
}

fn default_client_summary() -> PathBuf {
    PathBuf::from("outputs/client_summary.txt")
}

fn default_expert_answers_csv() -> PathBuf {
    PathBuf::from("inputs/expert_answers.csv")
}

fn default_comparison_report_csv() -> PathBuf {
    PathBuf::from("outputs/comparison_report.csv")
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_document_language() -> String {
    "English".to_string()
}

fn default_vocabulary_domain() -> String {
    "banking".to_string()
}

fn default_top_k() -> usize {
    10
}

fn default_evidence_citations() -> usize {
    5
}

fn default_ingest_batch_size() -> usize {
    10
}

fn default_ingest_batch_delay_secs() -> u64 {
    5
}

fn default_row_delay_secs() -> u64 {
    1
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_secs() -> u64 {
    20
}

fn default_openai() -> ProviderSettings {
    ProviderSettings {
        model: "gpt-4o-mini".to_string(),
        embedding_model: "text-embedding-3-small".to_string(),
        base_url: "https://api.openai.com/v1".to_string(),
    }
}

fn default_google() -> ProviderSettings {
    ProviderSettings {
        model: "gemini-1.5-flash".to_string(),
        embedding_model: "models/gemini-embedding-001".to_string(),
        base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
    }
}
