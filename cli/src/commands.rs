use rcm_ai::audit::{AuditPipeline, PipelineSettings};
use rcm_ai::compare::compare_with_experts;
use rcm_ai::embeddings::Embedder;
use rcm_ai::hyde::QueryFormulator;
use rcm_ai::index::{IndexManager, IndexStatus, IndexStore, VectorIndex};
use rcm_ai::invoker::{ModelInvoker, RetryPolicy};
use rcm_ai::llm::Llm;
use rcm_ai::provider::{build_embedder, build_llm};
use rcm_ai::retrieve::CorpusRetriever;
use rcm_ai::summary::{generate_client_summary, SummaryOutcome};
use rcm_core::config::AppConfig;
use rcm_core::domain::CorpusTag;
use rcm_core::error::AppError;
use rcm_core::ingest::expert_csv::read_expert_csv;
use rcm_core::ingest::rcm_csv::read_rcm_csv;
use rcm_core::report::{read_audit_results, write_audit_results, write_semicolon_csv};

/// Providers and the shared invoker, built once per command from the loaded config.
struct Models {
    llm: Box<dyn Llm>,
    embedder: Box<dyn Embedder>,
    invoker: ModelInvoker,
}

impl Models {
    fn from_config(cfg: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            llm: build_llm(&cfg.llm_settings)?,
            embedder: build_embedder(&cfg.llm_settings)?,
            invoker: ModelInvoker::with_thread_sleeper(RetryPolicy::from_settings(&cfg.retry)),
        })
    }
}

fn index_manager(cfg: &AppConfig, invoker: &ModelInvoker) -> IndexManager {
    IndexManager::new(
        IndexStore::open(cfg.paths.index_dir.clone()),
        &cfg.rag_settings,
        invoker.clone(),
    )
}

fn load_indexes(
    cfg: &AppConfig,
    embedder: &dyn Embedder,
    invoker: &ModelInvoker,
) -> Result<(Option<VectorIndex>, Option<VectorIndex>), AppError> {
    let manager = index_manager(cfg, invoker);
    let client = manager.build_or_load(CorpusTag::Client, &cfg.paths.documents_folder, embedder)?;
    let regulations =
        manager.build_or_load(CorpusTag::Regulations, &cfg.paths.regulations_folder, embedder)?;
    if client.is_none() {
        tracing::warn!(
            folder = %cfg.paths.documents_folder.display(),
            "client corpus is empty; answers will lack client evidence"
        );
    }
    Ok((client, regulations))
}

/// Retriever over both corpora, shared by every command that generates answers.
fn corpus_retriever<'m>(cfg: &AppConfig, models: &'m Models) -> Result<CorpusRetriever<'m>, AppError> {
    let (client, regulations) = load_indexes(cfg, models.embedder.as_ref(), &models.invoker)?;
    Ok(CorpusRetriever::new(
        client,
        regulations,
        models.embedder.as_ref(),
        models.invoker.clone(),
    ))
}

pub fn index(cfg: &AppConfig) -> Result<(), AppError> {
    let embedder = build_embedder(&cfg.llm_settings)?;
    let invoker = ModelInvoker::with_thread_sleeper(RetryPolicy::from_settings(&cfg.retry));
    load_indexes(cfg, embedder.as_ref(), &invoker)?;

    let manager = index_manager(cfg, &invoker);
    for tag in [CorpusTag::Client, CorpusTag::Regulations] {
        match manager.status(tag)? {
            Some(st) => println!("{}", describe_status(&st)),
            None => println!("{tag}: no index"),
        }
    }
    Ok(())
}

fn describe_status(st: &IndexStatus) -> String {
    format!(
        "{}: {} chunks, model={}, dims={}, updated_at={}",
        st.corpus_tag, st.chunk_count, st.model, st.dims, st.updated_at
    )
}

pub fn run(cfg: &AppConfig) -> Result<(), AppError> {
    let models = Models::from_config(cfg)?;
    let retriever = corpus_retriever(cfg, &models)?;

    let rows = read_rcm_csv(&cfg.paths.input_csv)?;
    tracing::info!(rows = rows.len(), path = %cfg.paths.input_csv.display(), "input loaded");

    let pipeline = AuditPipeline::new(
        models.llm.as_ref(),
        &retriever,
        models.invoker.clone(),
        QueryFormulator::from_settings(&cfg.rag_settings),
        PipelineSettings::from_settings(&cfg.rag_settings),
    );
    let records = pipeline.run(&rows);

    write_audit_results(&cfg.paths.output_json, &records)?;
    let failed = records.iter().filter(|r| r.is_failed()).count();
    tracing::info!(
        rows = records.len(),
        failed,
        path = %cfg.paths.output_json.display(),
        "audit complete"
    );
    Ok(())
}

pub fn summary(cfg: &AppConfig) -> Result<(), AppError> {
    let models = Models::from_config(cfg)?;
    let retriever = corpus_retriever(cfg, &models)?;
    let pipeline = AuditPipeline::new(
        models.llm.as_ref(),
        &retriever,
        models.invoker.clone(),
        QueryFormulator::from_settings(&cfg.rag_settings),
        PipelineSettings::from_settings(&cfg.rag_settings),
    );
    match generate_client_summary(&pipeline, &cfg.paths.client_summary)? {
        SummaryOutcome::AlreadyExists => {
            println!("client summary already exists: {}", cfg.paths.client_summary.display())
        }
        SummaryOutcome::Written { chunks } => println!(
            "client summary written from {chunks} chunks: {}",
            cfg.paths.client_summary.display()
        ),
        SummaryOutcome::Failed { error } => println!("client summary not generated: {error}"),
    }
    Ok(())
}

pub fn compare(cfg: &AppConfig) -> Result<(), AppError> {
    let audit_rows = read_audit_results(&cfg.paths.output_json)?;
    let experts = read_expert_csv(&cfg.paths.expert_answers_csv)?;
    let embedder = build_embedder(&cfg.llm_settings)?;
    let invoker = ModelInvoker::with_thread_sleeper(RetryPolicy::from_settings(&cfg.retry));

    let report = compare_with_experts(&audit_rows, &experts, embedder.as_ref(), &invoker);
    write_semicolon_csv(&cfg.paths.comparison_report_csv, &report)?;
    tracing::info!(
        pairs = report.len(),
        path = %cfg.paths.comparison_report_csv.display(),
        "comparison report written"
    );
    Ok(())
}
