mod common;

use std::fs;
use std::time::Duration;

use common::{chunk, invoker, CountABEmbedder};
use pretty_assertions::assert_eq;
use rcm_ai::index::{IndexManager, IndexStore};
use rcm_core::config::RagSettings;
use rcm_core::domain::{Chunk, CorpusTag};

fn chunks(n: usize) -> Vec<Chunk> {
    (0..n)
        .map(|i| chunk(CorpusTag::Client, i as u32 + 1, &format!("{}{}", "a".repeat(i + 1), "b")))
        .collect()
}

fn manager(root: &std::path::Path) -> (IndexManager, std::sync::Arc<common::RecordingSleeper>) {
    let (invoker, sleeper) = invoker(5, 20);
    let settings = RagSettings::default();
    (IndexManager::new(IndexStore::open(root.to_path_buf()), &settings, invoker), sleeper)
}

#[test]
fn ingest_batches_and_pauses_between_batches_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mgr, sleeper) = manager(dir.path());
    let embedder = CountABEmbedder::named("mock-embed");

    let index = mgr
        .ingest(CorpusTag::Client, chunks(23), &embedder)
        .expect("ingest")
        .expect("index");

    assert_eq!(index.len(), 23);
    assert_eq!(embedder.calls(), vec![10, 10, 3]);
    assert_eq!(sleeper.waits(), vec![Duration::from_secs(5), Duration::from_secs(5)]);
}

#[test]
fn single_batch_has_no_pause_and_empty_input_has_no_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mgr, sleeper) = manager(dir.path());
    let embedder = CountABEmbedder::named("mock-embed");

    assert!(mgr.ingest(CorpusTag::Client, chunks(10), &embedder).expect("ingest").is_some());
    assert!(sleeper.waits().is_empty());

    assert!(mgr
        .ingest(CorpusTag::Regulations, Vec::new(), &embedder)
        .expect("ingest")
        .is_none());
    assert_eq!(embedder.calls(), vec![10]);
}

#[test]
fn persisted_index_reloads_with_identical_ordering() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mgr, _) = manager(dir.path());
    let embedder = CountABEmbedder::named("mock-embed");
    let built = mgr
        .ingest(CorpusTag::Client, chunks(12), &embedder)
        .expect("ingest")
        .expect("index");

    let loaded = IndexStore::open(dir.path().to_path_buf())
        .load(CorpusTag::Client)
        .expect("load")
        .expect("persisted");
    assert_eq!(loaded, built);

    for query in [[1.0f32, 0.0], [0.0, 1.0], [3.0, 1.0]] {
        let ids = |index: &rcm_ai::index::VectorIndex| -> Vec<String> {
            index
                .search(&query, 5)
                .expect("search")
                .into_iter()
                .map(|h| h.chunk.chunk_id)
                .collect()
        };
        assert_eq!(ids(&built), ids(&loaded));
    }

    let status = mgr.status(CorpusTag::Client).expect("status").expect("manifest");
    assert_eq!(status.model, "mock-embed");
    assert_eq!(status.chunk_count, 12);
    assert_eq!(status.dims, 2);
}

#[test]
fn build_or_load_reuses_matching_index_and_rebuilds_otherwise() {
    let dir = tempfile::tempdir().expect("tempdir");
    let docs = dir.path().join("documents");
    fs::create_dir_all(&docs).expect("mkdir");
    fs::write(docs.join("policy.txt"), "aaa bbb\u{000C}ab").expect("write");
    let (mgr, _) = manager(&dir.path().join("indexes"));

    let first = CountABEmbedder::named("model-1");
    let built = mgr
        .build_or_load(CorpusTag::Client, &docs, &first)
        .expect("build")
        .expect("index");
    assert_eq!(built.len(), 2);
    assert_eq!(first.calls(), vec![2]);

    let again = CountABEmbedder::named("model-1");
    let reloaded = mgr
        .build_or_load(CorpusTag::Client, &docs, &again)
        .expect("load")
        .expect("index");
    assert_eq!(reloaded, built);
    assert!(again.calls().is_empty(), "a matching index must not be re-embedded");

    let other = CountABEmbedder::named("model-2");
    let rebuilt = mgr
        .build_or_load(CorpusTag::Client, &docs, &other)
        .expect("rebuild")
        .expect("index");
    assert_eq!(rebuilt.embedding_model(), "model-2");
    assert_eq!(other.calls(), vec![2]);
}

#[test]
fn corrupt_manifest_falls_back_to_rebuild() {
    let dir = tempfile::tempdir().expect("tempdir");
    let docs = dir.path().join("regulations");
    fs::create_dir_all(&docs).expect("mkdir");
    fs::write(docs.join("rule.md"), "abab").expect("write");
    let index_root = dir.path().join("indexes");
    fs::create_dir_all(index_root.join("regulations")).expect("mkdir");
    fs::write(index_root.join("regulations").join("index_status.json"), "{not json").expect("write");

    let (mgr, _) = manager(&index_root);
    let embedder = CountABEmbedder::named("mock-embed");
    let index = mgr
        .build_or_load(CorpusTag::Regulations, &docs, &embedder)
        .expect("rebuild")
        .expect("index");
    assert_eq!(index.len(), 1);
    assert_eq!(embedder.calls(), vec![1]);
}

#[test]
fn missing_corpus_folder_yields_no_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (mgr, _) = manager(&dir.path().join("indexes"));
    let embedder = CountABEmbedder::named("mock-embed");
    let folder = dir.path().join("documents");
    assert!(mgr
        .build_or_load(CorpusTag::Client, &folder, &embedder)
        .expect("build")
        .is_none());
    assert!(folder.is_dir());
    assert!(embedder.calls().is_empty());
}
