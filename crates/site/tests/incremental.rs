//! End-to-end engine behaviour over in-memory backends.
//!
//! These tests exercise the contract that matters: an incremental run must
//! produce exactly the output a full rebuild would, while doing strictly
//! less work, and failures must stay contained to the unit that caused them.

use plume_config::{SiteConfig, StaleOutputs};
use plume_site::{BuildMode, FailureStage, STATE_FILE, Site};
use plume_storage::backend::MemoryBackend;
use plume_storage::BackendHandle;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct Fixture {
    site: Site,
    content: BackendHandle,
    templates: BackendHandle,
    output: BackendHandle,
}

fn fixture_with(config: SiteConfig, content: &[(&str, &str)], templates: &[(&str, &str)]) -> Fixture {
    let content: BackendHandle =
        Arc::new(MemoryBackend::with_files(content.iter().map(|(p, b)| (*p, *b))).with_name("content"));
    let templates: BackendHandle =
        Arc::new(MemoryBackend::with_files(templates.iter().map(|(p, b)| (*p, *b))).with_name("templates"));
    let output: BackendHandle = Arc::new(MemoryBackend::default().with_name("output"));
    let site =
        Site::with_backends(config, content.clone(), templates.clone(), output.clone());
    Fixture { site, content, templates, output }
}

fn fixture(content: &[(&str, &str)]) -> Fixture {
    fixture_with(SiteConfig::default(), content, &[])
}

async fn snapshot(backend: &BackendHandle) -> BTreeMap<PathBuf, Vec<u8>> {
    let mut map = BTreeMap::new();
    for info in backend.list(None).await.unwrap() {
        map.insert(info.path.clone(), backend.read(&info.path).await.unwrap());
    }
    map
}

async fn exists(backend: &BackendHandle, path: &str) -> bool {
    backend.exists(Path::new(path)).await.unwrap()
}

const POST_A: &str = "---\ntitle: Alpha\ndate: 2024-01-10\n---\n# Alpha\n\nFirst.\n";
const POST_B: &str = "---\ntitle: Beta\ndate: 2024-02-20\n---\n# Beta\n\nSecond.\n";

#[tokio::test]
async fn test_first_build_renders_units_and_all_aggregates() {
    let fx = fixture(&[("alpha.md", POST_A), ("beta.md", POST_B)]);
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();

    assert!(report.success());
    assert_eq!(report.rebuilt, ["alpha", "beta"]);
    assert_eq!(report.skipped, 0);
    assert!(report.aggregates_rebuilt);
    for artifact in
        ["alpha.html", "beta.html", "index.html", "archive.html", "sitemap.xml", "rss.xml", "robots.txt", STATE_FILE]
    {
        assert!(exists(&fx.output, artifact).await, "missing {artifact}");
    }
}

#[tokio::test]
async fn test_second_run_with_no_changes_does_nothing() {
    let fx = fixture(&[("alpha.md", POST_A), ("beta.md", POST_B)]);
    fx.site.build(BuildMode::Incremental).await.unwrap();
    let before = snapshot(&fx.output).await;

    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert!(report.success());
    assert!(report.rebuilt.is_empty());
    assert_eq!(report.skipped, 2);
    assert!(!report.aggregates_rebuilt);
    assert_eq!(snapshot(&fx.output).await, before);
}

#[tokio::test]
async fn test_editing_one_unit_rebuilds_it_and_the_aggregates_only() {
    let fx = fixture(&[("alpha.md", POST_A), ("beta.md", POST_B)]);
    fx.site.build(BuildMode::Incremental).await.unwrap();
    let alpha_before = fx.output.read(Path::new("alpha.html")).await.unwrap();

    let edited = POST_B.replace("Second.", "Second, edited.");
    fx.content.write(Path::new("beta.md"), edited.as_bytes()).await.unwrap();

    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert_eq!(report.rebuilt, ["beta"]);
    assert_eq!(report.skipped, 1);
    assert!(report.aggregates_rebuilt);
    assert_eq!(fx.output.read(Path::new("alpha.html")).await.unwrap(), alpha_before);
    let beta = fx.output.read(Path::new("beta.html")).await.unwrap();
    assert!(String::from_utf8(beta).unwrap().contains("Second, edited."));
}

#[tokio::test]
async fn test_incremental_output_is_byte_identical_to_full_rebuild() {
    let fx = fixture(&[("alpha.md", POST_A), ("beta.md", POST_B)]);
    fx.site.build(BuildMode::Incremental).await.unwrap();

    // Evolve the corpus: edit one unit, add another, then run incrementally.
    fx.content.write(Path::new("beta.md"), POST_B.replace("Beta", "Beta Prime").as_bytes()).await.unwrap();
    fx.content
        .write(Path::new("gamma.md"), b"---\ntitle: Gamma\ndate: 2024-03-30\n---\n# Gamma\n")
        .await
        .unwrap();
    fx.site.build(BuildMode::Incremental).await.unwrap();
    let incremental = snapshot(&fx.output).await;

    // A pristine site over the same final sources must produce the same bytes.
    let beta_prime = POST_B.replace("Beta", "Beta Prime");
    let fresh = fixture(&[
        ("alpha.md", POST_A),
        ("beta.md", beta_prime.as_str()),
        ("gamma.md", "---\ntitle: Gamma\ndate: 2024-03-30\n---\n# Gamma\n"),
    ]);
    fresh.site.build(BuildMode::Full).await.unwrap();
    assert_eq!(snapshot(&fresh.output).await, incremental);
}

#[tokio::test]
async fn test_template_edit_invalidates_only_its_users() {
    let fx = fixture_with(
        SiteConfig::default(),
        &[
            ("alpha.md", "---\ntitle: Alpha\ntemplate: page\n---\n# Alpha\n"),
            ("beta.md", POST_B),
        ],
        &[("page.html", "<main>v1 {{ post.content }}</main>")],
    );
    fx.site.build(BuildMode::Incremental).await.unwrap();

    fx.templates
        .write(Path::new("page.html"), b"<main>v2 {{ post.content }}</main>")
        .await
        .unwrap();
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert_eq!(report.rebuilt, ["alpha"]);
    assert_eq!(report.skipped, 1);
    assert!(report.aggregates_rebuilt);
    let alpha = String::from_utf8(fx.output.read(Path::new("alpha.html")).await.unwrap()).unwrap();
    assert!(alpha.contains("v2"));
}

#[tokio::test]
async fn test_added_unit_joins_the_aggregates() {
    let fx = fixture(&[("alpha.md", POST_A)]);
    fx.site.build(BuildMode::Incremental).await.unwrap();

    fx.content.write(Path::new("beta.md"), POST_B.as_bytes()).await.unwrap();
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert_eq!(report.rebuilt, ["beta"]);
    assert!(report.aggregates_rebuilt);

    let index = String::from_utf8(fx.output.read(Path::new("index.html")).await.unwrap()).unwrap();
    assert!(index.contains("Beta"));
    let sitemap = String::from_utf8(fx.output.read(Path::new("sitemap.xml")).await.unwrap()).unwrap();
    assert!(sitemap.contains("beta.html"));
}

#[tokio::test]
async fn test_removed_unit_is_reported_stale_and_kept_by_default() {
    let fx = fixture(&[("alpha.md", POST_A), ("beta.md", POST_B)]);
    fx.site.build(BuildMode::Incremental).await.unwrap();

    fx.content.delete(Path::new("beta.md")).await.unwrap();
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert!(report.success());
    assert_eq!(report.stale.len(), 1);
    assert_eq!(report.stale[0].slug, "beta");
    assert!(!report.stale[0].deleted);
    // Keep policy leaves the artifact, but the listings drop the unit.
    assert!(exists(&fx.output, "beta.html").await);
    let index = String::from_utf8(fx.output.read(Path::new("index.html")).await.unwrap()).unwrap();
    assert!(!index.contains("Beta"));

    // The record is gone, so a third run has nothing stale left to report.
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert!(report.stale.is_empty());
}

#[tokio::test]
async fn test_delete_policy_removes_stale_outputs() {
    let mut config = SiteConfig::default();
    config.build.stale_outputs = StaleOutputs::Delete;
    let fx = fixture_with(config, &[("alpha.md", POST_A), ("beta.md", POST_B)], &[]);
    fx.site.build(BuildMode::Incremental).await.unwrap();

    fx.content.delete(Path::new("beta.md")).await.unwrap();
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert_eq!(report.stale.len(), 1);
    assert!(report.stale[0].deleted);
    assert!(!exists(&fx.output, "beta.html").await);
    assert!(exists(&fx.output, "alpha.html").await);
}

#[tokio::test]
async fn test_broken_source_is_not_treated_as_removed() {
    let mut config = SiteConfig::default();
    config.build.stale_outputs = StaleOutputs::Delete;
    let fx = fixture_with(config, &[("alpha.md", POST_A), ("beta.md", POST_B)], &[]);
    fx.site.build(BuildMode::Incremental).await.unwrap();

    // The source file still exists, it just no longer parses. Even under the
    // delete policy its output must survive: only removal makes it stale.
    fx.content.write(Path::new("beta.md"), b"---\ntitle: [unclosed\n---\nbody").await.unwrap();
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert!(!report.success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, FailureStage::Parse);
    assert!(report.stale.is_empty());
    assert!(exists(&fx.output, "beta.html").await);

    // Fixing the file is an ordinary edit: the unit rebuilds and the run is
    // clean again.
    let repaired = POST_B.replace("Second.", "Second, repaired.");
    fx.content.write(Path::new("beta.md"), repaired.as_bytes()).await.unwrap();
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert!(report.success());
    assert_eq!(report.rebuilt, ["beta"]);
    let beta = String::from_utf8(fx.output.read(Path::new("beta.html")).await.unwrap()).unwrap();
    assert!(beta.contains("Second, repaired."));
}

#[tokio::test]
async fn test_corrupt_state_forces_a_full_rebuild() {
    let fx = fixture(&[("alpha.md", POST_A), ("beta.md", POST_B)]);
    fx.site.build(BuildMode::Incremental).await.unwrap();

    fx.output.write(Path::new(STATE_FILE), b"{definitely not json").await.unwrap();
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert!(report.state_recovered);
    assert_eq!(report.mode, BuildMode::Full);
    assert_eq!(report.rebuilt, ["alpha", "beta"]);
    assert!(report.success());

    // The rewritten state supports incremental runs again.
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert!(report.rebuilt.is_empty());
}

#[tokio::test]
async fn test_lost_state_rebuilds_without_changing_output() {
    let fx = fixture(&[("alpha.md", POST_A), ("beta.md", POST_B)]);
    fx.site.build(BuildMode::Incremental).await.unwrap();
    let before = snapshot(&fx.output).await;

    // A run interrupted before the final state write leaves outputs on disk
    // with no record of them; the engine must redo the work, not skip it.
    fx.output.delete(Path::new(STATE_FILE)).await.unwrap();
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert_eq!(report.rebuilt, ["alpha", "beta"]);
    assert_eq!(snapshot(&fx.output).await, before);
}

#[tokio::test]
async fn test_config_change_invalidates_the_whole_corpus() {
    let fx = fixture(&[("alpha.md", POST_A), ("beta.md", POST_B)]);
    fx.site.build(BuildMode::Incremental).await.unwrap();

    let mut config = fx.site.config().clone();
    config.site.title = "Renamed Blog".to_string();
    let site = Site::with_backends(config, fx.content.clone(), fx.templates.clone(), fx.output.clone());
    let report = site.build(BuildMode::Incremental).await.unwrap();
    assert_eq!(report.rebuilt, ["alpha", "beta"]);
    assert!(report.aggregates_rebuilt);
    let index = String::from_utf8(fx.output.read(Path::new("index.html")).await.unwrap()).unwrap();
    assert!(index.contains("Renamed Blog"));
}

#[tokio::test]
async fn test_parse_failure_is_isolated_and_fails_the_run() {
    let fx = fixture(&[("alpha.md", POST_A), ("broken.md", "---\ntitle: [unclosed\n---\nbody")]);
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();

    assert!(!report.success());
    assert_eq!(report.rebuilt, ["alpha"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, FailureStage::Parse);
    assert!(exists(&fx.output, "alpha.html").await);
}

#[tokio::test]
async fn test_missing_template_fails_only_its_unit() {
    let fx = fixture(&[
        ("alpha.md", POST_A),
        ("odd.md", "---\ntitle: Odd\ntemplate: nonexistent\n---\nbody"),
    ]);
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();

    assert!(!report.success());
    assert_eq!(report.rebuilt, ["alpha"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].stage, FailureStage::MissingTemplate);
    assert!(!exists(&fx.output, "odd.html").await);

    // The failed unit has no state record, so it is retried every run until
    // it succeeds.
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert_eq!(report.failures.len(), 1);

    fx.templates.write(Path::new("nonexistent.html"), b"<p>{{ post.title }}</p>").await.unwrap();
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert!(report.success());
    assert_eq!(report.rebuilt, ["odd"]);
}

#[tokio::test]
async fn test_plan_is_a_dry_run() {
    let fx = fixture(&[("alpha.md", POST_A), ("beta.md", POST_B)]);
    fx.site.build(BuildMode::Incremental).await.unwrap();
    fx.content.write(Path::new("beta.md"), b"# Changed").await.unwrap();

    let plan = fx.site.plan().await.unwrap();
    assert_eq!(plan.rebuild.len(), 1);
    assert_eq!(plan.rebuild[0].unit.slug, "beta");
    assert!(plan.aggregates);

    // Planning must not have written anything.
    let beta = String::from_utf8(fx.output.read(Path::new("beta.html")).await.unwrap()).unwrap();
    assert!(beta.contains("Second."));
}

#[tokio::test]
async fn test_drafts_become_stale_when_marked() {
    let fx = fixture(&[("alpha.md", POST_A), ("beta.md", POST_B)]);
    fx.site.build(BuildMode::Incremental).await.unwrap();

    // Marking a published unit as draft retracts it like a removal.
    let drafted = POST_B.replace("---\ntitle:", "---\ndraft: true\ntitle:");
    fx.content.write(Path::new("beta.md"), drafted.as_bytes()).await.unwrap();
    let report = fx.site.build(BuildMode::Incremental).await.unwrap();
    assert_eq!(report.stale.len(), 1);
    assert_eq!(report.stale[0].slug, "beta");
    let index = String::from_utf8(fx.output.read(Path::new("index.html")).await.unwrap()).unwrap();
    assert!(!index.contains("Beta"));
}
