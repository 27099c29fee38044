use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use alphabatch_config::{ConfigGuardRailError, ConfigLoadError, ConfigLoader, ConfigSource};

fn loader(root: &std::path::Path, vars: &[(&str, &str)]) -> ConfigLoader {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigLoader::new()
        .with_env_lookup(move |key| vars.get(key).cloned())
        .with_root(root)
}

#[test]
fn defaults_apply_without_any_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let load = loader(dir.path(), &[]).load().expect("load defaults");

    assert_eq!(load.source, ConfigSource::Default);
    assert_eq!(load.config.api.base_url, "https://api.worldquantbrain.com");
    assert_eq!(load.config.orchestrator.max_concurrency.get(), 3);
    assert_eq!(load.config.orchestrator.cycle_interval_ms, 5_000);
    assert_eq!(load.config.orchestrator.saturation_backoff_ms, 30_000);
    assert_eq!(load.config.submission.max_accept_attempts, 5);
    assert_eq!(load.config.submission.heartbeat_every, 75);
    assert_eq!(
        load.config.paths.results_file,
        PathBuf::from("data/processed/backtest_results.csv")
    );
}

#[test]
fn default_file_is_discovered_and_partially_overrides() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("config")).expect("config dir");
    fs::write(
        dir.path().join("config/alphabatch.toml"),
        "[orchestrator]\nmax_concurrency = 5\n\n[paths]\nidentifiers_dir = \"fields\"\n",
    )
    .expect("write config");

    let load = loader(dir.path(), &[]).load().expect("load file");
    assert_eq!(
        load.source,
        ConfigSource::File(dir.path().join("config/alphabatch.toml"))
    );
    assert_eq!(load.config.orchestrator.max_concurrency.get(), 5);
    assert_eq!(load.config.orchestrator.cycle_interval_ms, 5_000);
    assert_eq!(load.config.paths.identifiers_dir, PathBuf::from("fields"));
}

#[test]
fn env_path_beats_inline_json_and_default_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let custom = dir.path().join("custom.json");
    fs::write(&custom, r#"{"submission": {"heartbeat_every": 10}}"#).expect("write");
    fs::write(dir.path().join("alphabatch.toml"), "").expect("write default");

    let load = loader(
        dir.path(),
        &[
            ("ALPHABATCH_CONFIG_PATH", custom.to_str().expect("utf8 path")),
            ("ALPHABATCH_CONFIG_JSON", r#"{"submission": {"heartbeat_every": 99}}"#),
        ],
    )
    .load()
    .expect("load env path");

    assert_eq!(load.source, ConfigSource::EnvPath(custom));
    assert_eq!(load.config.submission.heartbeat_every, 10);
}

#[test]
fn inline_json_is_used_when_no_path_is_set() {
    let dir = tempfile::tempdir().expect("tempdir");
    let load = loader(
        dir.path(),
        &[("ALPHABATCH_CONFIG_JSON", r#"{"api": {"poll_timeout_secs": 4}}"#)],
    )
    .load()
    .expect("load inline");

    assert_eq!(load.source, ConfigSource::EnvInline);
    assert_eq!(load.config.api.poll_timeout_secs, 4);
}

#[test]
fn explicit_path_wins_over_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let explicit = dir.path().join("run.toml");
    fs::write(&explicit, "[api]\nrequest_timeout_secs = 12\n").expect("write");

    let load = loader(dir.path(), &[("ALPHABATCH_CONFIG_JSON", "{}")])
        .with_explicit_path(Some(explicit.clone()))
        .load()
        .expect("load explicit");

    assert_eq!(load.source, ConfigSource::Explicit(explicit));
    assert_eq!(load.config.api.request_timeout_secs, 12);
}

#[test]
fn out_of_range_concurrency_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = loader(
        dir.path(),
        &[("ALPHABATCH_CONFIG_JSON", r#"{"orchestrator": {"max_concurrency": 9}}"#)],
    )
    .load()
    .expect_err("concurrency 9 must fail");

    assert!(matches!(err, ConfigLoadError::Parse { .. }), "got {err:?}");
}

#[test]
fn guard_rails_reject_zero_intervals_and_bad_urls() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = loader(
        dir.path(),
        &[("ALPHABATCH_CONFIG_JSON", r#"{"orchestrator": {"cycle_interval_ms": 0}}"#)],
    )
    .load()
    .expect_err("zero interval must fail");
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::ZeroValue {
            field: "orchestrator.cycle_interval_ms"
        })
    ));

    let err = loader(
        dir.path(),
        &[("ALPHABATCH_CONFIG_JSON", r#"{"api": {"base_url": "not a url"}}"#)],
    )
    .load()
    .expect_err("bad url must fail");
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::InvalidBaseUrl { .. })
    ));
}
