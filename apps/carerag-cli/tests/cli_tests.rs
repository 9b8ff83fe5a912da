use std::fs;

use carerag_cli::{verify_setup, SMOKE_QUERIES};
use carerag_core::config::Config;
use tempfile::TempDir;

fn offline_config(dir: &TempDir) -> Config {
    fs::write(
        dir.path().join("config.toml"),
        "[embedding]\nprovider = \"hash\"\ndimension = 64\n",
    )
    .unwrap();
    Config::load_from(dir.path()).expect("load")
}

#[test]
fn offline_setup_only_needs_the_counselor_directory() {
    let tmp = TempDir::new().unwrap();
    let config = offline_config(&tmp);
    let settings = config.settings().unwrap();

    let problems = verify_setup(&config, &settings);
    assert_eq!(problems.len(), 1, "{problems:?}");
    assert!(problems[0].contains("counselor directory"));

    fs::create_dir_all(tmp.path().join("resources")).unwrap();
    fs::write(tmp.path().join("resources/counselors.json"), "[]").unwrap();
    assert!(verify_setup(&config, &settings).is_empty());
}

#[test]
fn smoke_queries_cover_crisis_and_contact() {
    assert!(SMOKE_QUERIES.iter().any(|q| q.contains("suicide")));
    assert!(SMOKE_QUERIES.iter().any(|q| q.contains("counselor")));
}
