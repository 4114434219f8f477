//! CLI tests against the built `agent` binary.
//!
//! These cover the fail-fast paths that need no network access: missing
//! credential, empty corpus and missing index.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn agent_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_agent"))
}

fn setup_test_env(with_docs: bool) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let content_dir = root.join("content");
    fs::create_dir_all(&content_dir).unwrap();
    if with_docs {
        fs::write(
            content_dir.join("about.md"),
            "# About\n\nSomesh is a cloud engineer.",
        )
        .unwrap();
    }

    let config_content = format!(
        r#"[content]
root = "{root}/content"

[index]
path = "{root}/storage/vector_index"

[server]
bind = "127.0.0.1:0"
resumes_dir = "{root}/resumes"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("agent.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_agent(config_path: &Path, api_key: Option<&str>, args: &[&str]) -> (String, String, bool) {
    let binary = agent_binary();
    let mut cmd = Command::new(&binary);
    cmd.arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .env_remove("PORT")
        .env_remove("ALLOWED_ORIGINS");
    if let Some(key) = api_key {
        cmd.env("OPENAI_API_KEY", key);
    }

    let output = cmd
        .output()
        .unwrap_or_else(|e| panic!("Failed to run agent binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_build_without_api_key_fails() {
    let (_tmp, config_path) = setup_test_env(true);

    let (stdout, stderr, success) = run_agent(&config_path, None, &["build"]);
    assert!(!success, "build should fail: stdout={}", stdout);
    assert!(
        stderr.contains("OPENAI_API_KEY"),
        "expected credential error, got: {}",
        stderr
    );
}

#[test]
fn test_serve_without_api_key_fails() {
    let (_tmp, config_path) = setup_test_env(true);

    let (_, stderr, success) = run_agent(&config_path, None, &["serve"]);
    assert!(!success);
    assert!(stderr.contains("OPENAI_API_KEY"));
}

#[test]
fn test_build_empty_corpus_aborts() {
    let (tmp, config_path) = setup_test_env(false);

    let (_, stderr, success) = run_agent(&config_path, Some("sk-test"), &["build"]);
    assert!(!success);
    assert!(
        stderr.contains("No documents found"),
        "expected empty corpus error, got: {}",
        stderr
    );
    assert!(!tmp.path().join("storage/vector_index").exists());
}

#[test]
fn test_serve_without_index_fails() {
    let (_tmp, config_path) = setup_test_env(true);

    let (_, stderr, success) = run_agent(&config_path, Some("sk-test"), &["serve"]);
    assert!(!success);
    assert!(
        stderr.contains("No vector index found"),
        "expected missing index error, got: {}",
        stderr
    );
}

#[test]
fn test_invalid_config_fails() {
    let (tmp, _) = setup_test_env(true);
    let bad = tmp.path().join("config/bad.toml");
    fs::write(&bad, "[chunking]\nchunk_size = 10\nchunk_overlap = 20\n").unwrap();

    let (_, stderr, success) = run_agent(&bad, Some("sk-test"), &["build"]);
    assert!(!success);
    assert!(stderr.contains("chunk_overlap"));
}
