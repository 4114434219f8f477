//! Markdown document loader.
//!
//! Walks the configured content directory and turns every file matching
//! the include globs into a [`Document`] keyed by its relative path.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::ContentConfig;
use crate::models::Document;

const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/target/**", "**/node_modules/**"];

/// Loads all matching documents under `config.root`, sorted by `source_id`.
pub fn load_documents(config: &ContentConfig) -> Result<Vec<Document>> {
    let root = &config.root;
    if !root.is_dir() {
        bail!("Content directory does not exist: {}", root.display());
    }

    let include_set = build_globset(config.include_globs.as_slice())?;
    let exclude_set = build_globset(DEFAULT_EXCLUDES)?;

    let mut docs = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let source_id = relative_source_id(root, path);

        if exclude_set.is_match(&source_id) || !include_set.is_match(&source_id) {
            continue;
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        tracing::info!(
            source_id = %source_id,
            chars = content.chars().count(),
            "loaded document"
        );
        docs.push(Document { content, source_id });
    }

    docs.sort_by(|a, b| a.source_id.cmp(&b.source_id));

    Ok(docs)
}

fn relative_source_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern.as_ref())?);
    }
    Ok(builder.build()?)
}
