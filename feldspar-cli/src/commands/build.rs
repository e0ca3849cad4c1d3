//! Build command implementation.

use crate::config::ProjectConfig;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use feldspar_core::{Document, PipelineConfig, Severity, SourceDates};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

pub fn run(config_path: &Path) -> Result<()> {
    tracing::info!("loading config from {}", config_path.display());
    let project = ProjectConfig::from_file(config_path)?;
    let options = project.resolved_options();

    let content_dir = project.content_dir();
    let documents = discover_documents(&content_dir, &options.ignore_patterns)?;
    tracing::info!(
        "building '{}': {} documents",
        project.site.title,
        documents.len()
    );

    let config = PipelineConfig::standard(project.site.clone(), options);
    let report = feldspar_core::run(config, documents).context("build failed")?;

    for diag in &report.diagnostics {
        match diag.severity {
            Severity::Warning => tracing::warn!("[{}] {}", diag.code, diag.message),
            Severity::Info => tracing::info!("[{}] {}", diag.code, diag.message),
        }
    }

    // All-or-nothing output: artifacts only touch disk when every emitter
    // succeeded.
    if !report.emit_failures.is_empty() {
        for failure in &report.emit_failures {
            tracing::error!("emitter '{}' failed: {}", failure.emitter, failure.error);
        }
        bail!(
            "{} emitter(s) failed; no output written",
            report.emit_failures.len()
        );
    }

    let output_dir = project.output_dir();
    for artifact in &report.artifacts {
        let target = output_dir.join(&artifact.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&target, &artifact.content)
            .with_context(|| format!("failed to write {}", target.display()))?;
    }

    tracing::info!(
        "wrote {} artifacts to {}",
        report.artifacts.len(),
        output_dir.display()
    );

    Ok(())
}

/// Walk the content root and load every markdown file into a document.
fn discover_documents(content_dir: &Path, ignore_patterns: &[String]) -> Result<Vec<Document>> {
    let ignores = compile_ignore_patterns(ignore_patterns);
    let mut documents = Vec::new();

    for entry in WalkDir::new(content_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let is_markdown = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
            .unwrap_or(false);
        if !is_markdown {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(content_dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        if should_ignore(&rel, &ignores) {
            tracing::debug!("ignoring {} due to ignore_patterns", rel);
            continue;
        }

        let raw = fs::read_to_string(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;
        let dates = source_dates(entry.path());

        let document = Document::from_source(&rel, &raw, dates)
            .with_context(|| format!("failed to load {}", rel))?;
        documents.push(document);
    }

    Ok(documents)
}

/// Filesystem timestamps for a source file. Missing metadata degrades to
/// absent dates.
fn source_dates(path: &Path) -> SourceDates {
    let Ok(metadata) = fs::metadata(path) else {
        return SourceDates::default();
    };

    SourceDates {
        created: metadata.created().ok().map(to_naive),
        modified: metadata.modified().ok().map(to_naive),
        vcs_created: None,
        vcs_modified: None,
    }
}

fn to_naive(time: SystemTime) -> NaiveDateTime {
    DateTime::<Utc>::from(time).naive_utc()
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pattern in patterns {
        match Regex::new(pattern) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("invalid ignore pattern '{}': {}", pattern, err),
        }
    }
    compiled
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}
