//! Plugin pipeline: ordered Transformers, Filters and Emitters over the
//! document set.
//!
//! Flow: documents -> [transformer stages] -> [filters] -> freeze -> emitters
//!
//! Each transformer is applied to the whole set before the next stage runs.
//! Stage application is parallel across documents (no cross-document reads
//! inside a stage by contract). Filters run sequentially relative to the
//! set; emitters only see the frozen result and may run concurrently.

use crate::config::{Options, SiteMeta};
use crate::error::{BuildError, Diagnostic, EmitFailure};
use crate::graph::LinkGraph;
use crate::model::Document;
use crate::plugins;
use crate::slug::SlugTable;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Per-document enrichment stage. Must not change document identity and
/// must not read other documents; the context exposes the global options
/// and the frozen slug list instead.
pub trait Transformer: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, doc: Document, ctx: &TransformContext<'_>) -> anyhow::Result<Document>;
}

/// Membership stage: keep or drop. Dropped documents stay invisible for the
/// rest of the build, but their slugs remain reserved.
pub trait Filter: Send + Sync {
    fn name(&self) -> &'static str;

    fn keep(&self, doc: &Document, ctx: &TransformContext<'_>) -> anyhow::Result<bool>;
}

/// Output stage: read the frozen site, produce artifacts. Emitters decide
/// output paths and content; they never mutate documents.
pub trait Emitter: Send + Sync {
    fn name(&self) -> &'static str;

    fn emit(&self, site: &Site) -> anyhow::Result<Vec<Artifact>>;
}

/// Read-only context handed to transformers and filters.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    pub options: &'a Options,

    /// Every slug in the build, fixed before the first stage runs.
    pub slugs: &'a [String],
}

/// One output file, path relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub content: String,
}

impl Artifact {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// The frozen document set shared read-only by all emitters and derived
/// structure builders.
#[derive(Debug)]
pub struct Site {
    pub meta: SiteMeta,
    pub options: Options,

    /// Documents surviving all filters, in slug order.
    pub documents: Vec<Document>,

    /// The link graph, built once after the filter stage.
    pub graph: LinkGraph,

    /// Slugs of filtered-out documents. Still reserved: nothing may reuse
    /// them for the remainder of the build.
    pub reserved: BTreeSet<String>,
}

impl Site {
    pub fn document(&self, slug: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.slug == slug)
    }
}

/// Everything a build run needs, constructed once and never mutated.
/// There is no ambient registry; plugin order is exactly declaration order.
pub struct PipelineConfig {
    pub meta: SiteMeta,
    pub options: Options,
    pub plugins: Plugins,
}

impl PipelineConfig {
    /// The stock plugin set wired from the options.
    pub fn standard(meta: SiteMeta, options: Options) -> Self {
        let plugins = plugins::standard(&options);
        Self {
            meta,
            options,
            plugins,
        }
    }
}

/// Ordered plugin lists. Transformer and filter order is semantically
/// significant and never reordered; emitters are order-independent.
#[derive(Default)]
pub struct Plugins {
    pub transformers: Vec<Box<dyn Transformer>>,
    pub filters: Vec<Box<dyn Filter>>,
    pub emitters: Vec<Box<dyn Emitter>>,
}

/// Outcome of a successful pipeline run. Artifacts exist in memory only;
/// writing them is the caller's concern, and a caller wanting all-or-nothing
/// output writes only when `emit_failures` is empty.
#[derive(Debug)]
pub struct BuildReport {
    pub site: Site,

    /// All artifacts from all emitters, sorted by output path.
    pub artifacts: Vec<Artifact>,

    /// Non-fatal issues collected across the build.
    pub diagnostics: Vec<Diagnostic>,

    /// Per-emitter failures. Sibling emitters still ran.
    pub emit_failures: Vec<EmitFailure>,
}

/// Run the full pipeline over a loaded document set.
pub fn run(config: PipelineConfig, documents: Vec<Document>) -> Result<BuildReport, BuildError> {
    let PipelineConfig {
        meta,
        options,
        plugins,
    } = config;

    // Slug uniqueness is checked before any plugin runs.
    let mut table = SlugTable::new();
    for doc in &documents {
        table.insert(doc.slug.clone(), doc.source_path.clone())?;
    }
    let slugs = table.slugs();

    tracing::info!("pipeline start: {} documents", documents.len());

    let ctx = TransformContext {
        options: &options,
        slugs: &slugs,
    };

    // Transformer stages: each applied to every document before the next.
    let mut docs = documents;
    for transformer in &plugins.transformers {
        tracing::debug!("transformer stage: {}", transformer.name());
        docs = docs
            .into_par_iter()
            .map(|doc| {
                let was = doc.slug.clone();
                let out = transformer.apply(doc, &ctx).map_err(|source| {
                    BuildError::Transform {
                        plugin: transformer.name().to_string(),
                        slug: was.clone(),
                        source,
                    }
                })?;
                if out.slug != was {
                    return Err(BuildError::IdentityChanged {
                        plugin: transformer.name().to_string(),
                        was,
                        now: out.slug,
                    });
                }
                Ok(out)
            })
            .collect::<Result<Vec<_>, BuildError>>()?;
    }

    // Filters: sequential over the set, parallel per predicate. Later
    // filters see the survivors of earlier ones.
    let mut reserved: BTreeSet<String> = BTreeSet::new();
    for filter in &plugins.filters {
        let verdicts = docs
            .into_par_iter()
            .map(|doc| match filter.keep(&doc, &ctx) {
                Ok(keep) => Ok((doc, keep)),
                Err(source) => Err(BuildError::Filter {
                    plugin: filter.name().to_string(),
                    slug: doc.slug.clone(),
                    source,
                }),
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        docs = Vec::with_capacity(verdicts.len());
        for (doc, keep) in verdicts {
            if keep {
                docs.push(doc);
            } else {
                tracing::debug!("filter '{}' dropped '{}'", filter.name(), doc.slug);
                reserved.insert(doc.slug);
            }
        }
    }

    // Freeze: sort for determinism, drain per-document diagnostics, build
    // the graph exactly once.
    docs.sort_by(|a, b| a.slug.cmp(&b.slug));
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for doc in &mut docs {
        diagnostics.append(&mut doc.diagnostics);
    }

    let graph = LinkGraph::build(&docs);

    tracing::info!(
        "frozen set: {} documents, {} reserved, {} edges",
        docs.len(),
        reserved.len(),
        graph.edge_count()
    );

    let site = Site {
        meta,
        options,
        documents: docs,
        graph,
        reserved,
    };

    // Emitters: independent, read-only, isolated failures.
    let results: Vec<(String, anyhow::Result<Vec<Artifact>>)> = plugins
        .emitters
        .par_iter()
        .map(|emitter| (emitter.name().to_string(), emitter.emit(&site)))
        .collect();

    let mut artifacts: Vec<Artifact> = Vec::new();
    let mut emit_failures: Vec<EmitFailure> = Vec::new();
    let mut claimed: IndexMap<String, String> = IndexMap::new();

    for (name, result) in results {
        match result {
            Ok(list) => {
                for artifact in list {
                    if let Some(owner) = claimed.get(&artifact.path) {
                        emit_failures.push(EmitFailure {
                            emitter: name.clone(),
                            error: format!(
                                "artifact path '{}' already produced by '{}'",
                                artifact.path, owner
                            ),
                        });
                        continue;
                    }
                    claimed.insert(artifact.path.clone(), name.clone());
                    artifacts.push(artifact);
                }
            }
            Err(error) => {
                tracing::warn!("emitter '{}' failed: {:#}", name, error);
                emit_failures.push(EmitFailure {
                    emitter: name,
                    error: format!("{error:#}"),
                });
            }
        }
    }

    artifacts.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::info!(
        "pipeline done: {} artifacts, {} diagnostics, {} emitter failures",
        artifacts.len(),
        diagnostics.len(),
        emit_failures.len()
    );

    Ok(BuildReport {
        site,
        artifacts,
        diagnostics,
        emit_failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceDates;
    use anyhow::anyhow;

    fn doc(path: &str, raw: &str) -> Document {
        Document::from_source(path, raw, SourceDates::default()).unwrap()
    }

    struct Upper;
    impl Transformer for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }
        fn apply(&self, mut doc: Document, _ctx: &TransformContext<'_>) -> anyhow::Result<Document> {
            doc.description = Some(doc.body.to_uppercase());
            Ok(doc)
        }
    }

    struct Exclaim;
    impl Transformer for Exclaim {
        fn name(&self) -> &'static str {
            "exclaim"
        }
        fn apply(&self, mut doc: Document, _ctx: &TransformContext<'_>) -> anyhow::Result<Document> {
            if let Some(d) = doc.description.as_mut() {
                d.push('!');
            }
            Ok(doc)
        }
    }

    struct Renamer;
    impl Transformer for Renamer {
        fn name(&self) -> &'static str {
            "renamer"
        }
        fn apply(&self, mut doc: Document, _ctx: &TransformContext<'_>) -> anyhow::Result<Document> {
            doc.slug = format!("renamed/{}", doc.slug);
            Ok(doc)
        }
    }

    struct Failing;
    impl Transformer for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn apply(&self, _doc: Document, _ctx: &TransformContext<'_>) -> anyhow::Result<Document> {
            Err(anyhow!("boom"))
        }
    }

    struct DropDrafts;
    impl Filter for DropDrafts {
        fn name(&self) -> &'static str {
            "drop-drafts"
        }
        fn keep(&self, doc: &Document, _ctx: &TransformContext<'_>) -> anyhow::Result<bool> {
            Ok(!doc.frontmatter.draft)
        }
    }

    struct CountingEmitter;
    impl Emitter for CountingEmitter {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn emit(&self, site: &Site) -> anyhow::Result<Vec<Artifact>> {
            Ok(vec![Artifact::new(
                "count.txt",
                site.documents.len().to_string(),
            )])
        }
    }

    struct FailingEmitter;
    impl Emitter for FailingEmitter {
        fn name(&self) -> &'static str {
            "failing-emitter"
        }
        fn emit(&self, _site: &Site) -> anyhow::Result<Vec<Artifact>> {
            Err(anyhow!("disk on fire"))
        }
    }

    fn config(plugins: Plugins) -> PipelineConfig {
        PipelineConfig {
            meta: SiteMeta::default(),
            options: Options::default(),
            plugins,
        }
    }

    #[test]
    fn test_duplicate_slug_is_fatal() {
        let docs = vec![doc("a.md", "one"), doc("a/index.md", "two")];
        let err = run(config(Plugins::default()), docs).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Config(crate::error::ConfigError::DuplicateSlug { .. })
        ));
    }

    #[test]
    fn test_transformer_stage_ordering() {
        // `exclaim` must observe `upper`'s output for every document.
        let plugins = Plugins {
            transformers: vec![Box::new(Upper), Box::new(Exclaim)],
            ..Default::default()
        };
        let docs = vec![doc("a.md", "hello"), doc("b.md", "world")];
        let report = run(config(plugins), docs).unwrap();

        let a = report.site.document("a").unwrap();
        assert_eq!(a.description.as_deref(), Some("HELLO!"));
    }

    #[test]
    fn test_identity_change_rejected() {
        let plugins = Plugins {
            transformers: vec![Box::new(Renamer)],
            ..Default::default()
        };
        let err = run(config(plugins), vec![doc("a.md", "x")]).unwrap_err();
        assert!(matches!(err, BuildError::IdentityChanged { .. }));
    }

    #[test]
    fn test_transformer_failure_aborts() {
        let plugins = Plugins {
            transformers: vec![Box::new(Failing)],
            ..Default::default()
        };
        let err = run(config(plugins), vec![doc("a.md", "x")]).unwrap_err();
        assert!(matches!(err, BuildError::Transform { .. }));
    }

    #[test]
    fn test_filter_drops_are_permanent_and_reserved() {
        let plugins = Plugins {
            filters: vec![Box::new(DropDrafts)],
            emitters: vec![Box::new(CountingEmitter)],
            ..Default::default()
        };
        let docs = vec![
            doc("a.md", "---\ndraft: true\n---\nx"),
            doc("b.md", "---\ndraft: true\n---\nx"),
            doc("c.md", "x"),
            doc("d.md", "x"),
            doc("e.md", "x"),
        ];
        let report = run(config(plugins), docs).unwrap();

        assert_eq!(report.site.documents.len(), 3);
        assert!(report.site.reserved.contains("a"));
        assert!(report.site.reserved.contains("b"));
        assert_eq!(report.artifacts[0].content, "3");
    }

    #[test]
    fn test_emitter_failure_is_isolated() {
        let plugins = Plugins {
            emitters: vec![Box::new(FailingEmitter), Box::new(CountingEmitter)],
            ..Default::default()
        };
        let report = run(config(plugins), vec![doc("a.md", "x")]).unwrap();

        assert_eq!(report.emit_failures.len(), 1);
        assert_eq!(report.emit_failures[0].emitter, "failing-emitter");
        // The sibling still produced its artifact.
        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.artifacts[0].path, "count.txt");
    }

    #[test]
    fn test_artifact_path_collision_reported() {
        struct Dup(&'static str);
        impl Emitter for Dup {
            fn name(&self) -> &'static str {
                self.0
            }
            fn emit(&self, _site: &Site) -> anyhow::Result<Vec<Artifact>> {
                Ok(vec![Artifact::new("same.html", "x")])
            }
        }

        let plugins = Plugins {
            emitters: vec![Box::new(Dup("first")), Box::new(Dup("second"))],
            ..Default::default()
        };
        let report = run(config(plugins), vec![doc("a.md", "x")]).unwrap();

        assert_eq!(report.artifacts.len(), 1);
        assert_eq!(report.emit_failures.len(), 1);
        assert!(report.emit_failures[0].error.contains("same.html"));
    }

    #[test]
    fn test_artifacts_sorted_by_path() {
        struct Multi;
        impl Emitter for Multi {
            fn name(&self) -> &'static str {
                "multi"
            }
            fn emit(&self, _site: &Site) -> anyhow::Result<Vec<Artifact>> {
                Ok(vec![
                    Artifact::new("z.html", ""),
                    Artifact::new("a.html", ""),
                ])
            }
        }
        let plugins = Plugins {
            emitters: vec![Box::new(Multi)],
            ..Default::default()
        };
        let report = run(config(plugins), vec![doc("a.md", "x")]).unwrap();
        let paths: Vec<&str> = report.artifacts.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["a.html", "z.html"]);
    }
}
