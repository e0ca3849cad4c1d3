//! # feldspar-core
//!
//! Core build pipeline for the feldspar site generator.
//!
//! This crate turns a tree of authored markdown documents into output
//! artifacts: it runs an ordered plugin pipeline (transformers, filters,
//! emitters) over the document set, derives folder containment, tag
//! hierarchy and the inter-document link graph, and aggregates the global
//! content index used by feeds and sitemaps.

pub mod config;
pub mod error;
pub mod frontmatter;
pub mod graph;
pub mod hierarchy;
pub mod index;
pub mod markdown;
pub mod model;
pub mod pipeline;
pub mod plugins;
pub mod slug;

pub use config::{DateSource, LinkResolution, Options, OptionsPatch, SiteMeta};
pub use error::{BuildError, ConfigError, Diagnostic, EmitFailure, Severity};
pub use graph::{Edge, GraphView, GraphViewOptions, LinkGraph};
pub use index::{build_entries, ContentIndexEntry, IndexOptions};
pub use markdown::ContentTree;
pub use model::{Document, DocumentDates, ResolvedDate, SourceDates};
pub use pipeline::{
    run, Artifact, BuildReport, Emitter, Filter, PipelineConfig, Plugins, Site, TransformContext,
    Transformer,
};
pub use slug::{slug_from_path, SlugTable};
