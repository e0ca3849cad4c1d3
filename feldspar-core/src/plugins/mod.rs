//! Built-in plugins and the stock pipeline wiring.

pub mod emitters;
pub mod filters;
pub mod transformers;

pub use emitters::{AliasRedirects, ContentIndex, ContentPages, FolderPages, GraphData, TagPages};
pub use filters::{ExplicitPublish, RemoveDrafts};
pub use transformers::{CrawlLinks, DeriveDescription, ResolveDates, TableOfContents};

use crate::config::Options;
use crate::pipeline::Plugins;

/// The stock plugin set, wired from the global options. Transformer order
/// matters: dates and descriptions resolve before links are crawled, and
/// everything runs before the draft filter and the emitters.
pub fn standard(options: &Options) -> Plugins {
    Plugins {
        transformers: vec![
            Box::new(ResolveDates::new(options.date_priority.clone())),
            Box::new(DeriveDescription::default()),
            Box::new(TableOfContents::default()),
            Box::new(CrawlLinks::new(options.link_resolution)),
        ],
        filters: vec![Box::new(RemoveDrafts)],
        emitters: vec![
            Box::new(ContentPages),
            Box::new(FolderPages),
            Box::new(TagPages),
            Box::new(ContentIndex::default()),
            Box::new(AliasRedirects),
            Box::new(GraphData),
        ],
    }
}
