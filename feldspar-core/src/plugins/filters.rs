//! Stock filters deciding document set membership.

use crate::model::Document;
use crate::pipeline::{Filter, TransformContext};

/// Drops documents whose frontmatter marks `draft: true`.
pub struct RemoveDrafts;

impl Filter for RemoveDrafts {
    fn name(&self) -> &'static str {
        "remove-drafts"
    }

    fn keep(&self, doc: &Document, _ctx: &TransformContext<'_>) -> anyhow::Result<bool> {
        Ok(!doc.frontmatter.draft)
    }
}

/// Allow-list mode: keeps only documents whose frontmatter marks
/// `publish: true`. The key lives in the pass-through bag.
pub struct ExplicitPublish;

impl Filter for ExplicitPublish {
    fn name(&self) -> &'static str {
        "explicit-publish"
    }

    fn keep(&self, doc: &Document, _ctx: &TransformContext<'_>) -> anyhow::Result<bool> {
        Ok(doc.frontmatter.extra_bool("publish").unwrap_or(false))
    }
}
