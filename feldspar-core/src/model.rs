//! The canonical in-memory representation of one content unit.

use crate::error::{BuildError, Diagnostic};
use crate::frontmatter::{parse_frontmatter, Frontmatter};
use crate::markdown::ContentTree;
use crate::slug::slug_from_path;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A resolved date together with the source it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedDate {
    pub value: NaiveDateTime,
    pub source: crate::config::DateSource,
}

/// Created/modified dates after priority resolution. Either may be absent;
/// missing dates degrade to omitted fields, never abort.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DocumentDates {
    pub created: Option<ResolvedDate>,
    pub modified: Option<ResolvedDate>,
}

/// Raw per-source date inputs gathered at load time. The date-resolution
/// transformer picks from these by configured priority.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCandidates {
    pub frontmatter_created: Option<NaiveDateTime>,
    pub frontmatter_modified: Option<NaiveDateTime>,
    pub fs_created: Option<NaiveDateTime>,
    pub fs_modified: Option<NaiveDateTime>,
    pub vcs_created: Option<NaiveDateTime>,
    pub vcs_modified: Option<NaiveDateTime>,
}

/// Timestamps the discovery collaborator hands over alongside the raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceDates {
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub vcs_created: Option<NaiveDateTime>,
    pub vcs_modified: Option<NaiveDateTime>,
}

/// One content unit flowing through the pipeline.
///
/// Created once per source file at pipeline start, mutated in place only by
/// transformers in declared order, immutable from the filter stage on.
#[derive(Debug)]
pub struct Document {
    /// Canonical hierarchical identifier. Unique across the set; never
    /// changed after construction.
    pub slug: String,

    /// Storage path relative to the content root, kept for diagnostics.
    pub source_path: String,

    pub frontmatter: Frontmatter,

    /// Raw markdown body with the frontmatter fence stripped.
    pub body: String,

    /// Opaque parsed content.
    pub content: ContentTree,

    /// Resolved outbound slugs, attached by the link-crawl transformer.
    pub links: Vec<String>,

    pub dates: DocumentDates,

    pub date_candidates: DateCandidates,

    /// Resolved display description; derived from the body when the
    /// frontmatter does not declare one.
    pub description: Option<String>,

    /// Rendered table of contents, when the document has enough headings.
    pub toc_html: Option<String>,

    /// Non-fatal issues raised by transformers; drained into the build
    /// report when the set is frozen.
    pub diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Construct a document from one discovered source file.
    pub fn from_source(
        rel_path: &str,
        raw: &str,
        source_dates: SourceDates,
    ) -> Result<Self, BuildError> {
        let slug = slug_from_path(rel_path)?;
        let (frontmatter, body) =
            parse_frontmatter(raw).map_err(|source| BuildError::Frontmatter {
                path: rel_path.to_string(),
                source,
            })?;
        let content = ContentTree::parse(&body);

        let date_candidates = DateCandidates {
            frontmatter_created: frontmatter.date.as_deref().and_then(parse_date),
            frontmatter_modified: frontmatter.modified.as_deref().and_then(parse_date),
            fs_created: source_dates.created,
            fs_modified: source_dates.modified,
            vcs_created: source_dates.vcs_created,
            vcs_modified: source_dates.vcs_modified,
        };

        Ok(Self {
            slug,
            source_path: rel_path.to_string(),
            description: frontmatter.description.clone(),
            frontmatter,
            body,
            content,
            links: Vec::new(),
            dates: DocumentDates::default(),
            date_candidates,
            toc_html: None,
            diagnostics: Vec::new(),
        })
    }

    /// Display title: declared in frontmatter, else the last slug segment.
    pub fn title(&self) -> &str {
        match self.frontmatter.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => self.slug.rsplit('/').next().unwrap_or(&self.slug),
        }
    }

    /// The date used for ordering: created, falling back to modified.
    pub fn sort_date(&self) -> Option<NaiveDateTime> {
        self.dates
            .created
            .or(self.dates.modified)
            .map(|d| d.value)
    }

    /// Relative output path, derived one-to-one from the slug.
    pub fn output_rel_path(&self) -> String {
        format!("{}.html", self.slug)
    }

    pub fn url(&self) -> String {
        format!("/{}", self.output_rel_path())
    }
}

/// Parse a frontmatter date string. Accepts a date, or a date with a time.
pub fn parse_date(input: &str) -> Option<NaiveDateTime> {
    let trimmed = input.trim();

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_source() {
        let raw = "---\ntitle: A Note\ntags: [x/y]\ndate: 2024-01-01\n---\n# Body\n";
        let doc = Document::from_source("notes/a.md", raw, SourceDates::default()).unwrap();

        assert_eq!(doc.slug, "notes/a");
        assert_eq!(doc.title(), "A Note");
        assert_eq!(doc.frontmatter.tags, vec!["x/y"]);
        assert_eq!(
            doc.date_candidates.frontmatter_created,
            parse_date("2024-01-01")
        );
        assert!(!doc.content.is_empty());
    }

    #[test]
    fn test_title_falls_back_to_slug_segment() {
        let doc = Document::from_source("garden/Weeding.md", "body", SourceDates::default())
            .unwrap();
        assert_eq!(doc.title(), "Weeding");
    }

    #[test]
    fn test_output_path_derived_from_slug() {
        let doc = Document::from_source("garden/index.md", "body", SourceDates::default())
            .unwrap();
        assert_eq!(doc.slug, "garden");
        assert_eq!(doc.output_rel_path(), "garden.html");
        assert_eq!(doc.url(), "/garden.html");
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2024-01-01").is_some());
        assert!(parse_date("2024-01-01 12:30").is_some());
        assert!(parse_date("2024-01-01T09:15:00").is_some());
        assert!(parse_date("January 1st").is_none());
    }

    #[test]
    fn test_sort_date_prefers_created() {
        let mut doc =
            Document::from_source("a.md", "body", SourceDates::default()).unwrap();
        let created = parse_date("2024-01-01").unwrap();
        let modified = parse_date("2024-06-01").unwrap();
        doc.dates.created = Some(ResolvedDate {
            value: created,
            source: crate::config::DateSource::Frontmatter,
        });
        doc.dates.modified = Some(ResolvedDate {
            value: modified,
            source: crate::config::DateSource::Filesystem,
        });
        assert_eq!(doc.sort_date(), Some(created));
    }
}
