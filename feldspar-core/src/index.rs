//! Global content index used by feeds, sitemaps and recent lists.

use crate::model::Document;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;

/// Immutable per-document snapshot, produced once at the end of the
/// pipeline and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ContentIndexEntry {
    pub slug: String,
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDateTime>,

    /// Full rendered content, populated only when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexOptions {
    /// Include documents whose content tree is empty.
    pub include_empty: bool,

    /// Cap on emitted entries. `None` keeps everything.
    pub limit: Option<usize>,

    /// Carry the full rendered content per entry.
    pub full_excerpt: bool,
}

/// Snapshot the document set into an ordered entry list.
///
/// Ordering: resolved date descending, undated entries last, ties broken by
/// slug ascending. The result is a total order, so re-running the build on
/// unchanged input yields identical output.
pub fn build_entries(docs: &[Document], opts: &IndexOptions) -> Vec<ContentIndexEntry> {
    let mut entries: Vec<ContentIndexEntry> = docs
        .iter()
        .filter(|d| opts.include_empty || !d.content.is_empty())
        .map(|d| ContentIndexEntry {
            slug: d.slug.clone(),
            title: d.title().to_string(),
            description: d.description.clone(),
            tags: d.frontmatter.tags.clone(),
            date: d.sort_date(),
            excerpt: opts.full_excerpt.then(|| d.content.render_html()),
        })
        .collect();

    entries.sort_by(compare_entries);

    if let Some(limit) = opts.limit {
        entries.truncate(limit);
    }

    entries
}

fn compare_entries(a: &ContentIndexEntry, b: &ContentIndexEntry) -> Ordering {
    match (a.date, b.date) {
        (Some(da), Some(db)) => db.cmp(&da).then_with(|| a.slug.cmp(&b.slug)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.slug.cmp(&b.slug),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DateSource;
    use crate::model::{parse_date, Document, ResolvedDate, SourceDates};

    fn doc(path: &str, body: &str, date: Option<&str>) -> Document {
        let mut d = Document::from_source(path, body, SourceDates::default()).unwrap();
        d.dates.created = date.map(|s| ResolvedDate {
            value: parse_date(s).unwrap(),
            source: DateSource::Frontmatter,
        });
        d
    }

    #[test]
    fn test_descending_date_order() {
        let docs = vec![
            doc("a.md", "body", Some("2024-01-01")),
            doc("b.md", "body", Some("2024-01-02")),
            doc("c.md", "body", Some("2024-01-03")),
        ];
        let entries = build_entries(&docs, &IndexOptions::default());
        let slugs: Vec<&str> = entries.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_ties_break_by_slug_ascending() {
        let docs = vec![
            doc("zz.md", "body", Some("2024-01-01")),
            doc("aa.md", "body", Some("2024-01-01")),
        ];
        let entries = build_entries(&docs, &IndexOptions::default());
        assert_eq!(entries[0].slug, "aa");
        assert_eq!(entries[1].slug, "zz");
    }

    #[test]
    fn test_undated_entries_sort_last() {
        let docs = vec![
            doc("undated.md", "body", None),
            doc("dated.md", "body", Some("2020-01-01")),
        ];
        let entries = build_entries(&docs, &IndexOptions::default());
        assert_eq!(entries[0].slug, "dated");
        assert_eq!(entries[1].slug, "undated");
    }

    #[test]
    fn test_empty_documents_excluded_by_default() {
        let docs = vec![doc("empty.md", "", None), doc("full.md", "body", None)];

        let entries = build_entries(&docs, &IndexOptions::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].slug, "full");

        let entries = build_entries(
            &docs,
            &IndexOptions {
                include_empty: true,
                ..Default::default()
            },
        );
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_limit_and_excerpt() {
        let docs = vec![
            doc("a.md", "**bold** body", Some("2024-01-01")),
            doc("b.md", "body", Some("2024-01-02")),
        ];

        let entries = build_entries(
            &docs,
            &IndexOptions {
                limit: Some(1),
                full_excerpt: true,
                ..Default::default()
            },
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].slug, "b");
        assert!(entries[0].excerpt.is_some());

        let entries = build_entries(&docs, &IndexOptions::default());
        assert!(entries[0].excerpt.is_none());
    }

    #[test]
    fn test_idempotent_under_reordering() {
        let mut docs = vec![
            doc("a.md", "body", Some("2024-01-01")),
            doc("b.md", "body", None),
            doc("c.md", "body", Some("2024-03-01")),
        ];
        let first = build_entries(&docs, &IndexOptions::default());
        docs.reverse();
        let second = build_entries(&docs, &IndexOptions::default());

        let slugs = |entries: &[ContentIndexEntry]| {
            entries.iter().map(|e| e.slug.clone()).collect::<Vec<_>>()
        };
        assert_eq!(slugs(&first), slugs(&second));
    }
}
