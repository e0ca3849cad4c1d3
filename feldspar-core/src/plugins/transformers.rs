//! Stock transformers: date resolution, description derivation, table of
//! contents, link crawling.

use crate::config::{DateSource, LinkResolution};
use crate::markdown::{self, collect_headings};
use crate::model::{Document, ResolvedDate};
use crate::pipeline::{TransformContext, Transformer};
use pulldown_cmark::Event;

/// Fills `doc.dates` from the per-source candidates, walking the configured
/// priority list; the first source with a value wins, per field.
pub struct ResolveDates {
    priority: Vec<DateSource>,
}

impl ResolveDates {
    pub fn new(priority: Vec<DateSource>) -> Self {
        Self { priority }
    }
}

impl Transformer for ResolveDates {
    fn name(&self) -> &'static str {
        "resolve-dates"
    }

    fn apply(&self, mut doc: Document, _ctx: &TransformContext<'_>) -> anyhow::Result<Document> {
        let c = &doc.date_candidates;

        for source in &self.priority {
            if doc.dates.created.is_none() {
                let candidate = match source {
                    DateSource::Frontmatter => c.frontmatter_created,
                    DateSource::Filesystem => c.fs_created,
                    DateSource::VersionControl => c.vcs_created,
                };
                if let Some(value) = candidate {
                    doc.dates.created = Some(ResolvedDate {
                        value,
                        source: *source,
                    });
                }
            }
            if doc.dates.modified.is_none() {
                let candidate = match source {
                    DateSource::Frontmatter => c.frontmatter_modified,
                    DateSource::Filesystem => c.fs_modified,
                    DateSource::VersionControl => c.vcs_modified,
                };
                if let Some(value) = candidate {
                    doc.dates.modified = Some(ResolvedDate {
                        value,
                        source: *source,
                    });
                }
            }
        }

        Ok(doc)
    }
}

/// Derives a display description from the body when the frontmatter does
/// not declare one: whole sentences up to the cap, else a word-boundary
/// truncation with an ellipsis.
pub struct DeriveDescription {
    pub max_len: usize,
}

impl Default for DeriveDescription {
    fn default() -> Self {
        Self { max_len: 150 }
    }
}

impl Transformer for DeriveDescription {
    fn name(&self) -> &'static str {
        "derive-description"
    }

    fn apply(&self, mut doc: Document, _ctx: &TransformContext<'_>) -> anyhow::Result<Document> {
        if doc.description.is_some() {
            return Ok(doc);
        }

        let text = plain_text(&doc);
        if text.is_empty() {
            return Ok(doc);
        }

        doc.description = Some(summarize(&text, self.max_len));
        Ok(doc)
    }
}

/// Plain text of a document: the tree's text events, whitespace collapsed.
fn plain_text(doc: &Document) -> String {
    let mut out = String::new();
    for event in doc.content.events() {
        match event {
            Event::Text(t) | Event::Code(t) => {
                out.push_str(t.as_ref());
                out.push(' ');
            }
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn summarize(text: &str, max_len: usize) -> String {
    let mut out = String::new();

    for sentence in split_sentences(text) {
        if out.is_empty() {
            out.push_str(sentence);
        } else if out.len() + sentence.len() + 1 <= max_len {
            out.push(' ');
            out.push_str(sentence);
        } else {
            break;
        }
    }

    if out.len() <= max_len {
        return out;
    }

    // First sentence alone blows the cap; cut at a word boundary.
    let mut truncated = String::new();
    for word in out.split_whitespace() {
        if !truncated.is_empty() && truncated.len() + word.len() + 1 > max_len {
            break;
        }
        if !truncated.is_empty() {
            truncated.push(' ');
        }
        truncated.push_str(word);
    }
    truncated.push('…');
    truncated
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();

    for (i, b) in bytes.iter().enumerate() {
        let at_end = i + 1 == bytes.len();
        let boundary = matches!(b, b'.' | b'!' | b'?') && (at_end || bytes[i + 1] == b' ');
        if boundary || at_end {
            let sentence = text[start..=i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = i + 1;
        }
    }

    sentences
}

/// Renders `toc_html` from the document's headings.
pub struct TableOfContents {
    pub min_headings: usize,
}

impl Default for TableOfContents {
    fn default() -> Self {
        Self { min_headings: 1 }
    }
}

impl Transformer for TableOfContents {
    fn name(&self) -> &'static str {
        "table-of-contents"
    }

    fn apply(&self, mut doc: Document, _ctx: &TransformContext<'_>) -> anyhow::Result<Document> {
        let headings = collect_headings(&doc.content);
        if headings.len() < self.min_headings {
            return Ok(doc);
        }

        let mut html = String::from(r#"<nav class="toc"><ul>"#);
        for h in &headings {
            html.push_str(&format!(
                r##"<li class="toc-level-{}"><a href="#{}">{}</a></li>"##,
                h.level,
                h.id,
                crate::plugins::emitters::escape_html(&h.text)
            ));
        }
        html.push_str("</ul></nav>");

        doc.toc_html = Some(html);
        Ok(doc)
    }
}

/// Resolves every outbound reference in the content tree, rewrites link
/// destinations, and attaches the resolved slug list. Must run after any
/// transformer that introduces links and before anything that reads them.
pub struct CrawlLinks {
    resolution: LinkResolution,
}

impl CrawlLinks {
    pub fn new(resolution: LinkResolution) -> Self {
        Self { resolution }
    }
}

impl Transformer for CrawlLinks {
    fn name(&self) -> &'static str {
        "crawl-links"
    }

    fn apply(&self, mut doc: Document, ctx: &TransformContext<'_>) -> anyhow::Result<Document> {
        let tree = std::mem::take(&mut doc.content);
        let outcome = markdown::crawl_links(tree, &doc.slug, self.resolution, ctx.slugs);

        doc.content = outcome.tree;
        doc.links = outcome.links;
        doc.diagnostics.extend(outcome.diagnostics);
        Ok(doc)
    }
}
