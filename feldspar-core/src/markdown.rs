//! Markdown parsing collaborator.
//!
//! Produces the opaque [`ContentTree`] carried by documents. The pipeline
//! driver never looks inside it; the built-in link and heading transformers
//! use the crate-private event accessors here.

use crate::config::LinkResolution;
use crate::error::Diagnostic;
use crate::slug::{resolve_reference, sanitize_segment};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

/// Opaque parsed content. Owned and move-only: transformers take the tree
/// by value and return a (possibly new) owned value.
#[derive(Debug)]
pub struct ContentTree {
    events: Vec<Event<'static>>,
    blocks: usize,
}

impl ContentTree {
    /// Parse a markdown body into a content tree.
    pub fn parse(body: &str) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        let parser = Parser::new_ext(body, options);
        let mut events: Vec<Event<'static>> = Vec::new();
        let mut blocks = 0usize;
        let mut depth = 0usize;

        for event in parser {
            if let Event::Start(_) = &event {
                if depth == 0 {
                    blocks += 1;
                }
                depth += 1;
            }
            if let Event::End(_) = &event {
                depth = depth.saturating_sub(1);
            }
            events.push(into_static(event));
        }

        Self { events, blocks }
    }

    /// A tree with no content at all (the root has zero children).
    pub fn is_empty(&self) -> bool {
        self.blocks == 0
    }

    pub fn block_count(&self) -> usize {
        self.blocks
    }

    /// Render the tree to HTML.
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        html::push_html(&mut out, self.events.iter().cloned());
        out
    }

    pub(crate) fn from_events(events: Vec<Event<'static>>, blocks: usize) -> Self {
        Self { events, blocks }
    }

    pub(crate) fn into_events(self) -> (Vec<Event<'static>>, usize) {
        (self.events, self.blocks)
    }

    pub(crate) fn events(&self) -> &[Event<'static>] {
        &self.events
    }
}

impl Default for ContentTree {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            blocks: 0,
        }
    }
}

/// One document heading, collected for table-of-contents rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u32,
    pub text: String,
    pub id: String,
}

/// Collect headings in document order.
pub(crate) fn collect_headings(tree: &ContentTree) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<(u32, String)> = None;

    for event in tree.events() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((*level as u32, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, ref mut title)) = current {
                    title.push_str(text.as_ref());
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = current.take() {
                    let id = heading_id(&text);
                    headings.push(Heading { level, text, id });
                }
            }
            _ => {}
        }
    }

    headings
}

fn heading_id(text: &str) -> String {
    sanitize_segment(&text.to_lowercase())
}

/// Result of crawling one document's outbound references.
pub(crate) struct CrawlOutcome {
    pub tree: ContentTree,
    pub links: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rewrite link targets in the tree and collect the resolved slug list.
///
/// Handles both `[[wikilink]]`/`[[wikilink|text]]` syntax inside text events
/// and regular markdown links with non-external destinations. External
/// destinations (anything with a scheme) pass through untouched.
pub(crate) fn crawl_links(
    tree: ContentTree,
    source_slug: &str,
    strategy: LinkResolution,
    all_slugs: &[String],
) -> CrawlOutcome {
    let (events, blocks) = tree.into_events();
    let mut result: Vec<Event<'static>> = Vec::with_capacity(events.len());
    let mut links: Vec<String> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let mut in_code_block = false;
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                result.push(events[i].clone());
                i += 1;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                result.push(events[i].clone());
                i += 1;
            }
            Event::Text(_) if !in_code_block => {
                // Merge consecutive text events so wikilinks split across
                // events are seen whole.
                let mut merged = String::new();
                while i < events.len() {
                    if let Event::Text(text) = &events[i] {
                        merged.push_str(text.as_ref());
                        i += 1;
                    } else {
                        break;
                    }
                }

                if merged.contains("[[") && merged.contains("]]") {
                    process_wikilinks(
                        &merged,
                        source_slug,
                        strategy,
                        all_slugs,
                        &mut result,
                        &mut links,
                        &mut diagnostics,
                    );
                } else {
                    result.push(Event::Text(CowStr::Boxed(merged.into_boxed_str())));
                }
            }
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            }) if !in_code_block && !is_external(dest_url) && !dest_url.starts_with('#') => {
                let resolution =
                    resolve_reference(source_slug, dest_url.as_ref(), strategy, all_slugs);
                let fragment = dest_url
                    .split_once('#')
                    .map(|(_, frag)| frag.to_string())
                    .filter(|f| !f.is_empty());

                links.push(resolution.slug.clone());
                diagnostics.extend(resolution.diagnostics);

                let href = match fragment {
                    Some(frag) => format!("/{}.html#{frag}", resolution.slug),
                    None => format!("/{}.html", resolution.slug),
                };
                result.push(Event::Start(Tag::Link {
                    link_type: *link_type,
                    dest_url: CowStr::Boxed(href.into_boxed_str()),
                    title: title.clone(),
                    id: id.clone(),
                }));
                i += 1;
            }
            _ => {
                result.push(events[i].clone());
                i += 1;
            }
        }
    }

    CrawlOutcome {
        tree: ContentTree::from_events(result, blocks),
        links,
        diagnostics,
    }
}

fn is_external(dest: &str) -> bool {
    dest.contains("://") || dest.starts_with("mailto:") || dest.starts_with("tel:")
}

#[allow(clippy::too_many_arguments)]
fn process_wikilinks(
    text: &str,
    source_slug: &str,
    strategy: LinkResolution,
    all_slugs: &[String],
    events: &mut Vec<Event<'static>>,
    links: &mut Vec<String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut remaining = text;

    while let Some(start) = remaining.find("[[") {
        if start > 0 {
            events.push(Event::Text(CowStr::Boxed(
                remaining[..start].to_string().into_boxed_str(),
            )));
        }

        match remaining[start..].find("]]") {
            Some(end) => {
                let inner = &remaining[start + 2..start + end];
                let (target, display) = match inner.find('|') {
                    Some(pipe) => (inner[..pipe].trim(), inner[pipe + 1..].trim()),
                    None => (inner.trim(), inner.trim()),
                };

                let resolution = resolve_reference(source_slug, target, strategy, all_slugs);
                let fragment = target
                    .split_once('#')
                    .map(|(_, frag)| sanitize_segment(&frag.to_lowercase()))
                    .filter(|f| !f.is_empty());

                links.push(resolution.slug.clone());
                diagnostics.extend(resolution.diagnostics.iter().cloned());

                let href = match fragment {
                    Some(frag) => format!("/{}.html#{frag}", resolution.slug),
                    None => format!("/{}.html", resolution.slug),
                };

                events.push(Event::Start(Tag::Link {
                    link_type: pulldown_cmark::LinkType::Inline,
                    dest_url: CowStr::Boxed(href.into_boxed_str()),
                    title: CowStr::Borrowed(""),
                    id: CowStr::Borrowed(""),
                }));
                let display = display.split('#').next().unwrap_or(display);
                events.push(Event::Text(CowStr::Boxed(
                    display.to_string().into_boxed_str(),
                )));
                events.push(Event::End(TagEnd::Link));

                remaining = &remaining[start + end + 2..];
            }
            None => {
                // No closing marker, keep the rest as literal text.
                events.push(Event::Text(CowStr::Boxed(
                    remaining.to_string().into_boxed_str(),
                )));
                return;
            }
        }
    }

    if !remaining.is_empty() {
        events.push(Event::Text(CowStr::Boxed(
            remaining.to_string().into_boxed_str(),
        )));
    }
}

fn into_static(event: Event<'_>) -> Event<'static> {
    match event {
        Event::Start(tag) => Event::Start(tag_into_static(tag)),
        Event::End(tag) => Event::End(tag),
        Event::Text(text) => Event::Text(owned(text)),
        Event::Code(code) => Event::Code(owned(code)),
        Event::Html(html) => Event::Html(owned(html)),
        Event::InlineHtml(html) => Event::InlineHtml(owned(html)),
        Event::FootnoteReference(r) => Event::FootnoteReference(owned(r)),
        Event::SoftBreak => Event::SoftBreak,
        Event::HardBreak => Event::HardBreak,
        Event::Rule => Event::Rule,
        Event::TaskListMarker(checked) => Event::TaskListMarker(checked),
        Event::InlineMath(math) => Event::InlineMath(owned(math)),
        Event::DisplayMath(math) => Event::DisplayMath(owned(math)),
    }
}

fn owned(s: CowStr<'_>) -> CowStr<'static> {
    CowStr::Boxed(s.to_string().into_boxed_str())
}

fn tag_into_static(tag: Tag<'_>) -> Tag<'static> {
    match tag {
        Tag::Paragraph => Tag::Paragraph,
        Tag::Heading {
            level,
            id,
            classes,
            attrs,
        } => Tag::Heading {
            level,
            id: id.map(owned),
            classes: classes.into_iter().map(owned).collect(),
            attrs: attrs
                .into_iter()
                .map(|(k, v)| (owned(k), v.map(owned)))
                .collect(),
        },
        Tag::BlockQuote(kind) => Tag::BlockQuote(kind),
        Tag::CodeBlock(kind) => Tag::CodeBlock(match kind {
            pulldown_cmark::CodeBlockKind::Indented => pulldown_cmark::CodeBlockKind::Indented,
            pulldown_cmark::CodeBlockKind::Fenced(lang) => {
                pulldown_cmark::CodeBlockKind::Fenced(owned(lang))
            }
        }),
        Tag::HtmlBlock => Tag::HtmlBlock,
        Tag::List(num) => Tag::List(num),
        Tag::Item => Tag::Item,
        Tag::FootnoteDefinition(label) => Tag::FootnoteDefinition(owned(label)),
        Tag::Table(alignments) => Tag::Table(alignments),
        Tag::TableHead => Tag::TableHead,
        Tag::TableRow => Tag::TableRow,
        Tag::TableCell => Tag::TableCell,
        Tag::Emphasis => Tag::Emphasis,
        Tag::Strong => Tag::Strong,
        Tag::Strikethrough => Tag::Strikethrough,
        Tag::Superscript => Tag::Superscript,
        Tag::Subscript => Tag::Subscript,
        Tag::DefinitionList => Tag::DefinitionList,
        Tag::DefinitionListTitle => Tag::DefinitionListTitle,
        Tag::DefinitionListDefinition => Tag::DefinitionListDefinition,
        Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        } => Tag::Link {
            link_type,
            dest_url: owned(dest_url),
            title: owned(title),
            id: owned(id),
        },
        Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        } => Tag::Image {
            link_type,
            dest_url: owned(dest_url),
            title: owned(title),
            id: owned(id),
        },
        Tag::MetadataBlock(kind) => Tag::MetadataBlock(kind),
    }
}
