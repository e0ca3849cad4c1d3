//! Stock emitters: per-document pages, folder and tag listings, the global
//! content index (feed + sitemap), alias redirects and the graph artifact.
//!
//! Emitters only read the frozen site. All output paths derive from slugs,
//! so they stay collision-free as long as slugs are unique.

use crate::graph::GraphViewOptions;
use crate::hierarchy::{docs_with_tag, folder_children, folder_slugs, tag_index};
use crate::index::{build_entries, IndexOptions};
use crate::model::Document;
use crate::pipeline::{Artifact, Emitter, Site};
use crate::slug::normalize_target;

/// One HTML page per document.
pub struct ContentPages;

impl Emitter for ContentPages {
    fn name(&self) -> &'static str {
        "content-pages"
    }

    fn emit(&self, site: &Site) -> anyhow::Result<Vec<Artifact>> {
        let mut artifacts = Vec::with_capacity(site.documents.len());

        for doc in &site.documents {
            let mut body = String::new();
            let classes = if doc.frontmatter.css_classes.is_empty() {
                String::new()
            } else {
                format!(" class=\"{}\"", escape_html(&doc.frontmatter.css_classes.join(" ")))
            };

            body.push_str(&format!("<article{classes}>\n"));
            body.push_str(&format!("<h1>{}</h1>\n", escape_html(doc.title())));
            body.push_str(&content_meta(doc));

            if let Some(toc) = &doc.toc_html {
                body.push_str(toc);
                body.push('\n');
            }

            body.push_str(&doc.content.render_html());
            body.push_str("</article>\n");
            body.push_str(&backlink_section(site, &doc.slug));

            let html = page_shell(site, doc.title(), doc.description.as_deref(), &body);
            artifacts.push(Artifact::new(doc.output_rel_path(), html));
        }

        tracing::debug!("emitted {} content pages", artifacts.len());
        Ok(artifacts)
    }
}

fn content_meta(doc: &Document) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(created) = doc.dates.created {
        parts.push(format!("Created {}", created.value.format("%Y-%m-%d")));
    }
    if let Some(modified) = doc.dates.modified {
        parts.push(format!("Updated {}", modified.value.format("%Y-%m-%d")));
    }

    let mut out = String::new();
    if !parts.is_empty() {
        out.push_str(&format!(
            "<p class=\"content-meta\">{}</p>\n",
            parts.join(" · ")
        ));
    }

    if !doc.frontmatter.tags.is_empty() {
        let tags: Vec<String> = doc
            .frontmatter
            .tags
            .iter()
            .map(|t| {
                format!(
                    "<a href=\"/tags/{}/index.html\">#{}</a>",
                    t,
                    escape_html(t)
                )
            })
            .collect();
        out.push_str(&format!("<p class=\"tags\">{}</p>\n", tags.join(" ")));
    }

    out
}

fn backlink_section(site: &Site, slug: &str) -> String {
    let backlinks = site.graph.backlinks(slug);
    if backlinks.is_empty() {
        return String::new();
    }

    let mut out = String::from("<section class=\"backlinks\">\n<h2>Backlinks</h2>\n<ul>\n");
    for source in backlinks {
        let title = site
            .document(source)
            .map(|d| d.title().to_string())
            .unwrap_or_else(|| source.to_string());
        out.push_str(&format!(
            "<li><a href=\"/{source}.html\">{}</a></li>\n",
            escape_html(&title)
        ));
    }
    out.push_str("</ul>\n</section>\n");
    out
}

/// One listing page per implicit folder.
pub struct FolderPages;

impl Emitter for FolderPages {
    fn name(&self) -> &'static str {
        "folder-pages"
    }

    fn emit(&self, site: &Site) -> anyhow::Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();

        for folder in folder_slugs(&site.documents) {
            // The tag tree owns everything under tags/.
            if folder == "tags" || folder.starts_with("tags/") {
                continue;
            }

            let children = folder_children(&site.documents, &folder);
            let index_doc = site.document(&folder);
            let title = index_doc
                .map(|d| d.title().to_string())
                .unwrap_or_else(|| {
                    folder
                        .rsplit('/')
                        .next()
                        .unwrap_or(&folder)
                        .to_string()
                });

            let mut body = String::new();
            body.push_str("<article>\n");
            body.push_str(&format!("<h1>{}</h1>\n", escape_html(&title)));
            body.push_str(&format!(
                "<p class=\"content-meta\">{} items under this folder.</p>\n",
                children.len()
            ));
            if let Some(doc) = index_doc {
                body.push_str(&doc.content.render_html());
            }
            body.push_str("</article>\n");
            body.push_str(&listing(&children));

            let html = page_shell(site, &title, None, &body);
            artifacts.push(Artifact::new(format!("{folder}/index.html"), html));
        }

        Ok(artifacts)
    }
}

fn listing(docs: &[&Document]) -> String {
    let mut out = String::from("<ul class=\"page-listing\">\n");
    for doc in docs {
        out.push_str(&format!(
            "<li><a href=\"{}\">{}</a>",
            doc.url(),
            escape_html(doc.title())
        ));
        if let Some(date) = doc.sort_date() {
            out.push_str(&format!(
                " <span class=\"meta\">{}</span>",
                date.format("%Y-%m-%d")
            ));
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n");
    out
}

/// The root tag index plus one listing page per expanded tag.
pub struct TagPages;

impl Emitter for TagPages {
    fn name(&self) -> &'static str {
        "tag-pages"
    }

    fn emit(&self, site: &Site) -> anyhow::Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        let entries = tag_index(&site.documents, site.options.tag_display_cap);

        // Root index: every tag with a capped listing.
        let mut body = String::new();
        body.push_str("<article>\n<h1>Tags</h1>\n");
        body.push_str(&format!(
            "<p class=\"content-meta\">{} tags in total.</p>\n</article>\n",
            entries.len()
        ));
        for entry in &entries {
            body.push_str("<section class=\"tag-section\">\n");
            body.push_str(&format!(
                "<h2><a href=\"/tags/{}/index.html\">#{}</a></h2>\n",
                entry.tag,
                escape_html(&entry.tag)
            ));
            let counter = if entry.capped() {
                format!("Showing first {} of {} items.", entry.members.len(), entry.total)
            } else {
                format!("{} items with this tag.", entry.total)
            };
            body.push_str(&format!("<p class=\"content-meta\">{counter}</p>\n"));
            if let Some(desc) = entry.index_doc.and_then(|d| d.description.as_deref()) {
                body.push_str(&format!("<p>{}</p>\n", escape_html(desc)));
            }
            body.push_str(&listing(&entry.members));
            body.push_str("</section>\n");
        }
        artifacts.push(Artifact::new(
            "tags/index.html",
            page_shell(site, "Tags", None, &body),
        ));

        // One page per tag with the full membership.
        for entry in &entries {
            let members = docs_with_tag(&site.documents, &entry.tag);
            let mut body = String::new();
            body.push_str("<article>\n");
            body.push_str(&format!("<h1>#{}</h1>\n", escape_html(&entry.tag)));
            body.push_str(&format!(
                "<p class=\"content-meta\">{} items with this tag.</p>\n",
                members.len()
            ));
            if let Some(doc) = entry.index_doc {
                body.push_str(&doc.content.render_html());
            }
            body.push_str("</article>\n");
            body.push_str(&listing(&members));

            let title = format!("Tag: {}", entry.tag);
            artifacts.push(Artifact::new(
                format!("tags/{}/index.html", entry.tag),
                page_shell(site, &title, None, &body),
            ));
        }

        Ok(artifacts)
    }
}

/// The global content index: JSON snapshot, sitemap and RSS feed.
pub struct ContentIndex {
    pub enable_sitemap: bool,
    pub enable_rss: bool,
}

impl Default for ContentIndex {
    fn default() -> Self {
        Self {
            enable_sitemap: true,
            enable_rss: true,
        }
    }
}

impl Emitter for ContentIndex {
    fn name(&self) -> &'static str {
        "content-index"
    }

    fn emit(&self, site: &Site) -> anyhow::Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();

        let entries = build_entries(
            &site.documents,
            &IndexOptions {
                include_empty: site.options.include_empty,
                limit: None,
                full_excerpt: false,
            },
        );

        artifacts.push(Artifact::new(
            "content-index.json",
            serde_json::to_string_pretty(&entries)?,
        ));

        if self.enable_sitemap {
            let mut urls = String::new();
            for entry in &entries {
                urls.push_str("<url>");
                urls.push_str(&format!(
                    "<loc>{}</loc>",
                    absolute_url(&site.meta.url, &format!("{}.html", entry.slug))
                ));
                if let Some(date) = entry.date {
                    urls.push_str(&format!("<lastmod>{}</lastmod>", date.format("%Y-%m-%d")));
                }
                urls.push_str("</url>\n");
            }
            let xml = format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{urls}</urlset>\n"
            );
            artifacts.push(Artifact::new("sitemap.xml", xml));
        }

        if self.enable_rss {
            let feed_entries = build_entries(
                &site.documents,
                &IndexOptions {
                    include_empty: site.options.include_empty,
                    limit: site.options.rss_limit,
                    full_excerpt: site.options.rss_full_html,
                },
            );

            let mut items = String::new();
            for entry in &feed_entries {
                let link = absolute_url(&site.meta.url, &format!("{}.html", entry.slug));
                let description = entry
                    .excerpt
                    .as_deref()
                    .or(entry.description.as_deref())
                    .unwrap_or(&entry.title);

                items.push_str(&format!(
                    "<item><title>{}</title><link>{link}</link><guid>{link}</guid><description>{}</description>",
                    escape_xml(&entry.title),
                    escape_xml(description)
                ));
                if let Some(date) = entry.date {
                    items.push_str(&format!(
                        "<pubDate>{}</pubDate>",
                        date.and_utc().to_rfc2822()
                    ));
                }
                items.push_str("</item>\n");
            }

            let rss = format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n<title>{}</title>\n<link>{}</link>\n<description>{}</description>\n{items}</channel>\n</rss>\n",
                escape_xml(&site.meta.title),
                absolute_url(&site.meta.url, ""),
                escape_xml(&site.meta.description)
            );
            artifacts.push(Artifact::new("rss.xml", rss));
        }

        Ok(artifacts)
    }
}

/// Meta-refresh stubs for frontmatter aliases.
pub struct AliasRedirects;

impl Emitter for AliasRedirects {
    fn name(&self) -> &'static str {
        "alias-redirects"
    }

    fn emit(&self, site: &Site) -> anyhow::Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();

        for doc in &site.documents {
            for alias in &doc.frontmatter.aliases {
                let alias_slug = normalize_target(alias);
                if alias_slug.is_empty() {
                    continue;
                }
                if site.document(&alias_slug).is_some() || site.reserved.contains(&alias_slug) {
                    tracing::warn!(
                        "alias '{}' on '{}' shadows an existing slug, skipping",
                        alias,
                        doc.slug
                    );
                    continue;
                }

                let url = doc.url();
                let html = format!(
                    "<!DOCTYPE html>\n<html>\n<head>\n<title>{}</title>\n<link rel=\"canonical\" href=\"{url}\">\n<meta name=\"robots\" content=\"noindex\">\n<meta charset=\"utf-8\">\n<meta http-equiv=\"refresh\" content=\"0; url={url}\">\n</head>\n</html>\n",
                    escape_html(doc.title())
                );
                artifacts.push(Artifact::new(format!("{alias_slug}.html"), html));
            }
        }

        Ok(artifacts)
    }
}

/// The serialized graph view consumed by the interactive graph.
pub struct GraphData;

impl Emitter for GraphData {
    fn name(&self) -> &'static str {
        "graph-data"
    }

    fn emit(&self, site: &Site) -> anyhow::Result<Vec<Artifact>> {
        let view = site.graph.project(
            &site.documents,
            GraphViewOptions {
                include_tags: site.options.graph_tags,
                include_folders: site.options.graph_folders,
            },
        );

        Ok(vec![Artifact::new(
            "graph.json",
            serde_json::to_string_pretty(&view)?,
        )])
    }
}

fn page_shell(site: &Site, title: &str, description: Option<&str>, body: &str) -> String {
    let description_meta = description
        .map(|d| format!("<meta name=\"description\" content=\"{}\">\n", escape_html(d)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n<title>{} · {}</title>\n{description_meta}</head>\n<body>\n<header><a href=\"/index.html\">{}</a></header>\n<main>\n{body}</main>\n<footer>{}</footer>\n</body>\n</html>\n",
        escape_html(title),
        escape_html(&site.meta.title),
        escape_html(&site.meta.title),
        escape_html(&site.meta.author)
    )
}

fn absolute_url(site_url: &str, rel: &str) -> String {
    let root = site_url.trim_end_matches('/');
    let rel = rel.trim_start_matches('/');
    if rel.is_empty() {
        root.to_string()
    } else if root.is_empty() {
        format!("/{rel}")
    } else {
        format!("{root}/{rel}")
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Options, SiteMeta};
    use crate::graph::LinkGraph;
    use crate::model::{Document, SourceDates};
    use std::collections::BTreeSet;

    fn site(docs: Vec<Document>) -> Site {
        let mut docs = docs;
        docs.sort_by(|a, b| a.slug.cmp(&b.slug));
        let graph = LinkGraph::build(&docs);
        Site {
            meta: SiteMeta {
                title: "Test Garden".into(),
                author: "Tester".into(),
                description: "A test site".into(),
                url: "https://example.com".into(),
            },
            options: Options::default(),
            documents: docs,
            graph,
            reserved: BTreeSet::new(),
        }
    }

    fn doc(path: &str, raw: &str) -> Document {
        Document::from_source(path, raw, SourceDates::default()).unwrap()
    }

    fn linked_doc(path: &str, raw: &str, links: &[&str]) -> Document {
        let mut d = doc(path, raw);
        d.links = links.iter().map(|s| s.to_string()).collect();
        d
    }

    #[test]
    fn test_content_pages_paths_and_backlinks() {
        let site = site(vec![
            linked_doc("a.md", "links to b", &["b"]),
            doc("b.md", "---\ntitle: Bee\n---\ncontent"),
        ]);
        let artifacts = ContentPages.emit(&site).unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].path, "a.html");

        let b_page = &artifacts[1];
        assert_eq!(b_page.path, "b.html");
        assert!(b_page.content.contains("Backlinks"));
        assert!(b_page.content.contains("href=\"/a.html\""));

        // No backlinks section on a page nothing links to.
        assert!(!artifacts[0].content.contains("Backlinks"));
    }

    #[test]
    fn test_folder_pages_list_direct_children_only() {
        let site = site(vec![
            doc("garden/a.md", "body"),
            doc("garden/deep/b.md", "body"),
            doc("garden/index.md", "welcome to the garden"),
        ]);
        let artifacts = FolderPages.emit(&site).unwrap();

        let garden = artifacts
            .iter()
            .find(|a| a.path == "garden/index.html")
            .unwrap();
        assert!(garden.content.contains("href=\"/garden/a.html\""));
        assert!(!garden.content.contains("href=\"/garden/deep/b.html\""));
        assert!(garden.content.contains("welcome to the garden"));

        assert!(artifacts.iter().any(|a| a.path == "garden/deep/index.html"));
    }

    #[test]
    fn test_tag_pages_cover_prefix_hierarchy() {
        let site = site(vec![
            doc("a.md", "---\ntags: [x/y]\n---\nbody"),
            doc("b.md", "---\ntags: [x]\n---\nbody"),
        ]);
        let artifacts = TagPages.emit(&site).unwrap();

        let paths: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
        assert!(paths.contains(&"tags/index.html"));
        assert!(paths.contains(&"tags/x/index.html"));
        assert!(paths.contains(&"tags/x/y/index.html"));

        let x = artifacts
            .iter()
            .find(|a| a.path == "tags/x/index.html")
            .unwrap();
        assert!(x.content.contains("2 items with this tag."));
    }

    #[test]
    fn test_tag_root_shows_capped_counts() {
        let mut docs = Vec::new();
        for i in 0..12 {
            docs.push(doc(
                &format!("n{i:02}.md"),
                "---\ntags: [x]\n---\nbody",
            ));
        }
        let site = site(docs);
        let artifacts = TagPages.emit(&site).unwrap();
        let root = artifacts
            .iter()
            .find(|a| a.path == "tags/index.html")
            .unwrap();
        assert!(root.content.contains("Showing first 10 of 12 items."));
    }

    #[test]
    fn test_content_index_artifacts() {
        let mut a = doc("a.md", "---\ndate: 2024-01-01\n---\nbody");
        a.dates.created = Some(crate::model::ResolvedDate {
            value: crate::model::parse_date("2024-01-01").unwrap(),
            source: crate::config::DateSource::Frontmatter,
        });
        let site = site(vec![a]);
        let artifacts = ContentIndex::default().emit(&site).unwrap();

        let paths: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["content-index.json", "sitemap.xml", "rss.xml"]);

        let sitemap = &artifacts[1];
        assert!(sitemap
            .content
            .contains("<loc>https://example.com/a.html</loc>"));
        assert!(sitemap.content.contains("<lastmod>2024-01-01</lastmod>"));

        let rss = &artifacts[2];
        assert!(rss.content.contains("<title>Test Garden</title>"));
        assert!(rss.content.contains("<pubDate>"));
    }

    #[test]
    fn test_alias_redirects() {
        let site = site(vec![doc(
            "new-home.md",
            "---\naliases: [old page]\n---\nbody",
        )]);
        let artifacts = AliasRedirects.emit(&site).unwrap();

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].path, "old-page.html");
        assert!(artifacts[0]
            .content
            .contains("url=/new-home.html"));
    }

    #[test]
    fn test_alias_shadowing_existing_slug_skipped() {
        let site = site(vec![
            doc("a.md", "---\naliases: [b]\n---\nbody"),
            doc("b.md", "body"),
        ]);
        let artifacts = AliasRedirects.emit(&site).unwrap();
        assert!(artifacts.is_empty());
    }

    #[test]
    fn test_graph_artifact() {
        let site = site(vec![
            linked_doc("a.md", "body", &["b"]),
            doc("b.md", "body"),
        ]);
        let artifacts = GraphData.emit(&site).unwrap();

        assert_eq!(artifacts[0].path, "graph.json");
        let view: serde_json::Value = serde_json::from_str(&artifacts[0].content).unwrap();
        assert_eq!(view["links"][0]["source"], "a");
        assert_eq!(view["links"][0]["target"], "b");
    }

    #[test]
    fn test_absolute_url_joining() {
        assert_eq!(
            absolute_url("https://example.com/", "a.html"),
            "https://example.com/a.html"
        );
        assert_eq!(absolute_url("https://example.com", ""), "https://example.com");
        assert_eq!(absolute_url("", "a.html"), "/a.html");
    }
}
