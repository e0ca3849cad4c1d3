//! Build options and site metadata.

use serde::{Deserialize, Serialize};

/// Strategy for resolving relative link targets against the slug set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkResolution {
    /// Search the full slug set for the shortest unambiguous suffix match.
    #[default]
    Shortest,
    /// Interpret targets as paths from the content root.
    Absolute,
}

/// Where a document date was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateSource {
    #[serde(rename = "frontmatter")]
    Frontmatter,
    #[serde(rename = "filesystem")]
    Filesystem,
    #[serde(rename = "git")]
    VersionControl,
}

fn default_date_priority() -> Vec<DateSource> {
    vec![
        DateSource::Frontmatter,
        DateSource::Filesystem,
        DateSource::VersionControl,
    ]
}

fn default_tag_display_cap() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// Global options consumed by the pipeline and the built-in plugins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub link_resolution: LinkResolution,

    /// Date sources in precedence order; first available wins.
    #[serde(default = "default_date_priority")]
    pub date_priority: Vec<DateSource>,

    /// Listing cap per tag on the root tag index.
    #[serde(default = "default_tag_display_cap")]
    pub tag_display_cap: usize,

    /// Include documents with an empty content tree in the content index.
    #[serde(default)]
    pub include_empty: bool,

    /// Add tag membership nodes to the graph artifact.
    #[serde(default = "default_true")]
    pub graph_tags: bool,

    /// Add folder containment nodes to the graph artifact.
    #[serde(default)]
    pub graph_folders: bool,

    /// Cap on RSS feed entries. `None` emits every entry.
    #[serde(default)]
    pub rss_limit: Option<usize>,

    /// Carry the full rendered content in feed entries rather than the
    /// description only.
    #[serde(default)]
    pub rss_full_html: bool,

    /// Regex patterns for source paths excluded at discovery time.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            link_resolution: LinkResolution::default(),
            date_priority: default_date_priority(),
            tag_display_cap: default_tag_display_cap(),
            include_empty: false,
            graph_tags: true,
            graph_folders: false,
            rss_limit: None,
            rss_full_html: false,
            ignore_patterns: Vec::new(),
        }
    }
}

impl Options {
    /// Overlay a partial set of options. Every field present in `patch`
    /// wins over the current value; when patches are applied in declaration
    /// order this gives "later-declared entry wins" semantics.
    pub fn apply(mut self, patch: OptionsPatch) -> Self {
        if let Some(v) = patch.link_resolution {
            self.link_resolution = v;
        }
        if let Some(v) = patch.date_priority {
            self.date_priority = v;
        }
        if let Some(v) = patch.tag_display_cap {
            self.tag_display_cap = v;
        }
        if let Some(v) = patch.include_empty {
            self.include_empty = v;
        }
        if let Some(v) = patch.graph_tags {
            self.graph_tags = v;
        }
        if let Some(v) = patch.graph_folders {
            self.graph_folders = v;
        }
        if let Some(v) = patch.rss_limit {
            self.rss_limit = Some(v);
        }
        if let Some(v) = patch.rss_full_html {
            self.rss_full_html = v;
        }
        if let Some(v) = patch.ignore_patterns {
            self.ignore_patterns = v;
        }
        self
    }
}

/// A partial [`Options`] as it appears in config overlays. Absent fields
/// leave the base value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionsPatch {
    #[serde(default)]
    pub link_resolution: Option<LinkResolution>,

    #[serde(default)]
    pub date_priority: Option<Vec<DateSource>>,

    #[serde(default)]
    pub tag_display_cap: Option<usize>,

    #[serde(default)]
    pub include_empty: Option<bool>,

    #[serde(default)]
    pub graph_tags: Option<bool>,

    #[serde(default)]
    pub graph_folders: Option<bool>,

    #[serde(default)]
    pub rss_limit: Option<usize>,

    #[serde(default)]
    pub rss_full_html: Option<bool>,

    #[serde(default)]
    pub ignore_patterns: Option<Vec<String>>,
}

/// Site-level metadata rendered into pages and feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMeta {
    pub title: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub description: String,

    /// Absolute site URL used for feed and sitemap locations.
    #[serde(default)]
    pub url: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            title: String::from("Untitled site"),
            author: String::new(),
            description: String::new(),
            url: String::new(),
        }
    }
}
