//! Folder containment and tag-prefix hierarchy, derived from slugs and
//! frontmatter tags. Nothing here is materialized between builds; every
//! function is a pure view over the frozen document set.

use crate::model::Document;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Parent folder of a slug: `"a/b/c"` → `Some("a/b")`, `"a"` → `None`.
pub fn parent_folder(slug: &str) -> Option<&str> {
    slug.rsplit_once('/').map(|(parent, _)| parent)
}

/// Whether `slug` sits directly inside `folder` (exactly one segment
/// deeper). The empty folder is the content root.
pub fn is_direct_child(slug: &str, folder: &str) -> bool {
    if slug == folder {
        return false;
    }
    match parent_folder(slug) {
        Some(parent) => parent == folder,
        None => folder.is_empty(),
    }
}

/// Direct children of a folder, in slug order.
pub fn folder_children<'a>(docs: &'a [Document], folder: &str) -> Vec<&'a Document> {
    let mut children: Vec<&Document> = docs
        .iter()
        .filter(|d| is_direct_child(&d.slug, folder))
        .collect();
    children.sort_by(|a, b| a.slug.cmp(&b.slug));
    children
}

/// Every implicit folder present in the corpus (all proper slug prefixes),
/// sorted.
pub fn folder_slugs(docs: &[Document]) -> Vec<String> {
    let mut folders: BTreeSet<String> = BTreeSet::new();
    for doc in docs {
        let mut slug = doc.slug.as_str();
        while let Some(parent) = parent_folder(slug) {
            folders.insert(parent.to_string());
            slug = parent;
        }
    }
    folders.into_iter().collect()
}

/// Expand a hierarchical tag into its full prefix set:
/// `"a/b/c"` → `["a", "a/b", "a/b/c"]`.
pub fn expand_tag(tag: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    let mut current = String::new();
    for segment in tag.split('/').filter(|s| !s.is_empty()) {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(segment);
        prefixes.push(current.clone());
    }
    prefixes
}

/// The expanded tag set of one document.
pub fn document_tags(doc: &Document) -> BTreeSet<String> {
    doc.frontmatter
        .tags
        .iter()
        .flat_map(|t| expand_tag(t))
        .collect()
}

/// Every document whose expanded tag set includes `tag`, in slug order.
pub fn docs_with_tag<'a>(docs: &'a [Document], tag: &str) -> Vec<&'a Document> {
    let mut members: Vec<&Document> = docs
        .iter()
        .filter(|d| document_tags(d).contains(tag))
        .collect();
    members.sort_by(|a, b| a.slug.cmp(&b.slug));
    members
}

/// One entry of the root tag index.
#[derive(Debug)]
pub struct TagIndexEntry<'a> {
    pub tag: String,

    /// Members shown, capped to the display cap.
    pub members: Vec<&'a Document>,

    /// Total member count, for "showing N of M" rendering.
    pub total: usize,

    /// The tag's own index document, when one is authored at `tags/<tag>`.
    pub index_doc: Option<&'a Document>,
}

impl TagIndexEntry<'_> {
    /// Whether the listing is truncated by the display cap.
    pub fn capped(&self) -> bool {
        self.members.len() < self.total
    }
}

/// The root tag index: every distinct expanded tag across the corpus, in
/// locale-aware lexicographic order, with capped member listings.
pub fn tag_index<'a>(docs: &'a [Document], display_cap: usize) -> Vec<TagIndexEntry<'a>> {
    let mut tags: Vec<String> = docs
        .iter()
        .flat_map(document_tags)
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();
    tags.sort_by(|a, b| locale_cmp(a, b));

    tags.into_iter()
        .map(|tag| {
            let all = docs_with_tag(docs, &tag);
            let total = all.len();
            let members: Vec<&Document> = all.into_iter().take(display_cap).collect();
            let index_slug = format!("tags/{tag}");
            let index_doc = docs.iter().find(|d| d.slug == index_slug);
            TagIndexEntry {
                tag,
                members,
                total,
                index_doc,
            }
        })
        .collect()
}

/// Case-insensitive lexicographic comparison with the original strings as
/// tiebreak, so ordering stays total and deterministic.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
