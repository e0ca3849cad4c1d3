//! Slug derivation from storage paths and link target resolution.

use crate::config::LinkResolution;
use crate::error::{ConfigError, Diagnostic};
use indexmap::IndexMap;
use unicode_segmentation::UnicodeSegmentation;

/// Markdown extensions stripped during slug derivation.
const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Derive the canonical slug for a storage path relative to the content root.
///
/// Rules:
/// - path separators normalize to `/`, leading/trailing separators dropped
/// - the markdown extension is stripped from the final segment
/// - each segment is percent-decoded and sanitized (whitespace becomes `-`,
///   only alphanumerics, `-`, `_` and `.` survive, hyphen runs collapse)
/// - case is preserved
/// - a trailing `index` segment stands for its parent folder and is removed
pub fn slug_from_path(rel_path: &str) -> Result<String, ConfigError> {
    let normalized = rel_path.replace('\\', "/");
    let trimmed = normalized.trim_matches('/');

    let mut segments: Vec<String> = Vec::new();
    let count = trimmed.split('/').filter(|s| !s.is_empty()).count();

    for (i, raw) in trimmed.split('/').filter(|s| !s.is_empty()).enumerate() {
        let raw = if i + 1 == count {
            strip_markdown_extension(raw)
        } else {
            raw
        };

        let segment = sanitize_segment(&percent_decode(raw));
        if segment.is_empty() {
            return Err(ConfigError::InvalidSlug {
                path: rel_path.to_string(),
                reason: format!("segment '{raw}' is empty after normalization"),
            });
        }
        segments.push(segment);
    }

    // An index file represents its parent folder.
    if segments.last().map(|s| s == "index").unwrap_or(false) {
        segments.pop();
    }

    if segments.is_empty() {
        // The root index file.
        return Ok(String::from("index"));
    }

    Ok(segments.join("/"))
}

fn strip_markdown_extension(segment: &str) -> &str {
    if let Some((stem, ext)) = segment.rsplit_once('.') {
        if !stem.is_empty() && MARKDOWN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
            return stem;
        }
    }
    segment
}

/// Decode `%xx` escapes, leaving malformed escapes as written.
pub fn percent_decode(input: &str) -> String {
    fn hex_value(b: u8) -> Option<u8> {
        match b {
            b'0'..=b'9' => Some(b - b'0'),
            b'a'..=b'f' => Some(b - b'a' + 10),
            b'A'..=b'F' => Some(b - b'A' + 10),
            _ => None,
        }
    }

    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(out).unwrap_or_else(|_| input.to_string())
}

/// Sanitize one path segment into slug form, preserving case.
pub fn sanitize_segment(segment: &str) -> String {
    let with_hyphens: String = segment
        .graphemes(true)
        .map(|g| match g {
            " " | "\t" | "\n" => "-",
            _ => g,
        })
        .collect();

    let cleaned: String = with_hyphens
        .graphemes(true)
        .filter_map(|g| {
            let c = g.chars().next()?;
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                Some(g)
            } else {
                None
            }
        })
        .collect();

    let mut collapsed = String::with_capacity(cleaned.len());
    let mut prev_hyphen = false;
    for c in cleaned.chars() {
        if c == '-' {
            if !prev_hyphen {
                collapsed.push(c);
            }
            prev_hyphen = true;
        } else {
            collapsed.push(c);
            prev_hyphen = false;
        }
    }

    collapsed.trim_matches('-').to_string()
}

/// Insertion-ordered registry of slugs with their originating paths.
/// Duplicate detection is a fatal configuration error.
#[derive(Debug, Default)]
pub struct SlugTable {
    entries: IndexMap<String, String>,
}

impl SlugTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slug: String, source_path: String) -> Result<(), ConfigError> {
        if let Some(first) = self.entries.get(&slug) {
            return Err(ConfigError::DuplicateSlug {
                slug,
                first: first.clone(),
                second: source_path,
            });
        }
        self.entries.insert(slug, source_path);
        Ok(())
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.entries.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn slugs(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Outcome of resolving one link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub slug: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve a link target written in a document against the full slug set.
///
/// `Shortest` searches for suffix matches (case-insensitive); zero or
/// multiple candidates resolve deterministically and carry a diagnostic.
/// `Absolute` interprets the target as a path from the content root.
pub fn resolve_reference(
    source_slug: &str,
    target: &str,
    strategy: LinkResolution,
    all_slugs: &[String],
) -> Resolution {
    let wanted = normalize_target(target);
    if wanted.is_empty() {
        return Resolution {
            slug: source_slug.to_string(),
            diagnostics: vec![Diagnostic::warning(
                "link.empty",
                format!("empty link target in '{source_slug}'"),
            )
            .with_slug(source_slug)],
        };
    }

    match strategy {
        LinkResolution::Absolute => {
            let mut diagnostics = Vec::new();
            if !all_slugs.iter().any(|s| s == &wanted) {
                diagnostics.push(
                    Diagnostic::warning(
                        "link.dangling",
                        format!("'{source_slug}' links to missing '{wanted}'"),
                    )
                    .with_slug(source_slug),
                );
            }
            Resolution {
                slug: wanted,
                diagnostics,
            }
        }
        LinkResolution::Shortest => {
            let wanted_lower = wanted.to_lowercase();
            let mut candidates: Vec<&String> = all_slugs
                .iter()
                .filter(|slug| {
                    let lower = slug.to_lowercase();
                    lower == wanted_lower || lower.ends_with(&format!("/{wanted_lower}"))
                })
                .collect();
            candidates.sort();

            match candidates.len() {
                0 => Resolution {
                    slug: wanted,
                    diagnostics: vec![Diagnostic::warning(
                        "link.dangling",
                        format!("'{source_slug}' links to missing '{target}'"),
                    )
                    .with_slug(source_slug)],
                },
                1 => Resolution {
                    slug: candidates[0].clone(),
                    diagnostics: Vec::new(),
                },
                n => Resolution {
                    slug: candidates[0].clone(),
                    diagnostics: vec![Diagnostic::warning(
                        "link.ambiguous",
                        format!(
                            "'{target}' in '{source_slug}' matches {n} documents; using '{}'",
                            candidates[0]
                        ),
                    )
                    .with_slug(source_slug)],
                },
            }
        }
    }
}

/// Normalize a written link target (or alias) into slug shape.
pub(crate) fn normalize_target(target: &str) -> String {
    let no_fragment = target.split('#').next().unwrap_or_default();
    let normalized = no_fragment.replace('\\', "/");
    let trimmed = normalized.trim().trim_matches('/');

    let segments: Vec<String> = trimmed
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(|seg| sanitize_segment(&percent_decode(strip_markdown_extension(seg))))
        .filter(|seg| !seg.is_empty())
        .collect();

    let mut resolved: Vec<String> = Vec::new();
    for seg in segments {
        if seg == ".." {
            resolved.pop();
        } else {
            resolved.push(seg);
        }
    }

    if resolved.last().map(|s| s == "index").unwrap_or(false) {
        resolved.pop();
    }

    resolved.join("/")
}
