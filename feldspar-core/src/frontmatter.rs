//! Frontmatter parsing from markdown sources.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Author-declared metadata. Keys the pipeline reads get typed fields;
/// everything else lands in `extra`, preserved but never interpreted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub draft: bool,

    /// Creation date as written ("2024-01-01" or "2024-01-01 12:30").
    #[serde(default)]
    pub date: Option<String>,

    #[serde(default, alias = "updated")]
    pub modified: Option<String>,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default, rename = "cssclasses")]
    pub css_classes: Vec<String>,

    /// Unrecognized keys, passed through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Frontmatter {
    /// Read a boolean out of the pass-through bag.
    pub fn extra_bool(&self, key: &str) -> Option<bool> {
        self.extra.get(key).and_then(|v| v.as_bool())
    }
}

static FENCE_REGEX: OnceLock<Regex> = OnceLock::new();

fn fence_regex() -> &'static Regex {
    FENCE_REGEX.get_or_init(|| Regex::new(r"(?s)^---\s*\n(.*?)\n---\s*\n?(.*)$").unwrap())
}

/// Split a markdown source into `(frontmatter, body)`.
///
/// Sources without a frontmatter fence yield a default frontmatter and the
/// full content as body.
pub fn parse_frontmatter(content: &str) -> Result<(Frontmatter, String), serde_yaml::Error> {
    let re = fence_regex();

    if let Some(captures) = re.captures(content) {
        let yaml = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let body = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        let frontmatter: Frontmatter = serde_yaml::from_str(yaml)?;
        Ok((frontmatter, body.to_string()))
    } else {
        Ok((Frontmatter::default(), content.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_fields() {
        let content = r#"---
title: Garden Notes
description: Assorted notes
tags:
  - garden/tools
  - weekly
draft: true
date: 2024-01-01
---

# Hello
"#;

        let (fm, body) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Garden Notes"));
        assert_eq!(fm.description.as_deref(), Some("Assorted notes"));
        assert_eq!(fm.tags, vec!["garden/tools", "weekly"]);
        assert!(fm.draft);
        assert_eq!(fm.date.as_deref(), Some("2024-01-01"));
        assert!(body.contains("# Hello"));
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let content = "---\ntitle: T\npublish: true\ncustom_field: 42\n---\nBody";
        let (fm, _) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.extra_bool("publish"), Some(true));
        assert_eq!(
            fm.extra.get("custom_field").and_then(|v| v.as_u64()),
            Some(42)
        );
    }

    #[test]
    fn test_no_fence() {
        let content = "# Just content\n\nNo metadata.";
        let (fm, body) = parse_frontmatter(content).unwrap();
        assert!(fm.title.is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_updated_alias() {
        let content = "---\ntitle: T\nupdated: 2024-02-02\n---\nBody";
        let (fm, _) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.modified.as_deref(), Some("2024-02-02"));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let content = "---\ntitle: [unclosed\n---\nBody";
        assert!(parse_frontmatter(content).is_err());
    }

    #[test]
    fn test_css_classes() {
        let content = "---\ntitle: T\ncssclasses:\n  - wide\n---\nBody";
        let (fm, _) = parse_frontmatter(content).unwrap();
        assert_eq!(fm.css_classes, vec!["wide"]);
    }
}
