//! Init command: scaffold a new project.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"site:
  title: My Garden
  author: ""
  description: ""
  url: ""

paths:
  content: content
  output: public

options:
  link_resolution: shortest
  tag_display_cap: 10
"#;

const WELCOME_NOTE: &str = r#"---
title: Welcome
---

# Welcome

This is your new feldspar site. Add markdown files under `content/` and run
`feldspar build`.
"#;

pub fn run(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or(Path::new("."));
    let config_path = root.join("feldspar.yml");

    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    fs::create_dir_all(root.join("content"))
        .with_context(|| format!("failed to create {}", root.join("content").display()))?;
    fs::write(&config_path, CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    let index_path = root.join("content/index.md");
    if !index_path.exists() {
        fs::write(&index_path, WELCOME_NOTE)
            .with_context(|| format!("failed to write {}", index_path.display()))?;
    }

    tracing::info!("initialized project at {}", root.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_scaffolds_project() {
        let dir = tempfile::tempdir().unwrap();
        run(Some(dir.path())).unwrap();

        assert!(dir.path().join("feldspar.yml").exists());
        assert!(dir.path().join("content/index.md").exists());
    }

    #[test]
    fn test_init_refuses_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("feldspar.yml"), "site: {}").unwrap();
        assert!(run(Some(dir.path())).is_err());
    }
}
