//! Project configuration file (`feldspar.yml`).

use anyhow::{Context, Result};
use feldspar_core::{Options, OptionsPatch, SiteMeta};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The on-disk project config. Build options are layered: defaults, then
/// `options`, then each entry of `overrides` in declaration order — the
/// later-declared entry wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub site: SiteMeta,
    pub paths: PathsConfig,

    #[serde(default)]
    pub options: OptionsPatch,

    #[serde(default)]
    pub overrides: Vec<OptionsPatch>,

    // Path to the config file itself, for relative path resolution.
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub content: PathBuf,
    pub output: PathBuf,
}

impl ProjectConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: ProjectConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Final options after applying every declared layer.
    pub fn resolved_options(&self) -> Options {
        let mut options = Options::default().apply(self.options.clone());
        for patch in &self.overrides {
            options = options.apply(patch.clone());
        }
        options
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.config_path.as_ref().and_then(|p| p.parent()) {
            Some(parent) => parent.join(path),
            None => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feldspar_core::DateSource;

    #[test]
    fn test_parse_minimal() {
        let yaml = r#"
site:
  title: My Garden
paths:
  content: content
  output: public
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.site.title, "My Garden");
        let options = config.resolved_options();
        assert_eq!(options.tag_display_cap, 10);
    }

    #[test]
    fn test_overrides_later_wins() {
        let yaml = r#"
site:
  title: My Garden
paths:
  content: content
  output: public
options:
  date_priority: [frontmatter]
  rss_full_html: true
overrides:
  - date_priority: [filesystem, frontmatter]
  - rss_full_html: false
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        let options = config.resolved_options();
        assert_eq!(
            options.date_priority,
            vec![DateSource::Filesystem, DateSource::Frontmatter]
        );
        assert!(!options.rss_full_html);
    }

    #[test]
    fn test_paths_resolve_relative_to_config() {
        let yaml = r#"
site:
  title: T
paths:
  content: content
  output: public
"#;
        let mut config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        config.config_path = Some(PathBuf::from("/srv/site/feldspar.yml"));
        assert_eq!(config.content_dir(), PathBuf::from("/srv/site/content"));
        assert_eq!(config.output_dir(), PathBuf::from("/srv/site/public"));
    }
}
