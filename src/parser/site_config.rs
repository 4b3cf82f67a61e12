use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Name of the optional configuration file in the source directory
pub const CONFIG_FILE: &str = "wiki.json";

/// Site settings. Paths are relative to the source directory and keep the
/// `./` / `../` prefix style used in links, e.g. `./public`, `../images`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Brand prefix of every page title
    pub site_name: String,

    /// Absolute URL the site is published under, with trailing slash
    pub website: String,

    /// Description used when a page has no `description:` directive
    pub description: String,

    /// Sidebar label of the root page
    pub home_label: String,

    pub output_dir: String,

    /// Copied verbatim to the output root
    pub public_dir: String,

    /// Copied verbatim to `<output>/images`
    pub images_dir: Option<String>,

    /// Texture folder; only files referenced by a page are copied
    pub textures_dir: Option<String>,

    /// Copied to `<output>/icon.png`
    pub icon: Option<String>,

    pub stylesheets: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "Aurora's Decorations".to_string(),
            website: "https://lambdaurora.dev/AurorasDecorations/".to_string(),
            description: "Welcome to the Aurora's Decorations wiki. Aurora's Decorations is a decorations-focused mod."
                .to_string(),
            home_label: "Main page".to_string(),
            output_dir: "deploy_out".to_string(),
            public_dir: "./public".to_string(),
            images_dir: Some("../images".to_string()),
            textures_dir: Some("../src/main/resources/assets/aurorasdeco/textures".to_string()),
            icon: Some("../src/main/resources/assets/aurorasdeco/icon.png".to_string()),
            stylesheets: vec!["https://lambdaurora.dev/style.css".to_string()],
        }
    }
}

impl SiteConfig {
    /// Load `wiki.json` from the source directory, falling back to defaults
    pub fn load(source_dir: &Path) -> Result<Self> {
        let config_path = source_dir.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: SiteConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
        Ok(config)
    }

    /// Output directory in the same `./`-prefixed form as other site paths
    pub fn output_root(&self) -> String {
        format!("./{}", self.output_dir.trim_start_matches("./").trim_end_matches('/'))
    }

    /// Page title with the brand prefix, unless it already carries it
    pub fn page_title(&self, raw_title: &str) -> String {
        if raw_title.starts_with(&self.site_name) {
            raw_title.to_string()
        } else {
            format!("{} - {}", self.site_name, raw_title)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_wiki_json() {
        let json = r#"{
            "site_name": "Lantern Wiki",
            "website": "https://example.org/lanterns/",
            "images_dir": null,
            "stylesheets": []
        }"#;

        let config: SiteConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.site_name, "Lantern Wiki");
        assert_eq!(config.website, "https://example.org/lanterns/");
        assert_eq!(config.images_dir, None);
        assert!(config.stylesheets.is_empty());
        // Unspecified fields keep their defaults
        assert_eq!(config.home_label, "Main page");
        assert_eq!(config.output_dir, "deploy_out");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::load(dir.path()).unwrap();
        assert_eq!(config.site_name, "Aurora's Decorations");
        assert_eq!(config.public_dir, "./public");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert!(SiteConfig::load(dir.path()).is_err());
    }

    #[test]
    fn test_page_title_prefix() {
        let config = SiteConfig::default();
        assert_eq!(config.page_title("Lanterns"), "Aurora's Decorations - Lanterns");
        assert_eq!(
            config.page_title("Aurora's Decorations Wiki"),
            "Aurora's Decorations Wiki"
        );
    }

    #[test]
    fn test_output_root() {
        let mut config = SiteConfig::default();
        assert_eq!(config.output_root(), "./deploy_out");
        config.output_dir = "./site/".to_string();
        assert_eq!(config.output_root(), "./site");
    }
}
