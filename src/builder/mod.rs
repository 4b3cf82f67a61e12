mod include;
mod navigation;
mod outline;
mod page;
mod paths;
mod template;

use crate::parser::dom::{to_html, Node};
use crate::parser::SiteConfig;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

use include::expand_includes;
use navigation::Navigation;
use page::{Page, Pages};
use paths::{deploy_path, is_within, relativize_from_root, AssetRegistry, LinkRewriter};
use template::{PageView, Templates};

// Embed static assets at compile time
const STYLE_CSS: &str = include_str!("../../templates/style.css");
const SCRIPT_JS: &str = include_str!("../../templates/script.js");

/// Build statistics
#[derive(Debug, Default)]
pub struct BuildStats {
    pub pages: usize,
    pub assets: usize,
}

/// Result of the load phase, read-only once every page is loaded
struct Site {
    pages: Pages,
    assets: AssetRegistry,
}

/// Deploy the wiki in `source` into its output directory.
/// `root` prefixes every navigation link (empty for root-relative links).
pub fn deploy(source: &Path, root: &str) -> Result<()> {
    let start_time = Instant::now();
    let source = source.canonicalize().context("Source directory not found")?;

    let config = SiteConfig::load(&source)?;
    tracing::info!("Site: {}", config.site_name);

    let stats = deploy_with_config(&source, &config, root)?;

    println!();
    println!(">> generation finished with success in {:.1}s !", start_time.elapsed().as_secs_f64());
    println!("   {} pages built, {} asset files copied", stats.pages, stats.assets);

    Ok(())
}

pub fn deploy_with_config(source: &Path, config: &SiteConfig, root: &str) -> Result<BuildStats> {
    let deployer = Deployer {
        source,
        config,
        output: source.join(config.output_root()),
        rewriter: LinkRewriter::new(config)?,
        stats: BuildStats::default(),
    };
    deployer.run(root)
}

struct Deployer<'a> {
    source: &'a Path,
    config: &'a SiteConfig,
    output: PathBuf,
    rewriter: LinkRewriter,
    stats: BuildStats,
}

impl<'a> Deployer<'a> {
    fn run(mut self, root: &str) -> Result<BuildStats> {
        tracing::info!("Creating deploy directory.");
        clean_output(&self.output)?;
        fs::create_dir_all(&self.output)
            .with_context(|| format!("Failed to create {}", self.output.display()))?;
        self.write_static_assets()?;

        tracing::info!("Deploying...");
        let site = self.load_site()?;
        self.write_pages(&site, root)?;

        let config = self.config;
        if let Some(images) = &config.images_dir {
            self.copy_dir(images, |_| true)?;
        }
        if let Some(textures) = &config.textures_dir {
            self.copy_textures(textures, &site.assets)?;
        }
        if let Some(icon) = &config.icon {
            let dest = self.output.join("icon.png");
            fs::copy(self.source.join(icon), &dest)
                .with_context(|| format!("Failed to copy icon {}", icon))?;
            self.stats.assets += 1;
            tracing::info!("Copied icon.");
        }

        Ok(self.stats)
    }

    fn write_static_assets(&mut self) -> Result<()> {
        for (name, content) in [("style.css", STYLE_CSS), ("script.js", SCRIPT_JS)] {
            let dest = self.output.join(name);
            fs::write(&dest, content).with_context(|| format!("Failed to write {}", dest.display()))?;
        }
        Ok(())
    }

    /// Load every markdown page under the source directory, copying public
    /// files along the way.
    fn load_site(&mut self) -> Result<Site> {
        let mut site = Site {
            pages: Pages::new(),
            assets: AssetRegistry::new(),
        };

        for path in self.walk(".")? {
            if is_within(&path, &self.config.public_dir) {
                self.copy_file(&path)?;
            } else if path.ends_with(".md") {
                tracing::info!("  Loading {}...", path);
                let page = Page::load(self.source, &path, self.config, &self.rewriter, &mut site.assets)?;
                site.pages.insert(path, page);
            }
        }

        Ok(site)
    }

    fn copy_dir(&mut self, dir: &str, filter: impl Fn(&str) -> bool) -> Result<()> {
        for path in self.walk(dir)? {
            if filter(&path) {
                self.copy_file(&path)?;
            }
        }
        Ok(())
    }

    /// Copy the textures some page references, and nothing else
    fn copy_textures(&mut self, textures: &str, assets: &AssetRegistry) -> Result<()> {
        tracing::info!("Copying {} referenced textures...", assets.len());
        let prefix = format!("{}/", textures.trim_end_matches('/'));
        self.copy_dir(textures, |path| {
            path.strip_prefix(&prefix).is_some_and(|key| assets.contains(key))
        })?;

        for (key, source_path) in assets.iter() {
            if !self.source.join(source_path).is_file() {
                tracing::warn!("referenced texture {} does not exist", key);
            }
        }
        Ok(())
    }

    /// Site paths of every file below `dir`, sorted, skipping the output
    /// directory and hidden entries
    fn walk(&self, dir: &str) -> Result<Vec<String>> {
        tracing::info!("Deploying \"{}\"...", dir);
        let base = self.source.join(dir);
        let mut files = Vec::new();

        let walker = WalkDir::new(&base)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || (entry.path() != self.output && !entry.file_name().to_string_lossy().starts_with('.'))
            });

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to read directory {}", base.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(&base)?;
            let mut path = dir.trim_end_matches('/').to_string();
            for component in relative.components() {
                path.push('/');
                path.push_str(&component.as_os_str().to_string_lossy());
            }
            files.push(path);
        }

        Ok(files)
    }

    fn copy_file(&mut self, path: &str) -> Result<()> {
        tracing::info!("  Copying file {}...", path);
        let dest = self.source.join(deploy_path(path, self.config));
        create_parent_dir(&dest)?;
        fs::copy(self.source.join(path), &dest)
            .with_context(|| format!("Failed to copy {} to {}", path, dest.display()))?;
        self.stats.assets += 1;
        Ok(())
    }

    fn write_pages(&mut self, site: &Site, root: &str) -> Result<()> {
        let navigation = Navigation::build(site.pages.values(), &self.config.home_label, root);
        tracing::debug!("navigation has {} entries", navigation.entry_count());
        let templates = Templates::new()?;

        for page in site.pages.values() {
            tracing::info!("Writing {}...", page.html_path);

            let content = to_html(&expand_includes(page, &site.pages));
            let nav_html = Node::from(navigation.render(page)).to_html();
            let root_path = relativize_from_root(&page.html_path);
            let view = PageView {
                title: &page.title,
                description: &page.description,
                path: &page.html_path,
                thumbnail: page.thumbnail.as_deref(),
                root_path: &root_path,
                navigation: &nav_html,
                content: &content,
            };
            let html = templates.render_page(&view, self.config)?;

            let dest = self.source.join(deploy_path(&page.html_path, self.config));
            create_parent_dir(&dest)?;
            fs::write(&dest, html).with_context(|| format!("Failed to write {}", dest.display()))?;
            self.stats.pages += 1;
        }

        Ok(())
    }
}

fn create_parent_dir(dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Remove a previous output directory; a missing one is fine
fn clean_output(output: &Path) -> Result<()> {
    match fs::remove_dir_all(output) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("Failed to remove {}", output.display())),
    }
}
