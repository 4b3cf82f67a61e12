use crate::parser::dom::escape_attr;
use crate::parser::SiteConfig;
use anyhow::Result;
use tera::{Context, Tera};

/// Everything a page document needs besides the site configuration
pub struct PageView<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// Site-relative path of the page, e.g. `./guide/setup.html`
    pub path: &'a str,
    pub thumbnail: Option<&'a str>,
    /// `./` or `../`-chain back to the site root
    pub root_path: &'a str,
    pub navigation: &'a str,
    pub content: &'a str,
}

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        // Values are escaped before they reach the template
        tera.autoescape_on(vec![]);

        // Register the main page template
        tera.add_raw_template("page.html", PAGE_TEMPLATE)?;

        Ok(Self { tera })
    }

    pub fn render_page(&self, page: &PageView, config: &SiteConfig) -> Result<String> {
        let mut context = Context::new();

        context.insert("title", &escape_attr(page.title));
        context.insert("site_name", &escape_attr(&config.site_name));
        context.insert("description", &escape_attr(page.description));
        context.insert(
            "page_url",
            &escape_attr(&format!("{}{}", config.website, page.path.trim_start_matches("./"))),
        );
        context.insert(
            "thumbnail_url",
            &page
                .thumbnail
                .map(|thumbnail| escape_attr(&format!("{}{}", config.website, thumbnail))),
        );
        context.insert("root_path", page.root_path);
        context.insert("has_icon", &config.icon.is_some());
        let stylesheets: Vec<String> = config.stylesheets.iter().map(|s| escape_attr(s)).collect();
        context.insert("stylesheets", &stylesheets);
        context.insert("navigation", page.navigation);
        context.insert("content", page.content);

        let html = self.tera.render("page.html", &context)?;
        Ok(html)
    }
}

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
	<head>
		<meta charset="utf-8" />

		<title>{{ title }}</title>

		<meta property="og:type" content="website">
		<meta property="og:title" content="{{ title }}">
		<meta property="og:site_name" content="{{ site_name }}">
		<meta property="og:url" content="{{ page_url }}">
		<meta property="og:description" content="{{ description }}">
		{% if thumbnail_url %}<meta property="og:image" content="{{ thumbnail_url }}"/>{% endif %}

		{% if has_icon %}<link rel="icon" href="{{ root_path }}icon.png" />{% endif %}

		{% for stylesheet in stylesheets %}<link rel="stylesheet" type="text/css" href="{{ stylesheet }}" />
		{% endfor %}<link rel="stylesheet" type="text/css" href="{{ root_path }}style.css" />

		<meta name="viewport" content="width=device-width, initial-scale=1.0" />
	</head>
	<body class="wiki_page">
		<div class="ls_navbar ls_fixed ls_show_on_small_only" ls_side="top">
			<div class="ls_nav_trigger_btn_wrapper">
				<label for="main_nav_trigger" class="ls_btn ls_nav_trigger_btn" ls_variant="icon" aria-role="menu" aria-label="Menu" aria-description="Open the navigation menu.">
					<svg width="40" height="40" viewBox="0 0 40 40" stroke="currentColor" stroke-width="2px" shape-rendering="crispedges">
						<line x1="12" y1="14" x2="28" y2="14"></line><line x1="12" y1="20" x2="28" y2="20"></line><line x1="12" y1="26" x2="28" y2="26"></line>
					</svg>
				</label>
			</div>
			<span class="ls_navbar_title">{{ site_name }}</span>
		</div>
		<div>
			<input type="checkbox" id="main_nav_trigger" class="ls_sidenav_internal_trigger" aria-hidden="true">
			<nav id="main_nav" class="ls_sidenav">
				<a class="ls_nav_banner" href="{{ root_path }}">
					{% if has_icon %}<img class="mod_icon ls_pixelated" src="{{ root_path }}icon.png" alt="{{ site_name }} Icon">{% endif %}
					<span>{{ site_name }}</span>
				</a>
				{{ navigation }}
			</nav>
			<label for="main_nav_trigger" class="ls_sidenav_darkened"></label>
		</div>
		<div class="wiki_content ls_sidenav_neighbor">
			<main>
				<article>
					{{ content }}
				</article>
			</main>
			<footer class="ls_app_footer">
				<div class="ls_app_footer_license">
					<span>
						Hosted on <a href="https://pages.github.com">GitHub Pages</a>.
					</span>
					<span>
						Except where otherwise noted, content on this site is licensed under a <a rel="license" href="http://creativecommons.org/licenses/by/4.0/">CC-BY 4.0 International License</a>.
					</span>
				</div>
			</footer>
		</div>

		<script src="{{ root_path }}script.js"></script>
	</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn view<'a>(thumbnail: Option<&'a str>) -> PageView<'a> {
        PageView {
            title: "Aurora's Decorations - Lanterns",
            description: "Lanterns & candles",
            path: "./blocks/lantern.html",
            thumbnail,
            root_path: "../",
            navigation: "<nav><ul></ul></nav>",
            content: "<h1 id=\"lanterns\">Lanterns</h1>",
        }
    }

    #[test]
    fn test_render_page_metadata() {
        let templates = Templates::new().unwrap();
        let html = templates.render_page(&view(None), &SiteConfig::default()).unwrap();

        assert!(html.contains("<title>Aurora's Decorations - Lanterns</title>"));
        assert!(html.contains(
            r#"<meta property="og:url" content="https://lambdaurora.dev/AurorasDecorations/blocks/lantern.html">"#
        ));
        assert!(html.contains(r#"<meta property="og:description" content="Lanterns &amp; candles">"#));
        assert!(html.contains(r#"<link rel="stylesheet" type="text/css" href="../style.css" />"#));
        assert!(html.contains(r#"<script src="../script.js"></script>"#));
        assert!(!html.contains("og:image"));
    }

    #[test]
    fn test_render_page_body() {
        let templates = Templates::new().unwrap();
        let html = templates.render_page(&view(None), &SiteConfig::default()).unwrap();

        assert!(html.contains("<nav><ul></ul></nav>"));
        assert!(html.contains("<article>\n\t\t\t\t\t<h1 id=\"lanterns\">Lanterns</h1>"));
    }

    #[test]
    fn test_render_thumbnail() {
        let templates = Templates::new().unwrap();
        let html = templates
            .render_page(&view(Some("images/lantern.png")), &SiteConfig::default())
            .unwrap();

        assert!(html.contains(
            r#"<meta property="og:image" content="https://lambdaurora.dev/AurorasDecorations/images/lantern.png"/>"#
        ));
    }

    #[test]
    fn test_render_without_icon() {
        let config = SiteConfig {
            icon: None,
            ..Default::default()
        };
        let templates = Templates::new().unwrap();
        let html = templates.render_page(&view(None), &config).unwrap();
        assert!(!html.contains("icon.png"));
    }
}
