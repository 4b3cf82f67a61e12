pub mod directive;
pub mod dom;
pub mod markdown;
pub mod site_config;

pub use directive::Directive;
pub use markdown::render_markdown;
pub use site_config::SiteConfig;
