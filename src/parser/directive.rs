//! Authoring directives embedded in HTML comments.
//!
//! ```text
//! <!--description:A short summary-->
//! <!--thumbnail:images/preview.png-->
//! <!--include:1:./blocks/lantern.md-->
//! ```

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Description(String),
    Thumbnail(String),
    Include { offset: i32, path: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("include directive is missing the target page: {0:?}")]
    MissingTarget(String),
    #[error("include directive has an invalid heading offset {offset:?}")]
    InvalidOffset { offset: String },
}

impl Directive {
    /// Classify the body of an HTML comment.
    ///
    /// The keyword must open the comment and payloads are kept as written.
    /// Returns `Ok(None)` for ordinary comments.
    pub fn from_comment(body: &str) -> Result<Option<Directive>, DirectiveError> {
        if let Some(text) = body.strip_prefix("description:") {
            return Ok(Some(Directive::Description(text.to_string())));
        }
        if let Some(path) = body.strip_prefix("thumbnail:") {
            return Ok(Some(Directive::Thumbnail(path.to_string())));
        }
        if let Some(rest) = body.strip_prefix("include:") {
            let mut parts = rest.splitn(2, ':');
            let offset = parts.next().unwrap_or_default();
            let path = parts
                .next()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| DirectiveError::MissingTarget(body.to_string()))?;
            let offset = offset.trim().parse::<i32>().map_err(|_| DirectiveError::InvalidOffset {
                offset: offset.to_string(),
            })?;
            return Ok(Some(Directive::Include {
                offset,
                path: path.to_string(),
            }));
        }

        Ok(None)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Description(text) => write!(f, "description:{}", text),
            Directive::Thumbnail(path) => write!(f, "thumbnail:{}", path),
            Directive::Include { offset, path } => write!(f, "include:{}:{}", offset, path),
        }
    }
}

/// Body of a complete HTML comment, if `html` is exactly one comment
pub fn comment_body(html: &str) -> Option<&str> {
    html.trim()
        .strip_prefix("<!--")
        .and_then(|rest| rest.strip_suffix("-->"))
        .filter(|body| !body.contains("-->"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_description() {
        let directive = Directive::from_comment("description:The lantern page.").unwrap();
        assert_eq!(directive, Some(Directive::Description("The lantern page.".to_string())));
    }

    #[test]
    fn test_parse_thumbnail() {
        let directive = Directive::from_comment("thumbnail:images/lantern.png").unwrap();
        assert_eq!(directive, Some(Directive::Thumbnail("images/lantern.png".to_string())));
    }

    #[test]
    fn test_payload_is_kept_as_written() {
        let directive = Directive::from_comment("description: Lanterns & candles ").unwrap();
        assert_eq!(directive, Some(Directive::Description(" Lanterns & candles ".to_string())));
    }

    #[test]
    fn test_keyword_must_open_the_comment() {
        assert_eq!(Directive::from_comment(" description:Lanterns").unwrap(), None);
    }

    #[test]
    fn test_parse_include() {
        let directive = Directive::from_comment("include:1:./blocks/lantern.md").unwrap();
        assert_eq!(
            directive,
            Some(Directive::Include {
                offset: 1,
                path: "./blocks/lantern.md".to_string()
            })
        );
    }

    #[test]
    fn test_include_with_bad_offset() {
        let err = Directive::from_comment("include:one:./a.md").unwrap_err();
        assert_eq!(err, DirectiveError::InvalidOffset { offset: "one".to_string() });
    }

    #[test]
    fn test_include_without_target() {
        assert!(matches!(
            Directive::from_comment("include:2"),
            Err(DirectiveError::MissingTarget(_))
        ));
    }

    #[test]
    fn test_plain_comment() {
        assert_eq!(Directive::from_comment(" just a note ").unwrap(), None);
    }

    #[test]
    fn test_display_roundtrips_the_comment_form() {
        let directive = Directive::Include {
            offset: 2,
            path: "./a.md".to_string(),
        };
        assert_eq!(directive.to_string(), "include:2:./a.md");
    }

    #[test]
    fn test_comment_body() {
        assert_eq!(comment_body("<!--include:1:./a.md-->\n"), Some("include:1:./a.md"));
        assert_eq!(comment_body("<div>not a comment</div>"), None);
        assert_eq!(comment_body("<!-- a --> <!-- b -->"), None);
    }
}
