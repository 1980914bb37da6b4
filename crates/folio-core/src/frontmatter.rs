//! Frontmatter parsing for content files.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};

/// Frontmatter metadata for content files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frontmatter {
    /// Page title (required).
    #[serde(default)]
    pub title: String,

    /// Publication date. Accepts `YYYY-MM-DD` or RFC 3339.
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date: Option<DateTime<Utc>>,

    /// Summary shown in listings and meta tags.
    #[serde(default)]
    pub description: Option<String>,

    /// Thumbnail image shown on the works listing.
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Related links (repository, demo, ...).
    #[serde(default)]
    pub links: Vec<String>,

    /// Whether this is a draft.
    #[serde(default)]
    pub draft: bool,

    /// Custom extra fields.
    #[serde(default, flatten)]
    pub extra: std::collections::HashMap<String, serde_yaml::Value>,
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_date(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

/// Parse a frontmatter date, either a bare calendar date or RFC 3339.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Frontmatter syntax, chosen by the opening fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// `---` fenced YAML.
    Yaml,
    /// `+++` fenced TOML.
    Toml,
}

impl FrontmatterFormat {
    const ALL: [Self; 2] = [Self::Yaml, Self::Toml];

    pub fn fence(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        }
    }
}

/// Split a content file into its frontmatter block and body.
///
/// The closing fence must start a line, so fences inside values are kept.
/// Returns `None` when the file has no (closed) frontmatter.
pub fn split_frontmatter(content: &str) -> Option<(FrontmatterFormat, &str, &str)> {
    let content = content.trim_start();
    let (format, rest) = FrontmatterFormat::ALL
        .into_iter()
        .find_map(|f| content.strip_prefix(f.fence()).map(|rest| (f, rest)))?;

    let closing = format!("\n{}", format.fence());
    let (block, body) = rest.split_once(closing.as_str())?;

    Some((format, block.trim(), body.trim_start()))
}

/// Parse the frontmatter of a content file, returning it with the body.
///
/// Files without frontmatter get [`Frontmatter::default`] and their whole
/// contents as the body.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<(Frontmatter, String)> {
    let Some((format, block, body)) = split_frontmatter(content) else {
        return Ok((Frontmatter::default(), content.to_string()));
    };

    let parsed: std::result::Result<Frontmatter, String> = match format {
        FrontmatterFormat::Yaml => serde_yaml::from_str(block).map_err(|e| e.to_string()),
        FrontmatterFormat::Toml => toml::from_str(block).map_err(|e| e.to_string()),
    };
    let frontmatter = parsed.map_err(|e| CoreError::frontmatter(path, format.name(), e))?;

    Ok((frontmatter, body.to_string()))
}

impl Frontmatter {
    /// Fields every published page needs.
    pub fn validate(&self, path: &Path) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::missing_field(path, "title"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;

    #[test]
    fn test_split_yaml_frontmatter() {
        let content = r#"---
title: "Hello World"
date: 2024-01-14
---

This is the body content."#;

        let (format, fm, body) = split_frontmatter(content).expect("split");
        assert_eq!(format, FrontmatterFormat::Yaml);
        assert!(fm.contains("title:"));
        assert!(body.starts_with("This is the body"));
    }

    #[test]
    fn test_split_keeps_inline_dashes() {
        let content = "---\ntitle: \"a---b\"\n---\nBody";

        let (_, fm, body) = split_frontmatter(content).expect("split");
        assert_eq!(fm, "title: \"a---b\"");
        assert_eq!(body, "Body");
    }

    #[test]
    fn test_split_toml_frontmatter() {
        let content = r#"+++
title = "Hello World"
+++

This is the body content."#;

        let (format, fm, body) = split_frontmatter(content).expect("split");
        assert_eq!(format, FrontmatterFormat::Toml);
        assert!(fm.contains("title ="));
        assert!(body.starts_with("This is the body"));
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "Just some content without frontmatter.";
        assert!(split_frontmatter(content).is_none());
    }

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: "ポートフォリオサイトを作った"
date: 2024-12-01
description: "HonoX で作りました"
thumbnail: /works/site.webp
links:
  - https://github.com/yu7400ki/yu7400ki.me
---

Content here."#;

        let (fm, body) = parse_frontmatter(content, Path::new("blog/site.mdx")).expect("parse");

        assert_eq!(fm.title, "ポートフォリオサイトを作った");
        let date = fm.date.expect("date");
        assert_eq!((date.year(), date.month(), date.day()), (2024, 12, 1));
        assert_eq!(fm.description.as_deref(), Some("HonoX で作りました"));
        assert_eq!(fm.thumbnail.as_deref(), Some("/works/site.webp"));
        assert_eq!(fm.links, vec!["https://github.com/yu7400ki/yu7400ki.me"]);
        assert!(!fm.draft);
        assert_eq!(body, "Content here.");
    }

    #[test]
    fn test_parse_rfc3339_date() {
        let content = "---\ntitle: T\ndate: 2024-01-14T10:00:00+09:00\n---\nBody";

        let (fm, _) = parse_frontmatter(content, Path::new("test.md")).expect("parse");
        let date = fm.date.expect("date");
        assert_eq!(date.to_rfc3339(), "2024-01-14T01:00:00+00:00");
    }

    #[test]
    fn test_parse_invalid_date() {
        let content = "---\ntitle: T\ndate: yesterday\n---\nBody";

        let result = parse_frontmatter(content, Path::new("test.md"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid date"));
    }

    #[test]
    fn test_parse_toml_frontmatter() {
        let content = r#"+++
title = "Test Post"
date = "2024-01-14"
draft = true
+++

Content here."#;

        let (fm, body) = parse_frontmatter(content, Path::new("test.md")).expect("parse");

        assert_eq!(fm.title, "Test Post");
        assert!(fm.date.is_some());
        assert!(fm.draft);
        assert_eq!(body, "Content here.");
    }

    #[test]
    fn test_frontmatter_with_extra_fields() {
        let content = r#"---
title: "Test"
custom_field: "custom value"
---

Body"#;

        let (fm, _body) = parse_frontmatter(content, Path::new("test.md")).expect("parse");

        assert_eq!(fm.title, "Test");
        assert!(fm.extra.contains_key("custom_field"));
    }

    #[test]
    fn test_invalid_toml_names_format() {
        let content = "+++\ntitle = \n+++\nBody";

        let err = parse_frontmatter(content, Path::new("works/app.md")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid TOML frontmatter in works/app.md"));
    }

    #[test]
    fn test_unclosed_frontmatter_is_body() {
        let content = "---\ntitle: Never closed\n";

        let (fm, body) = parse_frontmatter(content, Path::new("test.md")).expect("parse");
        assert!(fm.title.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_validate_missing_title() {
        let fm = Frontmatter::default();
        let result = fm.validate(Path::new("test.md"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("title"));
    }
}
