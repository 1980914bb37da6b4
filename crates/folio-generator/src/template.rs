//! String templates for page layout.
//!
//! Placeholders are written `{{ name }}` (required) or `{{ name? }}` (empty
//! when missing). Values are inserted verbatim; use
//! [`TemplateContext::insert_text`] for anything that is not already HTML.

use std::collections::HashMap;

use folio_parser::syntax::html_escape;
use thiserror::Error;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable `{variable}` in template `{template}`")]
    MissingVariable { template: String, variable: String },

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("invalid template syntax in `{template}`: {message}")]
    InvalidSyntax { template: String, message: String },
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Variables available to a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an HTML fragment.
    pub fn insert(&mut self, key: impl Into<String>, html: impl Into<String>) {
        self.variables.insert(key.into(), html.into());
    }

    /// Insert plain text, escaping it.
    pub fn insert_text(&mut self, key: impl Into<String>, text: &str) {
        self.insert(key, html_escape(text));
    }

    /// Builder form of [`TemplateContext::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, html: impl Into<String>) -> Self {
        self.insert(key, html);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }
}

/// A named template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    source: String,
}

impl Template {
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render with the given context. Substituted values are not rescanned.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(open) = rest.find("{{") {
            out.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after.find("}}").ok_or_else(|| TemplateError::InvalidSyntax {
                template: self.name.clone(),
                message: "unclosed `{{`".to_string(),
            })?;

            let placeholder = after[..close].trim();
            let (variable, optional) = match placeholder.strip_suffix('?') {
                Some(name) => (name.trim_end(), true),
                None => (placeholder, false),
            };

            match context.get(variable) {
                Some(value) => out.push_str(value),
                None if optional => {}
                None => {
                    return Err(TemplateError::MissingVariable {
                        template: self.name.clone(),
                        variable: variable.to_string(),
                    });
                }
            }
            rest = &after[close + 2..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// Named templates used by the HTML generator.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Registry with the built-in layout templates.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        for (name, source) in [
            ("base", BASE_TEMPLATE),
            ("page", PAGE_TEMPLATE),
            ("article", ARTICLE_TEMPLATE),
            ("work", WORK_TEMPLATE),
            ("listing", LISTING_TEMPLATE),
        ] {
            registry.register(Template::new(name, source));
        }
        registry
    }

    /// Register a template, replacing any with the same name.
    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Render a named template.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        self.get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?
            .render(context)
    }
}

/// Document shell: head metadata, navigation and footer.
pub const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{{ csp? }}
<title>{{ title }}</title>
<meta name="description" content="{{ description? }}">
<link rel="canonical" href="{{ canonical_url }}">
<meta property="og:url" content="{{ canonical_url }}">
<meta property="og:type" content="website">
<meta property="og:title" content="{{ title }}">
<meta property="og:description" content="{{ description? }}">
{{ og_image? }}
<meta property="og:site_name" content="{{ site_title }}">
<meta property="og:locale" content="{{ og_locale }}">
<meta name="twitter:card" content="summary">
{{ twitter? }}
{{ head_scripts? }}
</head>
<body>
<header>
<nav>
<a href="/" class="site-title">{{ site_title }}</a>
<ul class="nav-links">{{ nav }}</ul>
</nav>
</header>
<main>
{{ content }}
</main>
<footer>
<p>&copy; {{ year }} {{ author? }}</p>
<ul class="socials">{{ socials? }}</ul>
</footer>
</body>
</html>
"#;

/// Plain pages, including the home page.
pub const PAGE_TEMPLATE: &str = r#"<article class="page">
{{ heading? }}
<div class="prose">{{ content }}</div>
</article>"#;

/// Blog articles.
pub const ARTICLE_TEMPLATE: &str = r#"<article class="article">
<header>
<h1>{{ page_title }}</h1>
{{ date? }}
</header>
{{ toc? }}
<div class="prose">{{ content }}</div>
</article>"#;

/// Works entries.
pub const WORK_TEMPLATE: &str = r#"<article class="work">
<header>
<h1>{{ page_title }}</h1>
{{ summary? }}
{{ links? }}
{{ thumbnail? }}
</header>
<div class="prose">{{ content }}</div>
</article>"#;

/// Section listings.
pub const LISTING_TEMPLATE: &str = r#"<section class="listing">
<h1>{{ heading }}</h1>
<ul class="{{ class }}">{{ items }}</ul>
</section>"#;
