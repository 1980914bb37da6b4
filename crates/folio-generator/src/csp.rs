//! Content-Security-Policy meta tag generation.

use base64::{Engine, engine::general_purpose::STANDARD};
use folio_core::config::{CspConfig, CspDirective};
use folio_parser::syntax::html_escape;
use sha2::{Digest, Sha256};

const SCRIPT_SRC: &str = "script-src";

/// A policy assembled from configured directives and inlined script hashes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSecurityPolicy {
    enabled: bool,
    directives: Vec<CspDirective>,
}

impl ContentSecurityPolicy {
    /// Policy from the `[csp]` configuration section.
    pub fn from_config(config: &CspConfig) -> Self {
        Self {
            enabled: config.enabled,
            directives: config.directives.clone(),
        }
    }

    /// Append a source to a directive, creating the directive if absent.
    pub fn add_source(&mut self, name: &str, source: impl Into<String>) {
        let source = source.into();
        match self.directives.iter_mut().find(|d| d.name == name) {
            Some(directive) => {
                if !directive.sources.contains(&source) {
                    directive.sources.push(source);
                }
            }
            None => self.directives.push(CspDirective {
                name: name.to_string(),
                sources: vec![source],
            }),
        }
    }

    /// Allow an inline script by the hash of its exact contents.
    pub fn allow_inline_script(&mut self, contents: &str) {
        self.add_source(SCRIPT_SRC, hash_source(contents));
    }

    /// Directives in emission order.
    pub fn directives(&self) -> &[CspDirective] {
        &self.directives
    }

    /// Policy string, e.g. `default-src 'self'; script-src 'self'`.
    pub fn policy(&self) -> String {
        self.directives
            .iter()
            .map(|d| {
                if d.sources.is_empty() {
                    d.name.clone()
                } else {
                    format!("{} {}", d.name, d.sources.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// The `<meta>` tag, or nothing in development or when disabled.
    pub fn to_meta(&self, production: bool) -> String {
        if !production || !self.enabled || self.directives.is_empty() {
            return String::new();
        }
        format!(
            r#"<meta http-equiv="content-security-policy" content="{}">"#,
            html_escape(&self.policy())
        )
    }
}

/// `'sha256-<base64>'` source expression for a script body.
pub fn hash_source(contents: &str) -> String {
    let digest = Sha256::digest(contents.as_bytes());
    format!("'sha256-{}'", STANDARD.encode(digest))
}
