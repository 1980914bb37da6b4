//! Folio Generator Library
//!
//! Static site generation for Folio.
//!
//! # Modules
//!
//! - [`template`] - string templates with `{{ var }}` interpolation
//! - [`html`] - page layout, navigation and section listings
//! - [`collector`] - content discovery and parsing
//! - [`assets`] - asset copying, fingerprinting and script tags
//! - [`csp`] - Content-Security-Policy meta tag
//! - [`build`] - build orchestration, including permalink embeds

pub mod assets;
pub mod build;
pub mod collector;
pub mod csp;
pub mod html;
pub mod template;

pub use assets::{AssetManifest, AssetProcessor, ScriptLoader};
pub use build::{BuildError, BuildStats, Builder};
pub use collector::{ContentCollector, SiteContent, SourceDocument};
pub use csp::ContentSecurityPolicy;
pub use html::HtmlGenerator;
pub use template::{Template, TemplateContext, TemplateRegistry};
