//! Syntax highlighting for code blocks.
//!
//! [`HighlighterCache`] owns the syntect syntax and theme sets and hands out one
//! [`Highlighter`] per grammar identifier. It is created once per build and
//! shared between the Markdown renderer and the permalink embedder.

use std::{
    collections::HashMap,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::RwLock;
use regex::Regex;
use syntect::{
    easy::HighlightLines,
    highlighting::{Color, Style, Theme, ThemeSet},
    html::{IncludeBackground, styled_line_to_highlighted_html},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

/// Grammar identifier used when a language is unknown.
pub const PLAINTEXT: &str = "plaintext";

/// Theme used when the configured one is not available.
pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Transformations applied while highlighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightOptions {
    /// Honour `[!code ++]` / `[!code --]` line comments.
    pub diff: bool,
}

/// Process-wide cache of per-grammar highlighters.
///
/// Entries are never evicted. Two callers racing on the first use of a grammar
/// may both load it; the last insert wins and both results are equivalent.
#[derive(Debug)]
pub struct HighlighterCache {
    syntax_set: Arc<SyntaxSet>,
    theme: Arc<Theme>,
    theme_name: String,
    entries: RwLock<HashMap<String, Arc<Highlighter>>>,
    loads: AtomicUsize,
}

impl Default for HighlighterCache {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

impl HighlighterCache {
    /// Create a cache using the named syntect theme.
    pub fn new(theme: &str) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let (theme_name, theme) = match themes.remove(theme) {
            Some(found) => (theme.to_string(), found),
            None => {
                tracing::warn!(theme, fallback = DEFAULT_THEME, "unknown syntax theme");
                (
                    DEFAULT_THEME.to_string(),
                    themes.remove(DEFAULT_THEME).unwrap_or_default(),
                )
            }
        };

        Self {
            syntax_set: Arc::new(SyntaxSet::load_defaults_newlines()),
            theme: Arc::new(theme),
            theme_name,
            entries: RwLock::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Names of the bundled themes.
    pub fn available_themes() -> Vec<String> {
        let mut names: Vec<String> = ThemeSet::load_defaults().themes.into_keys().collect();
        names.sort();
        names
    }

    /// Name of the active theme.
    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    /// Get the highlighter for a grammar, loading it on first use.
    pub fn get(&self, grammar: &str) -> Arc<Highlighter> {
        if let Some(highlighter) = self.entries.read().get(grammar) {
            return Arc::clone(highlighter);
        }

        let highlighter = Arc::new(self.load(grammar));
        self.entries
            .write()
            .insert(grammar.to_string(), Arc::clone(&highlighter));
        highlighter
    }

    /// Highlight code with the grammar for `lang`, or plain text when absent.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        self.highlight_with(code, lang, HighlightOptions::default())
    }

    pub fn highlight_with(
        &self,
        code: &str,
        lang: Option<&str>,
        options: HighlightOptions,
    ) -> String {
        let grammar = lang.map(str::to_lowercase);
        self.get(grammar.as_deref().unwrap_or(PLAINTEXT))
            .highlight_with(code, options)
    }

    /// Number of cached grammars.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no grammar has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of grammar loads performed so far.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    fn load(&self, grammar: &str) -> Highlighter {
        self.loads.fetch_add(1, Ordering::Relaxed);

        let token = syntect_token(grammar);
        let syntax = self
            .syntax_set
            .find_syntax_by_token(token)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
            .clone();

        tracing::debug!(grammar, syntax = %syntax.name, "loaded highlighter");

        Highlighter {
            grammar: grammar.to_string(),
            syntax,
            syntax_set: Arc::clone(&self.syntax_set),
            theme: Arc::clone(&self.theme),
        }
    }
}

/// Map grammar identifiers to the tokens syntect's bundled syntaxes know.
fn syntect_token(grammar: &str) -> &str {
    match grammar {
        "shellscript" | "shell" | "zsh" | "shellsession" | "console" => "bash",
        "csharp" | "c#" => "cs",
        "typescript" | "ts" | "tsx" | "jsx" | "mjs" | "cjs" => "js",
        "jsonc" | "json5" | "jsonl" | "hjson" => "json",
        "scss" | "sass" | "less" | "postcss" | "stylus" => "css",
        "vue" | "svelte" | "astro" | "erb" | "html-derivative" => "html",
        "objective-c" | "objc" => "m",
        "objective-cpp" => "mm",
        "emacs-lisp" | "common-lisp" | "elisp" => "lisp",
        "dotenv" | "fish" => "bash",
        "batch" | "cmd" => "bat",
        "makefile" => "make",
        "plaintext" | "text" | "txt" | "plain" => "txt",
        other => other,
    }
}

/// Diff marker attached to a line by `[!code ++]` / `[!code --]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineDiff {
    Add,
    Remove,
}

static DIFF_NOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(?://|#|--|;|<!--|/\*)?\s*\[!code (\+\+|--)\]\s*(?:-->|\*/)?\s*$")
        .expect("diff notation pattern is valid")
});

/// Strip a trailing diff notation comment from a line.
fn strip_diff_notation(line: &str) -> (&str, Option<LineDiff>) {
    let Some(caps) = DIFF_NOTATION.captures(line) else {
        return (line, None);
    };
    let (Some(whole), Some(kind)) = (caps.get(0), caps.get(1)) else {
        return (line, None);
    };
    let diff = if kind.as_str() == "++" {
        LineDiff::Add
    } else {
        LineDiff::Remove
    };
    (&line[..whole.start()], Some(diff))
}

/// Highlighter bound to a single grammar and theme.
#[derive(Debug)]
pub struct Highlighter {
    grammar: String,
    syntax: SyntaxReference,
    syntax_set: Arc<SyntaxSet>,
    theme: Arc<Theme>,
}

impl Highlighter {
    /// Grammar identifier this highlighter was loaded for.
    pub fn grammar(&self) -> &str {
        &self.grammar
    }

    /// Name of the syntect syntax in use.
    pub fn syntax_name(&self) -> &str {
        &self.syntax.name
    }

    /// Highlight code into a `<pre><code>` block, one `<span class="line">` per line.
    ///
    /// The code is shown verbatim; see [`Highlighter::highlight_with`] for diff
    /// notation.
    pub fn highlight(&self, code: &str) -> String {
        self.highlight_with(code, HighlightOptions::default())
    }

    /// Highlight with transformations. With `diff`, a trailing
    /// `[!code ++]` / `[!code --]` comment is stripped and marks its line.
    pub fn highlight_with(&self, code: &str, options: HighlightOptions) -> String {
        match self.try_highlight(code, options) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(grammar = %self.grammar, error = %e, "highlighting failed");
                self.fallback_highlight(code)
            }
        }
    }

    fn try_highlight(
        &self,
        code: &str,
        options: HighlightOptions,
    ) -> Result<String, syntect::Error> {
        let mut lines = HighlightLines::new(&self.syntax, &self.theme);
        let mut body = String::with_capacity(code.len() * 2);
        let mut has_diff = false;

        for raw in LinesWithEndings::from(code) {
            let content = raw.strip_suffix('\n').unwrap_or(raw);
            let content = content.strip_suffix('\r').unwrap_or(content);
            let (content, diff) = if options.diff {
                strip_diff_notation(content)
            } else {
                (content, None)
            };
            has_diff |= diff.is_some();

            // Syntaxes loaded with newlines expect the line terminator.
            let line = format!("{content}\n");
            let regions = lines.highlight_line(&line, &self.syntax_set)?;
            let regions: Vec<(Style, &str)> = regions
                .into_iter()
                .map(|(style, text)| (style, text.strip_suffix('\n').unwrap_or(text)))
                .filter(|(_, text)| !text.is_empty())
                .collect();
            let html = styled_line_to_highlighted_html(&regions, IncludeBackground::No)?;

            match diff {
                Some(LineDiff::Add) => body.push_str("<span class=\"line diff add\">"),
                Some(LineDiff::Remove) => body.push_str("<span class=\"line diff remove\">"),
                None => body.push_str("<span class=\"line\">"),
            }
            body.push_str(&html);
            body.push_str("</span>\n");
        }

        Ok(self.wrap(&body, has_diff))
    }

    fn wrap(&self, body: &str, has_diff: bool) -> String {
        let class = if has_diff {
            "highlight has-diff"
        } else {
            "highlight"
        };
        let background = self
            .theme
            .settings
            .background
            .map(|c| format!(" style=\"background-color:{};\"", hex(c)))
            .unwrap_or_default();
        format!(
            "<pre class=\"{class}\"{background}><code class=\"code-block\" data-lang=\"{}\">{}</code></pre>",
            html_escape(&self.grammar),
            body.trim_end_matches('\n')
        )
    }

    /// Fallback when syntect fails: escaped lines without styling.
    fn fallback_highlight(&self, code: &str) -> String {
        let body: String = code
            .lines()
            .map(|line| format!("<span class=\"line\">{}</span>\n", html_escape(line)))
            .collect();
        self.wrap(&body, false)
    }
}

fn hex(c: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", c.r, c.g, c.b)
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust() {
        let cache = HighlighterCache::default();
        let html = cache.highlight("fn main() {\n    println!(\"Hello\");\n}", Some("rust"));

        assert!(html.starts_with("<pre class=\"highlight\""));
        assert!(html.contains("<code class=\"code-block\" data-lang=\"rust\">"));
        assert_eq!(html.matches("<span class=\"line\">").count(), 3);
        assert!(html.contains("main"));
    }

    #[test]
    fn test_highlight_unknown_language_is_plain() {
        let cache = HighlighterCache::default();
        let highlighter = cache.get("unknown_lang_xyz");

        assert_eq!(highlighter.syntax_name(), "Plain Text");
        assert!(highlighter.highlight("some <code>").contains("some &lt;code&gt;"));
    }

    #[test]
    fn test_highlight_no_language() {
        let cache = HighlighterCache::default();
        let html = cache.highlight("plain text", None);

        assert!(html.contains("plain text"));
        assert!(html.contains("data-lang=\"plaintext\""));
    }

    #[test]
    fn test_cache_reuses_highlighters() {
        let cache = HighlighterCache::default();
        assert!(cache.is_empty());

        let first = cache.get("rust");
        let second = cache.get("rust");
        cache.get("python");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.loads(), 2);
    }

    #[test]
    fn test_grammar_aliases() {
        let cache = HighlighterCache::default();

        assert_eq!(cache.get("shellscript").syntax_name(), "Bourne Again Shell (bash)");
        assert_eq!(cache.get("csharp").syntax_name(), "C#");
    }

    #[test]
    fn test_diff_notation() {
        let cache = HighlighterCache::default();
        let code = "let a = 1; // [!code --]\nlet a = 2; // [!code ++]\nlet b = 3;";
        let html = cache.highlight_with(code, Some("rust"), HighlightOptions { diff: true });

        assert!(html.contains("has-diff"));
        assert!(html.contains("<span class=\"line diff remove\">"));
        assert!(html.contains("<span class=\"line diff add\">"));
        assert!(!html.contains("[!code"));
    }

    #[test]
    fn test_diff_notation_is_opt_in() {
        let cache = HighlighterCache::default();
        let html = cache.highlight("let a = 1; // [!code ++]", Some("rust"));

        assert!(!html.contains("has-diff"));
        assert!(!html.contains("diff add"));
        assert!(html.contains("[!code ++]"));
    }

    #[test]
    fn test_strip_diff_notation() {
        assert_eq!(strip_diff_notation("x # [!code ++]"), ("x", Some(LineDiff::Add)));
        assert_eq!(
            strip_diff_notation("<p/> <!-- [!code --] -->"),
            ("<p/>", Some(LineDiff::Remove))
        );
        assert_eq!(strip_diff_notation("plain"), ("plain", None));
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let cache = HighlighterCache::new("no-such-theme");
        assert_eq!(cache.theme_name(), DEFAULT_THEME);
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
    }

    #[test]
    fn test_available_themes() {
        let themes = HighlighterCache::available_themes();
        assert!(themes.iter().any(|t| t == DEFAULT_THEME));
    }
}
