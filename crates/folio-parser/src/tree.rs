//! Document tree built from pulldown-cmark events.
//!
//! The tree is a small mdast-like structure: block and inline nodes with owned
//! children, so transforms can rewrite it before HTML rendering.

use std::{borrow::Cow, ops::Range, sync::LazyLock};

use pulldown_cmark::{
    Alignment as CmarkAlignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd,
};
use regex::Regex;

/// Column alignment of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

impl From<CmarkAlignment> for Alignment {
    fn from(value: CmarkAlignment) -> Self {
        match value {
            CmarkAlignment::None => Self::None,
            CmarkAlignment::Left => Self::Left,
            CmarkAlignment::Center => Self::Center,
            CmarkAlignment::Right => Self::Right,
        }
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Root { children: Vec<Node> },
    Paragraph { children: Vec<Node> },
    Heading {
        level: u8,
        id: Option<String>,
        children: Vec<Node>,
    },
    BlockQuote { children: Vec<Node> },
    List {
        start: Option<u64>,
        children: Vec<Node>,
    },
    ListItem { children: Vec<Node> },
    TaskListMarker { checked: bool },
    /// Fenced or indented code block.
    Code {
        lang: Option<String>,
        meta: Option<String>,
        value: String,
    },
    Html { value: String },
    ThematicBreak,
    Table {
        alignments: Vec<Alignment>,
        children: Vec<Node>,
    },
    TableHead { children: Vec<Node> },
    TableRow { children: Vec<Node> },
    TableCell { children: Vec<Node> },
    FootnoteDefinition {
        label: String,
        children: Vec<Node>,
    },
    FootnoteReference { label: String },
    Text { value: String },
    Emphasis { children: Vec<Node> },
    Strong { children: Vec<Node> },
    Delete { children: Vec<Node> },
    InlineCode { value: String },
    InlineMath { value: String },
    DisplayMath { value: String },
    Break,
    SoftBreak,
    Link {
        url: String,
        title: String,
        children: Vec<Node>,
    },
    Image {
        url: String,
        title: String,
        alt: String,
    },
    /// GitHub permalink embed directive, resolved at render time.
    Embed { permalink: String },
}

impl Node {
    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// Create a paragraph node.
    pub fn paragraph(children: Vec<Node>) -> Self {
        Self::Paragraph { children }
    }

    /// Create a link node without a title.
    pub fn link(url: impl Into<String>, children: Vec<Node>) -> Self {
        Self::Link {
            url: url.into(),
            title: String::new(),
            children,
        }
    }

    /// Node kind name, mirroring mdast `type` values.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Root { .. } => "root",
            Self::Paragraph { .. } => "paragraph",
            Self::Heading { .. } => "heading",
            Self::BlockQuote { .. } => "blockquote",
            Self::List { .. } => "list",
            Self::ListItem { .. } => "listItem",
            Self::TaskListMarker { .. } => "taskListMarker",
            Self::Code { .. } => "code",
            Self::Html { .. } => "html",
            Self::ThematicBreak => "thematicBreak",
            Self::Table { .. } => "table",
            Self::TableHead { .. } => "tableHead",
            Self::TableRow { .. } => "tableRow",
            Self::TableCell { .. } => "tableCell",
            Self::FootnoteDefinition { .. } => "footnoteDefinition",
            Self::FootnoteReference { .. } => "footnoteReference",
            Self::Text { .. } => "text",
            Self::Emphasis { .. } => "emphasis",
            Self::Strong { .. } => "strong",
            Self::Delete { .. } => "delete",
            Self::InlineCode { .. } => "inlineCode",
            Self::InlineMath { .. } => "inlineMath",
            Self::DisplayMath { .. } => "math",
            Self::Break => "break",
            Self::SoftBreak => "softBreak",
            Self::Link { .. } => "link",
            Self::Image { .. } => "image",
            Self::Embed { .. } => "embed",
        }
    }

    /// Children of a parent node, or `None` for leaves.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Self::Root { children }
            | Self::Paragraph { children }
            | Self::Heading { children, .. }
            | Self::BlockQuote { children }
            | Self::List { children, .. }
            | Self::ListItem { children }
            | Self::Table { children, .. }
            | Self::TableHead { children }
            | Self::TableRow { children }
            | Self::TableCell { children }
            | Self::FootnoteDefinition { children, .. }
            | Self::Emphasis { children }
            | Self::Strong { children }
            | Self::Delete { children }
            | Self::Link { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Mutable children of a parent node, or `None` for leaves.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Root { children }
            | Self::Paragraph { children }
            | Self::Heading { children, .. }
            | Self::BlockQuote { children }
            | Self::List { children, .. }
            | Self::ListItem { children }
            | Self::Table { children, .. }
            | Self::TableHead { children }
            | Self::TableRow { children }
            | Self::TableCell { children }
            | Self::FootnoteDefinition { children, .. }
            | Self::Emphasis { children }
            | Self::Strong { children }
            | Self::Delete { children }
            | Self::Link { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Concatenated plain text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text { value } | Self::InlineCode { value } | Self::InlineMath { value } => {
                out.push_str(value);
            }
            Self::Image { alt, .. } => out.push_str(alt),
            Self::SoftBreak | Self::Break => out.push(' '),
            _ => {
                if let Some(children) = self.children() {
                    for child in children {
                        child.collect_text(out);
                    }
                }
            }
        }
    }

    /// Count descendants (including self) matching a predicate.
    pub fn count(&self, predicate: &impl Fn(&Node) -> bool) -> usize {
        let own = usize::from(predicate(self));
        own + self
            .children()
            .map(|children| children.iter().map(|c| c.count(predicate)).sum())
            .unwrap_or(0)
    }

    /// Permalinks of all embed directives in document order.
    pub fn embeds(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_embeds(&mut out);
        out
    }

    fn collect_embeds<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Self::Embed { permalink } = self {
            out.push(permalink);
        }
        if let Some(children) = self.children() {
            for child in children {
                child.collect_embeds(out);
            }
        }
    }
}

/// Open container while building the tree.
enum Open {
    Root,
    Paragraph,
    Heading { level: u8, id: Option<String> },
    BlockQuote,
    List { start: Option<u64> },
    ListItem,
    Code { lang: Option<String>, meta: Option<String> },
    Table { alignments: Vec<Alignment> },
    TableHead,
    TableRow,
    TableCell,
    FootnoteDefinition { label: String },
    Emphasis,
    Strong,
    Delete,
    Link { url: String, title: String },
    Image { url: String, title: String },
    /// Containers without a node of their own; children are spliced into the parent.
    Transparent,
}

impl Open {
    fn close(self, children: Vec<Node>) -> Vec<Node> {
        let node = match self {
            Self::Root => Node::Root { children },
            Self::Paragraph => Node::Paragraph { children },
            Self::Heading { level, id } => Node::Heading {
                level,
                id,
                children,
            },
            Self::BlockQuote => Node::BlockQuote { children },
            Self::List { start } => Node::List { start, children },
            Self::ListItem => Node::ListItem { children },
            Self::Code { lang, meta } => Node::Code {
                lang,
                meta,
                value: children.iter().map(Node::text_content).collect(),
            },
            Self::Table { alignments } => Node::Table {
                alignments,
                children,
            },
            Self::TableHead => Node::TableHead { children },
            Self::TableRow => Node::TableRow { children },
            Self::TableCell => Node::TableCell { children },
            Self::FootnoteDefinition { label } => Node::FootnoteDefinition { label, children },
            Self::Emphasis => Node::Emphasis { children },
            Self::Strong => Node::Strong { children },
            Self::Delete => Node::Delete { children },
            Self::Link { url, title } => Node::Link {
                url,
                title,
                children,
            },
            Self::Image { url, title } => Node::Image {
                url,
                title,
                alt: children.iter().map(Node::text_content).collect(),
            },
            Self::Transparent => return children,
        };
        vec![node]
    }
}

/// Builds a [`Node::Root`] from a stream of pulldown-cmark events.
pub struct TreeBuilder {
    stack: Vec<(Open, Vec<Node>)>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            stack: vec![(Open::Root, Vec::new())],
        }
    }

    /// Consume events and return the root node.
    pub fn build<'a>(mut self, events: impl IntoIterator<Item = Event<'a>>) -> Node {
        for event in events {
            self.push_event(event);
        }
        // Close anything left open by a truncated stream.
        while self.stack.len() > 1 {
            self.close();
        }
        match self.stack.pop() {
            Some((open, children)) => open
                .close(children)
                .pop()
                .unwrap_or(Node::Root { children: Vec::new() }),
            None => Node::Root {
                children: Vec::new(),
            },
        }
    }

    fn push_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(TagEnd::HtmlBlock | TagEnd::MetadataBlock(_)) => {}
            Event::End(_) => self.close(),
            Event::Text(text) => self.append(Node::text(text.to_string())),
            Event::Code(code) => self.append(Node::InlineCode {
                value: code.to_string(),
            }),
            Event::InlineMath(math) => self.append(Node::InlineMath {
                value: math.to_string(),
            }),
            Event::DisplayMath(math) => self.append(Node::DisplayMath {
                value: math.to_string(),
            }),
            Event::Html(raw) | Event::InlineHtml(raw) => self.append(Node::Html {
                value: raw.to_string(),
            }),
            Event::FootnoteReference(label) => self.append(Node::FootnoteReference {
                label: label.to_string(),
            }),
            Event::SoftBreak => self.append(Node::SoftBreak),
            Event::HardBreak => self.append(Node::Break),
            Event::Rule => self.append(Node::ThematicBreak),
            Event::TaskListMarker(checked) => self.append(Node::TaskListMarker { checked }),
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let open = match tag {
            Tag::Paragraph => Open::Paragraph,
            Tag::Heading { level, id, .. } => Open::Heading {
                level: level as u8,
                id: id.map(|i| i.to_string()),
            },
            Tag::BlockQuote(_) => Open::BlockQuote,
            Tag::CodeBlock(kind) => {
                let (lang, meta) = match kind {
                    CodeBlockKind::Fenced(info) => split_info_string(&info),
                    CodeBlockKind::Indented => (None, None),
                };
                Open::Code { lang, meta }
            }
            Tag::List(start) => Open::List { start },
            Tag::Item => Open::ListItem,
            Tag::FootnoteDefinition(label) => Open::FootnoteDefinition {
                label: label.to_string(),
            },
            Tag::Table(alignments) => Open::Table {
                alignments: alignments.into_iter().map(Alignment::from).collect(),
            },
            Tag::TableHead => Open::TableHead,
            Tag::TableRow => Open::TableRow,
            Tag::TableCell => Open::TableCell,
            Tag::Emphasis => Open::Emphasis,
            Tag::Strong => Open::Strong,
            Tag::Strikethrough => Open::Delete,
            Tag::Link {
                dest_url, title, ..
            } => Open::Link {
                url: dest_url.to_string(),
                title: title.to_string(),
            },
            Tag::Image {
                dest_url, title, ..
            } => Open::Image {
                url: dest_url.to_string(),
                title: title.to_string(),
            },
            // Html and metadata blocks have no End we track; their content arrives as
            // Html/Text events directly in the parent.
            Tag::HtmlBlock | Tag::MetadataBlock(_) => return,
            Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript => Open::Transparent,
        };
        self.stack.push((open, Vec::new()));
    }

    fn close(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some((open, children)) = self.stack.pop() {
            let nodes = open.close(children);
            self.append_all(nodes);
        }
    }

    fn append(&mut self, node: Node) {
        if let Some((_, children)) = self.stack.last_mut() {
            children.push(node);
        }
    }

    fn append_all(&mut self, nodes: Vec<Node>) {
        if let Some((_, children)) = self.stack.last_mut() {
            children.extend(nodes);
        }
    }
}

/// Split a fenced code info string into language and meta.
fn split_info_string(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    if info.is_empty() {
        return (None, None);
    }
    match info.split_once(char::is_whitespace) {
        Some((lang, meta)) => {
            let meta = meta.trim();
            (
                Some(lang.to_string()),
                (!meta.is_empty()).then(|| meta.to_string()),
            )
        }
        None => (Some(info.to_string()), None),
    }
}

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>]+").expect("bare URL pattern is valid"));

/// Wrap bare `http(s)://` URLs in angle brackets so they parse as autolinks.
///
/// URLs are located in the source before inline parsing, so emphasis
/// delimiters inside a URL (`__init__.py`) stay part of it. URLs inside code,
/// math, raw HTML and existing links are left alone. Trailing punctuation
/// (`.`, `,`, `:`, `;`, `!`, `?`, quotes, emphasis markers and unbalanced
/// closing parentheses) stays outside the link.
pub fn autolink_literals(markdown: &str, options: Options) -> Cow<'_, str> {
    let protected = literal_ranges(markdown, options);
    let mut out = String::new();
    let mut last = 0;

    for m in BARE_URL.find_iter(markdown) {
        let url = trim_url_suffix(m.as_str());
        if url.len() <= "https://".len() {
            continue;
        }
        let url_range = m.start()..m.start() + url.len();
        if protected
            .iter()
            .any(|r| r.start < url_range.end && url_range.start < r.end)
        {
            continue;
        }
        out.push_str(&markdown[last..url_range.start]);
        out.push('<');
        out.push_str(url);
        out.push('>');
        last = url_range.end;
    }

    if last == 0 {
        return Cow::Borrowed(markdown);
    }
    out.push_str(&markdown[last..]);
    Cow::Owned(out)
}

/// Source ranges whose text must not be autolinked.
fn literal_ranges(markdown: &str, options: Options) -> Vec<Range<usize>> {
    Parser::new_ext(markdown, options)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(
                Tag::CodeBlock(_)
                | Tag::Link { .. }
                | Tag::Image { .. }
                | Tag::HtmlBlock
                | Tag::MetadataBlock(_),
            )
            | Event::Code(_)
            | Event::InlineMath(_)
            | Event::DisplayMath(_)
            | Event::Html(_)
            | Event::InlineHtml(_) => Some(range),
            _ => None,
        })
        .collect()
}

fn trim_url_suffix(url: &str) -> &str {
    let mut url = url;
    loop {
        let Some(last) = url.chars().last() else {
            return url;
        };
        let trim = match last {
            '.' | ',' | ':' | ';' | '!' | '?' | '"' | '\'' | '*' | '_' | '~' => true,
            ')' => url.matches('(').count() < url.matches(')').count(),
            _ => false,
        };
        if !trim {
            return url;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
}
