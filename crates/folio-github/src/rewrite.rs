//! Rewriting bare permalink paragraphs into embed nodes.

use folio_parser::Node;

use crate::permalink::find_permalink;

/// Replace every paragraph that consists solely of a bare permalink link with
/// a [`Node::Embed`]. Returns the number of replacements.
///
/// A paragraph qualifies when it has exactly one child, a link, whose only
/// child is a text node equal to the link URL, and the URL contains a
/// permalink. Replacements are not visited again.
pub fn rewrite_permalinks(node: &mut Node) -> usize {
    let Some(children) = node.children_mut() else {
        return 0;
    };

    let mut count = 0;
    for child in children.iter_mut() {
        match embed_target(child) {
            Some(permalink) => {
                tracing::trace!(permalink, "rewriting permalink paragraph");
                *child = Node::Embed { permalink };
                count += 1;
            }
            None => count += rewrite_permalinks(child),
        }
    }
    count
}

/// The permalink a paragraph should be replaced with, if it qualifies.
pub fn embed_target(node: &Node) -> Option<String> {
    let Node::Paragraph { children } = node else {
        return None;
    };
    let [Node::Link { url, children, .. }] = children.as_slice() else {
        return None;
    };
    let [Node::Text { value }] = children.as_slice() else {
        return None;
    };
    if value != url {
        return None;
    }
    find_permalink(url).map(str::to_string)
}
