//! Statement id injection into a logging call's argument list.
//!
//! Tree-sitter trees are read-only, so injection is planned as text
//! insertions against the original source and applied in one pass.
//! Insertions never contain newlines: line numbers, and therefore the ids of
//! every call in the unit, are unchanged by instrumentation.

use tree_sitter::Node;

use crate::instrument::shape::Expr;

/// Key written by the pass. `id` is also accepted when reading.
pub const INJECTED_KEY: &str = "stmt_id";

/// A single insertion at a byte offset of the original source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub offset: usize,
    pub text: String,
}

/// Non-comment named children of a node.
pub(crate) fn value_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" && node.named_child_count() == 1 {
        match node.named_child(0) {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// Byte offset just past a `,` that follows `after` inside `container`.
fn trailing_comma_end(container: Node<'_>, after: Node<'_>) -> Option<usize> {
    let mut cursor = container.walk();
    let found = container
        .children(&mut cursor)
        .filter(|c| !c.is_named() && c.kind() == ",")
        .find(|c| c.start_byte() >= after.end_byte())
        .map(|c| c.end_byte());
    found
}

fn id_property(id: &str) -> String {
    format!("{INJECTED_KEY}: \"{id}\"")
}

/// Plan the insertion that makes the call carry `id`, or `None` when the
/// trailing object argument already declares an id key.
///
/// `arguments` must be the call's `arguments` node with at least one value.
pub fn plan_injection(arguments: Node<'_>, id: &str, source: &[u8]) -> Option<TextEdit> {
    let values = value_children(arguments);
    let last = *values.last()?;
    let target = unwrap_parens(last);

    if target.kind() == "object" {
        if Expr::from_node(target, source).declares_id_key() {
            return None;
        }
        return Some(extend_object(target, id));
    }

    let object = format!("{{ {} }}", id_property(id));
    Some(match trailing_comma_end(arguments, last) {
        Some(offset) => TextEdit {
            offset,
            text: format!(" {object},"),
        },
        None => TextEdit {
            offset: last.end_byte(),
            text: format!(", {object}"),
        },
    })
}

fn extend_object(object: Node<'_>, id: &str) -> TextEdit {
    let property = id_property(id);
    let members = value_children(object);
    match members.last() {
        None => TextEdit {
            // Just before the closing brace.
            offset: object.end_byte().saturating_sub(1),
            text: format!(" {property} "),
        },
        Some(last) => match trailing_comma_end(object, *last) {
            Some(offset) => TextEdit {
                offset,
                text: format!(" {property},"),
            },
            None => TextEdit {
                offset: last.end_byte(),
                text: format!(", {property}"),
            },
        },
    }
}

/// Apply insertions to the source they were planned against.
pub fn apply_edits(source: &str, mut edits: Vec<TextEdit>) -> String {
    if edits.is_empty() {
        return source.to_string();
    }
    edits.sort_by(|a, b| b.offset.cmp(&a.offset));
    let mut out = source.to_string();
    for edit in edits {
        if edit.offset <= out.len() && out.is_char_boundary(edit.offset) {
            out.insert_str(edit.offset, &edit.text);
        }
    }
    out
}
