//! Closed set of source-expression shapes the pass cares about.
//!
//! Tree-sitter nodes are lowered into [`Expr`] once; the classifier and the
//! message extractor then match exhaustively over it. Anything the pass does
//! not recognise becomes [`Expr::Other`].

use tree_sitter::Node;

/// Object keys that carry an injected statement id.
pub const ID_KEYS: &[&str] = &["stmt_id", "id"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// Plain string literal, escape sequences decoded.
    StringLiteral(String),
    /// Template literal; `quasis` are the raw static segments between
    /// substitutions (always one more than the substitution count).
    Template { quasis: Vec<String> },
    /// `object.property`. Either side is `None` when it is not a plain name.
    Member {
        object: Option<String>,
        property: Option<String>,
    },
    Identifier(String),
    /// Object literal with the statically known keys of its properties.
    Object { keys: Vec<String> },
    Other,
}

impl Expr {
    /// Lower a tree-sitter expression node.
    pub fn from_node(node: Node<'_>, source: &[u8]) -> Expr {
        match node.kind() {
            "parenthesized_expression" => match node.named_child(0) {
                Some(inner) if node.named_child_count() == 1 => Expr::from_node(inner, source),
                _ => Expr::Other,
            },
            "string" => Expr::StringLiteral(decode_string_literal(node_text(node, source))),
            "template_string" => Expr::Template {
                quasis: template_quasis(node, source),
            },
            "member_expression" => Expr::Member {
                object: node
                    .child_by_field_name("object")
                    .filter(|n| n.kind() == "identifier")
                    .map(|n| node_text(n, source).to_string()),
                property: node
                    .child_by_field_name("property")
                    .filter(|n| {
                        matches!(n.kind(), "property_identifier" | "private_property_identifier")
                    })
                    .map(|n| node_text(n, source).to_string()),
            },
            "identifier" => Expr::Identifier(node_text(node, source).to_string()),
            "object" => Expr::Object {
                keys: object_keys(node, source),
            },
            _ => Expr::Other,
        }
    }

    /// True for an object literal that already declares a statement id key.
    pub fn declares_id_key(&self) -> bool {
        match self {
            Expr::Object { keys } => keys.iter().any(|k| ID_KEYS.contains(&k.as_str())),
            _ => false,
        }
    }
}

pub(crate) fn node_text<'a>(node: Node<'_>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Static keys of an object literal: identifier keys, quoted keys and
/// shorthand properties. Computed keys, spreads and methods are skipped.
fn object_keys(node: Node<'_>, source: &[u8]) -> Vec<String> {
    let mut keys = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "pair" => {
                let Some(key) = child.child_by_field_name("key") else {
                    continue;
                };
                match key.kind() {
                    "property_identifier" => keys.push(node_text(key, source).to_string()),
                    "string" => keys.push(decode_string_literal(node_text(key, source))),
                    _ => {}
                }
            }
            "shorthand_property_identifier" => keys.push(node_text(child, source).to_string()),
            _ => {}
        }
    }
    keys
}

/// Raw template segments split at `${...}` substitutions.
fn template_quasis(node: Node<'_>, source: &[u8]) -> Vec<String> {
    let start = node.start_byte();
    let end = node.end_byte();
    // Strip the surrounding backticks.
    let body_start = (start + 1).min(end);
    let body_end = end.saturating_sub(1).max(body_start);

    let mut quasis = Vec::new();
    let mut segment_start = body_start;
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "template_substitution" {
            continue;
        }
        quasis.push(lossy_slice(source, segment_start, child.start_byte()));
        segment_start = child.end_byte();
    }
    quasis.push(lossy_slice(source, segment_start, body_end));
    quasis
}

fn lossy_slice(source: &[u8], start: usize, end: usize) -> String {
    if start >= end || end > source.len() {
        return String::new();
    }
    String::from_utf8_lossy(&source[start..end]).into_owned()
}

/// Decode a quoted JS string literal (including its quotes) into its value.
pub fn decode_string_literal(raw: &str) -> String {
    let inner = if raw.len() >= 2 && (raw.starts_with('"') || raw.starts_with('\'')) {
        &raw[1..raw.len() - 1]
    } else {
        raw
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escaped) = chars.next() else {
            break;
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'v' => out.push('\u{000B}'),
            '0' if !chars.peek().is_some_and(|n| n.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('x');
                        out.push_str(&hex);
                    }
                }
            }
            'u' => decode_unicode_escape(&mut chars, &mut out),
            // Line continuation.
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn decode_unicode_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, out: &mut String) {
    let hex: String = if chars.peek() == Some(&'{') {
        chars.next();
        let collected: String = chars.by_ref().take_while(|c| *c != '}').collect();
        collected
    } else {
        chars.by_ref().take(4).collect()
    };
    match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
        Some(ch) => out.push(ch),
        None => {
            out.push('u');
            out.push_str(&hex);
        }
    }
}
