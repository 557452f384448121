//! The instrumentation pass over one source unit.
//!
//! `visit` is a function of `(SourceUnit, StatementRegistry)` returning the
//! (possibly rewritten) unit and the updated registry. The caller threads the
//! registry through every unit of a build and exports it once at the end.

use tracing::{debug, warn};
use tree_sitter::Node;

use crate::instrument::classify::{callee_level, is_logging_call};
use crate::instrument::inject::{apply_edits, plan_injection, value_children, TextEdit};
use crate::instrument::message::extract_message;
use crate::instrument::parser::{parse_source, SourceLanguage};
use crate::instrument::registry::StatementRegistry;
use crate::instrument::shape::Expr;
use crate::instrument::statement_id::generate_id;
use crate::models::StatementRecord;

/// One compilation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceUnit {
    /// Project-root-relative, `/`-separated path; `None` when the host does
    /// not know where the source came from.
    pub path: Option<String>,
    pub language: SourceLanguage,
    pub source: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, language: SourceLanguage, source: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            language,
            source: source.into(),
        }
    }
}

/// Per-unit counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisitStats {
    pub calls_seen: usize,
    pub logging_calls: usize,
    pub registered: usize,
    pub injected: usize,
    pub skipped_no_position: usize,
    pub skipped_no_arguments: usize,
}

impl VisitStats {
    pub fn add(&mut self, other: &VisitStats) {
        self.calls_seen += other.calls_seen;
        self.logging_calls += other.logging_calls;
        self.registered += other.registered;
        self.injected += other.injected;
        self.skipped_no_position += other.skipped_no_position;
        self.skipped_no_arguments += other.skipped_no_arguments;
    }
}

/// Result of visiting one unit.
#[derive(Debug)]
pub struct Visit {
    pub unit: SourceUnit,
    pub registry: StatementRegistry,
    pub stats: VisitStats,
}

#[derive(Clone, Copy, Debug)]
pub struct InstrumentationPass {
    enabled: bool,
}

impl InstrumentationPass {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Register every logging call in `unit` and inject its statement id.
    ///
    /// Never fails: a disabled pass, an unparsable unit or an unusable call
    /// site leave the unit and registry untouched.
    pub fn visit(&self, unit: SourceUnit, mut registry: StatementRegistry) -> Visit {
        let mut stats = VisitStats::default();
        if !self.enabled {
            return Visit {
                unit,
                registry,
                stats,
            };
        }

        let tree = match parse_source(&unit.source, unit.language) {
            Ok(tree) if !tree.root_node().has_error() => tree,
            Ok(_) => {
                warn!(path = ?unit.path, "syntax errors in unit, skipping instrumentation");
                return Visit {
                    unit,
                    registry,
                    stats,
                };
            }
            Err(e) => {
                warn!(path = ?unit.path, error = %e, "failed to parse unit, skipping instrumentation");
                return Visit {
                    unit,
                    registry,
                    stats,
                };
            }
        };

        let source = unit.source.as_bytes();
        let mut edits: Vec<TextEdit> = Vec::new();

        for call in call_expressions(tree.root_node()) {
            stats.calls_seen += 1;
            let Some(callee_node) = call.child_by_field_name("function") else {
                continue;
            };
            let callee = Expr::from_node(callee_node, source);
            if !is_logging_call(&callee) {
                continue;
            }
            // Tagged templates have a template string in place of arguments.
            let Some(arguments) = call
                .child_by_field_name("arguments")
                .filter(|a| a.kind() == "arguments")
            else {
                continue;
            };
            stats.logging_calls += 1;

            let Some(file) = unit.path.as_deref().filter(|p| !p.is_empty()) else {
                stats.skipped_no_position += 1;
                debug!("logging call without a source path, skipping");
                continue;
            };
            let line = call.start_position().row as u32 + 1;

            let values = value_children(arguments);
            let Some(first) = values.first() else {
                stats.skipped_no_arguments += 1;
                debug!(file, line, "logging call without arguments, skipping");
                continue;
            };

            let id = generate_id(file, line);
            let message = extract_message(&Expr::from_node(*first, source));
            registry.upsert(StatementRecord {
                id: id.clone(),
                file: file.to_string(),
                line,
                message,
                level: callee_level(&callee),
            });
            stats.registered += 1;

            if let Some(edit) = plan_injection(arguments, &id, source) {
                edits.push(edit);
                stats.injected += 1;
            }
        }

        let rewritten = apply_edits(&unit.source, edits);
        Visit {
            unit: SourceUnit {
                source: rewritten,
                ..unit
            },
            registry,
            stats,
        }
    }
}

/// All call expressions under `root`, in pre-order.
fn call_expressions(root: Node<'_>) -> Vec<Node<'_>> {
    let mut calls = Vec::new();
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.kind() == "call_expression" {
            calls.push(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return calls;
            }
        }
    }
}
