//! Structured JSON logger that forwards injected statement ids.
//!
//! Instrumented call sites pass the id as a trailing object argument,
//! `{ stmt_id: "..." }` (or the older `{ id: "..." }`). The logger pulls the
//! id out of that object, forwards the remaining keys as attributes, and
//! writes one JSON object per line.

use std::cell::RefCell;
use std::io::Write;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::instrument::shape::ID_KEYS;
use crate::models::Level;

// ---------------------------------------------------------------------------
// Active span
// ---------------------------------------------------------------------------

/// Trace correlation attached to entries logged while a span is active.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: String,
    pub span_id: String,
}

thread_local! {
    static ACTIVE_SPANS: RefCell<Vec<SpanContext>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a span active on the current thread until dropped.
pub struct SpanGuard {
    _private: (),
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        ACTIVE_SPANS.with(|spans| {
            spans.borrow_mut().pop();
        });
    }
}

impl SpanContext {
    pub fn new(trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            span_id: span_id.into(),
        }
    }

    /// Make this the innermost active span on the current thread.
    pub fn enter(self) -> SpanGuard {
        ACTIVE_SPANS.with(|spans| spans.borrow_mut().push(self));
        SpanGuard { _private: () }
    }
}

pub fn active_span() -> Option<SpanContext> {
    ACTIVE_SPANS.with(|spans| spans.borrow().last().cloned())
}

// ---------------------------------------------------------------------------
// Entry construction
// ---------------------------------------------------------------------------

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Split the trailing arguments of a logging call into forwarded attributes
/// and the statement id, if one was injected.
///
/// When the last argument is an object carrying a truthy `stmt_id` or `id`,
/// that object supplies the id (`stmt_id` preferred) and, minus both id
/// keys, the attributes. An explicit first-argument object is merged
/// underneath it. Otherwise a first-argument object is used as attributes
/// verbatim.
pub fn split_attributes(args: &[Value]) -> (Map<String, Value>, Option<Value>) {
    let id_bearing = args.last().and_then(|last| match last {
        Value::Object(map) if ID_KEYS.iter().any(|k| map.get(*k).is_some_and(truthy)) => Some(map),
        _ => None,
    });

    if let Some(last) = id_bearing {
        let stmt_id = ID_KEYS
            .iter()
            .filter_map(|k| last.get(*k))
            .find(|v| truthy(v))
            .cloned();

        let mut attributes = match (args.len() > 1, args.first()) {
            (true, Some(Value::Object(first))) => first.clone(),
            _ => Map::new(),
        };
        for (key, value) in last {
            if !ID_KEYS.contains(&key.as_str()) {
                attributes.insert(key.clone(), value.clone());
            }
        }
        return (attributes, stmt_id);
    }

    match args.first() {
        Some(Value::Object(first)) => (first.clone(), None),
        _ => (Map::new(), None),
    }
}

/// Build the JSON object for one log entry.
pub fn build_entry(
    level: Level,
    message: &str,
    args: &[Value],
    timestamp: DateTime<Utc>,
    span: Option<&SpanContext>,
) -> Map<String, Value> {
    let (attributes, stmt_id) = split_attributes(args);
    let mut entry = Map::new();
    entry.insert(
        "timestamp".to_string(),
        Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    entry.insert("level".to_string(), Value::String(level.as_str().to_string()));
    entry.insert("message".to_string(), Value::String(message.to_string()));
    entry.extend(attributes);
    if let Some(id) = stmt_id {
        entry.insert("stmt_id".to_string(), id);
    }
    if let Some(span) = span {
        entry.insert("trace.id".to_string(), Value::String(span.trace_id.clone()));
        entry.insert("span.id".to_string(), Value::String(span.span_id.clone()));
    }
    entry
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Writes entries to stdout (info, debug) and stderr (warn, error), or to a
/// single injected writer. Write failures are swallowed.
#[derive(Default)]
pub struct StatementLogger {
    writer: Option<Mutex<Box<dyn Write + Send>>>,
}

impl StatementLogger {
    pub fn console() -> Self {
        Self::default()
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Some(Mutex::new(Box::new(writer))),
        }
    }

    pub fn log(&self, level: Level, message: &str, args: &[Value]) {
        let entry = build_entry(level, message, args, Utc::now(), active_span().as_ref());
        let line = Value::Object(entry).to_string();
        match &self.writer {
            Some(writer) => {
                if let Ok(mut w) = writer.lock() {
                    let _ = writeln!(w, "{line}");
                }
            }
            None => match level {
                Level::Warn | Level::Error => {
                    let _ = writeln!(std::io::stderr().lock(), "{line}");
                }
                Level::Info | Level::Debug => {
                    let _ = writeln!(std::io::stdout().lock(), "{line}");
                }
            },
        }
    }

    pub fn info(&self, message: &str, args: &[Value]) {
        self.log(Level::Info, message, args);
    }

    pub fn warn(&self, message: &str, args: &[Value]) {
        self.log(Level::Warn, message, args);
    }

    pub fn error(&self, message: &str, args: &[Value]) {
        self.log(Level::Error, message, args);
    }

    pub fn debug(&self, message: &str, args: &[Value]) {
        self.log(Level::Debug, message, args);
    }

    /// Info-level entry for a call site whose id is passed explicitly.
    pub fn log_with_statement(&self, message: &str, args: &[Value]) {
        self.info(message, args);
    }
}
