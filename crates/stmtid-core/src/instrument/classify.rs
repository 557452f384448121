//! Call-site classification: is this callee a logging call?

use crate::instrument::shape::Expr;
use crate::models::Level;

/// Methods on `console` that count as logging.
pub const CONSOLE_METHODS: &[&str] = &["log", "info", "warn", "error", "debug"];

/// Logger facade names whose every method counts as logging.
pub const LOGGER_FACADES: &[&str] = &["logger", "log", "BrontoLogger"];

/// Decide whether a callee shape is a logging call.
///
/// * `console.<m>` for `m` in [`CONSOLE_METHODS`]
/// * `<facade>.<anything>` for a name in [`LOGGER_FACADES`]
/// * a bare call whose name contains `log` (case-sensitive)
pub fn is_logging_call(callee: &Expr) -> bool {
    match callee {
        Expr::Member {
            object: Some(object),
            property,
        } => {
            if object == "console" {
                return property
                    .as_deref()
                    .is_some_and(|p| CONSOLE_METHODS.contains(&p));
            }
            LOGGER_FACADES.contains(&object.as_str())
        }
        Expr::Member { object: None, .. } => false,
        Expr::Identifier(name) => name.contains("log"),
        Expr::StringLiteral(_) | Expr::Template { .. } | Expr::Object { .. } | Expr::Other => false,
    }
}

/// Severity implied by the callee, e.g. `console.warn` or `logger.error`.
pub fn callee_level(callee: &Expr) -> Option<Level> {
    match callee {
        Expr::Member {
            property: Some(property),
            ..
        } => Level::from_method(property),
        _ => None,
    }
}
