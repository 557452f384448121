//! Display message extraction from the first logging argument.

use crate::instrument::shape::Expr;

/// Stands in for each interpolated expression of a template literal.
pub const PLACEHOLDER: &str = "{}";

/// Recorded when the argument has no literal form.
pub const UNKNOWN_MESSAGE: &str = "unknown";

pub fn extract_message(arg: &Expr) -> String {
    match arg {
        Expr::StringLiteral(value) => value.clone(),
        Expr::Template { quasis } => quasis.join(PLACEHOLDER),
        Expr::Member { .. } | Expr::Identifier(_) | Expr::Object { .. } | Expr::Other => {
            UNKNOWN_MESSAGE.to_string()
        }
    }
}
