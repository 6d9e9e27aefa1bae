//! Safety filtering of generated SQL before execution.

mod statements;
mod validation;

pub use statements::{StatementScreen, StatementViolation};
pub use validation::{first_forbidden_keyword, SafetyFilter, SafetyMode, FORBIDDEN_KEYWORDS};
