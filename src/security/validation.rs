//! Read-only validation of generated SQL.

use crate::error::ServerError;
use crate::security::statements::StatementScreen;
use serde::{Deserialize, Serialize};

/// Mutating keywords rejected anywhere in generated SQL.
pub const FORBIDDEN_KEYWORDS: [&str; 6] =
    ["insert", "update", "delete", "drop", "alter", "truncate"];

/// Safety filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SafetyMode {
    /// Case-insensitive substring blocklist only.
    ///
    /// Known false positives (`updated_at`) and false negatives (keywords
    /// the blocklist does not name) are accepted.
    #[default]
    Blocklist,

    /// Blocklist plus statement screening: no comments, exactly one
    /// statement, and that statement must parse as a query.
    Strict,
}

/// Error returned when parsing a safety mode fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSafetyModeError(String);

impl std::fmt::Display for ParseSafetyModeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid safety mode: '{}'", self.0)
    }
}

impl std::error::Error for ParseSafetyModeError {}

impl std::str::FromStr for SafetyMode {
    type Err = ParseSafetyModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blocklist" | "keyword" | "keywords" => Ok(SafetyMode::Blocklist),
            "strict" | "parse" | "parser" => Ok(SafetyMode::Strict),
            _ => Err(ParseSafetyModeError(s.to_string())),
        }
    }
}

impl std::fmt::Display for SafetyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyMode::Blocklist => write!(f, "blocklist"),
            SafetyMode::Strict => write!(f, "strict"),
        }
    }
}

/// Return the first forbidden keyword contained in `sql`, case-insensitively.
pub fn first_forbidden_keyword(sql: &str) -> Option<&'static str> {
    let lowered = sql.to_lowercase();
    FORBIDDEN_KEYWORDS
        .iter()
        .copied()
        .find(|word| lowered.contains(word))
}

/// Safety filter applied between generation and execution.
#[derive(Debug, Clone)]
pub struct SafetyFilter {
    mode: SafetyMode,
    screen: StatementScreen,
}

impl SafetyFilter {
    /// Create a new safety filter.
    pub fn new(mode: SafetyMode) -> Self {
        Self {
            mode,
            screen: StatementScreen::new(),
        }
    }

    /// Validate generated SQL. The SQL itself is never rewritten.
    pub fn check(&self, sql: &str) -> Result<(), ServerError> {
        if let Some(keyword) = first_forbidden_keyword(sql) {
            let detail = match self.mode {
                SafetyMode::Blocklist => None,
                SafetyMode::Strict => Some(format!("contains forbidden keyword '{keyword}'")),
            };
            return Err(ServerError::not_read_only(detail));
        }

        if self.mode == SafetyMode::Strict {
            self.screen
                .screen(sql)
                .map_err(|violation| ServerError::not_read_only(Some(violation.to_string())))?;
        }

        Ok(())
    }

    /// Get the current safety mode.
    pub fn mode(&self) -> SafetyMode {
        self.mode
    }
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new(SafetyMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocklist() -> SafetyFilter {
        SafetyFilter::new(SafetyMode::Blocklist)
    }

    fn strict() -> SafetyFilter {
        SafetyFilter::new(SafetyMode::Strict)
    }

    #[test]
    fn test_every_keyword_rejected_in_any_case() {
        let f = blocklist();
        for word in FORBIDDEN_KEYWORDS {
            let upper = format!("SELECT 1; {} something", word.to_uppercase());
            let mixed: String = word
                .chars()
                .enumerate()
                .map(|(i, c)| if i % 2 == 0 { c.to_ascii_uppercase() } else { c })
                .collect();
            assert!(f.check(&upper).is_err(), "{upper}");
            assert!(f.check(&format!("select {mixed}")).is_err(), "{mixed}");
            assert!(f.check(word).is_err(), "{word}");
        }
    }

    #[test]
    fn test_known_false_positive_is_kept() {
        let err = blocklist()
            .check("SELECT id, updated_at FROM users")
            .unwrap_err();
        assert!(matches!(err, ServerError::PolicyViolation { .. }));
        assert_eq!(err.to_string(), "Generated SQL is not read-only.");
    }

    #[test]
    fn test_clean_sql_passes() {
        let f = blocklist();
        assert!(f
            .check("SELECT id, name FROM users WHERE name ILIKE '%a%' ORDER BY id;")
            .is_ok());
        assert!(f.check("WITH t AS (SELECT 1 AS x) SELECT x FROM t").is_ok());
    }

    #[test]
    fn test_blocklist_does_not_screen_statements() {
        // Stacked and commented SQL without forbidden words passes in blocklist mode
        let f = blocklist();
        assert!(f.check("SELECT 1; SELECT 2").is_ok());
        assert!(f.check("SELECT 1 -- trailing").is_ok());
    }

    #[test]
    fn test_strict_rejects_stacked_and_comments() {
        let f = strict();
        assert!(f.check("SELECT 1; SELECT 2").is_err());
        assert!(f.check("SELECT 1 -- trailing").is_err());
        assert!(f.check("SELECT /* hidden */ 1").is_err());
        assert!(f.check("SELECT id FROM users;").is_ok());
    }

    #[test]
    fn test_strict_reports_detail() {
        let err = strict().check("DROP TABLE users").unwrap_err();
        match err {
            ServerError::PolicyViolation { detail, .. } => {
                assert_eq!(detail.as_deref(), Some("contains forbidden keyword 'drop'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_safety_mode_parse() {
        assert_eq!("strict".parse::<SafetyMode>().unwrap(), SafetyMode::Strict);
        assert_eq!(
            "Blocklist".parse::<SafetyMode>().unwrap(),
            SafetyMode::Blocklist
        );
        assert!("lenient".parse::<SafetyMode>().is_err());
    }
}
