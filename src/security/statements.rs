//! Statement screening for strict mode.
//!
//! Tokenizes and parses generated SQL with the PostgreSQL dialect and
//! rejects anything that is not exactly one comment-free query.

use sqlparser::ast::{Query, SetExpr, Statement};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer, Whitespace};
use thiserror::Error;

/// Why a statement failed screening.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementViolation {
    #[error("SQL comments are not allowed")]
    Comment,

    #[error("expected exactly one statement, found {0}")]
    StatementCount(usize),

    #[error("only queries are allowed, found {0}")]
    NotAQuery(String),

    #[error("SELECT INTO is not allowed")]
    SelectInto,

    #[error("data-modifying statement inside query")]
    NestedModification,

    #[error("SQL could not be parsed: {0}")]
    Unparseable(String),
}

/// Parser-backed statement screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementScreen;

impl StatementScreen {
    /// Create a new statement screen.
    pub fn new() -> Self {
        Self
    }

    /// Screen `sql`, returning the first violation found.
    pub fn screen(&self, sql: &str) -> Result<(), StatementViolation> {
        let dialect = PostgreSqlDialect {};
        let tokens = Tokenizer::new(&dialect, sql)
            .tokenize()
            .map_err(|e| StatementViolation::Unparseable(e.to_string()))?;

        let has_comment = tokens.iter().any(|t| {
            matches!(
                t,
                Token::Whitespace(Whitespace::SingleLineComment { .. })
                    | Token::Whitespace(Whitespace::MultiLineComment(_))
            )
        });
        if has_comment {
            return Err(StatementViolation::Comment);
        }

        let statements = Parser::parse_sql(&dialect, sql)
            .map_err(|e| StatementViolation::Unparseable(e.to_string()))?;

        if statements.len() != 1 {
            return Err(StatementViolation::StatementCount(statements.len()));
        }

        match &statements[0] {
            Statement::Query(query) => check_query(query),
            other => Err(StatementViolation::NotAQuery(statement_label(other))),
        }
    }
}

fn check_query(query: &Query) -> Result<(), StatementViolation> {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            check_query(&cte.query)?;
        }
    }
    check_set_expr(&query.body)
}

fn check_set_expr(expr: &SetExpr) -> Result<(), StatementViolation> {
    match expr {
        SetExpr::Select(select) => {
            if select.into.is_some() {
                return Err(StatementViolation::SelectInto);
            }
            Ok(())
        }
        SetExpr::Query(query) => check_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            check_set_expr(left)?;
            check_set_expr(right)
        }
        SetExpr::Insert(_) | SetExpr::Update(_) => Err(StatementViolation::NestedModification),
        _ => Ok(()),
    }
}

/// Leading words of a statement's SQL, for error messages.
fn statement_label(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
}
