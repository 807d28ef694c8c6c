//! SQL parsing using datafusion-sqlparser-rs
//!
//! Parses SQL into AST and provides error handling with diagnostics.

use sqlparser::ast::{Query, Statement};
use sqlparser::dialect::{
    BigQueryDialect, Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SnowflakeDialect,
};
use sqlparser::parser::{Parser, ParserError};
use cubegraph_core::{Diagnostic, DiagnosticCode, DialectConfig, Severity};

/// SQL parser with configurable dialect
///
/// Holds no state between calls, so one instance can parse every cube of a build.
pub struct SqlParser {
    dialect: Box<dyn Dialect>,
}

impl SqlParser {
    /// Create a new SQL parser with the default (generic) dialect
    pub fn new() -> Self {
        Self {
            dialect: Box::new(GenericDialect {}),
        }
    }

    /// Create a SQL parser for MySQL
    pub fn mysql() -> Self {
        Self {
            dialect: Box::new(MySqlDialect {}),
        }
    }

    /// Create a SQL parser for PostgreSQL
    pub fn postgres() -> Self {
        Self {
            dialect: Box::new(PostgreSqlDialect {}),
        }
    }

    /// Create a SQL parser for BigQuery
    pub fn bigquery() -> Self {
        Self {
            dialect: Box::new(BigQueryDialect {}),
        }
    }

    /// Create a SQL parser for Snowflake
    pub fn snowflake() -> Self {
        Self {
            dialect: Box::new(SnowflakeDialect {}),
        }
    }

    /// Create a parser from a dialect config
    pub fn from_dialect(dialect: &DialectConfig) -> Self {
        match dialect {
            DialectConfig::Generic => Self::new(),
            DialectConfig::MySql => Self::mysql(),
            DialectConfig::Postgres => Self::postgres(),
            DialectConfig::BigQuery => Self::bigquery(),
            DialectConfig::Snowflake => Self::snowflake(),
        }
    }

    /// Parse SQL string into AST
    pub fn parse(&self, sql: &str) -> Result<ParsedSql, ParseError> {
        match Parser::parse_sql(&*self.dialect, sql) {
            Ok(statements) => Ok(ParsedSql {
                sql: sql.to_string(),
                statements,
            }),
            Err(error) => Err(ParseError {
                sql: sql.to_string(),
                error,
            }),
        }
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Successfully parsed SQL with AST
#[derive(Debug, Clone)]
pub struct ParsedSql {
    /// Original SQL string
    pub sql: String,

    /// Parsed statements
    pub statements: Vec<Statement>,
}

impl ParsedSql {
    /// The query, if the SQL is exactly one query statement
    ///
    /// Multi-statement input has no single lineage root and yields `None`.
    pub fn single_query(&self) -> Option<&Query> {
        match self.statements.as_slice() {
            [Statement::Query(query)] => Some(query.as_ref()),
            _ => None,
        }
    }

    /// Count the number of statements
    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }
}

/// SQL parsing error with diagnostic information
#[derive(Debug, thiserror::Error)]
#[error("SQL parse error: {error}")]
pub struct ParseError {
    /// Original SQL string
    pub sql: String,

    /// Parser error from sqlparser
    pub error: ParserError,
}

impl ParseError {
    /// Convert to a diagnostic about the given cube
    pub fn to_diagnostic(&self, cube: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::SqlParseError,
            Severity::Warn,
            format!("Failed to parse SQL of cube '{}': {}", cube, self.error),
        )
        .with_subject(cube)
        .with_source_text(self.sql.clone())
    }
}
