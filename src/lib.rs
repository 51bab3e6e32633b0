// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A dialect-configurable SQL lexer and parser.
//!
//! Source text is lexed into [`tokens::Token`]s by a [`tokenizer::Tokenizer`]
//! driven entirely by per-dialect tables, then parsed into generic
//! [`ast::Node`] trees by a recursive-descent [`parser::Parser`] whose
//! statement, operator, and clause dispatch is likewise table-driven.
//! Dialects are data, not subclasses: each is a [`dialect::Dialect`] value
//! built by copying the base configuration and overriding entries, resolved
//! by name through a process-wide registry.
//!
//! Example:
//!
//! ```
//! use sqlweave::parse_one;
//!
//! let select = parse_one("SELECT a FROM t WHERE a > 1", "base").unwrap();
//! assert_eq!(select.tag, sqlweave::ast::Tag::Select);
//! ```
//!
//! Statements the structured grammar does not cover round-trip as opaque
//! command nodes carrying their verbatim source text, so a statement list
//! never fails wholesale because one statement uses vendor syntax.

pub mod ast;
pub mod dialect;
pub mod parser;
pub mod tokenizer;
pub mod tokens;
pub mod trie;

use core::fmt;
use std::sync::Arc;

use ast::Node;
use dialect::DialectError;
use parser::{Parser, ParserError, ParserOptions};

/// Any failure surfaced by the top-level convenience functions.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Dialect(DialectError),
    Parse(ParserError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Dialect(e) => write!(f, "{e}"),
            Error::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<DialectError> for Error {
    fn from(e: DialectError) -> Self {
        Error::Dialect(e)
    }
}

impl From<ParserError> for Error {
    fn from(e: ParserError) -> Self {
        Error::Parse(e)
    }
}

/// Parses a statement list with the dialect named by `dialect_ref`
/// (see [`dialect::get`] for the reference syntax).
pub fn parse(sql: &str, dialect_ref: &str) -> Result<Vec<Node>, Error> {
    let dialect = dialect::get(dialect_ref)?;
    let mut parser = Parser::new(&dialect);
    Ok(parser.parse_sql(sql)?)
}

/// Parses input expected to hold exactly one statement.
pub fn parse_one(sql: &str, dialect_ref: &str) -> Result<Node, Error> {
    let dialect = dialect::get(dialect_ref)?;
    let mut parser = Parser::new(&dialect);
    Ok(parser.parse_one(sql)?)
}

/// [`parse`] with explicit parser options.
pub fn parse_with_options(
    sql: &str,
    dialect_ref: &str,
    options: ParserOptions,
) -> Result<Vec<Node>, Error> {
    let dialect: Arc<dialect::Dialect> = dialect::get(dialect_ref)?;
    let mut parser = Parser::with_options(&dialect, options);
    Ok(parser.parse_sql(sql)?)
}
