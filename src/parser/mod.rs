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

//! SQL Parser
//!
//! Turns a token sequence into one [`Node`] tree per semicolon-delimited
//! statement. Statement keywords, range operators, precedence levels,
//! function parsers, and query modifiers are all dispatched through tables
//! carried by the [`Dialect`], so dialects extend the parser by overriding
//! table entries rather than control flow. Disambiguation is done by saving
//! the cursor, attempting a parse, and restoring on failure; thrown errors
//! are reserved for conditions with no recovery path.

mod expr;
mod query;
mod stmt;

use core::fmt;
use std::collections::HashMap;

use log::debug;

use crate::ast::{self, Node, Tag};
use crate::dialect::Dialect;
use crate::tokenizer::{Tokenizer, TokenizerError};
use crate::tokens::{Token, TokenType};

/// How parse errors are surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorLevel {
    /// Errors are silently discarded.
    Ignore,
    /// Errors are logged and parsing continues.
    Warn,
    /// Errors accumulate up to a cap, then are raised together after the
    /// whole input is consumed.
    #[default]
    Raise,
    /// The first error aborts parsing.
    Immediate,
}

/// One structured parse error record, with context slices cut from the
/// original source around the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrorDetail {
    pub description: String,
    pub line: usize,
    pub col: usize,
    pub start_context: String,
    pub highlight: String,
    pub end_context: String,
}

impl fmt::Display for ParseErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}. Line {}, Col: {}.\n  {}\x1b[4m{}\x1b[0m{}",
            self.description, self.line, self.col, self.start_context, self.highlight,
            self.end_context
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParserError {
    Tokenize(TokenizerError),
    Syntax {
        message: String,
        errors: Vec<ParseErrorDetail>,
    },
}

impl ParserError {
    fn syntax(detail: ParseErrorDetail) -> Self {
        ParserError::Syntax {
            message: detail.to_string(),
            errors: vec![detail],
        }
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParserError::Tokenize(e) => write!(f, "{e}"),
            ParserError::Syntax { message, .. } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ParserError {}

impl From<TokenizerError> for ParserError {
    fn from(e: TokenizerError) -> Self {
        ParserError::Tokenize(e)
    }
}

/// Parser behavior knobs, independent of the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub error_level: ErrorLevel,
    /// Cap on the number of error records included when `Raise` fires.
    pub max_errors: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            error_level: ErrorLevel::default(),
            max_errors: 3,
        }
    }
}

/// Parses one statement; positioned at the statement's first token.
pub type StatementParser = fn(&mut Parser) -> Result<Node, ParserError>;

/// Parses the right-hand side of a range operator whose keyword was already
/// consumed; receives the left operand.
pub type RangeParser = fn(&mut Parser, Node) -> Result<Node, ParserError>;

/// Normalizes a parsed function's arguments into a dedicated node.
pub type FunctionBuilder = fn(&Dialect, Vec<Node>) -> Node;

/// Attempts one query modifier clause; returns whether it consumed input.
pub type ModifierParser = fn(&mut Parser, &mut Node) -> Result<bool, ParserError>;

/// Entry in the postfix range-operator dispatch table.
#[derive(Debug, Clone, Copy)]
pub enum RangeEntry {
    /// A plain binary predicate: right side parsed at bitwise level.
    Binary(Tag),
    /// A LIKE-family predicate: supports ANY/ALL patterns and ESCAPE.
    LikePattern(Tag),
    /// A negated binary predicate (`!~` and friends).
    NegatedBinary(Tag),
    /// Irregular syntax with its own routine.
    Parser(RangeParser),
}

// `Parser` entries compare by function address.
impl PartialEq for RangeEntry {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RangeEntry::Binary(a), RangeEntry::Binary(b)) => a == b,
            (RangeEntry::LikePattern(a), RangeEntry::LikePattern(b)) => a == b,
            (RangeEntry::NegatedBinary(a), RangeEntry::NegatedBinary(b)) => a == b,
            (RangeEntry::Parser(a), RangeEntry::Parser(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

/// The parser's dispatch and precedence tables. A dialect starts from
/// [`ParserTables::base`] and inserts/replaces entries; tables are always
/// complete copies, never lookup-time diffs.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserTables {
    pub statements: HashMap<TokenType, StatementParser>,
    pub set_items: HashMap<String, StatementParser>,
    pub no_paren_functions: HashMap<TokenType, Tag>,
    /// Irregular function syntax by uppercased name, positioned after `(`.
    pub function_parsers: HashMap<String, StatementParser>,
    pub functions: HashMap<String, FunctionBuilder>,
    pub range: HashMap<TokenType, RangeEntry>,
    pub column_operators: HashMap<TokenType, Tag>,
    pub disjunction: HashMap<TokenType, Tag>,
    pub conjunction: HashMap<TokenType, Tag>,
    pub equality: HashMap<TokenType, Tag>,
    pub comparison: HashMap<TokenType, Tag>,
    pub bitwise: HashMap<TokenType, Tag>,
    pub term: HashMap<TokenType, Tag>,
    pub factor: HashMap<TokenType, Tag>,
    /// Empty in the base dialect; dialects with a power operator add e.g.
    /// `^` here (and remove it from `bitwise`).
    pub exponent: HashMap<TokenType, Tag>,
    /// Fixed-order query modifier pass; clause order is enforced by running
    /// the parsers once, in sequence.
    pub modifiers: Vec<ModifierParser>,
}

impl ParserTables {
    pub fn base() -> Self {
        use TokenType as T;

        let statements: HashMap<TokenType, StatementParser> = [
            (T::Select, query::parse_select_statement as StatementParser),
            (T::From, query::parse_from_first),
            (T::Values, query::parse_values_statement),
            (T::With, query::parse_with_statement),
            (T::Use, stmt::parse_use),
            (T::Set, stmt::parse_set),
            (T::Begin, stmt::parse_transaction),
            (T::Commit, stmt::parse_commit),
            (T::Rollback, stmt::parse_rollback),
            (T::Insert, stmt::guarded_insert),
            (T::Update, stmt::guarded_update),
            (T::Delete, stmt::guarded_delete),
            (T::Create, stmt::guarded_create),
            (T::Drop, stmt::guarded_drop),
            (T::Truncate, stmt::guarded_truncate),
            (T::Show, stmt::guarded_show),
            (T::Describe, stmt::guarded_describe),
            (T::Alter, stmt::parse_as_command),
            (T::Merge, stmt::parse_as_command),
            (T::Copy, stmt::parse_as_command),
            (T::Analyze, stmt::parse_as_command),
        ]
        .into_iter()
        .collect();

        let set_items: HashMap<String, StatementParser> = [
            (String::from("GLOBAL"), stmt::parse_set_item_scoped as StatementParser),
            (String::from("LOCAL"), stmt::parse_set_item_scoped),
            (String::from("SESSION"), stmt::parse_set_item_scoped),
        ]
        .into_iter()
        .collect();

        let no_paren_functions: HashMap<TokenType, Tag> = [
            (T::CurrentDate, Tag::CurrentDate),
            (T::CurrentTime, Tag::CurrentTime),
            (T::CurrentTimestamp, Tag::CurrentTimestamp),
            (T::CurrentUser, Tag::CurrentUser),
        ]
        .into_iter()
        .collect();

        let function_parsers: HashMap<String, StatementParser> = [
            (String::from("COUNT"), expr::parse_count as StatementParser),
            (String::from("TRIM"), expr::parse_trim),
            (String::from("SUBSTRING"), expr::parse_substring),
            (String::from("OVERLAY"), expr::parse_overlay),
            (String::from("MAP"), expr::parse_map),
        ]
        .into_iter()
        .collect();

        let functions: HashMap<String, FunctionBuilder> = [
            (String::from("COALESCE"), expr::build_coalesce as FunctionBuilder),
            (String::from("IFNULL"), expr::build_coalesce),
            (String::from("NVL"), expr::build_coalesce),
            (String::from("CONCAT"), expr::build_concat),
            (String::from("LOG"), expr::build_log),
            (String::from("MOD"), expr::build_mod),
            (String::from("POW"), expr::build_pow),
            (String::from("POWER"), expr::build_pow),
        ]
        .into_iter()
        .collect();

        let range: HashMap<TokenType, RangeEntry> = [
            (T::Between, RangeEntry::Parser(expr::parse_between as RangeParser)),
            (T::In, RangeEntry::Parser(expr::parse_in)),
            (T::Like, RangeEntry::LikePattern(Tag::Like)),
            (T::ILike, RangeEntry::LikePattern(Tag::ILike)),
            (T::Glob, RangeEntry::Binary(Tag::Glob)),
            (T::RLike, RangeEntry::Binary(Tag::RegexpLike)),
            (T::IRLike, RangeEntry::Binary(Tag::RegexpILike)),
            (T::LtAt, RangeEntry::Binary(Tag::ArrayContained)),
            (T::AtGt, RangeEntry::Binary(Tag::ArrayContains)),
            (T::DAmp, RangeEntry::Binary(Tag::ArrayOverlaps)),
            (T::CaretAt, RangeEntry::Binary(Tag::StartsWith)),
        ]
        .into_iter()
        .collect();

        let column_operators: HashMap<TokenType, Tag> = [
            (T::Arrow, Tag::JsonExtract),
            (T::DArrow, Tag::JsonExtractScalar),
            (T::HashArrow, Tag::JsonbExtract),
            (T::DHashArrow, Tag::JsonbExtractScalar),
        ]
        .into_iter()
        .collect();

        let modifiers: Vec<ModifierParser> = vec![
            query::modifier_match_recognize,
            query::modifier_where,
            query::modifier_connect,
            query::modifier_group,
            query::modifier_having,
            query::modifier_qualify,
            query::modifier_windows,
            query::modifier_order,
            query::modifier_cluster,
            query::modifier_distribute,
            query::modifier_sort,
            query::modifier_limit,
            query::modifier_offset,
            query::modifier_fetch,
            query::modifier_sample,
            query::modifier_locks,
        ];

        ParserTables {
            statements,
            set_items,
            no_paren_functions,
            function_parsers,
            functions,
            range,
            column_operators,
            disjunction: [(T::Or, Tag::Or)].into_iter().collect(),
            conjunction: [(T::And, Tag::And)].into_iter().collect(),
            equality: [(T::Eq, Tag::Eq), (T::Neq, Tag::Neq)].into_iter().collect(),
            comparison: [
                (T::Lt, Tag::Lt),
                (T::Lte, Tag::Lte),
                (T::Gt, Tag::Gt),
                (T::Gte, Tag::Gte),
            ]
            .into_iter()
            .collect(),
            bitwise: [
                (T::Amp, Tag::BitwiseAnd),
                (T::Pipe, Tag::BitwiseOr),
                (T::Caret, Tag::BitwiseXor),
                (T::LShift, Tag::BitwiseLeftShift),
                (T::RShift, Tag::BitwiseRightShift),
            ]
            .into_iter()
            .collect(),
            term: [(T::Plus, Tag::Add), (T::Dash, Tag::Sub), (T::DPipe, Tag::DPipe)]
                .into_iter()
                .collect(),
            factor: [
                (T::Star, Tag::Mul),
                (T::Slash, Tag::Div),
                (T::Percent, Tag::Mod),
                (T::Div, Tag::IntDiv),
            ]
            .into_iter()
            .collect(),
            exponent: HashMap::new(),
            modifiers,
        }
    }
}

impl Default for ParserTables {
    fn default() -> Self {
        ParserTables::base()
    }
}

/// SQL parser for one dialect. Holds only in-memory state; independent
/// instances are fully independent.
pub struct Parser<'a> {
    pub(crate) dialect: &'a Dialect,
    options: ParserOptions,
    sql: String,
    tokens: Vec<Token>,
    index: usize,
    errors: Vec<ParseErrorDetail>,
    /// True while the CONNECT BY condition is being parsed; PRIOR is only
    /// an operator there, everywhere else it is an ordinary name.
    pub(crate) in_connect: bool,
}

impl<'a> Parser<'a> {
    pub fn new(dialect: &'a Dialect) -> Self {
        Parser::with_options(dialect, ParserOptions::default())
    }

    pub fn with_options(dialect: &'a Dialect, options: ParserOptions) -> Self {
        Parser {
            dialect,
            options,
            sql: String::new(),
            tokens: Vec::new(),
            index: 0,
            errors: Vec::new(),
            in_connect: false,
        }
    }

    /// Tokenizes and parses `sql`, one tree per semicolon-delimited
    /// statement.
    pub fn parse_sql(&mut self, sql: &str) -> Result<Vec<Node>, ParserError> {
        let tokens = Tokenizer::new(&self.dialect.tokenizer).tokenize(sql)?;
        self.parse_tokens(tokens, sql)
    }

    /// Parses an already-tokenized statement list. `sql` must be the source
    /// the tokens were produced from; it supplies error context and the
    /// verbatim spans captured by command fallback.
    pub fn parse_tokens(&mut self, tokens: Vec<Token>, sql: &str) -> Result<Vec<Node>, ParserError> {
        debug!("parsing: {sql}");
        self.sql = String::from(sql);
        self.errors.clear();

        let mut statements = Vec::new();
        for chunk in split_statements(tokens) {
            self.tokens = chunk;
            self.index = 0;
            if self.current().is_eof() {
                continue;
            }
            let node = self.parse_statement()?;
            if !self.current().is_eof() {
                self.raise_error("Invalid expression / Unexpected token")?;
            }
            statements.push(node);
        }
        self.check_errors()?;
        Ok(statements)
    }

    /// Parses input expected to contain exactly one statement.
    pub fn parse_one(&mut self, sql: &str) -> Result<Node, ParserError> {
        let mut statements = self.parse_sql(sql)?;
        match (statements.len(), statements.pop()) {
            (1, Some(node)) => Ok(node),
            (n, _) => Err(ParserError::Syntax {
                message: format!("Expected exactly one statement, got {n}"),
                errors: Vec::new(),
            }),
        }
    }

    // ---- cursor ----

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    pub(crate) fn current_type(&self) -> TokenType {
        self.current().token_type
    }

    pub(crate) fn prev(&self) -> &Token {
        &self.tokens[self.index.saturating_sub(1)]
    }

    pub(crate) fn peek(&self, offset: usize) -> &Token {
        let index = (self.index + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        } else {
            // the Eof sentinel is never consumed
            self.index = self.tokens.len() - 1;
        }
        self.prev()
    }

    pub(crate) fn retreat(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Consumes the current token if it has the given type.
    pub(crate) fn match_(&mut self, token_type: TokenType) -> bool {
        if self.current_type() == token_type && token_type != TokenType::Eof {
            self.index += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn match_any(&mut self, token_types: &[TokenType]) -> Option<TokenType> {
        let current = self.current_type();
        if token_types.contains(&current) && self.match_(current) {
            Some(current)
        } else {
            None
        }
    }

    /// Consumes the current token if its text equals `text`,
    /// case-insensitively, regardless of its token type.
    pub(crate) fn match_text(&mut self, text: &str) -> bool {
        if !self.current().is_eof() && self.current().text.eq_ignore_ascii_case(text) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Consumes a whole word sequence or nothing.
    pub(crate) fn match_text_seq(&mut self, texts: &[&str]) -> bool {
        let index = self.index;
        for text in texts {
            if !self.match_text(text) {
                self.index = index;
                return false;
            }
        }
        true
    }

    pub(crate) fn match_pair(&mut self, first: TokenType, second: TokenType) -> bool {
        if self.current_type() == first && self.peek(1).token_type == second {
            self.index += 2;
            true
        } else {
            false
        }
    }

    /// Requires and consumes a token, raising a parse error (per the error
    /// level policy) when the requirement fails.
    pub(crate) fn expect(&mut self, token_type: TokenType) -> Result<(), ParserError> {
        if !self.match_(token_type) {
            self.raise_error(format!(
                "Expected {token_type}, got {}",
                self.current()
            ))?;
        }
        Ok(())
    }

    /// Saves the cursor, attempts `f`, and restores the cursor and error
    /// list exactly when it fails. The primary backtracking primitive.
    pub(crate) fn try_parse<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParserError>,
    ) -> Option<T> {
        let index = self.index;
        let errors = self.errors.len();
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.index = index;
                self.errors.truncate(errors);
                None
            }
        }
    }

    pub(crate) fn parse_csv<T>(
        &mut self,
        mut f: impl FnMut(&mut Self) -> Result<T, ParserError>,
    ) -> Result<Vec<T>, ParserError> {
        let mut items = vec![f(self)?];
        while self.match_(TokenType::Comma) {
            items.push(f(self)?);
        }
        Ok(items)
    }

    // ---- errors ----

    fn error_detail(&self, description: String) -> ParseErrorDetail {
        const CONTEXT: usize = 50;
        let token = self.current();
        let start = floor_char_boundary(&self.sql, token.start.saturating_sub(CONTEXT));
        let end = ceil_char_boundary(&self.sql, (token.end + CONTEXT).min(self.sql.len()));
        ParseErrorDetail {
            description,
            line: token.line,
            col: token.col,
            start_context: String::from(&self.sql[start..token.start]),
            highlight: String::from(&self.sql[token.start..token.end]),
            end_context: String::from(&self.sql[token.end..end]),
        }
    }

    /// Records or raises a parse error at the current token, per the
    /// configured [`ErrorLevel`].
    pub(crate) fn raise_error(&mut self, description: impl Into<String>) -> Result<(), ParserError> {
        let detail = self.error_detail(description.into());
        match self.options.error_level {
            ErrorLevel::Ignore => Ok(()),
            ErrorLevel::Warn => {
                log::warn!("{detail}");
                Ok(())
            }
            ErrorLevel::Raise => {
                self.errors.push(detail);
                Ok(())
            }
            ErrorLevel::Immediate => Err(ParserError::syntax(detail)),
        }
    }

    fn check_errors(&mut self) -> Result<(), ParserError> {
        if self.options.error_level != ErrorLevel::Raise || self.errors.is_empty() {
            return Ok(());
        }
        let errors = std::mem::take(&mut self.errors);
        let shown = errors.len().min(self.options.max_errors);
        let mut message = errors[..shown]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n\n");
        if errors.len() > shown {
            message.push_str(&format!("\n\n... and {} more", errors.len() - shown));
        }
        Err(ParserError::Syntax { message, errors })
    }

    pub(crate) fn errors_len(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn truncate_errors(&mut self, len: usize) {
        self.errors.truncate(len);
    }

    // ---- statements ----

    pub(crate) fn parse_statement(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        if let Some(parser) = dialect.parser.statements.get(&self.current_type()) {
            return parser(self);
        }

        // bare expression statement, e.g. "1 + 2" or "(SELECT 1) UNION ..."
        let expression = self.parse_expression()?;
        let expression = self.maybe_parse_set_operations(expression)?;
        let aliased = self.maybe_parse_implicit_alias(expression);
        Ok(aliased)
    }

    fn maybe_parse_implicit_alias(&mut self, expression: Node) -> Node {
        // a trailing identifier-like token aliases a bare expression
        if matches!(
            self.current_type(),
            TokenType::Var | TokenType::Identifier
        ) {
            let token = self.advance();
            let quoted = token.token_type == TokenType::Identifier;
            let name = token.text.clone();
            return ast::alias(expression, ast::identifier(name, quoted));
        }
        expression
    }

    /// Runs a structured statement parser; if it fails or leaves tokens
    /// unconsumed before the statement boundary, rewinds to the statement
    /// start and re-emits the whole statement as an opaque command. Errors
    /// recorded during the failed attempt are dropped with it.
    pub(crate) fn parse_or_command(&mut self, f: StatementParser) -> Result<Node, ParserError> {
        let index = self.index;
        let errors = self.errors.len();
        match f(self) {
            Ok(node) if self.current().is_eof() => Ok(node),
            _ => {
                debug!(
                    "failed to parse {:?} statement, falling back to command",
                    self.tokens[index].text
                );
                self.index = index;
                self.errors.truncate(errors);
                self.parse_command()
            }
        }
    }

    /// Consumes every remaining token of the statement into an opaque
    /// command node carrying the verbatim source span. Parenthesized
    /// subqueries inside the span are still parsed and attached in order of
    /// appearance.
    pub(crate) fn parse_command(&mut self) -> Result<Node, ParserError> {
        let start = self.current().start;
        let mut end = self.current().end;
        let mut subqueries = Vec::new();
        while !self.current().is_eof() {
            if self.current_type() == TokenType::LParen
                && matches!(
                    self.peek(1).token_type,
                    TokenType::Select | TokenType::With
                )
            {
                self.advance();
                let query = self.parse_statement()?;
                let query = self.maybe_parse_set_operations(query)?;
                self.expect(TokenType::RParen)?;
                subqueries.push(ast::subquery(query));
                end = self.prev().end;
            } else {
                end = self.advance().end;
            }
        }
        let mut command = Node::new(Tag::Command);
        command.set("this", String::from(&self.sql[start..end]));
        if !subqueries.is_empty() {
            command.set("expressions", subqueries);
        }
        Ok(command)
    }
}

/// Splits a token stream into per-statement chunks, dropping semicolons and
/// giving every chunk its own Eof sentinel.
fn split_statements(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    let mut eof = None;
    for token in tokens {
        match token.token_type {
            TokenType::Semicolon => {
                let sentinel = Token::eof(token.line, token.col, token.start);
                current.push(sentinel);
                chunks.push(std::mem::take(&mut current));
            }
            TokenType::Eof => eof = Some(token),
            _ => current.push(token),
        }
    }
    let eof = eof.unwrap_or_else(|| Token::eof(1, 1, 0));
    current.push(eof);
    chunks.push(current);
    chunks
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, mut index: usize) -> usize {
    while index < s.len() && !s.is_char_boundary(index) {
        index += 1;
    }
    index
}
