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

//! Token kinds and the lexeme record produced by the tokenizer.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of a lexed token. Multi-word keywords (`GROUP BY`, `ORDER BY`, ...)
/// are single tokens, produced by the tokenizer's trie-assisted scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenType {
    // punctuation and operators
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,
    Colon,
    DColon,
    ColonEq,
    Star,
    Plus,
    Dash,
    Slash,
    Percent,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Amp,
    DAmp,
    Pipe,
    DPipe,
    PipeSlash,
    DPipeSlash,
    Caret,
    CaretAt,
    Tilda,
    TildaStar,
    DTilda,
    DTildaStar,
    NotTilda,
    NotTildaStar,
    NotDTilda,
    NotDTildaStar,
    LtAt,
    AtGt,
    Arrow,
    DArrow,
    HashArrow,
    DHashArrow,
    LShift,
    RShift,
    At,
    Dollar,
    QMark,

    // literals and words
    Number,
    String,
    NationalString,
    BitString,
    HexString,
    ByteString,
    /// A quoted identifier.
    Identifier,
    /// An unquoted word that is not a registered keyword.
    Var,

    // keywords
    All,
    Alter,
    Analyze,
    And,
    Anti,
    Any,
    Array,
    As,
    Asc,
    Asof,
    Begin,
    Between,
    Case,
    Cast,
    ClusterBy,
    Commit,
    Copy,
    Create,
    Cross,
    Cube,
    CurrentDate,
    CurrentTime,
    CurrentTimestamp,
    CurrentUser,
    Date,
    Delete,
    Desc,
    Describe,
    Distinct,
    DistributeBy,
    Div,
    Drop,
    Else,
    End,
    Except,
    Exists,
    Extract,
    False,
    Fetch,
    Following,
    From,
    Full,
    Glob,
    GroupBy,
    GroupingSets,
    Having,
    ILike,
    In,
    Inner,
    Insert,
    Intersect,
    Interval,
    Into,
    IRLike,
    Is,
    Join,
    Lateral,
    Left,
    Like,
    Limit,
    Materialized,
    Merge,
    Natural,
    Not,
    Null,
    Offset,
    On,
    Or,
    OrderBy,
    Outer,
    Over,
    PartitionBy,
    Pivot,
    Preceding,
    Qualify,
    Range,
    Recursive,
    Right,
    RLike,
    Rollback,
    Rollup,
    Rows,
    Select,
    Semi,
    Set,
    Show,
    SortBy,
    Struct,
    Table,
    TableSample,
    Temporary,
    Then,
    Time,
    Timestamp,
    TimestampTz,
    True,
    Truncate,
    TryCast,
    Unbounded,
    Union,
    Unnest,
    Unpivot,
    Update,
    Use,
    Using,
    Values,
    View,
    When,
    Where,
    Window,
    With,

    /// End-of-input sentinel, always the final token of a tokenize call.
    Eof,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A single lexeme. `start..end` is a byte range into the untouched original
/// source; `text` may differ from the source slice for literals whose quotes
/// and escapes were resolved during scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token {
    pub token_type: TokenType,
    pub text: String,
    /// 1-based line of the token's first character.
    pub line: usize,
    /// 1-based column of the token's first character.
    pub col: usize,
    /// Byte offset of the first character in the original source.
    pub start: usize,
    /// Byte offset one past the last character in the original source.
    pub end: usize,
    /// Comments attached during tokenizing, in source order.
    pub comments: Vec<String>,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        text: impl Into<String>,
        line: usize,
        col: usize,
        start: usize,
        end: usize,
    ) -> Self {
        Token {
            token_type,
            text: text.into(),
            line,
            col,
            start,
            end,
            comments: Vec::new(),
        }
    }

    /// The end-of-input sentinel placed after the last real token.
    pub fn eof(line: usize, col: usize, offset: usize) -> Self {
        Token::new(TokenType::Eof, "", line, col, offset, offset)
    }

    pub fn is_eof(&self) -> bool {
        self.token_type == TokenType::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.token_type {
            TokenType::Eof => write!(f, "EOF"),
            _ => write!(f, "{}", self.text),
        }
    }
}
