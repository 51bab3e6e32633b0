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

//! SQL Tokenizer
//!
//! Converts a string into a sequence of [`Token`]s under a dialect's lexing
//! configuration. Lexical errors (unterminated literals, unrecognized
//! characters) abort the whole call; there is no safe recovery point inside
//! a lexeme.

use core::fmt;
use std::collections::HashMap;

use crate::tokens::{Token, TokenType};
use crate::trie::{Trie, TrieResult};

/// Fatal lexical error, carrying the position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} at line {}, column {}",
            self.message, self.line, self.col
        )
    }
}

impl std::error::Error for TokenizerError {}

/// Lexing configuration a dialect hands to the tokenizer. Constructed once
/// per dialect; the multi-word keyword trie is derived from `keywords` at
/// construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizerSettings {
    /// String literal delimiters, e.g. `("'", "'")`.
    pub quotes: Vec<(String, String)>,
    /// Quoted identifier delimiters, e.g. `("\"", "\"")`, `("[", "]")`.
    pub identifiers: Vec<(String, String)>,
    /// Characters that escape the closing quote inside a string. The quote
    /// character itself here means quote-doubling.
    pub string_escapes: Vec<char>,
    /// Characters that escape the closing delimiter inside an identifier.
    pub identifier_escapes: Vec<char>,
    /// National string delimiters, e.g. `("N'", "'")`.
    pub national_strings: Vec<(String, String)>,
    /// Bit string delimiters, e.g. `("B'", "'")` or `("0b", "")`.
    pub bit_strings: Vec<(String, String)>,
    /// Hex string delimiters, e.g. `("X'", "'")` or `("0x", "")`.
    pub hex_strings: Vec<(String, String)>,
    /// Byte/escape string delimiters, e.g. `("E'", "'")`; contents have
    /// backslash escapes decoded at scan time.
    pub byte_strings: Vec<(String, String)>,
    /// Two-character source sequences substituted verbatim before generic
    /// escape handling, e.g. backslash + `n` to a newline.
    pub unescaped_sequences: HashMap<String, String>,
    /// Uppercased keyword text (single- or multi-word) to token type.
    pub keywords: HashMap<String, TokenType>,
    /// Comment delimiters: start marker and, for block comments, end marker.
    pub comments: Vec<(String, Option<String>)>,
    /// Whether `1_000_000` style numeric literals are legal.
    pub numbers_can_be_underscore_separated: bool,
    /// Whether `$$...$$` / `$tag$...$tag$` strings are recognized.
    pub dollar_quoting: bool,

    keyword_trie: Trie,
}

impl TokenizerSettings {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quotes: Vec<(String, String)>,
        identifiers: Vec<(String, String)>,
        string_escapes: Vec<char>,
        identifier_escapes: Vec<char>,
        national_strings: Vec<(String, String)>,
        bit_strings: Vec<(String, String)>,
        hex_strings: Vec<(String, String)>,
        byte_strings: Vec<(String, String)>,
        unescaped_sequences: HashMap<String, String>,
        keywords: HashMap<String, TokenType>,
        comments: Vec<(String, Option<String>)>,
        numbers_can_be_underscore_separated: bool,
        dollar_quoting: bool,
    ) -> Self {
        let keyword_trie = Trie::build(keywords.keys().filter(|k| k.contains(' ')));
        TokenizerSettings {
            quotes,
            identifiers,
            string_escapes,
            identifier_escapes,
            national_strings,
            bit_strings,
            hex_strings,
            byte_strings,
            unescaped_sequences,
            keywords,
            comments,
            numbers_can_be_underscore_separated,
            dollar_quoting,
            keyword_trie,
        }
    }

    /// ANSI-flavored defaults every dialect starts from.
    pub fn base() -> Self {
        TokenizerSettings::new(
            vec![(String::from("'"), String::from("'"))],
            vec![(String::from("\""), String::from("\""))],
            vec!['\''],
            vec!['"'],
            vec![
                (String::from("N'"), String::from("'")),
                (String::from("n'"), String::from("'")),
            ],
            vec![],
            vec![],
            vec![],
            HashMap::new(),
            base_keywords(),
            vec![
                (String::from("--"), None),
                (String::from("/*"), Some(String::from("*/"))),
            ],
            false,
            false,
        )
    }

    /// Rebuilds the multi-word keyword trie. Must be called after mutating
    /// `keywords` during dialect construction.
    pub fn rebuild_keyword_trie(&mut self) {
        self.keyword_trie = Trie::build(self.keywords.keys().filter(|k| k.contains(' ')));
    }
}

impl Default for TokenizerSettings {
    fn default() -> Self {
        TokenizerSettings::base()
    }
}

/// Keyword table shared by all dialects; dialects add or remap entries on
/// top of this during construction.
pub fn base_keywords() -> HashMap<String, TokenType> {
    use TokenType::*;
    let pairs: &[(&str, TokenType)] = &[
        ("ALL", All),
        ("ALTER", Alter),
        ("ANALYZE", Analyze),
        ("AND", And),
        ("ANTI", Anti),
        ("ANY", Any),
        ("ARRAY", Array),
        ("AS", As),
        ("ASC", Asc),
        ("ASOF", Asof),
        ("BEGIN", Begin),
        ("BETWEEN", Between),
        ("CASE", Case),
        ("CAST", Cast),
        ("CLUSTER BY", ClusterBy),
        ("COMMIT", Commit),
        ("COPY", Copy),
        ("CREATE", Create),
        ("CROSS", Cross),
        ("CUBE", Cube),
        ("CURRENT_DATE", CurrentDate),
        ("CURRENT_TIME", CurrentTime),
        ("CURRENT_TIMESTAMP", CurrentTimestamp),
        ("CURRENT_USER", CurrentUser),
        ("DATE", Date),
        ("DELETE", Delete),
        ("DESC", Desc),
        ("DESCRIBE", Describe),
        ("DISTINCT", Distinct),
        ("DISTRIBUTE BY", DistributeBy),
        ("DIV", Div),
        ("DROP", Drop),
        ("ELSE", Else),
        ("END", End),
        ("EXCEPT", Except),
        ("EXISTS", Exists),
        ("EXTRACT", Extract),
        ("FALSE", False),
        ("FETCH", Fetch),
        ("FOLLOWING", Following),
        ("FROM", From),
        ("FULL", Full),
        ("GLOB", Glob),
        ("GROUP BY", GroupBy),
        ("GROUPING SETS", GroupingSets),
        ("HAVING", Having),
        ("ILIKE", ILike),
        ("IN", In),
        ("INNER", Inner),
        ("INSERT", Insert),
        ("INTERSECT", Intersect),
        ("INTERVAL", Interval),
        ("INTO", Into),
        ("IS", Is),
        ("JOIN", Join),
        ("LATERAL", Lateral),
        ("LEFT", Left),
        ("LIKE", Like),
        ("LIMIT", Limit),
        ("MATERIALIZED", Materialized),
        ("MERGE", Merge),
        ("NATURAL", Natural),
        ("NOT", Not),
        ("NULL", Null),
        ("OFFSET", Offset),
        ("ON", On),
        ("OR", Or),
        ("ORDER BY", OrderBy),
        ("OUTER", Outer),
        ("OVER", Over),
        ("PARTITION BY", PartitionBy),
        ("PIVOT", Pivot),
        ("PRECEDING", Preceding),
        ("QUALIFY", Qualify),
        ("RANGE", Range),
        ("RECURSIVE", Recursive),
        ("REGEXP", RLike),
        ("RIGHT", Right),
        ("RLIKE", RLike),
        ("ROLLBACK", Rollback),
        ("ROLLUP", Rollup),
        ("ROWS", Rows),
        ("SELECT", Select),
        ("SEMI", Semi),
        ("SET", Set),
        ("SHOW", Show),
        ("SORT BY", SortBy),
        ("STRUCT", Struct),
        ("TABLE", Table),
        ("TABLESAMPLE", TableSample),
        ("TEMP", Temporary),
        ("TEMPORARY", Temporary),
        ("THEN", Then),
        ("TIME", Time),
        ("TIMESTAMP", Timestamp),
        ("TIMESTAMPTZ", TimestampTz),
        ("TRUE", True),
        ("TRUNCATE", Truncate),
        ("TRY_CAST", TryCast),
        ("UNBOUNDED", Unbounded),
        ("UNION", Union),
        ("UNNEST", Unnest),
        ("UNPIVOT", Unpivot),
        ("UPDATE", Update),
        ("USE", Use),
        ("USING", Using),
        ("VALUES", Values),
        ("VIEW", View),
        ("WHEN", When),
        ("WHERE", Where),
        ("WINDOW", Window),
        ("WITH", With),
    ];
    pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
}

/// Operator lexemes, longest first so maximal munch is a simple first-match
/// scan down the table.
const OPERATORS: &[(&str, TokenType)] = &[
    ("!~~*", TokenType::NotDTildaStar),
    ("!~~", TokenType::NotDTilda),
    ("!~*", TokenType::NotTildaStar),
    ("||/", TokenType::DPipeSlash),
    ("~~*", TokenType::DTildaStar),
    ("#>>", TokenType::DHashArrow),
    ("->>", TokenType::DArrow),
    ("!=", TokenType::Neq),
    ("!~", TokenType::NotTilda),
    ("#>", TokenType::HashArrow),
    ("&&", TokenType::DAmp),
    ("->", TokenType::Arrow),
    ("::", TokenType::DColon),
    (":=", TokenType::ColonEq),
    ("<=", TokenType::Lte),
    ("<>", TokenType::Neq),
    ("<<", TokenType::LShift),
    ("<@", TokenType::LtAt),
    (">=", TokenType::Gte),
    (">>", TokenType::RShift),
    ("@>", TokenType::AtGt),
    ("^@", TokenType::CaretAt),
    ("|/", TokenType::PipeSlash),
    ("||", TokenType::DPipe),
    ("~*", TokenType::TildaStar),
    ("~~", TokenType::DTilda),
    ("%", TokenType::Percent),
    ("&", TokenType::Amp),
    ("(", TokenType::LParen),
    (")", TokenType::RParen),
    ("*", TokenType::Star),
    ("+", TokenType::Plus),
    (",", TokenType::Comma),
    ("-", TokenType::Dash),
    (".", TokenType::Dot),
    ("/", TokenType::Slash),
    (":", TokenType::Colon),
    (";", TokenType::Semicolon),
    ("<", TokenType::Lt),
    ("=", TokenType::Eq),
    (">", TokenType::Gt),
    ("?", TokenType::QMark),
    ("@", TokenType::At),
    ("[", TokenType::LBracket),
    ("]", TokenType::RBracket),
    ("^", TokenType::Caret),
    ("{", TokenType::LBrace),
    ("}", TokenType::RBrace),
    ("|", TokenType::Pipe),
    ("~", TokenType::Tilda),
    ("$", TokenType::Dollar),
];

/// SQL tokenizer. Pure in `(source, settings)`; holds no state across
/// `tokenize` calls.
pub struct Tokenizer<'a> {
    settings: &'a TokenizerSettings,
}

impl<'a> Tokenizer<'a> {
    pub fn new(settings: &'a TokenizerSettings) -> Self {
        Tokenizer { settings }
    }

    pub fn tokenize(&self, sql: &str) -> Result<Vec<Token>, TokenizerError> {
        Scanner::new(self.settings, sql).scan()
    }
}

#[derive(Clone, Copy)]
struct ScanState {
    pos: usize,
    line: usize,
    col: usize,
}

struct Scanner<'a> {
    settings: &'a TokenizerSettings,
    chars: Vec<char>,
    /// Byte offset of each char, with a final sentinel equal to the source
    /// length, so `offsets[i]..offsets[j]` is always a valid byte range.
    offsets: Vec<usize>,
    pos: usize,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
    pending_comments: Vec<String>,
}

impl<'a> Scanner<'a> {
    fn new(settings: &'a TokenizerSettings, sql: &str) -> Self {
        let mut chars = Vec::with_capacity(sql.len());
        let mut offsets = Vec::with_capacity(sql.len() + 1);
        for (offset, ch) in sql.char_indices() {
            chars.push(ch);
            offsets.push(offset);
        }
        offsets.push(sql.len());
        Scanner {
            settings,
            chars,
            offsets,
            pos: 0,
            line: 1,
            col: 0,
            tokens: Vec::new(),
            pending_comments: Vec::new(),
        }
    }

    fn scan(mut self) -> Result<Vec<Token>, TokenizerError> {
        let settings = self.settings;
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch.is_whitespace() {
                self.advance();
            } else if let Some((start, end)) = self.match_comment_start() {
                self.scan_comment(&start, end.as_deref())?;
            } else if let Some((start, end)) = self.match_delimiter(&settings.national_strings) {
                self.scan_string(start, end, TokenType::NationalString, false)?;
            } else if let Some((start, end)) = self.match_delimiter(&settings.byte_strings) {
                self.scan_string(start, end, TokenType::ByteString, true)?;
            } else if let Some((start, end)) = self.match_delimiter(&settings.hex_strings) {
                self.scan_prefixed_digits(start, end, TokenType::HexString)?;
            } else if let Some((start, end)) = self.match_delimiter(&settings.bit_strings) {
                self.scan_prefixed_digits(start, end, TokenType::BitString)?;
            } else if settings.dollar_quoting && ch == '$' && self.at_dollar_quote() {
                self.scan_dollar_quoted_string()?;
            } else if let Some((start, end)) = self.match_delimiter(&settings.quotes) {
                self.scan_string(start, end, TokenType::String, false)?;
            } else if let Some((start, end)) = self.match_delimiter(&settings.identifiers) {
                self.scan_quoted_identifier(start, end)?;
            } else if ch.is_ascii_digit() {
                self.scan_number();
            } else if ch.is_alphabetic() || ch == '_' {
                self.scan_word();
            } else {
                self.scan_operator()?;
            }
        }
        if !self.pending_comments.is_empty() {
            let comments = std::mem::take(&mut self.pending_comments);
            if let Some(last) = self.tokens.last_mut() {
                last.comments.extend(comments);
            }
        }
        let offset = *self.offsets.last().unwrap_or(&0);
        self.tokens.push(Token::eof(self.line, self.col + 1, offset));
        Ok(self.tokens)
    }

    fn save(&self) -> ScanState {
        ScanState {
            pos: self.pos,
            line: self.line,
            col: self.col,
        }
    }

    fn restore(&mut self, state: ScanState) {
        self.pos = state.pos;
        self.line = state.line;
        self.col = state.col;
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        ch
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, TokenizerError> {
        Err(TokenizerError {
            message: message.into(),
            line: self.line,
            col: self.col + 1,
        })
    }

    /// Checks whether the upcoming characters equal `text`, case-insensitive
    /// for ASCII letters, and consumes them on a match.
    fn match_text(&mut self, text: &str) -> bool {
        let mut offset = 0;
        for expected in text.chars() {
            match self.peek(offset) {
                Some(actual) if actual.eq_ignore_ascii_case(&expected) => offset += 1,
                _ => return false,
            }
        }
        for _ in 0..offset {
            self.advance();
        }
        true
    }

    fn match_delimiter<'s>(
        &mut self,
        delimiters: &'s [(String, String)],
    ) -> Option<(&'s str, &'s str)> {
        // prefer the longest start marker so N' wins over ' when both apply
        let mut candidates: Vec<&(String, String)> = delimiters.iter().collect();
        candidates.sort_by_key(|(start, _)| std::cmp::Reverse(start.len()));
        for (start, end) in candidates {
            let state = self.save();
            if self.match_text(start) {
                return Some((start.as_str(), end.as_str()));
            }
            self.restore(state);
        }
        None
    }

    fn is_quote_start(&self, ch: char) -> bool {
        self.settings
            .quotes
            .iter()
            .any(|(start, _)| start.len() == ch.len_utf8() && start.starts_with(ch))
    }

    fn match_comment_start(&mut self) -> Option<(String, Option<String>)> {
        let comments = self.settings;
        for (start, end) in &comments.comments {
            let state = self.save();
            if self.match_text(start) {
                return Some((start.clone(), end.clone()));
            }
            self.restore(state);
        }
        None
    }

    fn add_token(&mut self, token_type: TokenType, text: String, start: ScanState) {
        let mut token = Token::new(
            token_type,
            text,
            start.line,
            start.col + 1,
            self.offsets[start.pos],
            self.offsets[self.pos],
        );
        if !self.pending_comments.is_empty() {
            let comments = std::mem::take(&mut self.pending_comments);
            // comments right before a statement terminator belong to the
            // statement, i.e. to the previous token
            if token_type == TokenType::Semicolon && !self.tokens.is_empty() {
                if let Some(last) = self.tokens.last_mut() {
                    last.comments.extend(comments);
                }
            } else {
                token.comments = comments;
            }
        }
        self.tokens.push(token);
    }

    fn scan_comment(&mut self, _start: &str, end: Option<&str>) -> Result<(), TokenizerError> {
        let mut text = String::new();
        match end {
            None => {
                while let Some(ch) = self.peek(0) {
                    if ch == '\n' {
                        break;
                    }
                    text.push(self.advance());
                }
            }
            Some(end) => {
                // block comments nest
                let mut depth = 1usize;
                loop {
                    if self.pos >= self.chars.len() {
                        return self.error("Unterminated block comment");
                    }
                    let state = self.save();
                    if self.match_text(end) {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                        text.push_str(end);
                        continue;
                    }
                    self.restore(state);
                    let state = self.save();
                    if self.match_text("/*") {
                        depth += 1;
                        text.push_str("/*");
                        continue;
                    }
                    self.restore(state);
                    text.push(self.advance());
                }
            }
        }
        self.pending_comments.push(text);
        Ok(())
    }

    fn scan_string(
        &mut self,
        start_delim: &str,
        end_delim: &str,
        token_type: TokenType,
        decode_backslash_escapes: bool,
    ) -> Result<(), TokenizerError> {
        let settings = self.settings;
        let mut start = self.save();
        // match_delimiter consumed the start marker; token span includes it
        start.pos -= start_delim.chars().count();
        start.col = start.col.saturating_sub(start_delim.chars().count());
        let end_char = end_delim.chars().next();

        let mut text = String::new();
        loop {
            let Some(ch) = self.peek(0) else {
                return self.error(format!("Unterminated string starting with {start_delim:?}"));
            };

            // dialect substitution table wins over generic escape handling
            if let Some(next) = self.peek(1) {
                let seq: String = [ch, next].iter().collect();
                if let Some(replacement) = settings.unescaped_sequences.get(&seq) {
                    text.push_str(replacement.as_str());
                    self.advance();
                    self.advance();
                    continue;
                }
            }

            // an escape char is only special before the closing delimiter or
            // another escape char; anywhere else it is an ordinary character
            if settings.string_escapes.contains(&ch) {
                if let (Some(end_ch), Some(next)) = (end_char, self.peek(1)) {
                    if next == end_ch || settings.string_escapes.contains(&next) {
                        if ch == next && self.is_quote_start(ch) {
                            // doubled quote collapses to a single one
                            text.push(ch);
                        } else if next == end_ch {
                            // escaped closing delimiter
                            text.push(next);
                        } else {
                            // escape + escape stays verbatim
                            text.push(ch);
                            text.push(next);
                        }
                        self.advance();
                        self.advance();
                        continue;
                    }
                }
            }

            if decode_backslash_escapes && ch == '\\' {
                self.advance();
                let Some(escaped) = self.peek(0) else {
                    return self.error("Unterminated string escape");
                };
                self.advance();
                text.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
                continue;
            }

            let state = self.save();
            if self.match_text(end_delim) {
                break;
            }
            self.restore(state);
            text.push(self.advance());
        }
        self.add_token(token_type, text, start);
        Ok(())
    }

    fn scan_prefixed_digits(
        &mut self,
        start_delim: &str,
        end_delim: &str,
        token_type: TokenType,
    ) -> Result<(), TokenizerError> {
        let mut start = self.save();
        start.pos -= start_delim.chars().count();
        start.col = start.col.saturating_sub(start_delim.chars().count());

        if end_delim.is_empty() {
            // 0x / 0b style literals run while valid digits last
            let valid = |ch: char| match token_type {
                TokenType::HexString => ch.is_ascii_hexdigit(),
                _ => ch == '0' || ch == '1',
            };
            let mut text = String::new();
            while let Some(ch) = self.peek(0) {
                if !valid(ch) {
                    break;
                }
                text.push(self.advance());
            }
            if text.is_empty() {
                // a declared hex/bit prefix with no digits degrades to a
                // plain zero; scanning resumes right after the leading 0
                self.restore(start);
                let start = self.save();
                self.advance();
                self.add_token(TokenType::Number, String::from("0"), start);
                return Ok(());
            }
            self.add_token(token_type, text, start);
            return Ok(());
        }

        let mut text = String::new();
        loop {
            if self.pos >= self.chars.len() {
                return self.error(format!("Unterminated string starting with {start_delim:?}"));
            }
            let state = self.save();
            if self.match_text(end_delim) {
                break;
            }
            self.restore(state);
            text.push(self.advance());
        }
        self.add_token(token_type, text, start);
        Ok(())
    }

    fn at_dollar_quote(&self) -> bool {
        // $$ or $tag$ where tag is alphanumeric/underscore
        let mut offset = 1;
        while let Some(ch) = self.peek(offset) {
            if ch == '$' {
                return true;
            }
            if ch.is_alphanumeric() || ch == '_' {
                offset += 1;
            } else {
                return false;
            }
        }
        false
    }

    fn scan_dollar_quoted_string(&mut self) -> Result<(), TokenizerError> {
        let start = self.save();
        self.advance(); // $
        let mut tag = String::new();
        while let Some(ch) = self.peek(0) {
            if ch == '$' {
                break;
            }
            tag.push(self.advance());
        }
        self.advance(); // closing $ of the opening marker
        let terminator = format!("${tag}$");

        let mut text = String::new();
        loop {
            if self.pos >= self.chars.len() {
                return self.error(format!("Unterminated dollar-quoted string ${tag}$"));
            }
            let state = self.save();
            if self.match_text(&terminator) {
                break;
            }
            self.restore(state);
            text.push(self.advance());
        }
        self.add_token(TokenType::String, text, start);
        Ok(())
    }

    fn scan_quoted_identifier(
        &mut self,
        start_delim: &str,
        end_delim: &str,
    ) -> Result<(), TokenizerError> {
        let mut start = self.save();
        start.pos -= start_delim.chars().count();
        start.col = start.col.saturating_sub(start_delim.chars().count());
        let end_char = end_delim.chars().next();

        let mut text = String::new();
        loop {
            let Some(ch) = self.peek(0) else {
                return self.error(format!(
                    "Unterminated quoted identifier starting with {start_delim:?}"
                ));
            };
            if let Some(end_ch) = end_char {
                if ch != end_ch
                    && self.settings.identifier_escapes.contains(&ch)
                    && self.peek(1) == Some(end_ch)
                {
                    self.advance();
                    text.push(self.advance());
                    continue;
                }
            }
            let state = self.save();
            if self.match_text(end_delim) {
                // doubled closing delimiter escapes it
                if end_delim.chars().count() == 1 && self.peek(0) == end_char {
                    if let Some(end_ch) = end_char {
                        self.advance();
                        text.push(end_ch);
                        continue;
                    }
                }
                break;
            }
            self.restore(state);
            text.push(self.advance());
        }
        self.add_token(TokenType::Identifier, text, start);
        Ok(())
    }

    fn scan_number(&mut self) {
        let start = self.save();
        let mut text = String::new();
        let underscores = self.settings.numbers_can_be_underscore_separated;

        fn scan_digits(scanner: &mut Scanner, text: &mut String, underscores: bool) {
            while let Some(ch) = scanner.peek(0) {
                if ch.is_ascii_digit() {
                    text.push(scanner.advance());
                } else if ch == '_'
                    && underscores
                    && scanner.peek(1).is_some_and(|c| c.is_ascii_digit())
                {
                    scanner.advance();
                } else {
                    break;
                }
            }
        }
        scan_digits(self, &mut text, underscores);

        if self.peek(0) == Some('.') && self.peek(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push(self.advance());
            scan_digits(self, &mut text, underscores);
        }

        if matches!(self.peek(0), Some('e') | Some('E')) {
            let offset = if matches!(self.peek(1), Some('+') | Some('-')) {
                2
            } else {
                1
            };
            if self.peek(offset).is_some_and(|c| c.is_ascii_digit()) {
                text.push(self.advance().to_ascii_lowercase());
                if matches!(self.peek(0), Some('+') | Some('-')) {
                    text.push(self.advance());
                }
                scan_digits(self, &mut text, underscores);
            }
        }

        self.add_token(TokenType::Number, text, start);
    }

    fn scan_word(&mut self) {
        let start = self.save();
        let mut word = String::new();
        while let Some(ch) = self.peek(0) {
            if ch.is_alphanumeric() || ch == '_' {
                word.push(self.advance());
            } else {
                break;
            }
        }
        let upper = word.to_uppercase();

        if let Some((token_type, text)) = self.try_multi_word_keyword(&upper) {
            self.add_token(token_type, text, start);
            return;
        }

        match self.settings.keywords.get(&upper).copied() {
            Some(token_type) => self.add_token(token_type, word, start),
            None => self.add_token(TokenType::Var, word, start),
        }
    }

    /// Extends a scanned word through the multi-word keyword trie, consuming
    /// whitespace and further words only while the accumulated text remains
    /// a registered prefix. On failure the scan position, line, and column
    /// are restored exactly to where the single word ended.
    fn try_multi_word_keyword(&mut self, first: &str) -> Option<(TokenType, String)> {
        let settings = self.settings;
        let (result, mut node) = settings.keyword_trie.query(first);
        if result == TrieResult::Failed {
            return None;
        }
        let single_end = self.save();
        let mut text = String::from(first);
        let mut best: Option<(TokenType, String, ScanState)> = None;

        'extend: loop {
            // at least one whitespace character must separate the words
            if !self.peek(0).is_some_and(|c| c.is_whitespace()) {
                break;
            }
            while self.peek(0).is_some_and(|c| c.is_whitespace()) {
                self.advance();
            }
            let mut next = String::new();
            while let Some(ch) = self.peek(0) {
                if ch.is_alphanumeric() || ch == '_' {
                    next.push(self.advance());
                } else {
                    break;
                }
            }
            if next.is_empty() {
                break;
            }
            let step: String = format!(" {}", next.to_uppercase());
            let mut walked = node;
            for ch in step.chars() {
                match walked.step(ch) {
                    Some(child) => walked = child,
                    None => break 'extend,
                }
            }
            node = walked;
            text.push_str(&step);
            if node.is_word() {
                if let Some(token_type) = self.settings.keywords.get(&text) {
                    best = Some((*token_type, text.clone(), self.save()));
                }
            }
        }

        match best {
            Some((token_type, text, state)) => {
                self.restore(state);
                Some((token_type, text))
            }
            None => {
                self.restore(single_end);
                None
            }
        }
    }

    fn scan_operator(&mut self) -> Result<(), TokenizerError> {
        let start = self.save();
        for (op, token_type) in OPERATORS {
            let state = self.save();
            if self.match_text(op) {
                self.add_token(*token_type, String::from(*op), start);
                return Ok(());
            }
            self.restore(state);
        }
        self.error(format!(
            "Unrecognized character {:?}",
            self.peek(0).unwrap_or('\0')
        ))
    }
}
