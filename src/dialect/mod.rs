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

//! Dialect configuration and registry.
//!
//! A [`Dialect`] is pure data: behavior flags, tokenizer settings, time
//! format mappings, and the parser's dispatch tables. Built-in dialects are
//! constructed by copying the base dialect and overriding entries, then
//! stored as shared singletons in a process-wide registry keyed by name.
//! [`get`] resolves a textual reference like `"postgres"` or
//! `"base, version=2.1"`; a version reference clones the singleton with
//! only the version replaced, leaving the registered instance untouched.

use core::fmt;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use log::info;

use crate::ast::Tag;
use crate::parser::{ParserTables, RangeEntry};
use crate::tokenizer::TokenizerSettings;
use crate::tokens::TokenType;
use crate::trie::{self, Trie};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialectError {
    UnknownDialect(String),
    InvalidVersion(String),
}

impl fmt::Display for DialectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DialectError::UnknownDialect(name) => write!(f, "unknown dialect: {name}"),
            DialectError::InvalidVersion(version) => {
                write!(f, "invalid dialect version: {version}")
            }
        }
    }
}

impl std::error::Error for DialectError {}

/// Where NULL sorts when an ORDER BY item does not say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullOrdering {
    /// NULL compares lower than every value.
    #[default]
    NullsAreSmall,
    /// NULL compares higher than every value.
    NullsAreLarge,
    /// NULL always sorts last, regardless of direction.
    NullsAreLast,
}

impl NullOrdering {
    pub fn nulls_first(&self, desc: bool) -> bool {
        match self {
            NullOrdering::NullsAreSmall => !desc,
            NullOrdering::NullsAreLarge => desc,
            NullOrdering::NullsAreLast => false,
        }
    }
}

/// Scalar behavior switches consulted during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DialectFlags {
    pub null_ordering: NullOrdering,
    /// First index of an array subscript.
    pub index_offset: usize,
    /// Whether `||` raises on non-string operands instead of coercing.
    pub strict_string_concat: bool,
    /// Whether CONCAT returns NULL on any NULL argument.
    pub concat_coalesce: bool,
    /// Whether `/` keeps integer typing for integer operands.
    pub typed_division: bool,
    /// Whether `/` yields NULL on division by zero.
    pub safe_division: bool,
    /// Whether LOG(x, y) means log base x of y.
    pub log_base_first: bool,
    /// Whether hex literals render lowercase.
    pub hex_lowercase: bool,
    /// Whether a hex string literal denotes an integer rather than bytes.
    pub hex_string_is_integer_type: bool,
}

/// One SQL dialect: a name, optional version, and every table the tokenizer
/// and parser dispatch through. Lazily derived tries are cached per
/// instance and excluded from equality.
#[derive(Debug, Clone)]
pub struct Dialect {
    pub name: String,
    pub version: Option<(u32, u32, u32)>,
    pub flags: DialectFlags,
    pub tokenizer: TokenizerSettings,
    /// Dialect time format tokens to canonical strftime tokens.
    pub time_mapping: HashMap<String, String>,
    pub parser: ParserTables,

    time_trie: OnceLock<Trie>,
    inverse_time_mapping: OnceLock<HashMap<String, String>>,
    inverse_time_trie: OnceLock<Trie>,
}

impl PartialEq for Dialect {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.flags == other.flags
            && self.tokenizer == other.tokenizer
            && self.time_mapping == other.time_mapping
            && self.parser == other.parser
    }
}

impl Dialect {
    pub fn new(name: impl Into<String>) -> Self {
        Dialect {
            name: name.into(),
            version: None,
            flags: DialectFlags::default(),
            tokenizer: TokenizerSettings::base(),
            time_mapping: HashMap::new(),
            parser: ParserTables::base(),
            time_trie: OnceLock::new(),
            inverse_time_mapping: OnceLock::new(),
            inverse_time_trie: OnceLock::new(),
        }
    }

    /// Translates a dialect-specific time format string into the canonical
    /// strftime vocabulary, longest token first.
    pub fn format_time(&self, value: &str) -> String {
        let time_trie = self
            .time_trie
            .get_or_init(|| Trie::build(self.time_mapping.keys()));
        trie::format_time(value, &self.time_mapping, time_trie)
    }

    /// The reverse translation, canonical strftime to dialect tokens.
    pub fn inverse_format_time(&self, value: &str) -> String {
        let mapping = self.inverse_time_mapping.get_or_init(|| {
            self.time_mapping
                .iter()
                .map(|(k, v)| (v.clone(), k.clone()))
                .collect()
        });
        let time_trie = self
            .inverse_time_trie
            .get_or_init(|| Trie::build(mapping.keys()));
        trie::format_time(value, mapping, time_trie)
    }
}

// ---- registry ----

fn registry() -> &'static RwLock<HashMap<String, Arc<Dialect>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<Dialect>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut dialects = HashMap::new();
        for dialect in [base(), postgres(), mysql(), bigquery()] {
            dialects.insert(dialect.name.to_lowercase(), Arc::new(dialect));
        }
        RwLock::new(dialects)
    })
}

/// Registers a dialect under its lowercased name, replacing any previous
/// entry. Lookups lowercase too, so mixed-case names stay reachable.
pub fn register(dialect: Dialect) {
    info!("registering dialect {:?}", dialect.name);
    let mut dialects = registry()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    dialects.insert(dialect.name.to_lowercase(), Arc::new(dialect));
}

/// Names of all registered dialects, sorted.
pub fn list() -> Vec<String> {
    let dialects = registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut names: Vec<String> = dialects.keys().cloned().collect();
    names.sort();
    names
}

/// Resolves a dialect reference: a name, optionally followed by
/// `, version=MAJOR[.MINOR[.PATCH]]`. The empty reference means the base
/// dialect. Name lookup is case-insensitive; a versioned reference returns
/// a copy of the singleton with only the version replaced.
pub fn get(reference: &str) -> Result<Arc<Dialect>, DialectError> {
    let mut segments = reference.split(',').map(str::trim);
    let name = match segments.next() {
        Some("") | None => "base",
        Some(name) => name,
    };

    let mut version = None;
    for segment in segments {
        if let Some(value) = segment.strip_prefix("version=") {
            version = Some(parse_version(value.trim())?);
        } else if !segment.is_empty() {
            return Err(DialectError::UnknownDialect(reference.to_string()));
        }
    }

    let dialect = get_or_err(name)?;

    match version {
        None => Ok(dialect),
        Some(version) => {
            let mut copy = Dialect::clone(&dialect);
            copy.version = Some(version);
            Ok(Arc::new(copy))
        }
    }
}

/// Case-insensitive registry lookup by bare name, no version handling.
pub fn get_or_err(name: &str) -> Result<Arc<Dialect>, DialectError> {
    let dialects = registry()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    dialects
        .get(&name.to_lowercase())
        .map(Arc::clone)
        .ok_or_else(|| DialectError::UnknownDialect(name.to_string()))
}

/// `MAJOR[.MINOR[.PATCH]]`; omitted components are zero.
fn parse_version(value: &str) -> Result<(u32, u32, u32), DialectError> {
    let invalid = || DialectError::InvalidVersion(value.to_string());
    let mut parts = value.split('.');
    let mut component = |required: bool| -> Result<u32, DialectError> {
        match parts.next() {
            Some(part) => part.parse().map_err(|_| invalid()),
            None if required => Err(invalid()),
            None => Ok(0),
        }
    };
    let major = component(true)?;
    let minor = component(false)?;
    let patch = component(false)?;
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok((major, minor, patch))
}

// ---- built-in dialects ----

fn base() -> Dialect {
    Dialect::new("base")
}

fn postgres() -> Dialect {
    let mut dialect = Dialect::new("postgres");
    dialect.flags.null_ordering = NullOrdering::NullsAreLarge;
    dialect.flags.typed_division = true;

    dialect.tokenizer.dollar_quoting = true;
    dialect.tokenizer.byte_strings = vec![
        (String::from("E'"), String::from("'")),
        (String::from("e'"), String::from("'")),
    ];
    dialect.tokenizer.bit_strings = vec![
        (String::from("B'"), String::from("'")),
        (String::from("b'"), String::from("'")),
    ];
    dialect.tokenizer.hex_strings = vec![
        (String::from("X'"), String::from("'")),
        (String::from("x'"), String::from("'")),
    ];

    // regex and operator-spelled LIKE matches
    dialect.parser.range.extend([
        (TokenType::DTilda, RangeEntry::Binary(Tag::Like)),
        (TokenType::DTildaStar, RangeEntry::Binary(Tag::ILike)),
        (TokenType::Tilda, RangeEntry::Binary(Tag::RegexpLike)),
        (TokenType::TildaStar, RangeEntry::Binary(Tag::RegexpILike)),
        (TokenType::NotTilda, RangeEntry::NegatedBinary(Tag::RegexpLike)),
        (
            TokenType::NotTildaStar,
            RangeEntry::NegatedBinary(Tag::RegexpILike),
        ),
        (TokenType::NotDTilda, RangeEntry::NegatedBinary(Tag::Like)),
        (TokenType::NotDTildaStar, RangeEntry::NegatedBinary(Tag::ILike)),
    ]);

    // ^ is exponentiation, not XOR
    dialect.parser.bitwise.remove(&TokenType::Caret);
    dialect.parser.exponent.insert(TokenType::Caret, Tag::Pow);

    dialect
}

fn mysql() -> Dialect {
    let mut dialect = Dialect::new("mysql");
    dialect.flags.null_ordering = NullOrdering::NullsAreSmall;
    dialect.flags.strict_string_concat = true;
    dialect.flags.concat_coalesce = true;
    dialect.flags.log_base_first = true;

    dialect.tokenizer.identifiers = vec![(String::from("`"), String::from("`"))];
    dialect.tokenizer.string_escapes = vec!['\'', '\\'];
    dialect.tokenizer.comments.push((String::from("#"), None));
    dialect.tokenizer.bit_strings = vec![
        (String::from("B'"), String::from("'")),
        (String::from("b'"), String::from("'")),
        (String::from("0b"), String::new()),
    ];
    dialect.tokenizer.hex_strings = vec![
        (String::from("X'"), String::from("'")),
        (String::from("x'"), String::from("'")),
        (String::from("0x"), String::new()),
    ];
    dialect.flags.hex_string_is_integer_type = true;

    dialect.time_mapping = [
        ("%M", "%B"),
        ("%c", "%-m"),
        ("%e", "%-d"),
        ("%h", "%I"),
        ("%i", "%M"),
        ("%s", "%S"),
        ("%u", "%W"),
    ]
    .into_iter()
    .map(|(k, v)| (String::from(k), String::from(v)))
    .collect();

    dialect
}

fn bigquery() -> Dialect {
    let mut dialect = Dialect::new("bigquery");
    dialect.flags.null_ordering = NullOrdering::NullsAreLast;
    dialect.flags.safe_division = true;
    dialect.flags.log_base_first = true;

    dialect.tokenizer.identifiers = vec![(String::from("`"), String::from("`"))];
    dialect.tokenizer.quotes = vec![
        (String::from("'''"), String::from("'''")),
        (String::from("\"\"\""), String::from("\"\"\"")),
        (String::from("'"), String::from("'")),
        (String::from("\""), String::from("\"")),
    ];
    dialect.tokenizer.string_escapes = vec!['\\'];
    dialect.tokenizer.byte_strings = vec![
        (String::from("B'"), String::from("'")),
        (String::from("b'"), String::from("'")),
    ];
    dialect.tokenizer.numbers_can_be_underscore_separated = true;

    dialect
}
