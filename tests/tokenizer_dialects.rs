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

//! Tokenizer behavior that differs per dialect, plus the span and comment
//! guarantees every dialect shares.

use pretty_assertions::assert_eq;

use sqlweave::dialect;
use sqlweave::tokenizer::Tokenizer;
use sqlweave::tokens::{Token, TokenType};

fn tokenize(sql: &str, dialect_ref: &str) -> Vec<Token> {
    let dialect = dialect::get(dialect_ref).unwrap();
    Tokenizer::new(&dialect.tokenizer)
        .tokenize(sql)
        .unwrap_or_else(|e| panic!("failed to tokenize {sql:?}: {e}"))
}

#[test]
fn test_spans_reconstruct_source_outside_whitespace() {
    let sql = "SELECT a , 1 + 2 FROM t";
    let rebuilt: String = tokenize(sql, "base")
        .iter()
        .map(|t| &sql[t.start..t.end])
        .collect();
    let stripped: String = sql.split_whitespace().collect();
    assert_eq!(rebuilt, stripped);
}

#[test]
fn test_string_span_covers_quotes_but_text_is_decoded() {
    let sql = "SELECT 'a b'";
    let tokens = tokenize(sql, "base");
    assert_eq!(tokens[1].token_type, TokenType::String);
    assert_eq!(tokens[1].text, "a b");
    assert_eq!(&sql[tokens[1].start..tokens[1].end], "'a b'");
}

#[test]
fn test_multi_word_keywords_fuse() {
    let tokens = tokenize("GROUP BY ORDER BY", "base");
    assert_eq!(tokens[0].token_type, TokenType::GroupBy);
    assert_eq!(tokens[1].token_type, TokenType::OrderBy);

    // a lone prefix of a multi-word keyword stays a plain word
    let tokens = tokenize("GROUP x", "base");
    assert_eq!(tokens[0].token_type, TokenType::Var);
    assert_eq!(tokens[0].text, "GROUP");
}

#[test]
fn test_keywords_are_case_insensitive() {
    let tokens = tokenize("select From", "base");
    assert_eq!(tokens[0].token_type, TokenType::Select);
    assert_eq!(tokens[0].text, "select");
    assert_eq!(tokens[1].token_type, TokenType::From);
}

#[test]
fn test_line_and_column_tracking() {
    let tokens = tokenize("SELECT\n  a", "base");
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[0].col, 1);
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[1].col, 3);
}

#[test]
fn test_leading_comment_attaches_to_next_token() {
    let tokens = tokenize("-- intro\nSELECT 1", "base");
    assert_eq!(tokens[0].token_type, TokenType::Select);
    assert_eq!(tokens[0].comments, vec![String::from(" intro")]);
}

#[test]
fn test_comment_before_semicolon_attaches_to_previous_token() {
    let tokens = tokenize("SELECT 1 /* note */;", "base");
    assert_eq!(tokens[1].token_type, TokenType::Number);
    assert_eq!(tokens[1].comments, vec![String::from(" note ")]);
    assert_eq!(tokens[2].token_type, TokenType::Semicolon);
}

#[test]
fn test_nested_block_comments() {
    let tokens = tokenize("SELECT /* a /* b */ c */ 1", "base");
    assert_eq!(tokens[1].token_type, TokenType::Number);
    assert_eq!(tokens[1].comments, vec![String::from(" a /* b */ c ")]);
}

#[test]
fn test_mysql_backtick_identifiers() {
    let tokens = tokenize("SELECT `my col` FROM t", "mysql");
    assert_eq!(tokens[1].token_type, TokenType::Identifier);
    assert_eq!(tokens[1].text, "my col");
}

#[test]
fn test_mysql_hash_comments() {
    let tokens = tokenize("SELECT 1 # trailing", "mysql");
    assert_eq!(tokens[1].comments, vec![String::from(" trailing")]);
}

#[test]
fn test_mysql_hex_literals() {
    let tokens = tokenize("SELECT 0x1A, x'2b'", "mysql");
    assert_eq!(tokens[1].token_type, TokenType::HexString);
    assert_eq!(tokens[1].text, "1A");
    assert_eq!(tokens[3].token_type, TokenType::HexString);
    assert_eq!(tokens[3].text, "2b");
}

#[test]
fn test_hex_prefix_without_digits_degrades_to_zero() {
    let tokens = tokenize("0xg", "mysql");
    assert_eq!(tokens[0].token_type, TokenType::Number);
    assert_eq!(tokens[0].text, "0");
    assert_eq!(tokens[1].token_type, TokenType::Var);
    assert_eq!(tokens[1].text, "xg");
}

#[test]
fn test_postgres_dollar_quoted_strings() {
    let tokens = tokenize("SELECT $$plain$$, $fn$body $ text$fn$", "postgres");
    assert_eq!(tokens[1].token_type, TokenType::String);
    assert_eq!(tokens[1].text, "plain");
    assert_eq!(tokens[3].token_type, TokenType::String);
    assert_eq!(tokens[3].text, "body $ text");
}

#[test]
fn test_postgres_escape_strings_decode_backslashes() {
    let tokens = tokenize(r"SELECT E'a\nb'", "postgres");
    assert_eq!(tokens[1].token_type, TokenType::ByteString);
    assert_eq!(tokens[1].text, "a\nb");
}

#[test]
fn test_bigquery_underscore_separated_numbers() {
    let tokens = tokenize("SELECT 1_000_000", "bigquery");
    assert_eq!(tokens[1].token_type, TokenType::Number);
    assert_eq!(tokens[1].text, "1000000");

    // without the dialect flag the underscore splits the token
    let tokens = tokenize("SELECT 1_000", "base");
    assert_eq!(tokens[1].token_type, TokenType::Number);
    assert_eq!(tokens[1].text, "1");
    assert_eq!(tokens[2].token_type, TokenType::Var);
}

#[test]
fn test_bigquery_triple_quoted_strings() {
    let tokens = tokenize("SELECT '''it's fine'''", "bigquery");
    assert_eq!(tokens[1].token_type, TokenType::String);
    assert_eq!(tokens[1].text, "it's fine");
}

#[test]
fn test_quote_doubling_escapes() {
    let tokens = tokenize("SELECT 'it''s'", "base");
    assert_eq!(tokens[1].token_type, TokenType::String);
    assert_eq!(tokens[1].text, "it's");
}

#[test]
fn test_national_strings() {
    let tokens = tokenize("SELECT N'abc'", "base");
    assert_eq!(tokens[1].token_type, TokenType::NationalString);
    assert_eq!(tokens[1].text, "abc");
}

#[test]
fn test_unterminated_string_errors() {
    let dialect = dialect::get("base").unwrap();
    let err = Tokenizer::new(&dialect.tokenizer)
        .tokenize("SELECT 'oops")
        .unwrap_err();
    assert!(err.message.contains("Unterminated"), "{err}");
}

#[test]
fn test_scientific_notation_exponent_is_lowercased() {
    let tokens = tokenize("SELECT 1.5E10", "base");
    assert_eq!(tokens[1].token_type, TokenType::Number);
    assert_eq!(tokens[1].text, "1.5e10");
}

#[test]
fn test_postgres_operator_lexemes() {
    let kinds: Vec<TokenType> = tokenize("a !~* b <@ c @> d ^@ e", "postgres")
        .into_iter()
        .map(|t| t.token_type)
        .collect();
    assert!(kinds.contains(&TokenType::NotTildaStar));
    assert!(kinds.contains(&TokenType::LtAt));
    assert!(kinds.contains(&TokenType::AtGt));
    assert!(kinds.contains(&TokenType::CaretAt));
}

#[test]
fn test_negated_like_operator_lexemes() {
    let kinds: Vec<TokenType> = tokenize("a !~~ b !~~* c", "postgres")
        .into_iter()
        .map(|t| t.token_type)
        .collect();
    assert!(kinds.contains(&TokenType::NotDTilda));
    assert!(kinds.contains(&TokenType::NotDTildaStar));
}

#[test]
fn test_escape_char_before_ordinary_char_stays_verbatim() {
    let tokens = tokenize(r"SELECT 'a\qb'", "mysql");
    assert_eq!(tokens[1].token_type, TokenType::String);
    assert_eq!(tokens[1].text, r"a\qb");
}

#[test]
fn test_escape_char_before_delimiter_and_escape() {
    let tokens = tokenize(r"SELECT 'a\'b', 'c\\d'", "mysql");
    assert_eq!(tokens[1].text, "a'b");
    assert_eq!(tokens[3].text, r"c\\d");
}
