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

//! Statement parsing outside of queries: session statements, transaction
//! control, DML, and the structured subset of DDL. Statement forms whose
//! grammar is not modeled fall through to opaque command nodes, either
//! directly (ALTER, MERGE, COPY, ANALYZE) or through the guarded wrappers
//! that retry a failed structured parse as a command.

use crate::ast::{self, Node, Tag};
use crate::tokens::TokenType;

use super::{Parser, ParserError};

pub(crate) fn parse_as_command(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.parse_command()
}

pub(crate) fn guarded_insert(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.parse_or_command(parse_insert)
}

pub(crate) fn guarded_update(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.parse_or_command(parse_update)
}

pub(crate) fn guarded_delete(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.parse_or_command(parse_delete)
}

pub(crate) fn guarded_create(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.parse_or_command(parse_create)
}

pub(crate) fn guarded_drop(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.parse_or_command(parse_drop)
}

pub(crate) fn guarded_truncate(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.parse_or_command(parse_truncate)
}

pub(crate) fn guarded_show(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.parse_or_command(parse_show)
}

pub(crate) fn guarded_describe(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.parse_or_command(parse_describe)
}

pub(crate) fn parse_use(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Use)?;
    let mut node = Node::new(Tag::Use);
    for kind in ["DATABASE", "SCHEMA", "WAREHOUSE", "ROLE", "CATALOG"] {
        if parser.match_text(kind) {
            node.set("kind", kind);
            break;
        }
    }
    node.set("this", parser.parse_table()?);
    Ok(node)
}

pub(crate) fn parse_set(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Set)?;
    let items = parser.parse_csv(parse_set_item)?;
    Ok(Node::new(Tag::SetStatement).with("expressions", items))
}

fn parse_set_item(parser: &mut Parser) -> Result<Node, ParserError> {
    let dialect = parser.dialect;
    let upper = parser.current().text.to_uppercase();
    if let Some(item_parser) = dialect.parser.set_items.get(&upper) {
        return item_parser(parser);
    }
    parse_set_item_assignment(parser)
}

/// `SET GLOBAL x = 1` and friends; positioned at the scope word.
pub(crate) fn parse_set_item_scoped(parser: &mut Parser) -> Result<Node, ParserError> {
    let scope = parser.advance().text.to_uppercase();
    let mut item = parse_set_item_assignment(parser)?;
    if scope == "GLOBAL" {
        item.set("global", true);
    }
    item.set("kind", scope);
    Ok(item)
}

fn parse_set_item_assignment(parser: &mut Parser) -> Result<Node, ParserError> {
    // `x = 1` parses as an equality at the expression level
    let assignment = parser.parse_expression()?;
    Ok(Node::new(Tag::SetItem).with("this", assignment))
}

pub(crate) fn parse_transaction(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Begin)?;
    let mut node = Node::new(Tag::Transaction);
    if parser.match_text("TRANSACTION") {
        node.set("this", ast::var("TRANSACTION"));
    } else if parser.match_text("WORK") {
        node.set("this", ast::var("WORK"));
    }
    let mut modes = Vec::new();
    while matches!(parser.current_type(), TokenType::Var) {
        let mode = parser.advance().text.to_uppercase();
        modes.push(ast::var(mode));
        parser.match_(TokenType::Comma);
    }
    if !modes.is_empty() {
        node.set("modes", modes);
    }
    Ok(node)
}

pub(crate) fn parse_commit(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Commit)?;
    let mut node = Node::new(Tag::Commit);
    if !parser.match_text("TRANSACTION") {
        parser.match_text("WORK");
    }
    if parser.match_text_seq(&["AND", "NO", "CHAIN"]) {
        node.set("chain", false);
    } else if parser.match_text_seq(&["AND", "CHAIN"]) {
        node.set("chain", true);
    }
    Ok(node)
}

pub(crate) fn parse_rollback(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Rollback)?;
    let mut node = Node::new(Tag::Rollback);
    if !parser.match_text("TRANSACTION") {
        parser.match_text("WORK");
    }
    if parser.match_text("TO") {
        parser.match_text("SAVEPOINT");
        node.set("savepoint", parser.parse_identifier()?);
    }
    Ok(node)
}

fn parse_insert(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Insert)?;
    let mut node = Node::new(Tag::Insert);
    if parser.match_text("OVERWRITE") {
        node.set("overwrite", true);
        parser.match_(TokenType::Table);
    } else {
        parser.match_(TokenType::Into);
    }
    node.set("this", parser.parse_table()?);

    if parser.current_type() == TokenType::LParen {
        let columns = parser.try_parse(|p| {
            p.expect(TokenType::LParen)?;
            let columns = p.parse_csv(Parser::parse_identifier)?;
            p.expect(TokenType::RParen)?;
            // only a plain name list followed by a source is a column list
            if !matches!(
                p.current_type(),
                TokenType::Values | TokenType::Select | TokenType::With | TokenType::LParen
            ) {
                return Err(ParserError::Syntax {
                    message: String::from("not a column list"),
                    errors: Vec::new(),
                });
            }
            Ok(columns)
        });
        if let Some(columns) = columns {
            node.set("columns", columns);
        }
    }

    match parser.current_type() {
        TokenType::Values => {
            node.set("expression", parser.parse_values()?);
        }
        TokenType::Select | TokenType::With | TokenType::LParen => {
            node.set("expression", parser.parse_statement()?);
        }
        _ => {
            parser.raise_error("Expected VALUES or query in INSERT")?;
        }
    }
    Ok(node)
}

fn parse_update(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Update)?;
    let mut node = Node::new(Tag::Update).with("this", parser.parse_table()?);
    parser.expect(TokenType::Set)?;
    node.set("expressions", parser.parse_csv(Parser::parse_expression)?);
    if parser.match_(TokenType::From) {
        node.set("from", Node::new(Tag::From).with("this", parser.parse_table()?));
    }
    if parser.match_(TokenType::Where) {
        let condition = parser.parse_expression()?;
        node.set("where", Node::new(Tag::Where).with("this", condition));
    }
    Ok(node)
}

fn parse_delete(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Delete)?;
    parser.match_(TokenType::From);
    let mut node = Node::new(Tag::Delete).with("this", parser.parse_table()?);
    if parser.match_(TokenType::Using) {
        node.set("using", parser.parse_csv(Parser::parse_table)?);
    }
    if parser.match_(TokenType::Where) {
        let condition = parser.parse_expression()?;
        node.set("where", Node::new(Tag::Where).with("this", condition));
    }
    Ok(node)
}

fn parse_create(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Create)?;
    let mut node = Node::new(Tag::Create);
    if parser.match_text_seq(&["OR", "REPLACE"]) {
        node.set("replace", true);
    }
    if parser.match_(TokenType::Temporary) {
        node.set("temporary", true);
    }
    let kind = match parser.current_type() {
        TokenType::Table => {
            parser.advance();
            String::from("TABLE")
        }
        TokenType::View => {
            parser.advance();
            String::from("VIEW")
        }
        TokenType::Var => parser.advance().text.to_uppercase(),
        _ => {
            parser.raise_error("Expected object kind in CREATE")?;
            String::new()
        }
    };
    node.set("kind", kind);
    if parser.match_text_seq(&["IF", "NOT", "EXISTS"]) {
        node.set("exists", true);
    }

    let name = parser.parse_table()?;
    if parser.current_type() == TokenType::LParen {
        parser.advance();
        let columns = parser.parse_csv(parse_column_def)?;
        parser.expect(TokenType::RParen)?;
        node.set(
            "this",
            Node::new(Tag::Schema)
                .with("this", name)
                .with("expressions", columns),
        );
    } else {
        node.set("this", name);
    }

    if parser.match_(TokenType::As) {
        node.set("expression", parser.parse_statement()?);
    }
    Ok(node)
}

fn parse_column_def(parser: &mut Parser) -> Result<Node, ParserError> {
    let name = parser.parse_identifier()?;
    let mut column = Node::new(Tag::ColumnDef).with("this", name);
    if !matches!(parser.current_type(), TokenType::Comma | TokenType::RParen) {
        column.set("kind", parser.parse_data_type()?);
    }
    let mut constraints = Vec::new();
    while !matches!(
        parser.current_type(),
        TokenType::Comma | TokenType::RParen | TokenType::Eof
    ) {
        let word = parser.advance().text.to_uppercase();
        constraints.push(ast::var(word));
    }
    if !constraints.is_empty() {
        column.set("constraints", constraints);
    }
    Ok(column)
}

fn parse_drop(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Drop)?;
    let mut node = Node::new(Tag::Drop);
    if parser.match_(TokenType::Temporary) {
        node.set("temporary", true);
    }
    let kind = match parser.current_type() {
        TokenType::Table => {
            parser.advance();
            String::from("TABLE")
        }
        TokenType::View => {
            parser.advance();
            String::from("VIEW")
        }
        TokenType::Var => parser.advance().text.to_uppercase(),
        _ => {
            parser.raise_error("Expected object kind in DROP")?;
            String::new()
        }
    };
    node.set("kind", kind);
    if parser.match_text_seq(&["IF", "EXISTS"]) {
        node.set("exists", true);
    }
    node.set("this", parser.parse_table()?);
    if parser.match_text("CASCADE") {
        node.set("cascade", true);
    } else {
        parser.match_text("RESTRICT");
    }
    Ok(node)
}

fn parse_truncate(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Truncate)?;
    parser.match_(TokenType::Table);
    let tables = parser.parse_csv(Parser::parse_table)?;
    Ok(Node::new(Tag::TruncateTable).with("expressions", tables))
}

fn parse_show(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Show)?;
    if !matches!(parser.current_type(), TokenType::Var) {
        parser.raise_error("Expected SHOW target")?;
        return Ok(Node::new(Tag::Show).with("this", ast::var("")));
    }
    let target = parser.advance().text.to_uppercase();
    Ok(Node::new(Tag::Show).with("this", ast::var(target)))
}

fn parse_describe(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::Describe)?;
    let mut node = Node::new(Tag::Describe);
    if parser.match_(TokenType::Table) {
        node.set("kind", "TABLE");
    }
    node.set("this", parser.parse_table()?);
    Ok(node)
}
