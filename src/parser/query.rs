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

//! Query parsing: SELECT and its clauses, table factors and joins, set
//! operations, VALUES, and WITH. Clause order is enforced structurally: the
//! modifier parsers run once in dialect-table order, so a clause appearing
//! too late is simply never consumed and surfaces as a trailing-token error.

use crate::ast::{self, Capability, Node, Tag};
use crate::tokens::TokenType;

use super::{Parser, ParserError};

/// Plain words that never serve as an implicit alias; they introduce
/// clauses that follow a table or projection without a keyword token.
const NON_ALIAS_WORDS: &[&str] = &["FOR", "OF", "ONLY", "REPEATABLE"];

pub(crate) fn parse_select_statement(parser: &mut Parser) -> Result<Node, ParserError> {
    let select = parser.parse_select()?;
    parser.maybe_parse_set_operations(select)
}

/// `FROM t SELECT ...`: the leading FROM clause is parsed first and grafted
/// onto the SELECT that follows.
pub(crate) fn parse_from_first(parser: &mut Parser) -> Result<Node, ParserError> {
    let (from, joins, laterals) = parser.parse_from()?;
    if parser.current_type() != TokenType::Select {
        parser.raise_error("Expected SELECT after leading FROM clause")?;
        let mut select = Node::new(Tag::Select);
        select.set("from", from);
        return Ok(select);
    }
    let mut select = parser.parse_select()?;
    if select.get("from").is_none() {
        select.set("from", from);
        if !joins.is_empty() {
            select.set("joins", joins);
        }
        if !laterals.is_empty() {
            select.set("laterals", laterals);
        }
    }
    parser.maybe_parse_set_operations(select)
}

pub(crate) fn parse_values_statement(parser: &mut Parser) -> Result<Node, ParserError> {
    let values = parser.parse_values()?;
    parser.maybe_parse_set_operations(values)
}

pub(crate) fn parse_with_statement(parser: &mut Parser) -> Result<Node, ParserError> {
    parser.expect(TokenType::With)?;
    let mut with = Node::new(Tag::With);
    if parser.match_(TokenType::Recursive) {
        with.set("recursive", true);
    }
    with.set("expressions", parser.parse_csv(Parser::parse_cte)?);

    // graft onto the statement that follows, or wrap the remainder as a
    // command when the statement form cannot carry a WITH clause
    let index = parser.index();
    let errors = parser.errors_len();
    match parser.parse_statement() {
        Ok(mut node) if node.descriptor().declares("with") => {
            node.set("with", with);
            Ok(node)
        }
        _ => {
            parser.set_index(index);
            parser.truncate_errors(errors);
            let mut command = parser.parse_command()?;
            command.set("with", with);
            Ok(command)
        }
    }
}

impl<'a> Parser<'a> {
    fn parse_cte(&mut self) -> Result<Node, ParserError> {
        let name = self.parse_identifier()?;
        let mut alias = Node::new(Tag::TableAlias).with("this", name);
        if self.current_type() == TokenType::LParen {
            self.advance();
            alias.set("columns", self.parse_csv(Self::parse_identifier)?);
            self.expect(TokenType::RParen)?;
        }
        let mut cte = Node::new(Tag::Cte).with("alias", alias);
        if self.match_(TokenType::Using) && self.match_text("KEY") {
            self.expect(TokenType::LParen)?;
            cte.set("key", self.parse_csv(Self::parse_identifier)?);
            self.expect(TokenType::RParen)?;
        }
        self.expect(TokenType::As)?;
        if self.match_text_seq(&["NOT", "MATERIALIZED"]) {
            cte.set("materialized", false);
        } else if self.match_(TokenType::Materialized) {
            cte.set("materialized", true);
        }
        self.expect(TokenType::LParen)?;
        let query = self.parse_statement()?;
        self.expect(TokenType::RParen)?;
        cte.set("this", query);
        Ok(cte)
    }

    pub(crate) fn parse_select(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::Select)?;
        let mut select = Node::new(Tag::Select);

        if self.match_(TokenType::Distinct) {
            let mut distinct = Node::new(Tag::Distinct);
            if self.match_(TokenType::On) {
                self.expect(TokenType::LParen)?;
                distinct.set("on", self.parse_csv(Self::parse_expression)?);
                self.expect(TokenType::RParen)?;
            }
            select.set("distinct", distinct);
        } else {
            self.match_(TokenType::All);
        }

        select.set("expressions", self.parse_csv(Self::parse_projection)?);

        if self.current_type() == TokenType::From {
            let (from, joins, laterals) = self.parse_from()?;
            select.set("from", from);
            if !joins.is_empty() {
                select.set("joins", joins);
            }
            if !laterals.is_empty() {
                select.set("laterals", laterals);
            }
        }

        self.parse_query_modifiers(&mut select)?;
        Ok(select)
    }

    fn parse_projection(&mut self) -> Result<Node, ParserError> {
        let expression = self.parse_expression()?;
        self.maybe_parse_alias(expression)
    }

    /// `expr [AS] name`; without AS, only a plain word or quoted identifier
    /// is treated as an alias so clause keywords stay available.
    fn maybe_parse_alias(&mut self, expression: Node) -> Result<Node, ParserError> {
        if self.match_(TokenType::As) {
            let name = self.parse_identifier()?;
            return Ok(ast::alias(expression, name));
        }
        if self.can_implicit_alias() {
            let name = self.parse_identifier()?;
            return Ok(ast::alias(expression, name));
        }
        Ok(expression)
    }

    fn can_implicit_alias(&self) -> bool {
        match self.current_type() {
            TokenType::Identifier => true,
            TokenType::Var => {
                let upper = self.current().text.to_uppercase();
                !NON_ALIAS_WORDS.contains(&upper.as_str())
            }
            _ => false,
        }
    }

    /// The FROM clause with its joins and laterals. Comma-separated tables
    /// become joins with no kind, preserving the implicit-join spelling.
    fn parse_from(&mut self) -> Result<(Node, Vec<Node>, Vec<Node>), ParserError> {
        self.expect(TokenType::From)?;
        let from = Node::new(Tag::From).with("this", self.parse_table()?);
        let mut joins = Vec::new();
        let mut laterals = Vec::new();
        loop {
            if self.match_(TokenType::Comma) {
                joins.push(Node::new(Tag::Join).with("this", self.parse_table()?));
            } else if self.current_type() == TokenType::Lateral {
                laterals.push(self.parse_lateral()?);
            } else if let Some(join) = self.parse_join()? {
                if join.tag == Tag::Lateral {
                    laterals.push(join);
                } else {
                    joins.push(join);
                }
            } else {
                break;
            }
        }
        Ok((from, joins, laterals))
    }

    fn parse_join(&mut self) -> Result<Option<Node>, ParserError> {
        let index = self.index();
        let method = match self.match_any(&[TokenType::Natural, TokenType::Asof]) {
            Some(TokenType::Natural) => Some("NATURAL"),
            Some(_) => Some("ASOF"),
            None if self.current_type() == TokenType::Var && self.match_text("POSITIONAL") => {
                Some("POSITIONAL")
            }
            None => None,
        };
        let side = match self.match_any(&[TokenType::Left, TokenType::Right, TokenType::Full]) {
            Some(TokenType::Left) => Some("LEFT"),
            Some(TokenType::Right) => Some("RIGHT"),
            Some(_) => Some("FULL"),
            None => None,
        };
        let kind = match self.match_any(&[
            TokenType::Inner,
            TokenType::Outer,
            TokenType::Cross,
            TokenType::Semi,
            TokenType::Anti,
        ]) {
            Some(TokenType::Inner) => Some("INNER"),
            Some(TokenType::Outer) => Some("OUTER"),
            Some(TokenType::Cross) => Some("CROSS"),
            Some(TokenType::Semi) => Some("SEMI"),
            Some(_) => Some("ANTI"),
            None => None,
        };
        if matches!(kind, Some("CROSS") | Some("OUTER"))
            && method.is_none()
            && side.is_none()
            && self.match_text("APPLY")
        {
            let mut lateral = Node::new(Tag::Lateral).with("this", self.parse_table()?);
            lateral.set("cross_apply", kind == Some("CROSS"));
            return Ok(Some(lateral));
        }
        if !self.match_(TokenType::Join) {
            self.set_index(index);
            return Ok(None);
        }

        let mut join = Node::new(Tag::Join).with("this", self.parse_table()?);
        if let Some(method) = method {
            join.set("method", method);
        }
        if let Some(side) = side {
            join.set("side", side);
        }
        if let Some(kind) = kind {
            join.set("kind", kind);
        }
        if self.match_(TokenType::On) {
            join.set("on", self.parse_expression()?);
        } else if self.match_(TokenType::Using) {
            self.expect(TokenType::LParen)?;
            join.set("using", self.parse_csv(Self::parse_identifier)?);
            self.expect(TokenType::RParen)?;
        }
        Ok(Some(join))
    }

    fn parse_lateral(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::Lateral)?;
        let this = self.parse_table()?;
        Ok(Node::new(Tag::Lateral).with("this", this))
    }

    /// One table factor: a derived table, UNNEST, a table function, or a
    /// dotted table name, each with optional alias, pivots, and sample.
    pub(crate) fn parse_table(&mut self) -> Result<Node, ParserError> {
        let mut table = match self.current_type() {
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_statement()?;
                self.expect(TokenType::RParen)?;
                ast::subquery(inner)
            }
            TokenType::Unnest => self.parse_unnest()?,
            TokenType::String => {
                let text = self.advance().text.clone();
                Node::new(Tag::Table).with("this", ast::string_literal(text))
            }
            _ => {
                let mut parts = vec![self.parse_identifier()?];
                while self.match_(TokenType::Dot) {
                    parts.push(self.parse_identifier()?);
                }
                if parts.len() == 1 && self.current_type() == TokenType::LParen {
                    let name = parts[0].text("this").to_string();
                    self.advance();
                    let args = if self.current_type() == TokenType::RParen {
                        Vec::new()
                    } else {
                        self.parse_csv(Self::parse_expression)?
                    };
                    self.expect(TokenType::RParen)?;
                    Node::new(Tag::Table).with("this", ast::func(name, args))
                } else {
                    let mut table = Node::new(Tag::Table);
                    if let Some(name) = parts.pop() {
                        table.set("this", name);
                    }
                    if let Some(db) = parts.pop() {
                        table.set("db", db);
                    }
                    if let Some(catalog) = parts.pop() {
                        table.set("catalog", catalog);
                    }
                    table
                }
            }
        };

        if let Some(alias) = self.parse_table_alias()? {
            table.set("alias", alias);
        }
        while matches!(self.current_type(), TokenType::Pivot | TokenType::Unpivot) {
            let pivot = self.parse_pivot()?;
            table.append("pivots", pivot);
        }
        if self.current_type() == TokenType::TableSample {
            let sample = self.parse_table_sample()?;
            table.set("sample", sample);
        }
        Ok(table)
    }

    fn parse_table_alias(&mut self) -> Result<Option<Node>, ParserError> {
        let explicit = self.match_(TokenType::As);
        if !explicit && !self.can_implicit_alias() {
            return Ok(None);
        }
        let name = self.parse_identifier()?;
        let mut alias = Node::new(Tag::TableAlias).with("this", name);
        if self.current_type() == TokenType::LParen {
            self.advance();
            alias.set("columns", self.parse_csv(Self::parse_identifier)?);
            self.expect(TokenType::RParen)?;
        }
        Ok(Some(alias))
    }

    fn parse_unnest(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::Unnest)?;
        self.expect(TokenType::LParen)?;
        let expressions = self.parse_csv(Self::parse_expression)?;
        self.expect(TokenType::RParen)?;
        let mut unnest = Node::new(Tag::Unnest).with("expressions", expressions);
        if let Some(alias) = self.parse_table_alias()? {
            unnest.set("alias", alias);
        }
        if self.match_pair(TokenType::With, TokenType::Offset) {
            if matches!(self.current_type(), TokenType::Var | TokenType::Identifier) {
                unnest.set("offset", self.parse_identifier()?);
            } else {
                unnest.set("offset", true);
            }
        }
        Ok(unnest)
    }

    fn parse_pivot(&mut self) -> Result<Node, ParserError> {
        let unpivot = self.current_type() == TokenType::Unpivot;
        self.advance();
        self.expect(TokenType::LParen)?;
        let expressions = self.parse_csv(Self::parse_projection)?;
        let mut pivot = Node::new(Tag::Pivot).with("expressions", expressions);
        if unpivot {
            pivot.set("unpivot", true);
        }
        if self.match_text("FOR") {
            let field = self.parse_identifier()?;
            self.expect(TokenType::In)?;
            self.expect(TokenType::LParen)?;
            let values = self.parse_csv(Self::parse_projection)?;
            self.expect(TokenType::RParen)?;
            pivot.set(
                "field",
                Node::new(Tag::In)
                    .with("this", field)
                    .with("expressions", values),
            );
        }
        self.expect(TokenType::RParen)?;
        if let Some(alias) = self.parse_table_alias()? {
            pivot.set("alias", alias);
        }
        Ok(pivot)
    }

    fn parse_table_sample(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::TableSample)?;
        let mut sample = Node::new(Tag::TableSample);
        if matches!(self.current_type(), TokenType::Var)
            && self.peek(1).token_type == TokenType::LParen
        {
            let method = self.advance().text.to_uppercase();
            sample.set("method", ast::var(method));
        }
        self.expect(TokenType::LParen)?;
        let value = self.parse_expression()?;
        if self.match_text("PERCENT") || self.match_(TokenType::Percent) {
            sample.set("percent", value);
        } else if self.match_(TokenType::Rows) {
            sample.set("size", value);
        } else {
            sample.set("percent", value);
        }
        self.expect(TokenType::RParen)?;
        if self.match_text("REPEATABLE") {
            self.expect(TokenType::LParen)?;
            sample.set("seed", self.parse_expression()?);
            self.expect(TokenType::RParen)?;
        }
        Ok(sample)
    }

    /// Runs the dialect's modifier parsers once, in order. A clause spelled
    /// out of order is left unconsumed for the caller to reject.
    pub(crate) fn parse_query_modifiers(&mut self, node: &mut Node) -> Result<(), ParserError> {
        let dialect = self.dialect;
        for modifier in &dialect.parser.modifiers {
            modifier(self, node)?;
        }
        Ok(())
    }

    pub(crate) fn parse_order(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::OrderBy)?;
        let mut order = Node::new(Tag::Order);
        if self.match_(TokenType::All) {
            order.set("all", true);
            order.set("expressions", Vec::<Node>::new());
            return Ok(order);
        }
        order.set("expressions", self.parse_csv(Self::parse_ordered)?);
        Ok(order)
    }

    fn parse_ordered(&mut self) -> Result<Node, ParserError> {
        let this = self.parse_expression()?;
        let desc = if self.match_(TokenType::Desc) {
            true
        } else {
            self.match_(TokenType::Asc);
            false
        };
        let nulls_first = if self.match_text_seq(&["NULLS", "FIRST"]) {
            true
        } else if self.match_text_seq(&["NULLS", "LAST"]) {
            false
        } else {
            self.dialect.flags.null_ordering.nulls_first(desc)
        };
        let mut ordered = Node::new(Tag::Ordered).with("this", this);
        if desc {
            ordered.set("desc", true);
        }
        ordered.set("nulls_first", nulls_first);
        Ok(ordered)
    }

    pub(crate) fn parse_values(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::Values)?;
        let rows = self.parse_csv(|p| {
            p.expect(TokenType::LParen)?;
            let row = p.parse_csv(Self::parse_expression)?;
            p.expect(TokenType::RParen)?;
            Ok(Node::new(Tag::Tuple).with("expressions", row))
        })?;
        let mut values = Node::new(Tag::Values).with("expressions", rows);
        if let Some(alias) = self.parse_table_alias()? {
            values.set("alias", alias);
        }
        Ok(values)
    }

    /// Chains UNION / INTERSECT / EXCEPT strictly left to right; no
    /// precedence distinction is made between the operators.
    pub(crate) fn maybe_parse_set_operations(&mut self, this: Node) -> Result<Node, ParserError> {
        let mut this = this;
        loop {
            let tag = match self.current_type() {
                TokenType::Union => Tag::Union,
                TokenType::Intersect => Tag::Intersect,
                TokenType::Except => Tag::Except,
                _ => return Ok(this),
            };
            self.advance();
            let distinct = !self.match_(TokenType::All);
            if distinct {
                self.match_(TokenType::Distinct);
            }
            let by_name = self.match_text_seq(&["BY", "NAME"]);

            let right = match self.current_type() {
                TokenType::Select => self.parse_select()?,
                TokenType::Values => self.parse_values()?,
                TokenType::LParen => {
                    self.advance();
                    let inner = self.parse_statement()?;
                    self.expect(TokenType::RParen)?;
                    ast::subquery(inner)
                }
                _ => {
                    self.raise_error("Expected query after set operation")?;
                    Node::new(Tag::Select)
                }
            };

            let mut node = Node::new(tag).with("this", this).with("expression", right);
            node.set("distinct", distinct);
            if by_name {
                node.set("by_name", true);
            }
            debug_assert!(node.tag.has_capability(Capability::Query));
            this = node;
        }
    }
}

// ---- query modifier table entries ----

pub(crate) fn modifier_match_recognize(
    parser: &mut Parser,
    node: &mut Node,
) -> Result<bool, ParserError> {
    if !parser.match_text("MATCH_RECOGNIZE") {
        return Ok(false);
    }
    parser.expect(TokenType::LParen)?;
    let mut mr = Node::new(Tag::MatchRecognize);
    if parser.match_(TokenType::PartitionBy) {
        mr.set("partition_by", parser.parse_csv(Parser::parse_expression)?);
    }
    if parser.current_type() == TokenType::OrderBy {
        mr.set("order", parser.parse_order()?);
    }
    if parser.match_text("MEASURES") {
        let measures = parser.parse_csv(|p| {
            let expression = p.parse_expression()?;
            p.maybe_parse_alias(expression)
        })?;
        mr.set("measures", measures);
    }
    if parser.match_text("PATTERN") {
        parser.expect(TokenType::LParen)?;
        let mut depth = 0usize;
        let mut pattern = String::new();
        loop {
            match parser.current_type() {
                TokenType::LParen => depth += 1,
                TokenType::RParen if depth == 0 => break,
                TokenType::RParen => depth -= 1,
                TokenType::Eof => break,
                _ => {}
            }
            if !pattern.is_empty() {
                pattern.push(' ');
            }
            pattern.push_str(&parser.advance().text);
        }
        parser.expect(TokenType::RParen)?;
        mr.set("pattern", ast::var(pattern));
    }
    if parser.match_text("DEFINE") {
        let define = parser.parse_csv(|p| {
            let name = p.parse_identifier()?;
            p.expect(TokenType::As)?;
            Ok(ast::alias(p.parse_expression()?, name))
        })?;
        mr.set("define", define);
    }
    parser.expect(TokenType::RParen)?;
    if let Some(alias) = parser.parse_table_alias()? {
        mr.set("alias", alias);
    }
    node.set("match_recognize", mr);
    Ok(true)
}

/// Hierarchical queries: `START WITH ... CONNECT BY ...` in either order.
/// PRIOR is only an operator inside the CONNECT BY condition.
pub(crate) fn modifier_connect(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    let mut connect = Node::new(Tag::Connect);
    let mut matched = false;
    if parser.match_text_seq(&["START", "WITH"]) {
        connect.set("start", parser.parse_expression()?);
        matched = true;
    }
    if parser.match_text_seq(&["CONNECT", "BY"]) {
        if parser.match_text("NOCYCLE") {
            connect.set("nocycle", true);
        }
        parser.in_connect = true;
        let condition = parser.parse_expression();
        parser.in_connect = false;
        connect.set("connect", condition?);
        if parser.match_text_seq(&["START", "WITH"]) {
            connect.set("start", parser.parse_expression()?);
        }
        matched = true;
    }
    if !matched {
        return Ok(false);
    }
    node.set("connect", connect);
    Ok(true)
}

pub(crate) fn modifier_where(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::Where) {
        return Ok(false);
    }
    let condition = parser.parse_expression()?;
    node.set("where", Node::new(Tag::Where).with("this", condition));
    Ok(true)
}

pub(crate) fn modifier_group(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::GroupBy) {
        return Ok(false);
    }
    let mut group = Node::new(Tag::Group);
    if parser.match_(TokenType::All) {
        group.set("all", true);
        node.set("group", group);
        return Ok(true);
    }
    loop {
        match parser.current_type() {
            TokenType::Cube => {
                parser.advance();
                let mut cube = Node::new(Tag::Cube);
                if parser.match_(TokenType::LParen) {
                    cube.set("expressions", parser.parse_csv(Parser::parse_expression)?);
                    parser.expect(TokenType::RParen)?;
                }
                group.append("cube", cube);
            }
            TokenType::Rollup => {
                parser.advance();
                let mut rollup = Node::new(Tag::Rollup);
                if parser.match_(TokenType::LParen) {
                    rollup.set("expressions", parser.parse_csv(Parser::parse_expression)?);
                    parser.expect(TokenType::RParen)?;
                }
                group.append("rollup", rollup);
            }
            TokenType::GroupingSets => {
                parser.advance();
                parser.expect(TokenType::LParen)?;
                let sets = parser.parse_csv(|p| {
                    if p.match_(TokenType::LParen) {
                        let mut tuple = Node::new(Tag::Tuple);
                        if !p.match_(TokenType::RParen) {
                            tuple.set("expressions", p.parse_csv(Parser::parse_expression)?);
                            p.expect(TokenType::RParen)?;
                        }
                        Ok(tuple)
                    } else {
                        p.parse_expression()
                    }
                })?;
                parser.expect(TokenType::RParen)?;
                group.append(
                    "grouping_sets",
                    Node::new(Tag::GroupingSets).with("expressions", sets),
                );
            }
            _ => {
                let expression = parser.parse_expression()?;
                group.append("expressions", expression);
            }
        }
        if !parser.match_(TokenType::Comma) {
            break;
        }
    }
    node.set("group", group);
    Ok(true)
}

pub(crate) fn modifier_having(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::Having) {
        return Ok(false);
    }
    let condition = parser.parse_expression()?;
    node.set("having", Node::new(Tag::Having).with("this", condition));
    Ok(true)
}

pub(crate) fn modifier_qualify(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::Qualify) {
        return Ok(false);
    }
    let condition = parser.parse_expression()?;
    node.set("qualify", Node::new(Tag::Qualify).with("this", condition));
    Ok(true)
}

pub(crate) fn modifier_windows(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::Window) {
        return Ok(false);
    }
    let windows = parser.parse_csv(|p| {
        let name = p.parse_identifier()?;
        p.expect(TokenType::As)?;
        p.expect(TokenType::LParen)?;
        let mut window = Node::new(Tag::Window).with("this", name);
        if p.match_(TokenType::PartitionBy) {
            window.set("partition_by", p.parse_csv(Parser::parse_expression)?);
        }
        if p.current_type() == TokenType::OrderBy {
            window.set("order", p.parse_order()?);
        }
        p.expect(TokenType::RParen)?;
        Ok(window)
    })?;
    node.set("windows", windows);
    Ok(true)
}

pub(crate) fn modifier_order(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if parser.current_type() != TokenType::OrderBy {
        return Ok(false);
    }
    let order = parser.parse_order()?;
    node.set("order", order);
    Ok(true)
}

pub(crate) fn modifier_cluster(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::ClusterBy) {
        return Ok(false);
    }
    let expressions = parser.parse_csv(Parser::parse_expression)?;
    node.set("cluster", Node::new(Tag::Cluster).with("expressions", expressions));
    Ok(true)
}

pub(crate) fn modifier_distribute(
    parser: &mut Parser,
    node: &mut Node,
) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::DistributeBy) {
        return Ok(false);
    }
    let expressions = parser.parse_csv(Parser::parse_expression)?;
    node.set(
        "distribute",
        Node::new(Tag::Distribute).with("expressions", expressions),
    );
    Ok(true)
}

pub(crate) fn modifier_sort(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::SortBy) {
        return Ok(false);
    }
    let expressions = parser.parse_csv(Parser::parse_expression)?;
    node.set("sort", Node::new(Tag::Sort).with("expressions", expressions));
    Ok(true)
}

pub(crate) fn modifier_limit(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::Limit) {
        return Ok(false);
    }
    // `LIMIT 10 %` must read the trailing % as a percent marker, not modulo:
    // when the expression comes back as Mod, rewind and reparse at unary level
    // so the % token is left for the options below
    let index = parser.index();
    let errors = parser.errors_len();
    let first = match parser.parse_expression() {
        Ok(expr) if expr.tag != Tag::Mod => expr,
        _ => {
            parser.set_index(index);
            parser.truncate_errors(errors);
            parser.parse_unary()?
        }
    };
    if parser.match_(TokenType::Comma) {
        // LIMIT offset, count
        let count = parser.parse_expression()?;
        node.set("offset", Node::new(Tag::Offset).with("expression", first));
        node.set("limit", Node::new(Tag::Limit).with("expression", count));
        return Ok(true);
    }
    let mut limit = Node::new(Tag::Limit).with("expression", first);
    if parser.match_text("PERCENT") || parser.match_(TokenType::Percent) {
        limit.set("percent", true);
    }
    node.set("limit", limit);
    Ok(true)
}

pub(crate) fn modifier_offset(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::Offset) {
        return Ok(false);
    }
    let expression = parser.parse_expression()?;
    if !parser.match_(TokenType::Rows) {
        parser.match_text("ROW");
    }
    node.set("offset", Node::new(Tag::Offset).with("expression", expression));
    Ok(true)
}

pub(crate) fn modifier_fetch(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if !parser.match_(TokenType::Fetch) {
        return Ok(false);
    }
    let mut fetch = Node::new(Tag::Fetch);
    if parser.match_text("FIRST") {
        fetch.set("direction", "FIRST");
    } else if parser.match_text("NEXT") {
        fetch.set("direction", "NEXT");
    }
    if parser.current_type() != TokenType::Rows {
        fetch.set("count", parser.parse_expression()?);
        if parser.match_text("PERCENT") || parser.match_(TokenType::Percent) {
            fetch.set("percent", true);
        }
    }
    if !parser.match_(TokenType::Rows) {
        parser.match_text("ROW");
    }
    if parser.match_text_seq(&["WITH", "TIES"]) {
        fetch.set("with_ties", true);
    } else {
        parser.match_text("ONLY");
    }
    node.set("fetch", fetch);
    Ok(true)
}

pub(crate) fn modifier_sample(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    if parser.current_type() != TokenType::TableSample {
        return Ok(false);
    }
    let sample = parser.parse_table_sample()?;
    node.set("sample", sample);
    Ok(true)
}

pub(crate) fn modifier_locks(parser: &mut Parser, node: &mut Node) -> Result<bool, ParserError> {
    let mut consumed = false;
    loop {
        let update = if parser.match_text_seq(&["FOR", "UPDATE"]) {
            true
        } else if parser.match_text_seq(&["FOR", "SHARE"]) {
            false
        } else {
            break;
        };
        let mut lock = Node::new(Tag::Lock).with("update", update);
        if parser.match_text("OF") {
            lock.set("expressions", parser.parse_csv(Parser::parse_table)?);
        }
        if parser.match_text("NOWAIT") {
            lock.set("wait", false);
        } else if parser.match_text("WAIT") {
            lock.set("wait", parser.parse_expression()?);
        }
        node.append("locks", lock);
        consumed = true;
    }
    Ok(consumed)
}
