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

//! Expression parsing: the precedence ladder, postfix predicates, function
//! calls, and scalar primaries. Each precedence level is one method looping
//! over a dialect table; dialects change operator placement by moving table
//! entries, not by overriding methods.

use std::collections::HashMap;

use crate::ast::{self, ArgValue, Node, Tag};
use crate::dialect::Dialect;
use crate::tokens::TokenType;

use super::{Parser, ParserError, RangeEntry};

impl<'a> Parser<'a> {
    pub(crate) fn parse_expression(&mut self) -> Result<Node, ParserError> {
        self.parse_disjunction()
    }

    /// One left-associative binary level over a dialect table.
    fn parse_binary(
        &mut self,
        table: &HashMap<TokenType, Tag>,
        next: fn(&mut Self) -> Result<Node, ParserError>,
    ) -> Result<Node, ParserError> {
        let mut this = next(self)?;
        while let Some(&tag) = table.get(&self.current_type()) {
            self.advance();
            this = ast::binary(tag, this, next(self)?);
        }
        Ok(this)
    }

    fn parse_disjunction(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        self.parse_binary(&dialect.parser.disjunction, Self::parse_conjunction)
    }

    fn parse_conjunction(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        self.parse_binary(&dialect.parser.conjunction, Self::parse_not)
    }

    fn parse_not(&mut self) -> Result<Node, ParserError> {
        if self.match_(TokenType::Not) {
            Ok(ast::not(self.parse_not()?))
        } else {
            self.parse_equality()
        }
    }

    fn parse_equality(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        self.parse_binary(&dialect.parser.equality, Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        self.parse_binary(&dialect.parser.comparison, Self::parse_range)
    }

    /// Postfix predicates: IS, BETWEEN, IN, the LIKE family, and any
    /// dialect-registered range operators, each optionally preceded by NOT.
    /// A NOT that is not followed by a range operator is put back so the
    /// caller sees the cursor exactly where the unusable token starts.
    fn parse_range(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        let mut this = self.parse_bitwise()?;
        loop {
            if self.match_(TokenType::Is) {
                this = self.parse_is(this)?;
                continue;
            }
            if self.match_text_seq(&["SIMILAR", "TO"]) {
                this = ast::binary(Tag::SimilarTo, this, self.parse_bitwise()?);
                continue;
            }

            let negated = self.match_(TokenType::Not);
            let entry = dialect.parser.range.get(&self.current_type()).copied();
            let Some(entry) = entry else {
                if negated {
                    self.retreat();
                }
                return Ok(this);
            };
            self.advance();
            this = match entry {
                RangeEntry::Binary(tag) => ast::binary(tag, this, self.parse_bitwise()?),
                RangeEntry::NegatedBinary(tag) => {
                    ast::not(ast::binary(tag, this, self.parse_bitwise()?))
                }
                RangeEntry::LikePattern(tag) => self.parse_like(tag, this)?,
                RangeEntry::Parser(f) => f(self, this)?,
            };
            if negated {
                this = ast::not(this);
            }
        }
    }

    fn parse_is(&mut self, this: Node) -> Result<Node, ParserError> {
        let negated = self.match_(TokenType::Not);
        let node = if self.match_text_seq(&["DISTINCT", "FROM"]) {
            ast::binary(Tag::IsDistinctFrom, this, self.parse_bitwise()?)
        } else {
            let right = match self.current_type() {
                TokenType::Null => {
                    self.advance();
                    ast::null()
                }
                TokenType::True => {
                    self.advance();
                    ast::boolean(true)
                }
                TokenType::False => {
                    self.advance();
                    ast::boolean(false)
                }
                _ => self.parse_bitwise()?,
            };
            ast::binary(Tag::Is, this, right)
        };
        Ok(if negated { ast::not(node) } else { node })
    }

    fn parse_like(&mut self, tag: Tag, this: Node) -> Result<Node, ParserError> {
        let pattern = match self.match_any(&[TokenType::Any, TokenType::All]) {
            Some(TokenType::Any) => ast::unary(Tag::Any, self.parse_bitwise()?),
            Some(_) => ast::unary(Tag::All, self.parse_bitwise()?),
            None => self.parse_bitwise()?,
        };
        let mut node = ast::binary(tag, this, pattern);
        if self.match_text("ESCAPE") {
            node.set("escape", self.parse_bitwise()?);
        }
        Ok(node)
    }

    fn parse_bitwise(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        self.parse_binary(&dialect.parser.bitwise, Self::parse_term)
    }

    fn parse_term(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        let mut this = self.parse_factor()?;
        while let Some(&tag) = dialect.parser.term.get(&self.current_type()) {
            self.advance();
            let mut node = ast::binary(tag, this, self.parse_factor()?);
            if tag == Tag::DPipe && !dialect.flags.strict_string_concat {
                node.set("safe", true);
            }
            this = node;
        }
        Ok(this)
    }

    fn parse_factor(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        let mut this = self.parse_exponent()?;
        while let Some(&tag) = dialect.parser.factor.get(&self.current_type()) {
            self.advance();
            let mut node = ast::binary(tag, this, self.parse_exponent()?);
            if tag == Tag::Div {
                if dialect.flags.typed_division {
                    node.set("typed", true);
                }
                if dialect.flags.safe_division {
                    node.set("safe", true);
                }
            }
            this = node;
        }
        Ok(this)
    }

    fn parse_exponent(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        self.parse_binary(&dialect.parser.exponent, Self::parse_unary)
    }

    pub(crate) fn parse_unary(&mut self) -> Result<Node, ParserError> {
        if self.in_connect && self.current_type() == TokenType::Var && self.match_text("PRIOR") {
            return Ok(ast::unary(Tag::Prior, self.parse_unary()?));
        }
        let tag = match self.current_type() {
            TokenType::Dash => Tag::Neg,
            TokenType::Tilda => Tag::BitwiseNot,
            TokenType::PipeSlash => Tag::Sqrt,
            TokenType::DPipeSlash => Tag::Cbrt,
            TokenType::At => Tag::Abs,
            TokenType::Not => Tag::Not,
            TokenType::Exists => {
                self.advance();
                return Ok(ast::unary(Tag::Exists, self.parse_unary()?));
            }
            _ => {
                let this = self.parse_primary()?;
                return self.parse_column_ops(this);
            }
        };
        self.advance();
        Ok(ast::unary(tag, self.parse_unary()?))
    }

    /// Postfix operators that bind tighter than any arithmetic: `::` casts,
    /// dotted access, subscripts, dialect arrow operators, COLLATE, and
    /// AT TIME ZONE.
    pub(crate) fn parse_column_ops(&mut self, mut this: Node) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        loop {
            if self.match_(TokenType::DColon) {
                this = Node::new(Tag::Cast)
                    .with("this", this)
                    .with("to", self.parse_data_type()?);
            } else if self.match_(TokenType::Dot) {
                let field = self.parse_identifier()?;
                this = ast::binary(Tag::Dot, this, field);
            } else if self.match_(TokenType::LBracket) {
                this = self.parse_bracket(this)?;
            } else if let Some(&tag) = dialect.parser.column_operators.get(&self.current_type()) {
                self.advance();
                this = ast::binary(tag, this, self.parse_unary()?);
            } else if self.match_text("COLLATE") {
                this = ast::binary(Tag::Collate, this, self.parse_identifier()?);
            } else if self.match_text_seq(&["AT", "TIME", "ZONE"]) {
                this = Node::new(Tag::AtTimeZone)
                    .with("this", this)
                    .with("zone", self.parse_unary()?);
            } else {
                return Ok(this);
            }
        }
    }

    fn parse_bracket(&mut self, this: Node) -> Result<Node, ParserError> {
        // an empty, single, or comma-separated subscript; `a:b` is a slice
        if self.match_(TokenType::RBracket) {
            return Ok(Node::new(Tag::Bracket).with("this", this));
        }
        let first = if self.current_type() == TokenType::Colon {
            None
        } else {
            Some(self.parse_expression()?)
        };
        if self.match_(TokenType::Colon) {
            let mut slice = Node::new(Tag::Slice);
            if let Some(first) = first {
                slice.set("this", first);
            }
            if self.current_type() != TokenType::RBracket {
                slice.set("expression", self.parse_expression()?);
            }
            self.expect(TokenType::RBracket)?;
            return Ok(Node::new(Tag::Bracket)
                .with("this", this)
                .with("expressions", vec![slice]));
        }
        let mut expressions = vec![first.unwrap_or_else(ast::null)];
        while self.match_(TokenType::Comma) {
            expressions.push(self.parse_expression()?);
        }
        self.expect(TokenType::RBracket)?;
        Ok(Node::new(Tag::Bracket)
            .with("this", this)
            .with("expressions", expressions))
    }

    // ---- primaries ----

    fn parse_primary(&mut self) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        if let Some(&tag) = dialect.parser.no_paren_functions.get(&self.current_type()) {
            self.advance();
            let mut node = Node::new(tag);
            if self.match_(TokenType::LParen) && !self.match_(TokenType::RParen) {
                node.set("this", self.parse_expression()?);
                self.expect(TokenType::RParen)?;
            }
            return Ok(node);
        }

        match self.current_type() {
            TokenType::Number => {
                let text = self.advance().text.clone();
                Ok(ast::number_literal(text))
            }
            TokenType::String => {
                let text = self.advance().text.clone();
                Ok(ast::string_literal(text))
            }
            TokenType::NationalString => {
                let text = self.advance().text.clone();
                Ok(Node::new(Tag::National).with("this", text))
            }
            TokenType::BitString => {
                let text = self.advance().text.clone();
                Ok(Node::new(Tag::BitString).with("this", text))
            }
            TokenType::HexString => {
                let text = self.advance().text.clone();
                let mut node = Node::new(Tag::HexString).with("this", text);
                if self.dialect.flags.hex_string_is_integer_type {
                    node.set("is_integer", true);
                }
                Ok(node)
            }
            TokenType::ByteString => {
                let text = self.advance().text.clone();
                Ok(Node::new(Tag::ByteString).with("this", text))
            }
            TokenType::True => {
                self.advance();
                Ok(ast::boolean(true))
            }
            TokenType::False => {
                self.advance();
                Ok(ast::boolean(false))
            }
            TokenType::Null => {
                self.advance();
                Ok(ast::null())
            }
            TokenType::Star => self.parse_star(),
            TokenType::LParen => self.parse_paren(),
            TokenType::Case => self.parse_case(),
            TokenType::Cast => self.parse_cast(Tag::Cast),
            TokenType::TryCast => self.parse_cast(Tag::TryCast),
            TokenType::Interval => self.parse_interval(),
            TokenType::Extract => self.parse_extract(),
            TokenType::Array => self.parse_array(),
            TokenType::LBracket => self.parse_array_literal(),
            TokenType::Struct => self.parse_struct(),
            TokenType::QMark => {
                self.advance();
                Ok(Node::new(Tag::Placeholder))
            }
            TokenType::Colon => self.parse_parameter("colon"),
            TokenType::Dollar => self.parse_parameter("dollar"),
            TokenType::Date | TokenType::Time | TokenType::Timestamp | TokenType::TimestampTz
                if self.peek(1).token_type == TokenType::String =>
            {
                let kind = self.advance().text.to_uppercase();
                let text = self.advance().text.clone();
                Ok(Node::new(Tag::Cast)
                    .with("this", ast::string_literal(text))
                    .with("to", Node::new(Tag::DataType).with("this", kind)))
            }
            _ => self.parse_identifier_or_function(),
        }
    }

    fn parse_parameter(&mut self, kind: &'static str) -> Result<Node, ParserError> {
        self.advance();
        match self.current_type() {
            TokenType::Var | TokenType::Number => {
                let name = self.advance().text.clone();
                Ok(Node::new(Tag::Parameter)
                    .with("this", name)
                    .with("kind", kind))
            }
            _ => {
                self.raise_error("Expected parameter name")?;
                Ok(Node::new(Tag::Placeholder).with("kind", kind))
            }
        }
    }

    fn parse_star(&mut self) -> Result<Node, ParserError> {
        self.advance();
        let mut star = Node::new(Tag::Star);
        loop {
            if self.match_(TokenType::Except) || self.match_text("EXCLUDE") {
                self.expect(TokenType::LParen)?;
                let columns = self.parse_csv(Self::parse_identifier)?;
                self.expect(TokenType::RParen)?;
                star.set("except", columns);
            } else if self.match_text("REPLACE") {
                self.expect(TokenType::LParen)?;
                let replacements = self.parse_csv(|p| {
                    let expression = p.parse_expression()?;
                    p.match_(TokenType::As);
                    let name = p.parse_identifier()?;
                    Ok(ast::alias(expression, name))
                })?;
                self.expect(TokenType::RParen)?;
                star.set("replace", replacements);
            } else {
                return Ok(star);
            }
        }
    }

    fn parse_paren(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::LParen)?;
        if matches!(
            self.current_type(),
            TokenType::Select | TokenType::With | TokenType::Values
        ) {
            let query = self.parse_statement()?;
            self.expect(TokenType::RParen)?;
            let subquery = ast::subquery(query);
            return self.maybe_parse_set_operations(subquery);
        }

        let first = self.parse_expression()?;
        if self.match_(TokenType::Comma) {
            let mut expressions = vec![first];
            loop {
                expressions.push(self.parse_expression()?);
                if !self.match_(TokenType::Comma) {
                    break;
                }
            }
            self.expect(TokenType::RParen)?;
            return Ok(Node::new(Tag::Tuple).with("expressions", expressions));
        }
        self.expect(TokenType::RParen)?;
        Ok(ast::paren(first))
    }

    fn parse_case(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::Case)?;
        let mut case = Node::new(Tag::Case);
        if !matches!(self.current_type(), TokenType::When) {
            case.set("this", self.parse_expression()?);
        }
        let mut ifs = Vec::new();
        while self.match_(TokenType::When) {
            let condition = self.parse_expression()?;
            self.expect(TokenType::Then)?;
            let result = self.parse_expression()?;
            ifs.push(
                Node::new(Tag::If)
                    .with("this", condition)
                    .with("true", result),
            );
        }
        if ifs.is_empty() {
            self.raise_error("Expected at least one WHEN clause")?;
        }
        if self.match_(TokenType::Else) {
            case.set("default", self.parse_expression()?);
        }
        self.expect(TokenType::End)?;
        case.set("ifs", ifs);
        Ok(case)
    }

    fn parse_cast(&mut self, tag: Tag) -> Result<Node, ParserError> {
        self.advance();
        self.expect(TokenType::LParen)?;
        let this = self.parse_expression()?;
        self.expect(TokenType::As)?;
        let to = self.parse_data_type()?;
        self.expect(TokenType::RParen)?;
        Ok(Node::new(tag).with("this", this).with("to", to))
    }

    fn parse_interval(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::Interval)?;
        let mut interval = Node::new(Tag::Interval);
        match self.current_type() {
            TokenType::String => {
                let text = self.advance().text.clone();
                interval.set("this", ast::string_literal(text));
            }
            TokenType::Number => {
                let text = self.advance().text.clone();
                interval.set("this", ast::number_literal(text));
            }
            _ => return Ok(interval),
        }
        if self.current_type() == TokenType::Var {
            let unit = self.advance().text.to_uppercase();
            interval.set("unit", ast::var(unit));
        }
        Ok(interval)
    }

    fn parse_extract(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::Extract)?;
        self.expect(TokenType::LParen)?;
        let part = self.advance().text.to_uppercase();
        self.expect(TokenType::From)?;
        let expression = self.parse_expression()?;
        self.expect(TokenType::RParen)?;
        Ok(Node::new(Tag::Extract)
            .with("this", ast::var(part))
            .with("expression", expression))
    }

    fn parse_array(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::Array)?;
        let mut array = Node::new(Tag::Array);
        if self.match_(TokenType::LBracket) {
            if !self.match_(TokenType::RBracket) {
                array.set("expressions", self.parse_csv(Self::parse_expression)?);
                self.expect(TokenType::RBracket)?;
            }
        } else if self.match_(TokenType::LParen) {
            if !self.match_(TokenType::RParen) {
                array.set("expressions", self.parse_csv(Self::parse_expression)?);
                self.expect(TokenType::RParen)?;
            }
        }
        Ok(array)
    }

    /// A bare bracketed list, either an array literal or a comprehension of
    /// the form `[expr FOR var IN source IF condition]`.
    fn parse_array_literal(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::LBracket)?;
        let mut array = Node::new(Tag::Array);
        if self.match_(TokenType::RBracket) {
            return Ok(array);
        }
        let first = self.parse_expression()?;
        if self.match_text("FOR") {
            let variable = self.parse_identifier()?;
            self.expect(TokenType::In)?;
            let iterator = self.parse_expression()?;
            let mut node = Node::new(Tag::Comprehension)
                .with("this", first)
                .with("expression", variable)
                .with("iterator", iterator);
            if self.match_text("IF") {
                node.set("condition", self.parse_expression()?);
            }
            self.expect(TokenType::RBracket)?;
            return Ok(node);
        }
        let mut expressions = vec![first];
        while self.match_(TokenType::Comma) {
            expressions.push(self.parse_expression()?);
        }
        self.expect(TokenType::RBracket)?;
        array.set("expressions", expressions);
        Ok(array)
    }

    /// Brace-literal map, `MAP {key: value, ...}`.
    fn parse_map_literal(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::LBrace)?;
        let mut keys = Node::new(Tag::Array);
        let mut values = Node::new(Tag::Array);
        if self.current_type() != TokenType::RBrace {
            loop {
                keys.append("expressions", self.parse_expression()?);
                self.expect(TokenType::Colon)?;
                values.append("expressions", self.parse_expression()?);
                if !self.match_(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::RBrace)?;
        Ok(Node::new(Tag::Map).with("keys", keys).with("values", values))
    }

    fn parse_struct(&mut self) -> Result<Node, ParserError> {
        self.expect(TokenType::Struct)?;
        let mut node = Node::new(Tag::Struct);
        if self.match_(TokenType::LParen) && !self.match_(TokenType::RParen) {
            node.set("expressions", self.parse_csv(Self::parse_function_arg)?);
            self.expect(TokenType::RParen)?;
        }
        Ok(node)
    }

    pub(crate) fn parse_identifier(&mut self) -> Result<Node, ParserError> {
        match self.current_type() {
            TokenType::Identifier => {
                let name = self.advance().text.clone();
                Ok(ast::identifier(name, true))
            }
            TokenType::Eof | TokenType::LParen | TokenType::RParen | TokenType::Comma => {
                self.raise_error(format!("Expected identifier, got {}", self.current()))?;
                Ok(ast::identifier("", false))
            }
            // any word, keyword or not, can serve as a name here
            _ => {
                let name = self.advance().text.clone();
                Ok(ast::identifier(name, false))
            }
        }
    }

    fn parse_identifier_or_function(&mut self) -> Result<Node, ParserError> {
        if !matches!(self.current_type(), TokenType::Var | TokenType::Identifier) {
            // keyword tokens reaching this point are not valid primaries
            let current = format!("{}", self.current());
            self.raise_error(format!("Invalid expression near {current}"))?;
            let name = self.advance().text.clone();
            return Ok(ast::var(name));
        }

        let mut parts = vec![self.parse_identifier()?];
        let mut star = false;
        while self.match_(TokenType::Dot) {
            if self.match_(TokenType::Star) {
                star = true;
                break;
            }
            parts.push(self.parse_identifier()?);
        }

        if star {
            // a.* is a column whose name is a star
            parts.push(Node::new(Tag::Star));
            return Ok(ast::column(parts));
        }

        if parts.len() == 1
            && self.current_type() == TokenType::LBrace
            && parts[0].text("this").eq_ignore_ascii_case("map")
        {
            return self.parse_map_literal();
        }

        if self.current_type() == TokenType::LParen {
            let quoted = parts.iter().any(|part| part.flag("quoted"));
            if parts.len() == 1 && !quoted {
                let name = parts[0].text("this").to_string();
                self.advance();
                return self.parse_function(&name);
            }
            if !quoted {
                let name = parts
                    .iter()
                    .map(|part| part.text("this"))
                    .collect::<Vec<_>>()
                    .join(".");
                self.advance();
                return self.parse_function(&name);
            }
        }

        Ok(ast::column(parts))
    }

    // ---- functions ----

    /// Positioned just past the opening paren of `name(`.
    fn parse_function(&mut self, name: &str) -> Result<Node, ParserError> {
        let dialect = self.dialect;
        let upper = name.to_uppercase();

        let mut node = if let Some(parser) = dialect.parser.function_parsers.get(&upper) {
            let node = parser(self)?;
            self.expect(TokenType::RParen)?;
            node
        } else {
            let distinct = self.match_(TokenType::Distinct);
            let mut args = if self.current_type() == TokenType::RParen {
                Vec::new()
            } else {
                self.parse_csv(Self::parse_function_arg)?
            };
            if self.current_type() == TokenType::OrderBy {
                // aggregate-internal ordering, e.g. STRING_AGG(x ORDER BY y)
                let order = self.parse_order()?;
                if let Some(last) = args.pop() {
                    args.push(
                        Node::new(Tag::Order)
                            .with("this", last)
                            .with("expressions", order.child_list("expressions").to_vec()),
                    );
                }
            }
            self.expect(TokenType::RParen)?;

            // a nulls modifier parsed inside the argument list wraps the
            // whole call, e.g. LAST_VALUE(x IGNORE NULLS) OVER (...)
            let mut nulls_modifier = None;
            for arg in args.iter_mut() {
                if matches!(arg.tag, Tag::IgnoreNulls | Tag::RespectNulls) {
                    nulls_modifier = Some(arg.tag);
                    if let Some(ArgValue::Child(inner)) = arg.pop("this") {
                        *arg = *inner;
                    }
                }
            }

            if distinct {
                let distinct_node = Node::new(Tag::Distinct).with("expressions", args);
                args = vec![distinct_node];
            }
            let call = match dialect.parser.functions.get(&upper) {
                Some(builder) => builder(dialect, args),
                None => ast::func(name, args),
            };
            match nulls_modifier {
                Some(tag) => Node::new(tag).with("this", call),
                None => call,
            }
        };

        if self.match_text_seq(&["IGNORE", "NULLS"]) {
            node = Node::new(Tag::IgnoreNulls).with("this", node);
        } else if self.match_text_seq(&["RESPECT", "NULLS"]) {
            node = Node::new(Tag::RespectNulls).with("this", node);
        }
        if self.match_text_seq(&["WITHIN", "GROUP"]) {
            self.expect(TokenType::LParen)?;
            let order = self.parse_order()?;
            self.expect(TokenType::RParen)?;
            node = Node::new(Tag::WithinGroup)
                .with("this", node)
                .with("expression", order);
        }
        if self.match_text("FILTER") {
            self.expect(TokenType::LParen)?;
            self.expect(TokenType::Where)?;
            let condition = self.parse_expression()?;
            self.expect(TokenType::RParen)?;
            let where_clause = Node::new(Tag::Where).with("this", condition);
            node = Node::new(Tag::Filter)
                .with("this", node)
                .with("expression", where_clause);
        }
        if self.match_(TokenType::Over) {
            node = self.parse_window(node)?;
        }
        Ok(node)
    }

    /// One function argument: a lambda, a `name := value` keyword argument,
    /// or a plain expression.
    fn parse_function_arg(&mut self) -> Result<Node, ParserError> {
        if let Some(lambda) = self.try_parse(Self::parse_lambda) {
            return Ok(lambda);
        }
        if matches!(self.current_type(), TokenType::Var)
            && self.peek(1).token_type == TokenType::ColonEq
        {
            let name = self.advance().text.clone();
            self.advance();
            return Ok(Node::new(Tag::Kwarg)
                .with("this", ast::var(name))
                .with("expression", self.parse_expression()?));
        }
        let mut arg = self.parse_expression()?;
        // IGNORE/RESPECT NULLS may trail an argument; parse_function hoists
        // the wrapper onto the whole call
        if self.match_text_seq(&["IGNORE", "NULLS"]) {
            arg = Node::new(Tag::IgnoreNulls).with("this", arg);
        } else if self.match_text_seq(&["RESPECT", "NULLS"]) {
            arg = Node::new(Tag::RespectNulls).with("this", arg);
        }
        Ok(arg)
    }

    fn parse_lambda(&mut self) -> Result<Node, ParserError> {
        let params = if self.match_(TokenType::LParen) {
            let params = self.parse_csv(Self::parse_identifier)?;
            self.expect(TokenType::RParen)?;
            params
        } else if matches!(self.current_type(), TokenType::Var) {
            vec![self.parse_identifier()?]
        } else {
            return Err(ParserError::Syntax {
                message: String::from("not a lambda"),
                errors: Vec::new(),
            });
        };
        if !self.match_(TokenType::Arrow) {
            return Err(ParserError::Syntax {
                message: String::from("not a lambda"),
                errors: Vec::new(),
            });
        }
        let body = self.parse_expression()?;
        Ok(Node::new(Tag::Lambda)
            .with("this", body)
            .with("expressions", params))
    }

    fn parse_window(&mut self, this: Node) -> Result<Node, ParserError> {
        let mut window = Node::new(Tag::Window).with("this", this);
        window.set("over", "OVER");
        if !self.match_(TokenType::LParen) {
            let name = self.parse_identifier()?;
            window.set("alias", name);
            return Ok(window);
        }

        if self.match_(TokenType::PartitionBy) {
            window.set("partition_by", self.parse_csv(Self::parse_expression)?);
        }
        if self.current_type() == TokenType::OrderBy {
            window.set("order", self.parse_order()?);
        }
        if let Some(kind) = self.match_any(&[TokenType::Rows, TokenType::Range]) {
            let mut spec = Node::new(Tag::WindowSpec).with(
                "kind",
                if kind == TokenType::Rows { "ROWS" } else { "RANGE" },
            );
            if self.match_(TokenType::Between) {
                let (start, start_side) = self.parse_window_bound()?;
                spec.set("start", start);
                if let Some(side) = start_side {
                    spec.set("start_side", side);
                }
                self.expect(TokenType::And)?;
                let (end, end_side) = self.parse_window_bound()?;
                spec.set("end", end);
                if let Some(side) = end_side {
                    spec.set("end_side", side);
                }
            } else {
                let (start, start_side) = self.parse_window_bound()?;
                spec.set("start", start);
                if let Some(side) = start_side {
                    spec.set("start_side", side);
                }
            }
            window.set("spec", spec);
        }
        self.expect(TokenType::RParen)?;
        Ok(window)
    }

    fn parse_window_bound(&mut self) -> Result<(ArgValue, Option<&'static str>), ParserError> {
        if self.match_(TokenType::Unbounded) {
            let side = match self.current_type() {
                TokenType::Preceding => Some("PRECEDING"),
                TokenType::Following => Some("FOLLOWING"),
                _ => None,
            };
            if side.is_some() {
                self.advance();
            }
            return Ok((ArgValue::from("UNBOUNDED"), side));
        }
        if self.match_text_seq(&["CURRENT", "ROW"]) {
            return Ok((ArgValue::from("CURRENT ROW"), None));
        }
        let offset = self.parse_bitwise()?;
        let side = match self.current_type() {
            TokenType::Preceding => Some("PRECEDING"),
            TokenType::Following => Some("FOLLOWING"),
            _ => None,
        };
        if side.is_some() {
            self.advance();
        }
        Ok((ArgValue::from(offset), side))
    }

    // ---- data types ----

    pub(crate) fn parse_data_type(&mut self) -> Result<Node, ParserError> {
        if self.current().is_eof() {
            self.raise_error("Expected data type")?;
            return Ok(Node::new(Tag::DataType).with("this", ""));
        }
        let mut name = self.advance().text.to_uppercase();
        // multi-word type names like DOUBLE PRECISION
        while matches!(self.current_type(), TokenType::Var)
            && matches!(
                self.current().text.to_uppercase().as_str(),
                "PRECISION" | "VARYING"
            )
        {
            name.push(' ');
            name.push_str(&self.advance().text.to_uppercase());
        }
        let mut data_type = Node::new(Tag::DataType).with("this", name);

        if self.match_(TokenType::LParen) {
            let params = self.parse_csv(|p| {
                if p.current_type() == TokenType::Number {
                    let text = p.advance().text.clone();
                    Ok(ast::number_literal(text))
                } else {
                    let text = p.advance().text.clone();
                    Ok(ast::var(text))
                }
            })?;
            self.expect(TokenType::RParen)?;
            data_type.set("expressions", params);
        } else if self.match_(TokenType::Lt) {
            let inner = self.parse_csv(Self::parse_data_type)?;
            self.expect(TokenType::Gt)?;
            data_type.set("expressions", inner);
            data_type.set("nested", true);
        }
        Ok(data_type)
    }
}

// ---- irregular function syntax, dispatched by name ----

pub(crate) fn parse_count(parser: &mut Parser) -> Result<Node, ParserError> {
    let mut count = Node::new(Tag::Count);
    if parser.match_(TokenType::Star) {
        count.set("this", Node::new(Tag::Star));
    } else if parser.match_(TokenType::Distinct) {
        let expressions = parser.parse_csv(Parser::parse_expression)?;
        count.set(
            "this",
            Node::new(Tag::Distinct).with("expressions", expressions),
        );
    } else if parser.current_type() != TokenType::RParen {
        count.set("this", parser.parse_expression()?);
    }
    Ok(count)
}

pub(crate) fn parse_trim(parser: &mut Parser) -> Result<Node, ParserError> {
    let mut trim = Node::new(Tag::Trim);
    let position = if parser.match_text("BOTH") {
        Some("BOTH")
    } else if parser.match_text("LEADING") {
        Some("LEADING")
    } else if parser.match_text("TRAILING") {
        Some("TRAILING")
    } else {
        None
    };
    if let Some(position) = position {
        trim.set("position", position);
    }

    let first = if parser.current_type() == TokenType::From {
        None
    } else {
        Some(parser.parse_expression()?)
    };
    if parser.match_(TokenType::From) {
        // TRIM([chars FROM] subject)
        trim.set("this", parser.parse_expression()?);
        if let Some(chars) = first {
            trim.set("expression", chars);
        }
    } else if let Some(subject) = first {
        // TRIM(subject [, chars])
        trim.set("this", subject);
        if parser.match_(TokenType::Comma) {
            trim.set("expression", parser.parse_expression()?);
        }
    } else {
        parser.raise_error("Expected expression in TRIM")?;
    }
    Ok(trim)
}

pub(crate) fn parse_substring(parser: &mut Parser) -> Result<Node, ParserError> {
    let mut substring = Node::new(Tag::Substring).with("this", parser.parse_expression()?);
    if parser.match_(TokenType::From) || parser.match_(TokenType::Comma) {
        substring.set("start", parser.parse_expression()?);
    }
    if parser.match_text("FOR") || parser.match_(TokenType::Comma) {
        substring.set("length", parser.parse_expression()?);
    }
    Ok(substring)
}

pub(crate) fn parse_overlay(parser: &mut Parser) -> Result<Node, ParserError> {
    let this = parser.parse_expression()?;
    if !parser.match_text("PLACING") {
        parser.raise_error("Expected PLACING in OVERLAY")?;
    }
    let expression = parser.parse_expression()?;
    let mut overlay = Node::new(Tag::Overlay)
        .with("this", this)
        .with("expression", expression);
    if parser.match_(TokenType::From) {
        overlay.set("from", parser.parse_expression()?);
    }
    if parser.match_text("FOR") {
        overlay.set("for", parser.parse_expression()?);
    }
    Ok(overlay)
}

pub(crate) fn parse_map(parser: &mut Parser) -> Result<Node, ParserError> {
    if parser.current_type() == TokenType::RParen {
        return Ok(Node::new(Tag::Map));
    }
    let args = parser.parse_csv(Parser::parse_expression)?;
    match <[Node; 2]>::try_from(args) {
        Ok([keys, values]) if keys.tag == Tag::Array && values.tag == Tag::Array => {
            Ok(Node::new(Tag::Map).with("keys", keys).with("values", values))
        }
        Ok(args) => Ok(ast::func("MAP", args.into())),
        Err(args) => Ok(ast::func("MAP", args)),
    }
}

// ---- argument normalizers for regular call syntax ----

pub(crate) fn build_coalesce(_dialect: &Dialect, mut args: Vec<Node>) -> Node {
    if args.is_empty() {
        return ast::func("COALESCE", args);
    }
    let rest = args.split_off(1);
    let mut node = Node::new(Tag::Coalesce).with("this", args.remove(0));
    if !rest.is_empty() {
        node.set("expressions", rest);
    }
    node
}

pub(crate) fn build_concat(dialect: &Dialect, args: Vec<Node>) -> Node {
    Node::new(Tag::Concat)
        .with("expressions", args)
        .with("safe", !dialect.flags.strict_string_concat)
        .with("coalesce", dialect.flags.concat_coalesce)
}

pub(crate) fn build_log(dialect: &Dialect, args: Vec<Node>) -> Node {
    match <[Node; 2]>::try_from(args) {
        Ok([first, second]) => {
            let (base, value) = if dialect.flags.log_base_first {
                (first, second)
            } else {
                (second, first)
            };
            Node::new(Tag::Log).with("this", base).with("expression", value)
        }
        Err(mut args) => {
            if args.len() == 1 {
                Node::new(Tag::Log).with("this", args.remove(0))
            } else {
                ast::func("LOG", args)
            }
        }
    }
}

pub(crate) fn build_mod(_dialect: &Dialect, args: Vec<Node>) -> Node {
    match <[Node; 2]>::try_from(args) {
        Ok([left, right]) => ast::binary(Tag::Mod, left, right),
        Err(args) => ast::func("MOD", args),
    }
}

pub(crate) fn build_pow(_dialect: &Dialect, args: Vec<Node>) -> Node {
    match <[Node; 2]>::try_from(args) {
        Ok([left, right]) => ast::binary(Tag::Pow, left, right),
        Err(args) => ast::func("POW", args),
    }
}

// ---- irregular range syntax ----

pub(crate) fn parse_between(parser: &mut Parser, this: Node) -> Result<Node, ParserError> {
    let symmetric = parser.match_text("SYMMETRIC");
    let low = parser.parse_bitwise()?;
    parser.expect(TokenType::And)?;
    let high = parser.parse_bitwise()?;
    let mut between = Node::new(Tag::Between)
        .with("this", this)
        .with("low", low)
        .with("high", high);
    if symmetric {
        between.set("symmetric", true);
    }
    Ok(between)
}

pub(crate) fn parse_in(parser: &mut Parser, this: Node) -> Result<Node, ParserError> {
    let mut node = Node::new(Tag::In).with("this", this);
    if !parser.match_(TokenType::LParen) {
        // e.g. `x IN table` or `x IN UNNEST(arr)`
        node.set("field", parser.parse_unary()?);
        return Ok(node);
    }
    if matches!(
        parser.current_type(),
        TokenType::Select | TokenType::With | TokenType::Values
    ) {
        let query = parser.parse_statement()?;
        node.set("query", ast::subquery(query));
    } else {
        node.set("expressions", parser.parse_csv(Parser::parse_expression)?);
    }
    parser.expect(TokenType::RParen)?;
    Ok(node)
}
