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

//! Parser tests that hold across dialects, run against the base dialect
//! unless a test says otherwise.

use pretty_assertions::assert_eq;

use sqlweave::ast::{Node, Tag};
use sqlweave::parser::{ErrorLevel, ParserError, ParserOptions};
use sqlweave::{parse, parse_one, parse_with_options, Error};

fn one(sql: &str) -> Node {
    parse_one(sql, "base").unwrap_or_else(|e| panic!("failed to parse {sql:?}: {e}"))
}

fn projections(select: &Node) -> &[Node] {
    select.child_list("expressions")
}

#[test]
fn test_select_number_literal() {
    let select = one("SELECT 1");
    assert_eq!(select.tag, Tag::Select);
    let projection = &projections(&select)[0];
    assert_eq!(projection.tag, Tag::Literal);
    assert_eq!(projection.text("this"), "1");
    assert!(!projection.flag("is_string"));
    assert_eq!(projections(&select).len(), 1);
}

#[test]
fn test_select_with_all_core_clauses() {
    let select = one("SELECT a FROM t WHERE a > 1 GROUP BY a ORDER BY a LIMIT 10");
    assert_eq!(select.tag, Tag::Select);
    assert_eq!(select.child("from").unwrap().tag, Tag::From);
    let where_clause = select.child("where").unwrap();
    assert_eq!(where_clause.tag, Tag::Where);
    assert_eq!(where_clause.child("this").unwrap().tag, Tag::Gt);
    assert_eq!(select.child("group").unwrap().tag, Tag::Group);
    assert_eq!(select.child("order").unwrap().tag, Tag::Order);
    let limit = select.child("limit").unwrap();
    assert_eq!(limit.tag, Tag::Limit);
    assert_eq!(limit.child("expression").unwrap().text("this"), "10");
}

#[test]
fn test_clause_out_of_order_is_rejected() {
    let result = parse("SELECT a FROM t ORDER BY a WHERE a > 1", "base");
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Invalid expression"), "{err}");
}

#[test]
fn test_not_between() {
    let node = one("a NOT BETWEEN 1 AND 10");
    assert_eq!(node.tag, Tag::Not);
    let between = node.child("this").unwrap();
    assert_eq!(between.tag, Tag::Between);
    assert_eq!(between.child("low").unwrap().text("this"), "1");
    assert_eq!(between.child("high").unwrap().text("this"), "10");
}

#[test]
fn test_not_like() {
    let node = one("a NOT LIKE 'x'");
    assert_eq!(node.tag, Tag::Not);
    assert_eq!(node.child("this").unwrap().tag, Tag::Like);
}

#[test]
fn test_dangling_not_errors_at_the_not_token() {
    let err = parse("a NOT", "base").unwrap_err();
    let Error::Parse(ParserError::Syntax { errors, .. }) = err else {
        panic!("expected a syntax error");
    };
    assert_eq!(errors[0].highlight, "NOT");
    assert_eq!(errors[0].line, 1);
    assert_eq!(errors[0].col, 3);
    assert_eq!(errors[0].description, "Invalid expression / Unexpected token");
}

#[test]
fn test_set_operations_chain_left_to_right() {
    let node = one("SELECT * FROM a UNION SELECT * FROM b INTERSECT SELECT * FROM c");
    assert_eq!(node.tag, Tag::Intersect);
    let union = node.child("this").unwrap();
    assert_eq!(union.tag, Tag::Union);
    assert_eq!(union.child("this").unwrap().tag, Tag::Select);
    assert_eq!(union.child("expression").unwrap().tag, Tag::Select);
    assert_eq!(node.child("expression").unwrap().tag, Tag::Select);
    assert!(node.flag("distinct"));
}

#[test]
fn test_union_all_and_by_name() {
    let node = one("SELECT 1 UNION ALL SELECT 2");
    assert_eq!(node.tag, Tag::Union);
    assert!(!node.flag("distinct"));

    let node = one("SELECT * FROM a UNION BY NAME SELECT * FROM b");
    assert!(node.flag("by_name"));
}

#[test]
fn test_unparsed_statement_becomes_command_with_exact_text() {
    let sql = "ALTER TABLE t ADD COLUMN c INT";
    let node = one(sql);
    assert_eq!(node.tag, Tag::Command);
    assert_eq!(node.text("this"), sql);
}

#[test]
fn test_failed_structured_parse_falls_back_to_command() {
    // CREATE INDEX is not part of the structured DDL grammar
    let sql = "CREATE INDEX idx ON t (a)";
    let node = one(sql);
    assert_eq!(node.tag, Tag::Command);
    assert_eq!(node.text("this"), sql);
}

#[test]
fn test_command_still_parses_embedded_subqueries() {
    let sql = "MERGE INTO t USING (SELECT 1) s ON t.id = s.id";
    let node = one(sql);
    assert_eq!(node.tag, Tag::Command);
    assert_eq!(node.text("this"), sql);
    let subqueries = node.child_list("expressions");
    assert_eq!(subqueries.len(), 1);
    assert_eq!(subqueries[0].tag, Tag::Subquery);
}

#[test]
fn test_semicolons_split_statements() {
    let statements = parse("SELECT 1; SELECT 2;", "base").unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].tag, Tag::Select);
    assert_eq!(statements[1].tag, Tag::Select);
}

#[test]
fn test_projection_aliases() {
    let select = one("SELECT a AS x, b y FROM t");
    let projections = projections(&select);
    assert_eq!(projections[0].tag, Tag::Alias);
    assert_eq!(projections[0].child("alias").unwrap().name(), "x");
    assert_eq!(projections[1].tag, Tag::Alias);
    assert_eq!(projections[1].child("alias").unwrap().name(), "y");
}

#[test]
fn test_in_subquery_and_in_list() {
    let select = one("SELECT * FROM t WHERE a IN (SELECT b FROM u)");
    let in_node = select.child("where").unwrap().child("this").unwrap();
    assert_eq!(in_node.tag, Tag::In);
    assert_eq!(in_node.child("query").unwrap().tag, Tag::Subquery);

    let in_node = one("a IN (1, 2, 3)");
    assert_eq!(in_node.tag, Tag::In);
    assert_eq!(in_node.child_list("expressions").len(), 3);
}

#[test]
fn test_between_binds_tighter_than_and() {
    let select = one("SELECT * FROM t WHERE a BETWEEN 1 AND 10 AND b = 2");
    let condition = select.child("where").unwrap().child("this").unwrap();
    assert_eq!(condition.tag, Tag::And);
    assert_eq!(condition.child("this").unwrap().tag, Tag::Between);
    assert_eq!(condition.child("expression").unwrap().tag, Tag::Eq);
}

#[test]
fn test_is_null_and_is_not_null() {
    let node = one("a IS NULL");
    assert_eq!(node.tag, Tag::Is);
    assert_eq!(node.child("expression").unwrap().tag, Tag::Null);

    let node = one("a IS NOT NULL");
    assert_eq!(node.tag, Tag::Not);
    assert_eq!(node.child("this").unwrap().tag, Tag::Is);
}

#[test]
fn test_like_with_escape() {
    let node = one("a LIKE 'x!%' ESCAPE '!'");
    assert_eq!(node.tag, Tag::Like);
    assert_eq!(node.child("escape").unwrap().text("this"), "!");
}

#[test]
fn test_arithmetic_precedence() {
    let node = one("1 + 2 * 3");
    assert_eq!(node.tag, Tag::Add);
    assert_eq!(node.child("expression").unwrap().tag, Tag::Mul);

    let node = one("(1 + 2) * 3");
    assert_eq!(node.tag, Tag::Mul);
    assert_eq!(node.child("this").unwrap().tag, Tag::Paren);
}

#[test]
fn test_case_expression() {
    let select = one("SELECT CASE WHEN a = 1 THEN 'one' ELSE 'other' END FROM t");
    let case = &projections(&select)[0];
    assert_eq!(case.tag, Tag::Case);
    assert_eq!(case.child_list("ifs").len(), 1);
    assert_eq!(case.child("default").unwrap().text("this"), "other");
}

#[test]
fn test_casts() {
    let select = one("SELECT CAST(a AS INT), b::TEXT FROM t");
    let projections = projections(&select);
    assert_eq!(projections[0].tag, Tag::Cast);
    assert_eq!(
        projections[0].child("to").unwrap().text("this"),
        "INT"
    );
    assert_eq!(projections[1].tag, Tag::Cast);
    assert_eq!(
        projections[1].child("to").unwrap().text("this"),
        "TEXT"
    );
}

#[test]
fn test_typed_date_literal() {
    let select = one("SELECT DATE '2020-01-01'");
    let cast = &projections(&select)[0];
    assert_eq!(cast.tag, Tag::Cast);
    assert_eq!(cast.child("this").unwrap().text("this"), "2020-01-01");
    assert_eq!(cast.child("to").unwrap().text("this"), "DATE");
}

#[test]
fn test_interval() {
    let select = one("SELECT INTERVAL '1' DAY");
    let interval = &projections(&select)[0];
    assert_eq!(interval.tag, Tag::Interval);
    assert_eq!(interval.child("unit").unwrap().text("this"), "DAY");
}

#[test]
fn test_functions() {
    let select = one("SELECT COUNT(*), COALESCE(a, b), SUM(x) FROM t");
    let projections = projections(&select);
    assert_eq!(projections[0].tag, Tag::Count);
    assert_eq!(projections[0].child("this").unwrap().tag, Tag::Star);
    assert_eq!(projections[1].tag, Tag::Coalesce);
    assert_eq!(projections[1].child_list("expressions").len(), 1);
    assert_eq!(projections[2].tag, Tag::Func);
    assert_eq!(projections[2].name(), "SUM");
}

#[test]
fn test_count_distinct() {
    let select = one("SELECT COUNT(DISTINCT a) FROM t");
    let count = &projections(&select)[0];
    assert_eq!(count.tag, Tag::Count);
    assert_eq!(count.child("this").unwrap().tag, Tag::Distinct);
}

#[test]
fn test_window_function() {
    let select = one("SELECT SUM(a) OVER (PARTITION BY b ORDER BY c DESC) FROM t");
    let window = &projections(&select)[0];
    assert_eq!(window.tag, Tag::Window);
    assert_eq!(window.child("this").unwrap().tag, Tag::Func);
    assert_eq!(window.child_list("partition_by").len(), 1);
    let ordered = &window.child("order").unwrap().child_list("expressions")[0];
    assert_eq!(ordered.tag, Tag::Ordered);
    assert!(ordered.flag("desc"));
}

#[test]
fn test_window_frame() {
    let select =
        one("SELECT SUM(a) OVER (ORDER BY b ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) FROM t");
    let window = &projections(&select)[0];
    let spec = window.child("spec").unwrap();
    assert_eq!(spec.tag, Tag::WindowSpec);
    assert_eq!(spec.text("kind"), "ROWS");
    assert_eq!(spec.text("start"), "UNBOUNDED");
    assert_eq!(spec.text("start_side"), "PRECEDING");
    assert_eq!(spec.text("end"), "CURRENT ROW");
}

#[test]
fn test_joins() {
    let select = one("SELECT * FROM a JOIN b ON a.id = b.id LEFT OUTER JOIN c USING (x)");
    let joins = select.child_list("joins");
    assert_eq!(joins.len(), 2);
    assert!(joins[0].child("on").is_some());
    assert_eq!(joins[1].text("side"), "LEFT");
    assert_eq!(joins[1].text("kind"), "OUTER");
    assert_eq!(joins[1].child_list("using").len(), 1);
}

#[test]
fn test_implicit_join_from_comma() {
    let select = one("SELECT * FROM a, b");
    let joins = select.child_list("joins");
    assert_eq!(joins.len(), 1);
    assert!(joins[0].get("kind").is_none());
}

#[test]
fn test_group_by_rollup() {
    let select = one("SELECT a FROM t GROUP BY ROLLUP (a, b)");
    let group = select.child("group").unwrap();
    let rollup = &group.child_list("rollup")[0];
    assert_eq!(rollup.tag, Tag::Rollup);
    assert_eq!(rollup.child_list("expressions").len(), 2);
}

#[test]
fn test_cte_attaches_to_select() {
    let select = one("WITH x AS (SELECT 1) SELECT * FROM x");
    assert_eq!(select.tag, Tag::Select);
    let with = select.child("with").unwrap();
    assert_eq!(with.tag, Tag::With);
    let cte = &with.child_list("expressions")[0];
    assert_eq!(cte.tag, Tag::Cte);
    assert_eq!(cte.child("alias").unwrap().name(), "x");
    assert_eq!(cte.child("this").unwrap().tag, Tag::Select);
}

#[test]
fn test_cte_over_statement_without_with_slot_wraps_command() {
    let node = one("WITH x AS (SELECT 1) DROP TABLE x");
    assert_eq!(node.tag, Tag::Command);
    assert_eq!(node.text("this"), "DROP TABLE x");
    assert_eq!(node.child("with").unwrap().tag, Tag::With);
}

#[test]
fn test_values() {
    let values = one("VALUES (1, 2), (3, 4)");
    assert_eq!(values.tag, Tag::Values);
    let rows = values.child_list("expressions");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].tag, Tag::Tuple);
    assert_eq!(rows[0].child_list("expressions").len(), 2);
}

#[test]
fn test_insert() {
    let insert = one("INSERT INTO t (a, b) VALUES (1, 2)");
    assert_eq!(insert.tag, Tag::Insert);
    assert_eq!(insert.child("this").unwrap().tag, Tag::Table);
    assert_eq!(insert.child_list("columns").len(), 2);
    assert_eq!(insert.child("expression").unwrap().tag, Tag::Values);
}

#[test]
fn test_insert_from_select() {
    let insert = one("INSERT INTO t SELECT a FROM u");
    assert_eq!(insert.tag, Tag::Insert);
    assert_eq!(insert.child("expression").unwrap().tag, Tag::Select);
}

#[test]
fn test_update() {
    let update = one("UPDATE t SET a = 1 WHERE b = 2");
    assert_eq!(update.tag, Tag::Update);
    assert_eq!(update.child_list("expressions")[0].tag, Tag::Eq);
    assert!(update.child("where").is_some());
}

#[test]
fn test_delete() {
    let delete = one("DELETE FROM t WHERE a = 1");
    assert_eq!(delete.tag, Tag::Delete);
    assert!(delete.child("where").is_some());
}

#[test]
fn test_create_table_with_columns() {
    let create = one("CREATE TABLE IF NOT EXISTS t (a INT, b TEXT NOT NULL)");
    assert_eq!(create.tag, Tag::Create);
    assert_eq!(create.text("kind"), "TABLE");
    assert!(create.flag("exists"));
    let schema = create.child("this").unwrap();
    assert_eq!(schema.tag, Tag::Schema);
    let columns = schema.child_list("expressions");
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[1].child("kind").unwrap().text("this"), "TEXT");
    assert_eq!(columns[1].child_list("constraints").len(), 2);
}

#[test]
fn test_create_view_as_select() {
    let create = one("CREATE OR REPLACE VIEW v AS SELECT 1");
    assert_eq!(create.tag, Tag::Create);
    assert_eq!(create.text("kind"), "VIEW");
    assert!(create.flag("replace"));
    assert_eq!(create.child("expression").unwrap().tag, Tag::Select);
}

#[test]
fn test_drop() {
    let drop = one("DROP TABLE IF EXISTS t CASCADE");
    assert_eq!(drop.tag, Tag::Drop);
    assert_eq!(drop.text("kind"), "TABLE");
    assert!(drop.flag("exists"));
    assert!(drop.flag("cascade"));
}

#[test]
fn test_transaction_control() {
    let statements = parse("BEGIN; COMMIT; ROLLBACK", "base").unwrap();
    assert_eq!(statements[0].tag, Tag::Transaction);
    assert_eq!(statements[1].tag, Tag::Commit);
    assert_eq!(statements[2].tag, Tag::Rollback);
}

#[test]
fn test_set_statement() {
    let set = one("SET GLOBAL x = 1");
    assert_eq!(set.tag, Tag::SetStatement);
    let item = &set.child_list("expressions")[0];
    assert_eq!(item.tag, Tag::SetItem);
    assert_eq!(item.text("kind"), "GLOBAL");
    assert!(item.flag("global"));
    assert_eq!(item.child("this").unwrap().tag, Tag::Eq);
}

#[test]
fn test_use() {
    let node = one("USE db");
    assert_eq!(node.tag, Tag::Use);
    assert_eq!(node.child("this").unwrap().name(), "db");
}

#[test]
fn test_limit_and_offset() {
    let select = one("SELECT a FROM t LIMIT 10 OFFSET 5");
    assert!(select.child("limit").is_some());
    assert_eq!(
        select
            .child("offset")
            .unwrap()
            .child("expression")
            .unwrap()
            .text("this"),
        "5"
    );
}

#[test]
fn test_exists_subquery() {
    let node = one("EXISTS (SELECT 1)");
    assert_eq!(node.tag, Tag::Exists);
    assert_eq!(node.child("this").unwrap().tag, Tag::Subquery);
}

#[test]
fn test_postgres_regex_operators() {
    let node = parse_one("a ~ 'x'", "postgres").unwrap();
    assert_eq!(node.tag, Tag::RegexpLike);

    let node = parse_one("a !~ 'x'", "postgres").unwrap();
    assert_eq!(node.tag, Tag::Not);
    assert_eq!(node.child("this").unwrap().tag, Tag::RegexpLike);

    let node = parse_one("a !~~ 'x'", "postgres").unwrap();
    assert_eq!(node.tag, Tag::Not);
    assert_eq!(node.child("this").unwrap().tag, Tag::Like);

    let node = parse_one("a !~~* 'x'", "postgres").unwrap();
    assert_eq!(node.tag, Tag::Not);
    assert_eq!(node.child("this").unwrap().tag, Tag::ILike);
}

#[test]
fn test_caret_changes_meaning_per_dialect() {
    let select = parse_one("SELECT 2 ^ 3", "base").unwrap();
    assert_eq!(projections(&select)[0].tag, Tag::BitwiseXor);

    let select = parse_one("SELECT 2 ^ 3", "postgres").unwrap();
    assert_eq!(projections(&select)[0].tag, Tag::Pow);
}

#[test]
fn test_error_level_ignore_swallows_errors() {
    let options = ParserOptions {
        error_level: ErrorLevel::Ignore,
        ..ParserOptions::default()
    };
    let statements = parse_with_options("a NOT", "base", options).unwrap();
    assert_eq!(statements.len(), 1);
}

#[test]
fn test_error_level_immediate_aborts() {
    let options = ParserOptions {
        error_level: ErrorLevel::Immediate,
        ..ParserOptions::default()
    };
    assert!(parse_with_options("a NOT", "base", options).is_err());
}

#[test]
fn test_errors_beyond_max_are_summarized() {
    let err = parse("SELECT 1 2; SELECT 1 2; SELECT 1 2; SELECT 1 2", "base").unwrap_err();
    let Error::Parse(ParserError::Syntax { message, errors }) = err else {
        panic!("expected a syntax error");
    };
    assert_eq!(errors.len(), 4);
    assert!(message.contains("... and 1 more"), "{message}");
}

#[test]
fn test_qualified_column_and_star() {
    let select = one("SELECT t.a, t.* FROM t");
    let projections = projections(&select);
    assert_eq!(projections[0].tag, Tag::Column);
    assert_eq!(projections[0].child("table").unwrap().name(), "t");
    assert_eq!(projections[1].tag, Tag::Column);
    assert_eq!(projections[1].child("this").unwrap().tag, Tag::Star);
}

#[test]
fn test_derived_table() {
    let select = one("SELECT * FROM (SELECT a FROM t) AS s");
    let from = select.child("from").unwrap();
    let subquery = from.child("this").unwrap();
    assert_eq!(subquery.tag, Tag::Subquery);
    assert_eq!(subquery.child("alias").unwrap().name(), "s");
}

#[test]
fn test_connect_by_with_prior() {
    let select = one(
        "SELECT employee_id FROM employees \
         START WITH manager_id IS NULL \
         CONNECT BY PRIOR employee_id = manager_id",
    );
    let connect = select.child("connect").unwrap();
    assert_eq!(connect.tag, Tag::Connect);
    assert_eq!(connect.child("start").unwrap().tag, Tag::Is);
    let condition = connect.child("connect").unwrap();
    assert_eq!(condition.tag, Tag::Eq);
    assert_eq!(condition.child("this").unwrap().tag, Tag::Prior);
}

#[test]
fn test_connect_by_nocycle_start_with_after() {
    let select = one("SELECT a FROM t CONNECT BY NOCYCLE PRIOR a = b START WITH b = 1");
    let connect = select.child("connect").unwrap();
    assert!(connect.flag("nocycle"));
    assert!(connect.child("start").is_some());
}

#[test]
fn test_prior_is_a_plain_name_outside_connect_by() {
    let select = one("SELECT prior FROM t");
    assert_eq!(projections(&select)[0].tag, Tag::Column);
}

#[test]
fn test_cross_apply_parses_as_lateral() {
    let select = one("SELECT * FROM t CROSS APPLY f(t.a) OUTER APPLY g(t.b)");
    let laterals = select.child_list("laterals");
    assert_eq!(laterals.len(), 2);
    assert_eq!(laterals[0].tag, Tag::Lateral);
    assert!(laterals[0].flag("cross_apply"));
    assert!(!laterals[1].flag("cross_apply"));
}

#[test]
fn test_array_literal_and_comprehension() {
    let select = one("SELECT [1, 2, 3]");
    let array = &projections(&select)[0];
    assert_eq!(array.tag, Tag::Array);
    assert_eq!(array.child_list("expressions").len(), 3);

    let select = one("SELECT [x * 2 FOR x IN xs IF x > 0]");
    let comprehension = &projections(&select)[0];
    assert_eq!(comprehension.tag, Tag::Comprehension);
    assert_eq!(comprehension.child("this").unwrap().tag, Tag::Mul);
    assert_eq!(comprehension.child("iterator").unwrap().tag, Tag::Column);
    assert_eq!(comprehension.child("condition").unwrap().tag, Tag::Gt);
}

#[test]
fn test_map_brace_literal() {
    let select = one("SELECT MAP {'a': 1, 'b': 2}");
    let map = &projections(&select)[0];
    assert_eq!(map.tag, Tag::Map);
    assert_eq!(map.child("keys").unwrap().child_list("expressions").len(), 2);
    assert_eq!(
        map.child("values").unwrap().child_list("expressions").len(),
        2
    );
}

#[test]
fn test_positional_join() {
    let select = one("SELECT * FROM t POSITIONAL JOIN u");
    let joins = select.child_list("joins");
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].text("method"), "POSITIONAL");
}

#[test]
fn test_limit_percent_sign_and_keyword() {
    for sql in ["SELECT a FROM t LIMIT 10 %", "SELECT a FROM t LIMIT 10 PERCENT"] {
        let select = one(sql);
        let limit = select.child("limit").unwrap();
        assert_eq!(limit.tag, Tag::Limit, "{sql}");
        assert_eq!(limit.child("expression").unwrap().text("this"), "10");
        assert!(limit.flag("percent"), "{sql}");
    }
}

#[test]
fn test_nulls_modifier_inside_call_wraps_the_call() {
    let select = one("SELECT LAST_VALUE(x IGNORE NULLS) OVER (ORDER BY y) FROM t");
    let window = &projections(&select)[0];
    assert_eq!(window.tag, Tag::Window);
    let wrapper = window.child("this").unwrap();
    assert_eq!(wrapper.tag, Tag::IgnoreNulls);
    let call = wrapper.child("this").unwrap();
    assert_eq!(call.tag, Tag::Func);
    assert_eq!(call.child_list("expressions")[0].tag, Tag::Column);
}

#[test]
fn test_nulls_modifier_after_call() {
    let node = one("FIRST_VALUE(x) RESPECT NULLS");
    assert_eq!(node.tag, Tag::RespectNulls);
    assert_eq!(node.child("this").unwrap().tag, Tag::Func);
}
