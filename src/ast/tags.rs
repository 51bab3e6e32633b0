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

//! Node tags and their argument descriptors.
//!
//! Every node variant is one [`Tag`] plus a static [`TagDescriptor`] naming
//! its required and optional argument slots. The parser and any downstream
//! generator consult the descriptor generically; no tag carries virtual
//! behavior of its own. Cross-cutting roles ("is a function", "is a query")
//! are capability flags on the descriptor, checked by table lookup.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cross-cutting roles a tag can play, replacing subclass hierarchies with
/// flat capability sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Capability {
    Func,
    AggFunc,
    Unary,
    Binary,
    Predicate,
    Query,
    Ddl,
    Dml,
    /// The statement accepts a `with` argument slot for a CTE list.
    HasWith,
}

/// Static argument declaration for one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDescriptor {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub capabilities: &'static [Capability],
}

impl TagDescriptor {
    pub fn declares(&self, arg: &str) -> bool {
        self.required.contains(&arg) || self.optional.contains(&arg)
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

macro_rules! tags {
    ($(
        $name:ident {
            required: [$($req:literal),* $(,)?],
            optional: [$($opt:literal),* $(,)?],
            caps: [$($cap:ident),* $(,)?]
        }
    ),+ $(,)?) => {
        /// Variant identifier of a generic AST node.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum Tag {
            $($name,)+
        }

        impl Tag {
            pub fn descriptor(&self) -> &'static TagDescriptor {
                match self {
                    $(Tag::$name => &TagDescriptor {
                        required: &[$($req),*],
                        optional: &[$($opt),*],
                        capabilities: &[$(Capability::$cap),*],
                    },)+
                }
            }
        }
    };
}

impl Tag {
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.descriptor().has_capability(capability)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

tags! {
    // identifiers and literals
    Identifier { required: ["this"], optional: ["quoted"], caps: [] },
    Column { required: ["this"], optional: ["table", "db", "catalog"], caps: [] },
    Literal { required: ["this", "is_string"], optional: [], caps: [] },
    Null { required: [], optional: [], caps: [] },
    Boolean { required: ["this"], optional: [], caps: [] },
    Star { required: [], optional: ["except", "replace"], caps: [] },
    National { required: ["this"], optional: [], caps: [] },
    BitString { required: ["this"], optional: [], caps: [] },
    HexString { required: ["this"], optional: ["is_integer"], caps: [] },
    ByteString { required: ["this"], optional: [], caps: [] },
    Placeholder { required: [], optional: ["this", "kind"], caps: [] },
    Parameter { required: ["this"], optional: ["kind"], caps: [] },
    Var { required: ["this"], optional: [], caps: [] },

    // containers
    Paren { required: ["this"], optional: [], caps: [] },
    Tuple { required: [], optional: ["expressions"], caps: [] },
    Array { required: [], optional: ["expressions"], caps: [] },
    Struct { required: [], optional: ["expressions"], caps: [] },
    Alias { required: ["this"], optional: ["alias"], caps: [] },
    TableAlias { required: [], optional: ["this", "columns"], caps: [] },
    Bracket { required: ["this"], optional: ["expressions"], caps: [] },
    Slice { required: [], optional: ["this", "expression"], caps: [] },
    Dot { required: ["this", "expression"], optional: [], caps: [Binary] },
    Comprehension {
        required: ["this", "expression", "iterator"],
        optional: ["condition", "position"],
        caps: []
    },

    // boolean connectives and predicates
    And { required: ["this", "expression"], optional: [], caps: [Binary] },
    Or { required: ["this", "expression"], optional: [], caps: [Binary] },
    Not { required: ["this"], optional: [], caps: [Unary] },
    Eq { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    Neq { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    Gt { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    Gte { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    Lt { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    Lte { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    Is { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    IsDistinctFrom { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    Between {
        required: ["this", "low", "high"],
        optional: ["symmetric"],
        caps: [Predicate]
    },
    In { required: ["this"], optional: ["expressions", "query", "field"], caps: [Predicate] },
    Like { required: ["this", "expression"], optional: ["escape"], caps: [Binary, Predicate] },
    ILike { required: ["this", "expression"], optional: ["escape"], caps: [Binary, Predicate] },
    Glob { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    RegexpLike { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    RegexpILike { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    SimilarTo { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    Any { required: ["this"], optional: [], caps: [Unary] },
    All { required: ["this"], optional: [], caps: [Unary] },
    Exists { required: ["this"], optional: [], caps: [Unary, Predicate] },

    // arithmetic, bitwise, string operators
    Add { required: ["this", "expression"], optional: [], caps: [Binary] },
    Sub { required: ["this", "expression"], optional: [], caps: [Binary] },
    Mul { required: ["this", "expression"], optional: [], caps: [Binary] },
    Div { required: ["this", "expression"], optional: ["typed", "safe"], caps: [Binary] },
    IntDiv { required: ["this", "expression"], optional: [], caps: [Binary] },
    Mod { required: ["this", "expression"], optional: [], caps: [Binary] },
    Pow { required: ["this", "expression"], optional: [], caps: [Binary, Func] },
    DPipe { required: ["this", "expression"], optional: ["safe"], caps: [Binary] },
    BitwiseAnd { required: ["this", "expression"], optional: [], caps: [Binary] },
    BitwiseOr { required: ["this", "expression"], optional: [], caps: [Binary] },
    BitwiseXor { required: ["this", "expression"], optional: [], caps: [Binary] },
    BitwiseLeftShift { required: ["this", "expression"], optional: [], caps: [Binary] },
    BitwiseRightShift { required: ["this", "expression"], optional: [], caps: [Binary] },
    BitwiseNot { required: ["this"], optional: [], caps: [Unary] },
    Neg { required: ["this"], optional: [], caps: [Unary] },
    Prior { required: ["this"], optional: [], caps: [Unary] },
    Sqrt { required: ["this"], optional: [], caps: [Unary, Func] },
    Cbrt { required: ["this"], optional: [], caps: [Unary, Func] },
    Abs { required: ["this"], optional: [], caps: [Unary, Func] },
    ArrayContains { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    ArrayContained { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    ArrayOverlaps { required: ["this", "expression"], optional: [], caps: [Binary, Predicate] },
    StartsWith { required: ["this", "expression"], optional: [], caps: [Binary, Predicate, Func] },
    JsonExtract { required: ["this", "expression"], optional: [], caps: [Binary] },
    JsonExtractScalar { required: ["this", "expression"], optional: [], caps: [Binary] },
    JsonbExtract { required: ["this", "expression"], optional: [], caps: [Binary] },
    JsonbExtractScalar { required: ["this", "expression"], optional: [], caps: [Binary] },
    AtTimeZone { required: ["this", "zone"], optional: [], caps: [Binary] },
    Collate { required: ["this", "expression"], optional: [], caps: [Binary] },

    // typing
    Cast { required: ["this", "to"], optional: [], caps: [Func] },
    TryCast { required: ["this", "to"], optional: [], caps: [Func] },
    DataType { required: ["this"], optional: ["expressions", "nested"], caps: [] },
    Interval { required: [], optional: ["this", "unit"], caps: [] },

    // conditionals
    Case { required: [], optional: ["this", "ifs", "default"], caps: [] },
    If { required: ["this", "true"], optional: ["false"], caps: [] },

    // functions
    Func { required: ["this"], optional: ["expressions"], caps: [Func] },
    Count { required: [], optional: ["this", "big_int"], caps: [Func, AggFunc] },
    Coalesce { required: ["this"], optional: ["expressions"], caps: [Func] },
    Concat { required: ["expressions"], optional: ["safe", "coalesce"], caps: [Func] },
    Trim { required: ["this"], optional: ["expression", "position"], caps: [Func] },
    Substring { required: ["this"], optional: ["start", "length"], caps: [Func] },
    Overlay { required: ["this", "expression"], optional: ["from", "for"], caps: [Func] },
    Map { required: [], optional: ["keys", "values"], caps: [Func] },
    Log { required: ["this"], optional: ["expression"], caps: [Func] },
    Extract { required: ["this", "expression"], optional: [], caps: [Func] },
    CurrentDate { required: [], optional: ["this"], caps: [Func] },
    CurrentTime { required: [], optional: ["this"], caps: [Func] },
    CurrentTimestamp { required: [], optional: ["this"], caps: [Func] },
    CurrentUser { required: [], optional: ["this"], caps: [Func] },
    Lambda { required: ["this"], optional: ["expressions"], caps: [] },
    Kwarg { required: ["this", "expression"], optional: [], caps: [] },
    Distinct { required: [], optional: ["expressions", "on"], caps: [] },
    IgnoreNulls { required: ["this"], optional: [], caps: [] },
    RespectNulls { required: ["this"], optional: [], caps: [] },
    WithinGroup { required: ["this", "expression"], optional: [], caps: [] },
    Filter { required: ["this", "expression"], optional: [], caps: [] },
    Window {
        required: ["this"],
        optional: ["partition_by", "order", "spec", "alias", "over"],
        caps: []
    },
    WindowSpec {
        required: [],
        optional: ["kind", "start", "start_side", "end", "end_side"],
        caps: []
    },

    // query clauses
    Select {
        required: [],
        optional: [
            "expressions", "kind", "distinct", "from", "joins", "laterals",
            "match_recognize", "connect", "where", "group", "having", "qualify",
            "windows", "order", "cluster", "distribute", "sort", "limit",
            "offset", "fetch", "sample", "locks", "with",
        ],
        caps: [Query, HasWith]
    },
    From { required: ["this"], optional: [], caps: [] },
    Join {
        required: ["this"],
        optional: ["on", "using", "side", "kind", "method"],
        caps: []
    },
    Lateral { required: ["this"], optional: ["cross_apply", "alias"], caps: [] },
    Where { required: ["this"], optional: [], caps: [] },
    Connect { required: [], optional: ["start", "connect", "nocycle"], caps: [] },
    Group {
        required: [],
        optional: ["expressions", "all", "cube", "rollup", "grouping_sets"],
        caps: []
    },
    GroupingSets { required: ["expressions"], optional: [], caps: [] },
    Cube { required: [], optional: ["expressions"], caps: [] },
    Rollup { required: [], optional: ["expressions"], caps: [] },
    Having { required: ["this"], optional: [], caps: [] },
    Qualify { required: ["this"], optional: [], caps: [] },
    Order { required: ["expressions"], optional: ["this", "all"], caps: [] },
    Ordered { required: ["this"], optional: ["desc", "nulls_first"], caps: [] },
    Cluster { required: ["expressions"], optional: [], caps: [] },
    Distribute { required: ["expressions"], optional: [], caps: [] },
    Sort { required: ["expressions"], optional: [], caps: [] },
    Limit { required: ["expression"], optional: ["percent"], caps: [] },
    Offset { required: ["expression"], optional: [], caps: [] },
    Fetch {
        required: [],
        optional: ["direction", "count", "percent", "with_ties"],
        caps: []
    },
    Lock { required: [], optional: ["update", "key", "expressions", "wait"], caps: [] },
    MatchRecognize {
        required: [],
        optional: ["partition_by", "order", "measures", "pattern", "define", "alias"],
        caps: []
    },

    // tables and table operators
    Table {
        required: ["this"],
        optional: ["db", "catalog", "alias", "pivots", "sample"],
        caps: []
    },
    Subquery { required: ["this"], optional: ["alias", "pivots"], caps: [Query] },
    Unnest { required: ["expressions"], optional: ["alias", "offset"], caps: [] },
    TableSample {
        required: [],
        optional: ["method", "percent", "size", "seed"],
        caps: []
    },
    Pivot {
        required: [],
        optional: ["this", "expressions", "field", "unpivot", "alias"],
        caps: []
    },
    Schema { required: ["this"], optional: ["expressions"], caps: [] },
    ColumnDef { required: ["this"], optional: ["kind", "constraints"], caps: [] },

    // set operations
    Union {
        required: ["this", "expression"],
        optional: ["distinct", "by_name", "with"],
        caps: [Query, HasWith]
    },
    Intersect {
        required: ["this", "expression"],
        optional: ["distinct", "by_name", "with"],
        caps: [Query, HasWith]
    },
    Except {
        required: ["this", "expression"],
        optional: ["distinct", "by_name", "with"],
        caps: [Query, HasWith]
    },

    // CTEs
    With { required: ["expressions"], optional: ["recursive"], caps: [] },
    Cte { required: ["this", "alias"], optional: ["materialized", "key"], caps: [] },
    Values { required: ["expressions"], optional: ["alias"], caps: [Query] },

    // statements
    Command { required: ["this"], optional: ["expressions", "with"], caps: [] },
    Use { required: ["this"], optional: ["kind"], caps: [] },
    SetStatement { required: [], optional: ["expressions", "tag"], caps: [] },
    SetItem { required: [], optional: ["this", "kind", "global"], caps: [] },
    Transaction { required: [], optional: ["this", "modes"], caps: [] },
    Commit { required: [], optional: ["chain"], caps: [] },
    Rollback { required: [], optional: ["savepoint"], caps: [] },
    Insert {
        required: ["this"],
        optional: ["expression", "columns", "overwrite", "with"],
        caps: [Dml, HasWith]
    },
    Update {
        required: ["this", "expressions"],
        optional: ["from", "where", "with"],
        caps: [Dml, HasWith]
    },
    Delete {
        required: ["this"],
        optional: ["using", "where", "with"],
        caps: [Dml, HasWith]
    },
    Create {
        required: ["this", "kind"],
        optional: ["expression", "temporary", "exists", "replace", "expressions"],
        caps: [Ddl]
    },
    Drop {
        required: ["this", "kind"],
        optional: ["exists", "temporary", "cascade"],
        caps: [Ddl]
    },
    TruncateTable { required: ["expressions"], optional: [], caps: [Ddl] },
    Show { required: ["this"], optional: [], caps: [] },
    Describe { required: ["this"], optional: ["kind"], caps: [] },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_lookup() {
        let descriptor = Tag::Between.descriptor();
        assert_eq!(descriptor.required, &["this", "low", "high"]);
        assert!(descriptor.declares("symmetric"));
        assert!(!descriptor.declares("made_up"));
    }

    #[test]
    fn test_capabilities() {
        assert!(Tag::Select.has_capability(Capability::Query));
        assert!(Tag::Select.has_capability(Capability::HasWith));
        assert!(Tag::Count.has_capability(Capability::Func));
        assert!(Tag::Count.has_capability(Capability::AggFunc));
        assert!(Tag::Eq.has_capability(Capability::Binary));
        assert!(!Tag::Literal.has_capability(Capability::Func));
    }

    #[test]
    fn test_multi_capability_membership() {
        // a tag can be simultaneously a function and a binary operator
        assert!(Tag::Pow.has_capability(Capability::Func));
        assert!(Tag::Pow.has_capability(Capability::Binary));
    }
}
