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

use pretty_assertions::assert_eq;

use sqlweave::dialect::{self, Dialect, DialectError};

#[test]
fn test_versioned_reference_clones_the_singleton() {
    let base = dialect::get("base").unwrap();
    let versioned = dialect::get("base, version=2.1").unwrap();

    assert_eq!(versioned.version, Some((2, 1, 0)));
    assert_eq!(versioned.name, base.name);
    assert_eq!(versioned.flags, base.flags);
    assert_eq!(versioned.tokenizer, base.tokenizer);
    assert_eq!(versioned.parser, base.parser);
    assert_eq!(versioned.time_mapping, base.time_mapping);

    // the registered singleton is untouched
    assert_eq!(base.version, None);
    assert_eq!(dialect::get("base").unwrap().version, None);
}

#[test]
fn test_unknown_dialect() {
    let err = dialect::get("not_a_real_dialect").unwrap_err();
    assert_eq!(
        err,
        DialectError::UnknownDialect(String::from("not_a_real_dialect"))
    );
}

#[test]
fn test_version_components_default_to_zero() {
    assert_eq!(
        dialect::get("base, version=3").unwrap().version,
        Some((3, 0, 0))
    );
    assert_eq!(
        dialect::get("base, version=1.2.3").unwrap().version,
        Some((1, 2, 3))
    );
    assert!(matches!(
        dialect::get("base, version=abc"),
        Err(DialectError::InvalidVersion(_))
    ));
    assert!(matches!(
        dialect::get("base, version=1.2.3.4"),
        Err(DialectError::InvalidVersion(_))
    ));
}

#[test]
fn test_empty_reference_means_base() {
    assert_eq!(dialect::get("").unwrap().name, "base");
}

#[test]
fn test_name_lookup_is_case_insensitive() {
    assert_eq!(dialect::get("POSTGRES").unwrap().name, "postgres");
}

#[test]
fn test_list_contains_builtins() {
    let names = dialect::list();
    for name in ["base", "bigquery", "mysql", "postgres"] {
        assert!(names.contains(&String::from(name)), "{names:?}");
    }
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[test]
fn test_register_custom_dialect() {
    let mut custom = Dialect::new("customdb");
    custom.flags.log_base_first = true;
    dialect::register(custom);

    let resolved = dialect::get("customdb").unwrap();
    assert!(resolved.flags.log_base_first);
}

#[test]
fn test_register_mixed_case_name_is_stored_lowercased() {
    let mut custom = Dialect::new("FancyDB");
    custom.flags.concat_coalesce = true;
    dialect::register(custom);

    // lookups lowercase the reference, so both spellings resolve
    let resolved = dialect::get("fancydb").unwrap();
    assert!(resolved.flags.concat_coalesce);
    assert_eq!(resolved.name, "FancyDB");
    assert!(dialect::get("FancyDB").is_ok());
    assert!(dialect::list().contains(&String::from("fancydb")));
}

#[test]
fn test_time_format_translation() {
    let mysql = dialect::get("mysql").unwrap();
    assert_eq!(mysql.format_time("%Y-%c-%e %h:%i"), "%Y-%-m-%-d %I:%M");
    assert_eq!(mysql.inverse_format_time("%Y-%-m-%-d"), "%Y-%c-%e");
}

#[test]
fn test_get_or_err_skips_version_handling() {
    let postgres = dialect::get_or_err("Postgres").unwrap();
    assert_eq!(postgres.name, "postgres");

    let err = dialect::get_or_err("duckdb").unwrap_err();
    assert_eq!(err, DialectError::UnknownDialect(String::from("duckdb")));
}
