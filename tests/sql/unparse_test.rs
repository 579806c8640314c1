use insta::assert_snapshot;
use sqlbridge::sql::{
    parse_query, Node, ParserOptions, UnparseOptions, Unparser, UnsupportedConstruct,
};
use sqlbridge::Dialect;

fn parse(sql: &str) -> Node {
    parse_query(sql, &ParserOptions::default()).unwrap()
}

fn hive(sql: &str) -> String {
    Unparser::new(Dialect::Hive).to_sql(&parse(sql)).unwrap()
}

fn presto(sql: &str) -> String {
    Unparser::new(Dialect::Presto).to_sql(&parse(sql)).unwrap()
}

#[test]
fn test_cross_join_unnest_becomes_lateral_view() {
    assert_snapshot!(
        hive("SELECT c FROM table1 CROSS JOIN UNNEST(table1.arr) AS t (c)"),
        @"SELECT c FROM table1 LATERAL VIEW explode(table1.arr) t AS c"
    );
}

#[test]
fn test_comma_join_unnest_becomes_lateral_view() {
    assert_snapshot!(
        hive("SELECT a, c FROM table1, UNNEST(arr) AS t (c) WHERE b > 1"),
        @"SELECT a, c FROM table1 LATERAL VIEW explode(arr) t AS c WHERE b > 1"
    );
}

#[test]
fn test_unnest_needs_single_column_alias() {
    let tree = parse("SELECT * FROM UNNEST(ARRAY[1, 2]) AS t (c)");
    let err = Unparser::new(Dialect::Hive).to_sql(&tree).unwrap_err();
    assert!(matches!(err, UnsupportedConstruct::Render { dialect: "hive", .. }));
}

#[test]
fn test_day_of_week() {
    assert_snapshot!(
        hive("SELECT EXTRACT(DOW FROM ts) FROM table1"),
        @"SELECT from_unixtime(unix_timestamp(ts), 'u') FROM table1"
    );
    assert_snapshot!(
        hive("SELECT EXTRACT(YEAR FROM ts) FROM table1"),
        @"SELECT EXTRACT(YEAR FROM ts) FROM table1"
    );
}

#[test]
fn test_utc_conversion() {
    assert_snapshot!(
        hive("SELECT to_timestamp_tz(date_parse(s, '%Y-%m-%d'), 'UTC', tz) FROM t"),
        @"SELECT from_utc_timestamp(s, tz) FROM t"
    );
}

#[test]
fn test_utc_conversion_needs_utc_source() {
    let tree = parse("SELECT to_timestamp_tz(date_parse(s, '%Y'), 'PST', tz) FROM t");
    let err = Unparser::new(Dialect::Hive).to_sql(&tree).unwrap_err();
    assert_eq!(
        err,
        UnsupportedConstruct::Function {
            name: "to_timestamp_tz".into(),
            dialect: "hive",
        }
    );
}

#[test]
fn test_concat_and_constructors() {
    assert_snapshot!(
        hive("SELECT a || '-' || b, ARRAY[1, 2], MAP(ARRAY['k'], ARRAY[c]) FROM table1"),
        @"SELECT concat(concat(a, '-'), b), array(1, 2), MAP('k', c) FROM table1"
    );
}

#[test]
fn test_null_safe_comparisons() {
    assert_eq!(
        hive("SELECT a FROM t WHERE a IS NOT DISTINCT FROM b"),
        "SELECT a FROM t WHERE a <=> b"
    );
    let distinct = hive("SELECT a FROM t WHERE a IS DISTINCT FROM b");
    assert!(distinct.starts_with("SELECT a FROM t WHERE NOT"), "{}", distinct);
    assert!(distinct.contains("a <=> b"), "{}", distinct);
}

#[test]
fn test_string_and_identifier_quoting() {
    assert_snapshot!(
        hive(r#"SELECT 'it''s', "users", "user", "map", "$col" FROM t"#),
        @r"SELECT 'it\'s', users, `user`, `map`, `$col` FROM t"
    );
    assert_snapshot!(
        presto(r#"SELECT 'it''s', "$col" FROM t"#),
        @r#"SELECT 'it''s', "$col" FROM t"#
    );
}

#[test]
fn test_window_and_case() {
    assert_snapshot!(
        hive(
            "SELECT CASE WHEN b > 1 THEN 'big' ELSE 'small' END, \
             row_number() OVER (PARTITION BY a ORDER BY b DESC) FROM table1"
        ),
        @"SELECT CASE WHEN b > 1 THEN 'big' ELSE 'small' END, row_number() OVER (PARTITION BY a ORDER BY b DESC) FROM table1"
    );
}

#[test]
fn test_paging_order() {
    let sql = "SELECT a FROM t ORDER BY a LIMIT 10 OFFSET 5";
    assert_eq!(hive(sql), "SELECT a FROM t ORDER BY a LIMIT 10 OFFSET 5");
    assert_eq!(presto(sql), "SELECT a FROM t ORDER BY a OFFSET 5 LIMIT 10");
}

#[test]
fn test_presto_only_function_is_rejected() {
    let tree = parse("SELECT date_parse(s, '%Y') FROM t");
    let err = Unparser::new(Dialect::Hive).to_sql(&tree).unwrap_err();
    assert!(matches!(err, UnsupportedConstruct::Function { ref name, .. } if name == "date_parse"));

    let lenient = UnparseOptions {
        pretty: false,
        check_functions: false,
    };
    assert_eq!(
        Unparser::with_options(Dialect::Hive, lenient)
            .to_sql(&tree)
            .unwrap(),
        "SELECT date_parse(s, '%Y') FROM t"
    );
}

#[test]
fn test_pretty_output() {
    let options = UnparseOptions {
        pretty: true,
        check_functions: true,
    };
    let tree = parse("SELECT a, count(*) FROM t WHERE b = 1 GROUP BY a HAVING count(*) > 2");
    assert_snapshot!(
        Unparser::with_options(Dialect::Hive, options).to_sql(&tree).unwrap(),
        @r"
    SELECT a, count(*)
    FROM t
    WHERE b = 1
    GROUP BY a
    HAVING count(*) > 2
    "
    );
}

#[test]
fn test_with_union_body() {
    assert_snapshot!(
        hive("WITH x AS (SELECT a FROM t) SELECT a FROM x UNION ALL SELECT a FROM y"),
        @"WITH x AS (SELECT a FROM t) (SELECT a FROM x UNION ALL SELECT a FROM y)"
    );
}
