//! Translated output must parse again: Presto output with our own front
//! end, Hive output with sqlparser's Hive dialect.

use sqlparser::dialect::HiveDialect;
use sqlparser::parser::Parser;

use sqlbridge::sql::{parse_query, ParserOptions};
use sqlbridge::{Dialect, TranslationContext};

const QUERIES: &[&str] = &[
    "SELECT a, b FROM table1 WHERE c > 1.5 AND a LIKE 'x%'",
    "SELECT a, count(*) FROM table1 GROUP BY a HAVING count(*) > 1 ORDER BY a DESC LIMIT 10",
    "SELECT DISTINCT a FROM table1 WHERE b IN (1, 2, 3) OR b BETWEEN 10 AND 20",
    "SELECT CASE WHEN b > 0 THEN 'pos' ELSE 'neg' END AS sign FROM table1",
    "SELECT sum(b) OVER (PARTITION BY a ORDER BY ts ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) FROM table1",
    "SELECT x.a FROM (SELECT a FROM table1 WHERE b IS NOT NULL) AS x",
    "SELECT a FROM table1 WHERE EXISTS (SELECT 1 FROM dwh.dim_agent WHERE name = a)",
    "WITH w AS (SELECT a, b FROM table1) SELECT a FROM w UNION ALL SELECT name FROM dwh.dim_agent",
    "SELECT email, site_code FROM dwh.dim_agent AS d LEFT JOIN table1 AS t ON d.name = t.a",
    "SELECT cardinality(arr), now(), date_format(ts, '%Y-%m-%d') FROM table1",
    "SELECT a, x FROM table1 CROSS JOIN UNNEST(arr) AS u (x)",
    "SELECT c * 1.5e3, c / 2.5E-2 FROM table1",
    "SELECT agent_id FROM rta.agent_state_updates WHERE ts / 1000 > 1600000000",
];

#[test]
fn test_presto_output_parses_to_same_tree() {
    let ctx = TranslationContext::default().with_target(Dialect::Presto);
    let options = ParserOptions::default();
    for sql in QUERIES {
        let rendered = ctx.translate(sql).unwrap();
        let original = parse_query(sql, &options).unwrap();
        let reparsed = parse_query(&rendered, &options)
            .unwrap_or_else(|e| panic!("{} did not re-parse: {}", rendered, e));
        assert_eq!(original, reparsed, "{}", rendered);
    }
}

#[test]
fn test_presto_output_is_stable() {
    let ctx = TranslationContext::default().with_target(Dialect::Presto);
    for sql in QUERIES {
        let once = ctx.translate(sql).unwrap();
        let twice = ctx.translate(&once).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn test_hive_output_parses() {
    let ctx = TranslationContext::default();
    for sql in QUERIES {
        let rendered = ctx.translate(sql).unwrap();
        if let Err(e) = Parser::parse_sql(&HiveDialect {}, &rendered) {
            panic!("Hive output {} does not parse: {}", rendered, e);
        }
    }
}
