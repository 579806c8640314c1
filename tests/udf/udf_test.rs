use sqlbridge::rewrite::HiveRewriter;
use sqlbridge::sql::ast::{Call, Node};
use sqlbridge::sql::{parse_query, OperatorKind, ParserOptions};
use sqlbridge::udf::format::convert_time_format;
use sqlbridge::udf::{ConversionError, ConversionRule, UdfRegistry};

/// First select item of `sql` after the Hive rewrite.
fn rewrite_item(registry: &UdfRegistry, sql: &str) -> Result<Node, ConversionError> {
    let tree = parse_query(sql, &ParserOptions::default()).unwrap();
    let out = HiveRewriter::new(registry).apply(&tree)?.into_owned();
    let Node::Select(select) = out else {
        panic!("expected SELECT");
    };
    Ok(select.items[0].clone())
}

fn function(name: &'static str, operands: Vec<Node>) -> Node {
    Node::function(name, operands)
}

#[test]
fn test_time_format_specifiers() {
    let cases = [
        ("%Y-%m-%d", "yyyy-MM-dd"),
        ("%Y-%m-%d %H:%i:%s", "yyyy-MM-dd HH:mm:ss"),
        ("%H:%i", "HH:mm"),
        ("%Y%m%d", "yyyyMMdd"),
        ("'T'%H", "'T'HH"),
    ];
    for (presto, hive) in cases {
        assert_eq!(convert_time_format(presto).unwrap(), hive, "{}", presto);
    }
}

#[test]
fn test_time_format_rejects_illegal_letters() {
    let err = convert_time_format("%Y-%q").unwrap_err();
    let ConversionError::InvalidFormat {
        format, converted, ..
    } = &err
    else {
        panic!("expected InvalidFormat, got {:?}", err);
    };
    assert_eq!(format, "%Y-%q");
    assert_eq!(converted, "yyyy-%q");
    assert!(err.to_string().contains("illegal pattern character 'q'"));
}

#[test]
fn test_time_format_unterminated_quote() {
    assert!(convert_time_format("'T%H").is_err());
}

#[test]
fn test_registry_rules() {
    let registry = UdfRegistry::presto_to_hive();
    assert_eq!(registry.len(), 6);
    for name in ["now", "to_unixtime", "date_diff", "date_format"] {
        assert!(matches!(
            registry.lookup(name),
            Some(ConversionRule::Transform(_))
        ));
    }
    assert!(matches!(
        registry.lookup("cardinality"),
        Some(ConversionRule::Rename("size"))
    ));
}

#[test]
fn test_to_unixtime_of_date_parse() {
    let registry = UdfRegistry::presto_to_hive();
    let item = rewrite_item(
        &registry,
        "SELECT to_unixtime(date_parse(col, '%Y-%m-%d')) FROM t",
    )
    .unwrap();
    assert_eq!(
        item,
        function(
            "unix_timestamp",
            vec![Node::ident("col"), Node::string("yyyy-MM-dd")]
        )
    );
}

#[test]
fn test_date_diff_swaps_operands() {
    let registry = UdfRegistry::presto_to_hive();
    let item = rewrite_item(
        &registry,
        "SELECT date_diff('second', date_parse(a, '%Y'), date_parse(b, '%Y')) FROM t",
    )
    .unwrap();
    let Node::Call(call) = item else {
        panic!("expected call");
    };
    assert_eq!(call.kind(), OperatorKind::Minus);
    assert_eq!(
        call.operands,
        vec![
            function("unix_timestamp", vec![Node::ident("b"), Node::string("yyyy")]),
            function("unix_timestamp", vec![Node::ident("a"), Node::string("yyyy")]),
        ]
    );
}

#[test]
fn test_date_diff_unit_must_be_second() {
    let registry = UdfRegistry::presto_to_hive();
    let err = rewrite_item(
        &registry,
        "SELECT date_diff('minute', date_parse(a, '%Y'), date_parse(b, '%Y')) FROM t",
    )
    .unwrap_err();
    assert!(err.to_string().contains("'minute'"), "{}", err);
}

#[test]
fn test_date_format_converts_pattern_and_rewrites_value() {
    let registry = UdfRegistry::presto_to_hive();
    let item = rewrite_item(&registry, "SELECT date_format(now(), '%H:%i') FROM t").unwrap();
    assert_eq!(
        item,
        function(
            "date_format",
            vec![function("current_timestamp", vec![]), Node::string("HH:mm")]
        )
    );
}

#[test]
fn test_conversion_is_applied_inside_other_calls() {
    let registry = UdfRegistry::presto_to_hive();
    let item = rewrite_item(&registry, "SELECT coalesce(cardinality(tags), 0) FROM t").unwrap();
    assert_eq!(
        item,
        function(
            "coalesce",
            vec![function("size", vec![Node::ident("tags")]), Node::integer(0)]
        )
    );
}

#[test]
fn test_unexpected_shape_names_the_call() {
    let registry = UdfRegistry::presto_to_hive();
    let err = rewrite_item(&registry, "SELECT to_unixtime(ts) FROM t").unwrap_err();
    let ConversionError::UnexpectedShape {
        function, position, ..
    } = &err
    else {
        panic!("expected UnexpectedShape, got {:?}", err);
    };
    assert_eq!(function, "to_unixtime");
    assert!(position.is_known());
}

#[test]
fn test_custom_transform() {
    let registry = UdfRegistry::new().transform("double_it", |ctx, call| {
        let [value] = call.operands.as_slice() else {
            return Err(ConversionError::unexpected(call, "expected 1 operand"));
        };
        let value = ctx.rewrite(value)?;
        Ok(Call::function("concat", vec![value.clone(), value]).at(call.span))
    });
    let item = rewrite_item(&registry, "SELECT double_it(cardinality(x)) FROM t").unwrap();
    // Only the custom rule is registered, so `cardinality` is left alone.
    let inner = function("cardinality", vec![Node::ident("x")]);
    assert_eq!(item, function("concat", vec![inner.clone(), inner]));
}
