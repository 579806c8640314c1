use std::path::PathBuf;

use sqlbridge::config::Settings;
use sqlbridge::translation::{SharedContext, Stage};
use sqlbridge::udf::{ConversionError, UdfRegistry};
use sqlbridge::validation::{UnknownFunctions, ValidationError};
use sqlbridge::{translate, Dialect, TranslateError, TranslationContext};

fn fixture_context() -> TranslationContext {
    let schema_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas");
    let mut settings = Settings::default();
    settings.catalog.schema_dir = Some(schema_dir.to_string_lossy().into_owned());
    TranslationContext::from_settings(&settings).unwrap()
}

fn validation_errors(err: TranslateError) -> Vec<ValidationError> {
    match err {
        TranslateError::Validation(errors) => errors.into_vec(),
        other => panic!("expected validation errors, got {:?}", other),
    }
}

// =============================================================================
// Function conversions
// =============================================================================

#[test]
fn test_now() {
    assert_eq!(
        translate("SELECT now() FROM table1").unwrap(),
        "SELECT current_timestamp() FROM table1"
    );
}

#[test]
fn test_to_unixtime_of_date_parse() {
    assert_eq!(
        translate("SELECT to_unixtime(date_parse(a, '%Y-%m-%d')) FROM table1").unwrap(),
        "SELECT unix_timestamp(a, 'yyyy-MM-dd') FROM table1"
    );
}

#[test]
fn test_date_diff_in_seconds() {
    assert_eq!(
        translate(
            "SELECT date_diff('second', date_parse(a, '%Y-%m-%d'), \
             date_parse(a, '%Y-%m-%d %H:%i:%s')) FROM table1"
        )
        .unwrap(),
        "SELECT unix_timestamp(a, 'yyyy-MM-dd HH:mm:ss') - unix_timestamp(a, 'yyyy-MM-dd') \
         FROM table1"
    );
}

#[test]
fn test_date_diff_other_unit_fails_in_rewrite() {
    let err = translate(
        "SELECT date_diff('hour', date_parse(a, '%Y'), date_parse(a, '%Y')) FROM table1",
    )
    .unwrap_err();
    assert_eq!(err.stage(), Stage::Rewrite);
    assert!(matches!(
        err,
        TranslateError::Conversion(ConversionError::UnexpectedShape { ref function, .. })
            if function == "date_diff"
    ));
}

#[test]
fn test_date_format_pattern() {
    assert_eq!(
        translate("SELECT date_format(ts, '%Y-%m-%d %H:%i') FROM table1").unwrap(),
        "SELECT date_format(ts, 'yyyy-MM-dd HH:mm') FROM table1"
    );
}

#[test]
fn test_invalid_date_format() {
    let err = translate("SELECT date_format(ts, '%Y %q') FROM table1").unwrap_err();
    assert!(matches!(
        err,
        TranslateError::Conversion(ConversionError::InvalidFormat { .. })
    ));
}

#[test]
fn test_renamed_functions() {
    assert_eq!(
        translate("SELECT cardinality(arr), approx_percentile(c, 0.9) FROM table1 GROUP BY arr")
            .unwrap(),
        "SELECT size(arr), percentile_approx(c, 0.9) FROM table1 GROUP BY arr"
    );
}

#[test]
fn test_utc_conversion() {
    assert_eq!(
        translate(
            "SELECT to_timestamp_tz(date_parse(a, '%Y-%m-%d'), 'UTC', 'Asia/Kolkata') FROM table1"
        )
        .unwrap(),
        "SELECT from_utc_timestamp(a, 'Asia/Kolkata') FROM table1"
    );
}

// =============================================================================
// Structural rewrites
// =============================================================================

#[test]
fn test_cross_join_unnest() {
    assert_eq!(
        translate("SELECT a, x FROM table1 CROSS JOIN UNNEST(table1.arr) AS t (x)").unwrap(),
        "SELECT a, x FROM table1 LATERAL VIEW explode(table1.arr) t AS x"
    );
}

#[test]
fn test_unnest_column_shadowing_table_column_is_ambiguous() {
    // table1 already has a column `c`
    let err = translate("SELECT a, c FROM table1 CROSS JOIN UNNEST(table1.arr) AS t (c)")
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Validate);
    assert!(matches!(
        validation_errors(err).as_slice(),
        [ValidationError::AmbiguousColumn { name, candidates }]
            if name == "c" && candidates.len() == 2
    ));

    assert_eq!(
        translate("SELECT table1.c, t.c FROM table1 CROSS JOIN UNNEST(table1.arr) AS t (c)")
            .unwrap(),
        "SELECT table1.c, t.c FROM table1 LATERAL VIEW explode(table1.arr) t AS c"
    );
}

#[test]
fn test_day_of_week() {
    assert_eq!(
        translate("SELECT EXTRACT(DOW FROM ts) FROM table1").unwrap(),
        "SELECT from_unixtime(unix_timestamp(ts), 'u') FROM table1"
    );
}

#[test]
fn test_integer_division() {
    assert_eq!(
        translate("SELECT b / 2, c / 2 FROM table1").unwrap(),
        "SELECT b DIV 2, c / 2 FROM table1"
    );
}

#[test]
fn test_cast_types() {
    assert_eq!(
        translate("SELECT CAST(b AS VARCHAR), TRY_CAST(a AS BIGINT) FROM table1").unwrap(),
        "SELECT CAST(b AS STRING), CAST(a AS BIGINT) FROM table1"
    );

    let err = translate("SELECT CAST(a AS JSON) FROM table1").unwrap_err();
    assert_eq!(err.stage(), Stage::Rewrite);
    assert_eq!(err.to_string(), "Type JSON has no hive equivalent");
}

#[test]
fn test_conversion_inside_subquery_and_cte() {
    assert_eq!(
        translate(
            "WITH recent AS (SELECT a, now() AS seen FROM table1) \
             SELECT a FROM recent WHERE seen > (SELECT max(ts) FROM table1)"
        )
        .unwrap(),
        "WITH recent AS (SELECT a, current_timestamp() AS seen FROM table1) \
         SELECT a FROM recent WHERE seen > (SELECT max(ts) FROM table1)"
    );
}

// =============================================================================
// Catalog and validation
// =============================================================================

#[test]
fn test_loaded_schema_documents() {
    let ctx = fixture_context();
    assert_eq!(
        ctx.translate("SELECT uuid, cardinality(tags), pickup.lat FROM dwh.trips WHERE fare > 10")
            .unwrap(),
        "SELECT uuid, size(tags), pickup.lat FROM dwh.trips WHERE fare > 10"
    );
    assert_eq!(
        ctx.translate(
            "SELECT t.uuid, d.name FROM dwh.trips t JOIN dwh.drivers d ON t.uuid = d.uuid"
        )
        .unwrap(),
        "SELECT t.uuid, d.name FROM dwh.trips AS t INNER JOIN dwh.drivers AS d ON t.uuid = d.uuid"
    );
}

#[test]
fn test_integer_columns_from_documents() {
    let ctx = fixture_context();
    assert_eq!(
        ctx.translate("SELECT distance / city_id, fare / city_id FROM dwh.trips")
            .unwrap(),
        "SELECT distance DIV city_id, fare / city_id FROM dwh.trips"
    );
}

#[test]
fn test_ambiguous_column() {
    let ctx = fixture_context();
    let err = ctx
        .translate("SELECT uuid FROM dwh.trips t JOIN dwh.drivers d ON t.uuid = d.uuid")
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Validate);
    let errors = validation_errors(err);
    assert!(matches!(
        &errors[0],
        ValidationError::AmbiguousColumn { name, candidates }
            if name == "uuid" && candidates.len() == 2
    ));
}

#[test]
fn test_unknown_table_and_column() {
    let err = translate("SELECT a FROM dwh.nothing").unwrap_err();
    assert_eq!(err.stage(), Stage::Validate);
    assert_eq!(err.to_string(), "Table not found: dwh.nothing");

    let errors = validation_errors(translate("SELECT nope, also_nope FROM table1").unwrap_err());
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e, ValidationError::UnknownColumn { .. })));
}

#[test]
fn test_comparison_type_mismatch() {
    let err = translate("SELECT a FROM table1 WHERE arr = 1").unwrap_err();
    assert!(matches!(
        validation_errors(err).as_slice(),
        [ValidationError::TypeMismatch { .. }]
    ));
}

#[test]
fn test_unknown_function_policy() {
    let err = translate("SELECT no_such_fn(a) FROM table1").unwrap_err();
    assert!(matches!(
        validation_errors(err).as_slice(),
        [ValidationError::UnknownFunction { name, .. }] if name == "no_such_fn"
    ));

    let mut settings = Settings::default();
    settings.validation.unknown_functions = UnknownFunctions::Allow;
    settings.render.check_functions = false;
    let ctx = TranslationContext::from_settings(&settings).unwrap();
    assert_eq!(
        ctx.translate("SELECT no_such_fn(a) FROM table1").unwrap(),
        "SELECT no_such_fn(a) FROM table1"
    );
}

#[test]
fn test_hive_only_function_rejected_in_presto_source() {
    let err = translate("SELECT date_sub(ts, 1) FROM table1").unwrap_err();
    assert_eq!(err.stage(), Stage::Validate);
}

// =============================================================================
// Stages and configuration
// =============================================================================

#[test]
fn test_parse_errors() {
    let err = translate("SELECT FROM WHERE").unwrap_err();
    assert_eq!(err.stage(), Stage::Parse);

    let err = translate("INSERT INTO table1 VALUES (1)").unwrap_err();
    assert_eq!(err.stage(), Stage::Parse);
    assert!(matches!(err, TranslateError::UnsupportedConstruct { .. }));
}

#[test]
fn test_render_error_for_untranslatable_call() {
    // date_parse outside to_unixtime/date_diff has no Hive form
    let err = translate("SELECT date_parse(a, '%Y') FROM table1").unwrap_err();
    assert_eq!(err.stage(), Stage::Render);
}

#[test]
fn test_presto_target_is_identity() {
    let ctx = TranslationContext::default().with_target(Dialect::Presto);
    assert_eq!(
        ctx.translate("SELECT now(), a || 'x' FROM table1 ORDER BY a LIMIT 5 OFFSET 2")
            .unwrap(),
        "SELECT now(), a || 'x' FROM table1 ORDER BY a OFFSET 2 LIMIT 5"
    );
}

#[test]
fn test_pretty_settings() {
    let settings = Settings::from_toml(
        r#"
        [render]
        pretty = true
        "#,
    )
    .unwrap();
    let ctx = TranslationContext::from_settings(&settings).unwrap();
    assert_eq!(
        ctx.translate("SELECT now() FROM table1 WHERE b > 1").unwrap(),
        "SELECT current_timestamp()\nFROM table1\nWHERE b > 1"
    );
}

#[test]
fn test_custom_registry_replaces_default_rules() {
    let mut settings = Settings::default();
    settings.render.check_functions = false;
    let ctx = TranslationContext::from_settings(&settings)
        .unwrap()
        .with_registry(UdfRegistry::new().rename("cardinality", "array_size"));
    assert_eq!(ctx.registry().len(), 1);
    assert_eq!(
        ctx.translate("SELECT cardinality(arr), now() FROM table1").unwrap(),
        "SELECT array_size(arr), now() FROM table1"
    );
}

#[test]
fn test_shared_context_is_reused() {
    static SHARED: SharedContext = SharedContext::new();
    let first = SHARED
        .get_or_try_init(|| Ok::<_, ()>(fixture_context()))
        .unwrap();
    let second = SHARED
        .get_or_try_init(|| Err::<TranslationContext, _>(()))
        .unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert!(second.catalog().contains_table("dwh.trips"));
}
