//! Error propagation scenarios
//!
//! Engine failures and malformed results must surface as
//! `QueryExecution` naming the failing operation; nothing is swallowed or
//! turned into an empty result.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hubstats::analytics::{
    growth_series, license_distribution, monthly_trends, sdk_distribution, BaseIdentifier,
    Dashboard,
};
use hubstats::engine::{Query, QueryEngine, Row, Value};
use hubstats::error::{Error, ErrorCategory, Result};
use hubstats::models::EntityKind;

use crate::common::month;

/// Engine that fails every query
struct BrokenEngine;

impl QueryEngine for BrokenEngine {
    fn execute(&self, query: &Query) -> Result<Vec<Row>> {
        Err(Error::query(query.operation(), "database is locked"))
    }
}

/// Engine returning one fixed row for every query, counting calls
struct CannedEngine {
    row: Row,
    calls: AtomicUsize,
}

impl CannedEngine {
    fn new(columns: Vec<(&str, Value)>) -> Self {
        Self {
            row: Row::new(
                columns
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value))
                    .collect(),
            ),
            calls: AtomicUsize::new(0),
        }
    }
}

impl QueryEngine for CannedEngine {
    fn execute(&self, _query: &Query) -> Result<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.row.clone()])
    }
}

fn operation_of(err: &Error) -> &str {
    match err {
        Error::QueryExecution { operation, .. } => operation.as_str(),
        other => panic!("expected a query error, got {other:?}"),
    }
}

#[test]
fn test_engine_failures_name_the_operation() {
    let engine = BrokenEngine;
    let base = BaseIdentifier::parse("X").unwrap();

    assert_eq!(
        operation_of(&monthly_trends(&engine).unwrap_err()),
        "monthly_trends"
    );
    assert_eq!(
        operation_of(&license_distribution(&engine, EntityKind::Model).unwrap_err()),
        "tag_prefix_distribution"
    );
    assert_eq!(
        operation_of(&sdk_distribution(&engine).unwrap_err()),
        "sdk_distribution"
    );
    assert_eq!(
        operation_of(&growth_series(&engine, &base, month(2024, 1)).unwrap_err()),
        "growth_series"
    );
}

#[test]
fn test_engine_failure_is_not_recoverable() {
    let err = monthly_trends(&BrokenEngine).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Query);
    assert!(!err.is_recoverable());
}

#[test]
fn test_malformed_rows_are_query_errors() {
    let engine = CannedEngine::new(vec![
        ("month", Value::Text("not-a-month".to_string())),
        ("delta", Value::Integer(1)),
    ]);
    let base = BaseIdentifier::parse("X").unwrap();

    let err = growth_series(&engine, &base, month(2024, 1)).unwrap_err();
    assert_eq!(operation_of(&err), "growth_series");
}

#[test]
fn test_missing_column_is_query_error() {
    let engine = CannedEngine::new(vec![("label", Value::Text("mit".to_string()))]);
    let err = sdk_distribution(&engine).unwrap_err();
    assert!(err.to_string().contains("count"));
}

#[test]
fn test_null_label_is_query_error() {
    let engine = CannedEngine::new(vec![("label", Value::Null), ("count", Value::Integer(1))]);
    assert!(license_distribution(&engine, EntityKind::Dataset).is_err());
}

#[test]
fn test_rejected_identifier_never_reaches_engine() {
    let engine = CannedEngine::new(vec![]);
    let result = "x'--".parse::<BaseIdentifier>();
    assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    assert!(license_distribution(&engine, EntityKind::Space).is_err());
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_dashboard_fails_as_a_whole() {
    let err = Dashboard::compute(Arc::new(BrokenEngine)).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Query);
}
