//! Analytics against a real bound engine

use std::collections::{BTreeMap, HashSet};

use hubstats::analytics::{
    growth_series, license_distribution, monthly_trends, sdk_distribution,
    tag_prefix_distribution, BaseIdentifier, Dashboard, UNKNOWN_SDK_LABEL,
};
use hubstats::engine::SnapshotSet;
use hubstats::error::Error;
use hubstats::models::{CategoryCount, EntityKind, Month};

use super::fixtures::scenario_snapshots;
use crate::common::{at, month, session_with, space, tagged};

fn months(points: &[(Month, u64)]) -> Vec<(String, u64)> {
    points.iter().map(|(m, c)| (m.to_string(), *c)).collect()
}

#[test]
fn test_monthly_trends_are_sparse() {
    let session = session_with(SnapshotSet {
        models: vec![
            tagged("org/a", at(2023, 1, 2), &[]),
            tagged("org/b", at(2023, 1, 30), &[]),
            tagged("org/c", at(2023, 3, 15), &[]),
        ],
        ..Default::default()
    });

    let trends = monthly_trends(session.engine()).unwrap();
    let shaped: Vec<_> = trends
        .iter()
        .map(|t| {
            (
                t.month.to_string(),
                t.model_count,
                t.dataset_count,
                t.space_count,
            )
        })
        .collect();

    assert_eq!(
        shaped,
        vec![
            ("2023-01".to_string(), 2, 0, 0),
            ("2023-03".to_string(), 1, 0, 0),
        ]
    );
}

#[test]
fn test_monthly_trends_sum_to_relation_sizes() {
    let snapshots = scenario_snapshots();
    let session = session_with(snapshots.clone());
    let trends = monthly_trends(session.engine()).unwrap();

    for kind in EntityKind::ALL {
        let total: u64 = trends.iter().map(|t| t.count(kind)).sum();
        assert_eq!(total as usize, snapshots.records(kind).len(), "{kind}");
    }
    assert!(trends.iter().all(|t| t.total() > 0));
    assert!(trends.windows(2).all(|w| w[0].month < w[1].month));
}

#[test]
fn test_monthly_trends_match_record_months() {
    let snapshots = scenario_snapshots();
    let session = session_with(snapshots.clone());
    let trends = monthly_trends(session.engine()).unwrap();

    let mut expected: BTreeMap<Month, [u64; 3]> = BTreeMap::new();
    for (idx, kind) in EntityKind::ALL.into_iter().enumerate() {
        for record in snapshots.records(kind) {
            expected.entry(record.month()).or_default()[idx] += 1;
        }
    }

    let actual: BTreeMap<Month, [u64; 3]> = trends
        .iter()
        .map(|t| (t.month, EntityKind::ALL.map(|kind| t.count(kind))))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_license_distribution_scenario() {
    let session = session_with(scenario_snapshots());
    let licenses = license_distribution(session.engine(), EntityKind::Model).unwrap();

    assert_eq!(
        licenses,
        vec![
            CategoryCount::new("mit", 3),
            CategoryCount::new("apache-2.0", 2),
        ]
    );
}

#[test]
fn test_license_counts_match_tagged_entities() {
    let snapshots = scenario_snapshots();
    let session = session_with(snapshots.clone());

    for kind in [EntityKind::Model, EntityKind::Dataset] {
        let licenses = license_distribution(session.engine(), kind).unwrap();
        let total: u64 = licenses.iter().map(|c| c.count).sum();
        let tagged = snapshots
            .records(kind)
            .iter()
            .filter(|r| r.tags.iter().any(|t| t.starts_with("license:")))
            .count();
        assert_eq!(total as usize, tagged, "{kind}");
    }
}

#[test]
fn test_duplicate_tags_count_entity_once() {
    let session = session_with(SnapshotSet {
        models: vec![tagged("org/a", at(2023, 1, 1), &["license:mit", "license:mit"])],
        ..Default::default()
    });
    let licenses = license_distribution(session.engine(), EntityKind::Model).unwrap();
    assert_eq!(licenses, vec![CategoryCount::new("mit", 1)]);
}

#[test]
fn test_prefix_is_matched_literally() {
    let session = session_with(SnapshotSet {
        models: vec![
            tagged("org/a", at(2023, 1, 1), &["license:mit"]),
            tagged("org/b", at(2023, 1, 1), &["licenseXmit", "LICENSE:mit"]),
            tagged("org/c", at(2023, 1, 1), &["license_%"]),
        ],
        ..Default::default()
    });

    let licenses = license_distribution(session.engine(), EntityKind::Model).unwrap();
    assert_eq!(licenses, vec![CategoryCount::new("mit", 1)]);

    let wildcard = tag_prefix_distribution(session.engine(), EntityKind::Model, "license_").unwrap();
    assert_eq!(wildcard, vec![CategoryCount::new("%", 1)]);
}

#[test]
fn test_tag_distribution_rejects_spaces() {
    let session = session_with(scenario_snapshots());
    let err = license_distribution(session.engine(), EntityKind::Space).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { .. }));
}

#[test]
fn test_sdk_distribution_counts_every_space() {
    let snapshots = scenario_snapshots();
    let session = session_with(snapshots.clone());
    let sdks = sdk_distribution(session.engine()).unwrap();

    assert_eq!(
        sdks,
        vec![
            CategoryCount::new("gradio", 2),
            CategoryCount::new("streamlit", 1),
            CategoryCount::new(UNKNOWN_SDK_LABEL, 1),
        ]
    );
    let total: u64 = sdks.iter().map(|c| c.count).sum();
    assert_eq!(total as usize, snapshots.spaces.len());
}

#[test]
fn test_growth_series_scenario() {
    let session = session_with(scenario_snapshots());
    let base = BaseIdentifier::parse("X").unwrap();

    let series = growth_series(session.engine(), &base, month(2023, 9)).unwrap();
    let shaped: Vec<_> = series
        .points
        .iter()
        .map(|p| (p.month, p.cumulative_count))
        .collect();

    assert_eq!(
        months(&shaped),
        vec![
            ("2023-04".to_string(), 0),
            ("2023-05".to_string(), 1),
            ("2023-06".to_string(), 1),
            ("2023-07".to_string(), 2),
            ("2023-08".to_string(), 2),
            ("2023-09".to_string(), 2),
        ]
    );
    assert_eq!(series.base, "X");
    assert_eq!(series.anchor(), Some(month(2023, 5)));
    assert_eq!(series.total(), 2);
}

#[test]
fn test_growth_series_runs_through_current_month() {
    let session = session_with(scenario_snapshots());
    let base = BaseIdentifier::parse("X").unwrap();
    let current = Month::current();

    let series = growth_series(session.engine(), &base, current).unwrap();
    assert_eq!(series.points.last().unwrap().month, current);
    assert_eq!(series.total(), 2);
}

#[test]
fn test_growth_series_matches_tag_exactly() {
    let session = session_with(SnapshotSet {
        models: vec![
            tagged("org/a", at(2023, 2, 1), &["base_model:org/base"]),
            tagged("org/b", at(2023, 2, 2), &["base_model:org/base-v2"]),
            tagged("org/c", at(2023, 2, 3), &["base_model:ORG/BASE"]),
            tagged("org/d", at(2023, 2, 4), &["base_model:org/base", "base_model:org/base"]),
        ],
        ..Default::default()
    });
    let base = BaseIdentifier::parse("org/base").unwrap();

    let series = growth_series(session.engine(), &base, month(2023, 2)).unwrap();
    assert_eq!(series.points.len(), 2);
    assert_eq!(series.total(), 2);
}

#[test]
fn test_growth_series_unknown_base_is_empty() {
    let session = session_with(scenario_snapshots());
    let base = BaseIdentifier::parse("nobody/nothing").unwrap();

    let series = growth_series(session.engine(), &base, month(2024, 1)).unwrap();
    assert!(series.is_empty());
    assert_eq!(series.total(), 0);
}

#[test]
fn test_growth_series_empty_relation() {
    let session = session_with(SnapshotSet::default());
    let base = BaseIdentifier::parse("X").unwrap();
    assert!(growth_series(session.engine(), &base, month(2024, 1))
        .unwrap()
        .is_empty());
}

#[test]
fn test_hostile_identifiers_rejected_before_query() {
    for raw in ["X' OR '1'='1", "X\"; --", "X/*", "X;DROP TABLE models", "X\n"] {
        let result = BaseIdentifier::parse(raw);
        if raw == "X\n" {
            // surrounding whitespace is trimmed
            assert_eq!(result.unwrap().as_str(), "X");
        } else {
            assert!(
                matches!(result, Err(Error::InvalidParameter { .. })),
                "{raw:?}"
            );
        }
    }
}

#[test]
fn test_concurrent_growth_calls_are_isolated() {
    let session = session_with(SnapshotSet {
        models: vec![
            tagged("org/a", at(2023, 1, 1), &["base_model:A"]),
            tagged("org/b", at(2023, 2, 1), &["base_model:B"]),
            tagged("org/c", at(2023, 2, 2), &["base_model:B"]),
        ],
        ..Default::default()
    });
    let engine = session.shared_engine();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                let base = if i % 2 == 0 { "A" } else { "B" };
                let base = BaseIdentifier::parse(base).unwrap();
                let series = growth_series(engine.as_ref(), &base, month(2023, 3)).unwrap();
                (series.base.clone(), series.total())
            })
        })
        .collect();

    let results: HashSet<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        results,
        HashSet::from([("A".to_string(), 1), ("B".to_string(), 2)])
    );
}

#[tokio::test]
async fn test_dashboard_matches_individual_operations() {
    let session = session_with(scenario_snapshots());
    let dashboard = Dashboard::compute(session.shared_engine()).await.unwrap();

    assert_eq!(dashboard.trends, monthly_trends(session.engine()).unwrap());
    assert_eq!(
        dashboard.dataset_licenses,
        vec![CategoryCount::new("cc-by-4.0", 1)]
    );
    assert_eq!(dashboard.space_sdks.len(), 3);

    let blocking = Dashboard::compute_blocking(session.engine()).unwrap();
    assert_eq!(blocking.model_licenses, dashboard.model_licenses);
}

#[test]
fn test_spaces_without_sdk_column_values() {
    let session = session_with(SnapshotSet {
        spaces: vec![space("org/s", at(2023, 1, 1), None)],
        ..Default::default()
    });
    assert_eq!(
        sdk_distribution(session.engine()).unwrap(),
        vec![CategoryCount::new(UNKNOWN_SDK_LABEL, 1)]
    );
}
