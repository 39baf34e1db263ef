// ABOUTME: Property and example tests for build identifiers and their orderings.
// ABOUTME: Orderings must behave as total orders over parseable identifiers.

use std::cmp::Ordering;

use chrono::NaiveDate;
use proptest::prelude::*;
use webdeploy::types::{BuildId, BuildOrdering, ParseBuildIdError, make_version_tag};

fn build(repo: &str, version: &str, y: u32, m: u32, d: u32, millis: u64) -> BuildId {
    BuildId::parse(&format!("{}:{}-{}-{}-{}-{}", repo, version, y, m, d, millis)).unwrap()
}

fn arb_build() -> impl Strategy<Value = BuildId> {
    (
        prop::sample::select(vec!["t1/a1", "t1/a2", "t2/a1"]),
        prop::sample::select(vec!["1.0", "1.1", "2.0-rc1"]),
        2014u32..2017,
        1u32..13,
        1u32..29,
        0u64..86_400_000,
    )
        .prop_map(|(repo, version, y, m, d, millis)| build(repo, version, y, m, d, millis))
}

fn arb_ordering() -> impl Strategy<Value = BuildOrdering> {
    prop::sample::select(vec![BuildOrdering::Chronological, BuildOrdering::Lexicographic])
}

proptest! {
    #[test]
    fn compare_is_reflexive(ordering in arb_ordering(), a in arb_build()) {
        prop_assert_eq!(ordering.compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn compare_is_antisymmetric(ordering in arb_ordering(), a in arb_build(), b in arb_build()) {
        prop_assert_eq!(ordering.compare(&a, &b), ordering.compare(&b, &a).reverse());
    }

    #[test]
    fn compare_is_transitive(
        ordering in arb_ordering(),
        a in arb_build(),
        b in arb_build(),
        c in arb_build(),
    ) {
        if ordering.compare(&a, &b) != Ordering::Greater
            && ordering.compare(&b, &c) != Ordering::Greater
        {
            prop_assert_ne!(ordering.compare(&a, &c), Ordering::Greater);
        }
    }

    #[test]
    fn stamped_tags_parse_back(
        day in 1u32..29,
        hour in 0u32..24,
        minute in 0u32..60,
        milli in 0u32..1000,
    ) {
        let at = NaiveDate::from_ymd_opt(2015, 6, day)
            .unwrap()
            .and_hms_milli_opt(hour, minute, 0, milli)
            .unwrap();
        let tag = make_version_tag("1.0", at);
        let id = BuildId::parse(&format!("t1/a1:{}", tag)).unwrap();

        prop_assert_eq!(id.version(), "1.0");
        prop_assert_eq!(id.date(), (2015, 6, day));
        prop_assert_eq!(
            id.millis_of_day(),
            u64::from(hour * 3_600_000 + minute * 60_000 + milli)
        );
    }
}

#[test]
fn chronological_orders_months_numerically() {
    let september = build("t1/a1", "1.0", 2015, 9, 1, 0);
    let october = build("t1/a1", "1.0", 2015, 10, 1, 0);

    assert_eq!(
        BuildOrdering::Chronological.compare(&september, &october),
        Ordering::Less
    );
}

#[test]
fn lexicographic_orders_months_as_text() {
    let september = build("t1/a1", "1.0", 2015, 9, 1, 0);
    let october = build("t1/a1", "1.0", 2015, 10, 1, 0);

    assert_eq!(
        BuildOrdering::Lexicographic.compare(&september, &october),
        Ordering::Greater
    );
}

#[test]
fn millis_break_ties_numerically_in_both_orderings() {
    let early = build("t1/a1", "1.0", 2015, 9, 1, 9_000);
    let late = build("t1/a1", "1.0", 2015, 9, 1, 10_000);

    for ordering in [BuildOrdering::Chronological, BuildOrdering::Lexicographic] {
        assert_eq!(ordering.compare(&early, &late), Ordering::Less, "{}", ordering);
    }
}

#[test]
fn sort_is_ascending() {
    let mut builds = vec![
        build("t1/a1", "1.0", 2016, 1, 1, 0),
        build("t1/a1", "1.0", 2015, 12, 31, 5),
        build("t1/a1", "1.0", 2015, 12, 31, 4),
    ];
    BuildOrdering::Chronological.sort(&mut builds);

    let ids: Vec<&str> = builds.iter().map(BuildId::as_str).collect();
    assert_eq!(
        ids,
        vec![
            "t1/a1:1.0-2015-12-31-4",
            "t1/a1:1.0-2015-12-31-5",
            "t1/a1:1.0-2016-1-1-0",
        ]
    );
}

mod parsing {
    use super::*;

    #[test]
    fn registry_port_is_not_a_tag() {
        let id = BuildId::parse("registry:5000/t1/a1:1.0-2015-3-4-10").unwrap();
        assert_eq!(id.repository(), "registry:5000/t1/a1");
        assert_eq!(id.tag(), "1.0-2015-3-4-10");
    }

    #[test]
    fn hyphenated_versions_are_kept_whole() {
        let id = BuildId::parse("t1/a1:2.0-rc1-2015-3-4-10").unwrap();
        assert_eq!(id.version(), "2.0-rc1");
        assert_eq!(id.date(), (2015, 3, 4));
    }

    #[test]
    fn rejects_identifier_without_tag() {
        assert_eq!(
            BuildId::parse("registry:5000/t1/a1"),
            Err(ParseBuildIdError::MissingTag(
                "registry:5000/t1/a1".to_string()
            ))
        );
    }

    #[test]
    fn rejects_tag_without_timestamp() {
        assert!(matches!(
            BuildId::parse("t1/a1:latest"),
            Err(ParseBuildIdError::MissingTimestamp(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_fields() {
        assert!(matches!(
            BuildId::parse("t1/a1:1.0-2015-march-4-10"),
            Err(ParseBuildIdError::InvalidField { field: "month", .. })
        ));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(BuildId::parse("  "), Err(ParseBuildIdError::Empty));
    }
}
