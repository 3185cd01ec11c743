use super::common::*;
use crate::workflows::documents::classifier::ExpiryClassifier;
use crate::workflows::documents::domain::ExpiryStatus;
use crate::workflows::documents::registry::DocumentRegistry;

#[test]
fn zero_threshold_returns_expired_and_expiring_today() {
    let (_dir, registry) = sqlite_registry();
    for document in [
        upload("Yesterday", -1, None),
        upload("Today", 0, None),
        upload("Tomorrow", 1, None),
    ] {
        registry.add(document).expect("seed");
    }

    let found = ExpiryClassifier::new(today())
        .find_within(registry.as_ref(), 0)
        .expect("query succeeds");

    assert_eq!(names(&found), vec!["Yesterday", "Today"]);
}

#[test]
fn weekly_threshold_overlaps_with_expired_set() {
    let (_dir, registry) = seeded_registry();
    let classifier = ExpiryClassifier::new(today());

    let expired = classifier
        .find_within(registry.as_ref(), 0)
        .expect("expired query");
    let approaching = classifier
        .find_within(registry.as_ref(), 7)
        .expect("approaching query");

    assert_eq!(
        names(&approaching),
        vec!["Yesterday", "Today", "Tomorrow", "Next Week"]
    );
    for document in &expired {
        assert!(
            approaching.contains(document),
            "{} should appear in both lists",
            document.name
        );
    }
}

#[test]
fn window_boundary_is_inclusive() {
    let classifier = ExpiryClassifier::new(today());
    let on_boundary = stored(1, "Boundary", 7, None);
    let past_boundary = stored(2, "Outside", 8, None);

    assert!(classifier.is_within(&on_boundary, 7));
    assert!(!classifier.is_within(&past_boundary, 7));
}

#[test]
fn results_are_deterministic_for_a_fixed_today() {
    let (_dir, registry) = seeded_registry();
    let classifier = ExpiryClassifier::new(today());

    let first = classifier.find_within(registry.as_ref(), 7).expect("first");
    let second = classifier.find_within(registry.as_ref(), 7).expect("second");

    assert_eq!(first, second);
}

#[test]
fn overview_reports_overlapping_lists_and_statuses() {
    let registry = MemoryRegistry::default();
    for document in [
        upload("Yesterday", -1, None),
        upload("Today", 0, None),
        upload("Next Week", 5, None),
        upload("Next Month", 30, None),
    ] {
        registry.add(document).expect("seed");
    }

    let overview = ExpiryClassifier::new(today())
        .overview(&registry, 7)
        .expect("overview");

    assert_eq!(overview.documents.len(), 4);
    assert_eq!(names(&overview.expired), vec!["Yesterday", "Today"]);
    assert_eq!(
        names(&overview.approaching),
        vec!["Yesterday", "Today", "Next Week"]
    );

    let statuses: Vec<ExpiryStatus> = overview.documents.iter().map(|view| view.status).collect();
    assert_eq!(
        statuses,
        vec![
            ExpiryStatus::Expired,
            ExpiryStatus::ExpiresToday,
            ExpiryStatus::Approaching,
            ExpiryStatus::Current,
        ]
    );
}

#[test]
fn storage_failures_propagate() {
    let result = ExpiryClassifier::new(today()).find_within(&UnavailableRegistry, 7);
    assert!(result.is_err());
}
