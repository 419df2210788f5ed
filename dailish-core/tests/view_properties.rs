//! Ordering and filtering properties of the view pipeline over arbitrary
//! task sets.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use dailish_core::view::UNCATEGORIZED;
use dailish_core::{
    render, ActiveSort, Filter, Icon, Priority, Rendered, SortKey, Task, TaskId, ViewState,
};
use proptest::prelude::*;

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::High), Just(Priority::Medium), Just(Priority::Low)]
}

fn arb_category() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("   ".to_string())),
        Just(Some("Work".to_string())),
        Just(Some("Home".to_string())),
        Just(Some("Errands".to_string())),
    ]
}

fn arb_task() -> impl Strategy<Value = Task> {
    (
        arb_priority(),
        prop::option::of(0i64..60),
        arb_category(),
        any::<bool>(),
        any::<bool>(),
        0i64..10_000,
        "[a-z]{1,8}",
    )
        .prop_map(
            |(priority, deadline_offset, category, pinned, completed, minutes, title)| {
                let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
                Task {
                    id: TaskId::generate(),
                    title,
                    brief: None,
                    category,
                    icon: Icon::Tag,
                    priority,
                    deadline: deadline_offset.map(|days| base + Duration::days(days)),
                    completed,
                    pinned,
                    created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                        + Duration::minutes(minutes),
                    revisions: Vec::new(),
                }
            },
        )
}

fn arb_view() -> impl Strategy<Value = ViewState> {
    (
        prop_oneof![Just(Filter::All), Just(Filter::Active), Just(Filter::Completed)],
        prop_oneof![
            Just(SortKey::Newest),
            Just(SortKey::Deadline),
            Just(SortKey::Priority)
        ],
        prop_oneof![Just(ActiveSort::Default), Just(ActiveSort::Category)],
    )
        .prop_map(|(filter, sort, active_sort)| {
            ViewState::default()
                .with_filter(filter)
                .with_sort(sort)
                .with_active_sort(active_sort)
        })
}

/// Sequences the pipeline shows as one ordered run: the flat list, or each
/// category bucket.
fn runs<'a>(rendered: &Rendered<'a>) -> Vec<Vec<&'a Task>> {
    match rendered {
        Rendered::Empty => Vec::new(),
        Rendered::Flat(tasks) => vec![tasks.clone()],
        Rendered::Grouped(groups) => groups.iter().map(|g| g.tasks.clone()).collect(),
    }
}

fn assert_sorted_within_partitions(run: &[&Task], sort: SortKey) {
    for pinned in [true, false] {
        let partition: Vec<&Task> = run.iter().copied().filter(|t| t.pinned == pinned).collect();
        for pair in partition.windows(2) {
            match sort {
                SortKey::Priority => assert!(pair[0].priority <= pair[1].priority),
                SortKey::Deadline => match (pair[0].deadline, pair[1].deadline) {
                    (Some(a), Some(b)) => assert!(a <= b),
                    (None, Some(_)) => panic!("task without deadline sorted before dated task"),
                    _ => {}
                },
                SortKey::Newest => assert!(pair[0].created_at >= pair[1].created_at),
            }
        }
    }
}

proptest! {
    #[test]
    fn status_filter_is_respected(tasks in prop::collection::vec(arb_task(), 0..40), view in arb_view()) {
        let rendered = render(&tasks, &view);
        for task in rendered.tasks() {
            match view.filter {
                Filter::Active => prop_assert!(!task.completed),
                Filter::Completed => prop_assert!(task.completed),
                Filter::All => {}
            }
        }
    }

    #[test]
    fn pinned_always_precede_unpinned(tasks in prop::collection::vec(arb_task(), 0..40), view in arb_view()) {
        let rendered = render(&tasks, &view);
        for run in runs(&rendered) {
            let first_unpinned = run.iter().position(|t| !t.pinned).unwrap_or(run.len());
            prop_assert!(run[first_unpinned..].iter().all(|t| !t.pinned));
        }
    }

    #[test]
    fn partitions_are_sorted(tasks in prop::collection::vec(arb_task(), 0..40), view in arb_view()) {
        let rendered = render(&tasks, &view);
        for run in runs(&rendered) {
            assert_sorted_within_partitions(&run, view.sort);
        }
    }

    #[test]
    fn no_task_is_lost_or_duplicated(tasks in prop::collection::vec(arb_task(), 0..40), view in arb_view()) {
        let expected = tasks.iter().filter(|t| view.filter.admits(t)).count();
        let rendered = render(&tasks, &view);
        prop_assert_eq!(rendered.tasks().len(), expected);
        prop_assert_eq!(rendered.is_empty(), expected == 0);
    }

    #[test]
    fn category_buckets_are_consistent(tasks in prop::collection::vec(arb_task(), 0..40), sort in prop_oneof![
        Just(SortKey::Newest), Just(SortKey::Deadline), Just(SortKey::Priority)
    ]) {
        let view = ViewState::default()
            .with_filter(Filter::Active)
            .with_active_sort(ActiveSort::Category)
            .with_sort(sort);

        if let Rendered::Grouped(groups) = render(&tasks, &view) {
            let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
            let mut sorted = labels.clone();
            sorted.sort();
            prop_assert_eq!(labels, sorted);

            for group in &groups {
                prop_assert!(!group.tasks.is_empty());
                for task in &group.tasks {
                    prop_assert_eq!(task.category_label().unwrap_or(UNCATEGORIZED), group.label.as_str());
                }
            }
        }
    }
}
