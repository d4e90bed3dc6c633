use pretty_assertions::assert_eq;
use reelsync_core::{
    page_bounds, paginate, plan_merge, total_pages, ExecutionStatus, MediaType, MergeOutcome,
    PageKey, SubscriptionSnapshot,
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn merge_appends_only_unknown_links() {
    let existing = strings(&["a", "b"]);
    let plan = plan_merge(&existing, &strings(&["b", "c", "d"]));

    assert!(plan.needs_write());
    assert_eq!(plan.new_links, strings(&["c", "d"]));
    assert_eq!(plan.merged, strings(&["a", "b", "c", "d"]));
    assert_eq!(
        plan.outcome,
        MergeOutcome {
            added: 2,
            duplicate: 1,
            total: 3
        }
    );
}

#[test]
fn merge_of_known_links_needs_no_write() {
    let existing = strings(&["a", "b"]);
    let plan = plan_merge(&existing, &strings(&["a", "b"]));
    assert!(!plan.needs_write());
    assert_eq!(plan.outcome.added, 0);
    assert_eq!(plan.outcome.duplicate, 2);
    assert_eq!(plan.merged, existing);
}

#[test]
fn merge_uses_exact_comparison_and_dedupes_candidates() {
    let existing = strings(&["https://x/1"]);
    let plan = plan_merge(
        &existing,
        &strings(&["https://x/1/", "HTTPS://x/1", "https://x/2", "https://x/2"]),
    );
    assert_eq!(plan.new_links, strings(&["https://x/1/", "HTTPS://x/1", "https://x/2"]));
    assert_eq!(plan.outcome.duplicate, 1);
    assert_eq!(plan.outcome.total, 4);
}

#[test]
fn page_bounds_are_half_open() {
    assert_eq!(page_bounds(25, PageKey::new(1, 10)), 0..10);
    assert_eq!(page_bounds(25, PageKey::new(3, 10)), 20..25);
    assert_eq!(page_bounds(25, PageKey::new(4, 10)), 25..25);
    assert_eq!(page_bounds(0, PageKey::new(1, 10)), 0..0);
    assert_eq!(total_pages(25, 10), 3);
    assert_eq!(total_pages(20, 10), 2);
    assert_eq!(total_pages(0, 10), 0);
}

#[test]
fn page_key_depends_on_size() {
    assert_ne!(PageKey::new(2, 10), PageKey::new(2, 12));
    assert_eq!(PageKey::new(0, 0), PageKey::new(1, 1));
}

#[test]
fn paginate_slices_items() {
    let items: Vec<u32> = (0..7).collect();
    let page = paginate(&items, PageKey::new(2, 3));
    assert_eq!(page.items, vec![3, 4, 5]);
    assert_eq!(page.total, 7);
    assert_eq!(page.total_pages, 3);
}

#[test]
fn completeness_rules() {
    let mut show = SubscriptionSnapshot {
        id: "1".into(),
        external_id: "100".into(),
        title: "Show".into(),
        media_type: MediaType::Tv,
        execution: ExecutionStatus::Success,
        subscribed_units: 8,
        total_units: 10,
        links: Vec::new(),
    };
    assert!(!show.is_complete());
    assert_eq!(show.missing_units(), 2);
    show.subscribed_units = 10;
    assert!(show.is_complete());
    show.total_units = 0;
    show.subscribed_units = 0;
    assert!(!show.is_complete());

    let mut movie = show.clone();
    movie.media_type = MediaType::Movie;
    movie.total_units = 1;
    assert!(!movie.is_complete());
    movie.subscribed_units = 1;
    assert!(movie.is_complete());
}
