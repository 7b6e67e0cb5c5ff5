use bookclub_application::{ActiveFlag, load_reports, messages, search_catalog};
use bookclub_core::{BookRecord, Session};
use bookclub_test::{
    FakeBackend, FakeSearch, USER_ID, book, club, local_store, remote_state, review, signed_in,
    volume,
};

fn club_backend() -> FakeBackend {
    let mut backend = FakeBackend::new().with_states(vec![
        remote_state("r1", "Dune", "read"),
        remote_state("r2", "Emma", "reading"),
        remote_state("r3", "Ulysses", "pending"),
    ]);
    backend.reviews = vec![
        review("Dune", Some(5.0)),
        review("Emma", Some(4.0)),
        review("Dune", Some(4.0)),
        review("Ulysses", None),
    ];
    backend.clubs = vec![
        club("Quiet readers", 3, 1, false),
        club("Sci-fi circle", 4, 10, true),
    ];
    backend.books = vec![book("b1", "Dune", "read"), book("b2", "Emma", "pending")];
    backend
}

#[tokio::test]
async fn full_load_builds_every_report() {
    let backend = club_backend();
    let local = local_store();
    let session = signed_in();

    let snapshot = load_reports(&backend, &local, &session, Some(USER_ID)).await;
    assert_eq!(snapshot.status_message(), None);

    let summary = snapshot.summary();
    assert_eq!(summary.total_books, 2);
    assert_eq!(summary.total_reviews, 4);
    assert_eq!((summary.total_clubs, summary.active_clubs), (2, 1));
    assert_eq!((summary.to_read, summary.reading, summary.completed), (1, 1, 1));
    assert_eq!(summary.average_rating, Some(4.3));

    let top: Vec<(String, u64)> = snapshot
        .top_books()
        .into_iter()
        .map(|row| (row.title, row.reviews))
        .collect();
    assert_eq!(
        top,
        vec![
            ("Dune".to_string(), 2),
            ("Emma".to_string(), 1),
            ("Ulysses".to_string(), 1),
        ]
    );

    let clubs: Vec<(String, u64)> = snapshot
        .club_activity()
        .into_iter()
        .map(|row| (row.name, row.score))
        .collect();
    assert_eq!(
        clubs,
        vec![("Sci-fi circle".to_string(), 18), ("Quiet readers".to_string(), 7)]
    );

    let unknown = snapshot
        .monthly_progress()
        .into_iter()
        .find(|row| row.month == "Unknown")
        .map(|row| (row.reading, row.completed));
    assert_eq!(unknown, Some((2, 1)));
}

#[tokio::test]
async fn partial_failure_keeps_other_sources() {
    let backend = club_backend();
    backend.fail("reviews");
    backend.fail("clubs");
    let local = local_store();
    let session = signed_in();

    let snapshot = load_reports(&backend, &local, &session, Some(USER_ID)).await;
    assert!(snapshot.is_partial());
    assert_eq!(
        snapshot.status_message().as_deref(),
        Some("Some data could not be loaded: reviews, clubs.")
    );
    assert_eq!(snapshot.reading_states.len(), 3);
    assert!(snapshot.club_activity().is_empty());

    // No reviews: the top books fall back to read catalog books.
    let top: Vec<String> = snapshot.top_books().into_iter().map(|row| row.title).collect();
    assert_eq!(top, vec!["Dune".to_string()]);
}

#[tokio::test]
async fn total_failure_uses_the_page_message() {
    let backend = club_backend();
    for endpoint in ["reading-states", "reviews", "clubs", "books"] {
        backend.fail(endpoint);
    }
    let local = local_store();
    let session = signed_in();

    let snapshot = load_reports(&backend, &local, &session, Some(USER_ID)).await;
    assert_eq!(
        snapshot.status_message().as_deref(),
        Some(messages::LOAD_REPORTS_FAILED)
    );
    assert_eq!(snapshot.summary().total_books, 0);
}

#[tokio::test]
async fn anonymous_reports_are_empty_not_failed() {
    let backend = club_backend();
    let local = local_store();
    let session = Session::anonymous();

    let snapshot = load_reports(&backend, &local, &session, None).await;
    assert_eq!(snapshot.status_message(), None);
    assert!(snapshot.reading_states.is_empty());
    assert!(snapshot.top_books().is_empty());
}

#[tokio::test]
async fn results_for_a_closed_view_are_dropped() {
    let backend = club_backend();
    let local = local_store();
    let session = signed_in();
    let flag = ActiveFlag::new();
    let view = flag.clone();

    let load = async {
        let snapshot = load_reports(&backend, &local, &session, Some(USER_ID)).await;
        view.deactivate();
        snapshot
    };
    assert!(flag.settle(load).await.is_none());
}

#[tokio::test]
async fn search_merges_catalog_and_provider() {
    let mut backend = FakeBackend::new();
    backend.books = vec![
        BookRecord {
            google_id: Some("g-dune".to_string()),
            authors: vec!["Frank Herbert".to_string()],
            ..book("b1", "Dune", "read")
        },
        book("b2", "Emma", "pending"),
    ];
    let search = FakeSearch {
        volumes: vec![volume("g-dune", "Dune"), volume("g-messiah", "Dune Messiah")],
        down: false,
    };
    let session = signed_in();

    let results = search_catalog(&backend, &search, &session, "herbert").await;
    assert_eq!(results.status_message(), None);
    let catalog: Vec<&str> = results.catalog.iter().map(|b| b.title.as_str()).collect();
    assert_eq!(catalog, vec!["Dune"]);
    let external: Vec<&str> = results.external.iter().map(|v| v.google_id.as_str()).collect();
    assert_eq!(external, vec!["g-messiah"]);
}

#[tokio::test]
async fn search_reports_failed_sources() {
    let backend = FakeBackend::new();
    let search = FakeSearch {
        volumes: Vec::new(),
        down: true,
    };
    let session = signed_in();

    let results = search_catalog(&backend, &search, &session, "dune").await;
    assert_eq!(
        results.status_message().as_deref(),
        Some("Some data could not be loaded: book search.")
    );

    backend.fail("books");
    let results = search_catalog(&backend, &search, &session, "dune").await;
    assert_eq!(results.status_message().as_deref(), Some(messages::SEARCH_FAILED));
}
