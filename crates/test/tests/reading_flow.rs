use bookclub_application::{AppError, Reconciler, find, messages};
use bookclub_core::{
    NewLocalReadingState, Origin, ReadingPatch, RemoteReadingState, Session, UiStatus,
};
use bookclub_storage::{LocalReadingStore, Storage};
use bookclub_test::{FakeBackend, USER_ID, local_store, remote_state, signed_in};

#[tokio::test]
async fn merged_list_puts_local_first_and_folds_statuses() -> anyhow::Result<()> {
    let backend = FakeBackend::new().with_states(vec![
        remote_state("r1", "Dune", "read"),
        remote_state("r2", "Emma", "pending"),
        remote_state("r3", "Ulysses", "paused"),
    ]);
    let local = local_store();
    let session = signed_in();
    let reconciler = Reconciler::new(&backend, &local, &session);

    reconciler.add_local(USER_ID, NewLocalReadingState::new("Middlemarch"));
    let entries = reconciler.load(USER_ID).await.entries;

    let summary: Vec<(&str, Origin, UiStatus)> = entries
        .iter()
        .map(|e| (e.title.as_str(), e.origin, e.status))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Middlemarch", Origin::Local, UiStatus::ToRead),
            ("Dune", Origin::Remote, UiStatus::Completed),
            ("Emma", Origin::Remote, UiStatus::ToRead),
            ("Ulysses", Origin::Remote, UiStatus::Reading),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn anonymous_session_still_sees_local_entries() -> anyhow::Result<()> {
    let backend = FakeBackend::new().with_states(vec![remote_state("r1", "Dune", "read")]);
    let local = local_store();
    let session = Session::new(None, Some(USER_ID.to_string()));
    let reconciler = Reconciler::new(&backend, &local, &session);

    reconciler.add_local(USER_ID, NewLocalReadingState::new("Middlemarch"));
    let entries = reconciler.load(USER_ID).await.entries;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].origin, Origin::Local);
    Ok(())
}

#[tokio::test]
async fn edits_are_routed_by_origin() -> anyhow::Result<()> {
    let backend = FakeBackend::new().with_states(vec![remote_state("r1", "Dune", "reading")]);
    let local = local_store();
    let session = signed_in();
    let reconciler = Reconciler::new(&backend, &local, &session);
    reconciler.add_local(USER_ID, NewLocalReadingState::new("Middlemarch"));

    let entries = reconciler.load(USER_ID).await.entries;
    let done = ReadingPatch {
        status: Some(UiStatus::Completed),
        notes: Some("finished".to_string()),
    };

    let local_entry = &entries[0];
    let updated = reconciler.update(local_entry, &done).await?;
    assert_eq!(updated.origin, Origin::Local);
    assert_eq!(updated.status, UiStatus::Completed);
    let stored = local.list(USER_ID);
    assert_eq!(stored[0].status, UiStatus::Completed);
    assert_eq!(stored[0].notes, "finished");
    assert_eq!(backend.states()[0].status.as_deref(), Some("reading"));

    let remote_entry = find(&entries, "r1").ok_or_else(|| anyhow::anyhow!("missing r1"))?;
    let updated = reconciler.update(remote_entry, &done).await?;
    assert_eq!(updated.origin, Origin::Remote);
    assert_eq!(updated.status, UiStatus::Completed);
    assert_eq!(backend.states()[0].status.as_deref(), Some("read"));
    Ok(())
}

#[tokio::test]
async fn unkeyed_remote_entries_are_read_only() -> anyhow::Result<()> {
    let backend = FakeBackend::new().with_states(vec![RemoteReadingState {
        user_id: Some(USER_ID.to_string()),
        title: Some("Nameless".to_string()),
        ..RemoteReadingState::default()
    }]);
    let local = local_store();
    let session = signed_in();
    let reconciler = Reconciler::new(&backend, &local, &session);

    let entries = reconciler.load(USER_ID).await.entries;
    let err = reconciler
        .update(&entries[0], &ReadingPatch::default())
        .await
        .err()
        .ok_or_else(|| anyhow::anyhow!("update should fail"))?;
    assert!(matches!(err, AppError::ReadOnly));
    assert_eq!(
        err.user_message(messages::UPDATE_READING_STATE_FAILED),
        messages::ENTRY_READ_ONLY
    );
    assert!(matches!(
        reconciler.delete(&entries[0]).await,
        Err(AppError::ReadOnly)
    ));
    Ok(())
}

#[tokio::test]
async fn import_moves_local_entry_to_backend() -> anyhow::Result<()> {
    let backend = FakeBackend::new();
    let local = local_store();
    let session = signed_in();
    let reconciler = Reconciler::new(&backend, &local, &session);

    let mut draft = NewLocalReadingState::new("Middlemarch");
    draft.status = UiStatus::Completed;
    draft.authors = vec!["George Eliot".to_string()];
    let added = reconciler.add_local(USER_ID, draft);
    let local_id = added.id.clone().ok_or_else(|| anyhow::anyhow!("local entry has no id"))?;

    let imported = reconciler.import_local(USER_ID, &local_id).await?;
    assert_eq!(imported.origin, Origin::Remote);
    assert_eq!(imported.status, UiStatus::Completed);
    assert!(local.list(USER_ID).is_empty());
    assert_eq!(backend.states()[0].status.as_deref(), Some("read"));

    let entries = reconciler.load(USER_ID).await.entries;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].authors, vec!["George Eliot".to_string()]);
    Ok(())
}

#[tokio::test]
async fn failed_import_keeps_local_entry() {
    let backend = FakeBackend::new();
    backend.fail("reading-states");
    let local = local_store();
    let session = signed_in();
    let reconciler = Reconciler::new(&backend, &local, &session);

    let added = reconciler.add_local(USER_ID, NewLocalReadingState::new("Middlemarch"));
    let local_id = added.id.unwrap_or_default();

    let err = reconciler.import_local(USER_ID, &local_id).await;
    assert!(matches!(err, Err(AppError::Backend(_))));
    assert_eq!(local.list(USER_ID).len(), 1);
}

#[tokio::test]
async fn import_requires_sign_in() {
    let backend = FakeBackend::new();
    let local = local_store();
    let session = Session::new(None, Some(USER_ID.to_string()));
    let reconciler = Reconciler::new(&backend, &local, &session);
    let added = reconciler.add_local(USER_ID, NewLocalReadingState::new("Middlemarch"));

    let err = reconciler
        .import_local(USER_ID, added.id.as_deref().unwrap_or_default())
        .await;
    let err = match err {
        Err(err) => err,
        Ok(_) => panic!("import without a token should fail"),
    };
    assert_eq!(
        err.user_message(messages::IMPORT_READING_STATE_FAILED),
        messages::SIGN_IN_REQUIRED
    );
    assert_eq!(local.list(USER_ID).len(), 1);
}

#[tokio::test]
async fn local_entries_survive_reopening_the_database() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bookclub.db");
    let backend = FakeBackend::new();
    let session = signed_in();

    {
        let local = LocalReadingStore::new(Storage::open(&path)?);
        let reconciler = Reconciler::new(&backend, &local, &session);
        reconciler.add_local(USER_ID, NewLocalReadingState::new("Middlemarch"));
    }

    let local = LocalReadingStore::new(Storage::open(&path)?);
    let reconciler = Reconciler::new(&backend, &local, &session);
    let entries = reconciler.load(USER_ID).await.entries;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].title, "Middlemarch");
    assert!(entries[0].id.as_deref().is_some_and(|id| id.starts_with("local-")));
    Ok(())
}

#[tokio::test]
async fn backend_outage_leaves_local_entries_editable() -> anyhow::Result<()> {
    let backend = FakeBackend::new().with_states(vec![remote_state("r1", "Dune", "read")]);
    backend.fail("reading-states");
    let local = local_store();
    let session = signed_in();
    let reconciler = Reconciler::new(&backend, &local, &session);
    let added = reconciler.add_local(USER_ID, NewLocalReadingState::new("Middlemarch"));

    let loaded = reconciler.load(USER_ID).await;
    assert!(loaded.is_partial());
    let entries = loaded.into_entries()?;
    assert_eq!(entries.len(), 1);

    let key = added.id.clone().unwrap_or_default();
    let entry = find(&entries, &key).ok_or_else(|| anyhow::anyhow!("missing local entry"))?;
    reconciler.delete(entry).await?;
    assert!(local.list(USER_ID).is_empty());
    Ok(())
}
