use recall_core::db::open_db_in_memory;
use recall_core::{
    NewNote, NoteOrder, NoteQuery, NoteStore, NoteValidationError, RepoError, ReviewPatch,
    SqliteNoteStore,
};
use uuid::Uuid;

const NOW: i64 = 1_700_000_000_000;
const HOUR_MS: i64 = 60 * 60 * 1000;

fn store() -> SqliteNoteStore {
    SqliteNoteStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

#[test]
fn create_note_starts_at_level_zero_due_in_one_hour() {
    let store = store();
    let note = store
        .create_note_at(
            &NewNote::new("  Ownership  ", "borrowing rules").with_tags(["Rust", "basics"]),
            NOW,
        )
        .unwrap();

    assert_eq!(note.title, "Ownership");
    assert_eq!(note.review_level, 0);
    assert_eq!(note.review_count, 0);
    assert!(!note.is_archived);
    assert_eq!(note.next_review_date, NOW + HOUR_MS);
    assert_eq!(note.created_at, NOW);
    assert_eq!(note.tags, vec!["Rust".to_string(), "basics".to_string()]);

    let loaded = store.get_note(note.id).unwrap().unwrap();
    assert_eq!(loaded, note);
}

#[test]
fn create_note_rejects_blank_title() {
    let store = store();
    let err = store
        .create_note_at(&NewNote::new(" ", "body"), NOW)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(NoteValidationError::EmptyTitle)
    ));
}

#[test]
fn set_note_tags_replaces_full_set_preserving_order() {
    let store = store();
    let note = store
        .create_note_at(&NewNote::new("tagged", "").with_tags(["old"]), NOW)
        .unwrap();

    let updated = store
        .set_note_tags(
            note.id,
            &[
                "Zeta".to_string(),
                "alpha".to_string(),
                "ZETA".to_string(),
                "  ".to_string(),
            ],
        )
        .unwrap();
    assert_eq!(
        updated.tags,
        vec!["Zeta".to_string(), "alpha".to_string(), "ZETA".to_string()]
    );
    assert_eq!(
        store.list_tags().unwrap(),
        vec!["alpha".to_string(), "ZETA".to_string(), "Zeta".to_string()]
    );
}

#[test]
fn set_note_tags_on_missing_note_is_not_found() {
    let store = store();
    let missing = Uuid::new_v4();
    let err = store.set_note_tags(missing, &["x".to_string()]).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn archived_notes_are_hidden_from_active_and_due_queries() {
    let store = store();
    let kept = store
        .create_note_at(&NewNote::new("kept", ""), NOW - 2 * HOUR_MS)
        .unwrap();
    let hidden = store
        .create_note_at(&NewNote::new("hidden", ""), NOW - 2 * HOUR_MS)
        .unwrap();

    let archived = store.set_archived(hidden.id, true).unwrap();
    assert!(archived.is_archived);

    let active = store.find_notes(&NoteQuery::active()).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, kept.id);

    let due = store.find_notes(&NoteQuery::due_at(NOW)).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, kept.id);

    let everything = store
        .find_notes(&NoteQuery {
            include_archived: true,
            ..NoteQuery::default()
        })
        .unwrap();
    assert_eq!(everything.len(), 2);

    let restored = store.set_archived(hidden.id, false).unwrap();
    assert!(!restored.is_archived);
}

#[test]
fn tag_filter_matches_exact_case_and_ignores_padding() {
    let store = store();
    let upper = store
        .create_note_at(&NewNote::new("work", "").with_tags(["Work"]), NOW)
        .unwrap();
    let lower = store
        .create_note_at(&NewNote::new("chores", "").with_tags(["work"]), NOW)
        .unwrap();

    let by_tag = |tag: &str| -> Vec<Uuid> {
        store
            .find_notes(&NoteQuery {
                tag: Some(tag.to_string()),
                ..NoteQuery::active()
            })
            .unwrap()
            .into_iter()
            .map(|note| note.id)
            .collect()
    };
    assert_eq!(by_tag(" Work "), vec![upper.id]);
    assert_eq!(by_tag("work"), vec![lower.id]);
    assert!(by_tag("WORK").is_empty());
}

#[test]
fn update_note_replaces_text_and_tags_but_keeps_review_state() {
    let store = store();
    let note = store
        .create_note_at(&NewNote::new("draft", "v1").with_tags(["a", "b"]), NOW)
        .unwrap();
    store
        .update_review(
            note.id,
            &ReviewPatch {
                review_level: 2,
                review_count: 2,
                next_review_date: NOW + 5,
                updated_at: NOW,
            },
        )
        .unwrap();

    let edited = store
        .update_note_at(
            note.id,
            &NewNote::new(" final ", "v2").with_tags(["b", "C"]),
            NOW + 10,
        )
        .unwrap();
    assert_eq!(edited.title, "final");
    assert_eq!(edited.content, "v2");
    assert_eq!(edited.tags, vec!["b".to_string(), "C".to_string()]);
    assert_eq!(edited.review_level, 2);
    assert_eq!(edited.next_review_date, NOW + 5);
    assert_eq!(edited.updated_at, NOW + 10);
    assert_eq!(edited.created_at, NOW);

    let missing = Uuid::new_v4();
    assert!(matches!(
        store.update_note(missing, &NewNote::new("x", "")).unwrap_err(),
        RepoError::NotFound(id) if id == missing
    ));
}

#[test]
fn delete_note_removes_note_and_its_tags() {
    let store = store();
    let doomed = store
        .create_note_at(&NewNote::new("doomed", "").with_tags(["gone"]), NOW)
        .unwrap();
    store
        .create_note_at(&NewNote::new("kept", "").with_tags(["kept"]), NOW)
        .unwrap();

    store.delete_note(doomed.id).unwrap();
    assert!(store.get_note(doomed.id).unwrap().is_none());
    assert_eq!(store.list_tags().unwrap(), vec!["kept".to_string()]);
    assert!(matches!(
        store.delete_note(doomed.id).unwrap_err(),
        RepoError::NotFound(_)
    ));
}

#[test]
fn create_note_near_clock_limit_saturates_first_due_date() {
    let store = store();
    let note = store
        .create_note_at(&NewNote::new("far future", ""), i64::MAX - 1)
        .unwrap();
    assert_eq!(note.next_review_date, i64::MAX);
}

#[test]
fn query_respects_order_and_limit() {
    let store = store();
    let late = store
        .create_note_at(&NewNote::new("late", ""), NOW)
        .unwrap();
    let early = store
        .create_note_at(&NewNote::new("early", ""), NOW - 5 * HOUR_MS)
        .unwrap();

    let ordered = store
        .find_notes(&NoteQuery {
            order: NoteOrder::NextReviewAsc,
            limit: Some(1),
            ..NoteQuery::active()
        })
        .unwrap();
    assert_eq!(ordered.len(), 1);
    assert_eq!(ordered[0].id, early.id);
    assert_ne!(ordered[0].id, late.id);
}

#[test]
fn update_review_rejects_level_above_cap_and_unknown_ids() {
    let store = store();
    let note = store
        .create_note_at(&NewNote::new("capped", ""), NOW)
        .unwrap();

    let too_high = ReviewPatch {
        review_level: 6,
        review_count: 1,
        next_review_date: NOW,
        updated_at: NOW,
    };
    assert!(matches!(
        store.update_review(note.id, &too_high).unwrap_err(),
        RepoError::Validation(NoteValidationError::ReviewLevelOutOfRange(6))
    ));

    let ok = ReviewPatch {
        review_level: 3,
        review_count: 2,
        next_review_date: NOW + 42,
        updated_at: NOW + 7,
    };
    let missing = Uuid::new_v4();
    assert!(matches!(
        store.update_review(missing, &ok).unwrap_err(),
        RepoError::NotFound(id) if id == missing
    ));

    let updated = store.update_review(note.id, &ok).unwrap();
    assert_eq!(updated.review_level, 3);
    assert_eq!(updated.review_count, 2);
    assert_eq!(updated.next_review_date, NOW + 42);
    assert_eq!(updated.updated_at, NOW + 7);
}

#[test]
fn note_serializes_with_camel_case_field_names() {
    let store = store();
    let note = store
        .create_note_at(&NewNote::new("json", "body").with_tags(["a"]), NOW)
        .unwrap();
    let value = serde_json::to_value(&note).unwrap();

    for key in [
        "id",
        "tags",
        "isArchived",
        "reviewLevel",
        "reviewCount",
        "nextReviewDate",
    ] {
        assert!(value.get(key).is_some(), "missing key {key}");
    }
    assert_eq!(value["nextReviewDate"], serde_json::json!(NOW + HOUR_MS));
}
