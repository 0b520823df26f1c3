use noteverse_core::db::{open_db, open_db_in_memory};
use noteverse_core::{
    ListNotesRequest, NoteDraft, NoteService, ServiceError, SqliteNoteRepository,
    SqliteUserRepository, UserId, UserService,
};

#[test]
fn register_normalizes_email_and_rejects_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let ada = users.register_user("  ada ", " Ada@Example.COM ").unwrap();
    assert_eq!(ada.username, "ada");
    assert_eq!(ada.email, "ada@example.com");
    assert_eq!(users.get_user(ada.id).unwrap(), ada);

    let err = users.register_user("ADA", "ada@example.com").unwrap_err();
    let ServiceError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    assert!(errors.has_field("email"));
    assert!(errors.has_field("username"));
}

#[test]
fn register_rejects_malformed_input() {
    let conn = open_db_in_memory().unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let err = users.register_user("ab", "not-an-email").unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[test]
fn username_lookup_ignores_case() {
    let conn = open_db_in_memory().unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let grace = users.register_user("Grace", "grace@example.com").unwrap();

    assert_eq!(users.find_by_username("grace").unwrap(), Some(grace));
    assert_eq!(users.find_by_username("linus").unwrap(), None);
    assert!(matches!(
        users.get_user(UserId::new()),
        Err(ServiceError::UserNotFound(_))
    ));
}

#[test]
fn populate_resolves_author_and_likers() {
    let conn = open_db_in_memory().unwrap();
    let users = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    let ada = users.register_user("ada", "ada@example.com").unwrap();
    let grace = users.register_user("grace", "grace@example.com").unwrap();

    let note = notes
        .create_note(Some(ada.id), &NoteDraft::new("Engines", "analytical", "me", "4", "Machines"))
        .unwrap();
    notes.toggle_like(Some(grace.id), note.id).unwrap();
    let ghost = notes.toggle_like(Some(UserId::new()), note.id).unwrap();

    let populated = users.populate(ghost.note).unwrap();
    assert_eq!(populated.author, Some(ada));
    assert_eq!(populated.liked_by, vec![grace]);
    assert_eq!(populated.note.like_count(), 2);
}

#[test]
fn notes_survive_reopening_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noteverse.sqlite3");
    let author = UserId::new();

    let note_id = {
        let conn = open_db(&path).unwrap();
        let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
        notes
            .create_note(
                Some(author),
                &NoteDraft::new("Thermo", "entropy", "chem", "2", "Thermodynamics")
                    .with_public(false),
            )
            .unwrap()
            .id
    };

    let conn = open_db(&path).unwrap();
    let notes = NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap());
    assert_eq!(notes.get_note(Some(author), note_id).unwrap().title, "Thermo");
    assert!(notes
        .list_notes(None, &ListNotesRequest::default())
        .unwrap()
        .is_empty());
}
