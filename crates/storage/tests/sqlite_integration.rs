use quiz_core::model::{
    Difficulty, Question, QuestionId, QuizConfigDraft, QuizMode, Session,
};
use quiz_core::time::fixed_now;
use storage::repository::{SessionStore, Storage};
use storage::sqlite::SqliteRepository;

fn build_session() -> Session {
    let questions = vec![
        Question::new(
            "q1",
            "What is the capital of France?",
            vec!["Paris".into(), "London".into(), "Rome".into(), "Berlin".into()],
            "Paris",
        )
        .unwrap()
        .with_category("Geography")
        .with_difficulty(Difficulty::Easy),
        Question::new(
            "q2",
            "Which language runs in a web browser?",
            vec!["Java".into(), "C".into(), "Python".into(), "JavaScript".into()],
            "JavaScript",
        )
        .unwrap()
        .with_time_limit(Some(20)),
    ];
    let config = QuizConfigDraft {
        mode: QuizMode::Test,
        ..QuizConfigDraft::default()
    }
    .validate()
    .unwrap();
    Session::new(config, questions, fixed_now()).unwrap()
}

#[tokio::test]
async fn sqlite_round_trips_full_session() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_session_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut session = build_session();
    let q1 = QuestionId::new("q1");
    session.fix_display_choices(&q1, |choices| choices.reverse());
    session.timer_mut().start(30);
    session.timer_mut().tick();
    session.set_answer(&q1, "Rome");
    session.toggle_review(&q1);
    session.lock_if_answered(&q1);
    session.advance(1);
    session.timer_mut().start(20);
    session.set_paused(true);
    session.timer_mut().pause();

    repo.save(&session).await.unwrap();
    let loaded = repo.load().await.unwrap().expect("stored session");
    assert_eq!(loaded, session);
}

#[tokio::test]
async fn sqlite_save_overwrites_and_clear_removes() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_session_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Migrations are idempotent.
    repo.migrate().await.expect("migrate twice");

    assert!(repo.load().await.unwrap().is_none());

    let mut session = build_session();
    repo.save(&session).await.unwrap();
    session.advance(1);
    repo.save(&session).await.unwrap();

    let loaded = repo.load().await.unwrap().unwrap();
    assert_eq!(loaded.current_index(), 1);

    repo.clear().await.unwrap();
    assert!(repo.load().await.unwrap().is_none());
    repo.clear().await.unwrap();
}

#[tokio::test]
async fn sqlite_storage_builder_migrates() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage_builder?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.sessions.save(&build_session()).await.unwrap();
    assert!(storage.sessions.load().await.unwrap().is_some());
}

#[tokio::test]
async fn corrupt_payload_surfaces_serialization_error() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_session_corrupt?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    sqlx::query("INSERT INTO session_slots (key, payload, saved_at) VALUES (?1, ?2, ?3)")
        .bind(storage::repository::SESSION_KEY)
        .bind("{\"version\":2,\"state\":{}}")
        .bind("2023-11-14T22:13:20Z")
        .execute(repo.pool())
        .await
        .unwrap();

    let err = repo.load().await.unwrap_err();
    assert!(matches!(
        err,
        storage::repository::StorageError::Serialization(_)
    ));
}
