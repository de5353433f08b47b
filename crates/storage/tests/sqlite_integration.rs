use quiz_core::model::{
    Answer, AnswerOption, AttemptState, AttemptView, OptionId, Question, QuestionId, QuizId,
};
use quiz_core::time::fixed_clock;
use storage::repository::{AttemptKey, AttemptStore};
use storage::sqlite::SqliteRepository;

fn answer(id: u64, label: &str) -> Answer {
    let question = Question::new(
        QuestionId::new(id),
        format!("Question {id}"),
        vec![
            AnswerOption::new("A", "first", true),
            AnswerOption::new("B", "second", false),
        ],
        1,
    )
    .unwrap();
    Answer::evaluate(&question, &OptionId::from(label)).unwrap()
}

async fn repo(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url)
        .await
        .expect("connect")
        .with_clock(fixed_clock());
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrip_restores_answers_and_position() {
    let repo = repo("memdb_attempt_roundtrip").await;
    let key = AttemptKey::new(QuizId::new(7));
    let state = AttemptState::from_parts(
        2,
        vec![answer(1, "A"), answer(2, "B")],
        AttemptView::Question,
    );

    repo.save(&key, &state).await.unwrap();
    let loaded = repo.load(&key).await.unwrap().expect("stored attempt");
    assert_eq!(loaded, state);
    assert_eq!(loaded.answers().len(), 2);
    assert_eq!(loaded.current_question_index(), 2);
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_attempt() {
    let repo = repo("memdb_attempt_overwrite").await;
    let key = AttemptKey::new(QuizId::new(8));

    let first = AttemptState::from_parts(0, vec![answer(1, "B")], AttemptView::Question);
    repo.save(&key, &first).await.unwrap();
    let second = AttemptState::from_parts(
        1,
        vec![answer(1, "B"), answer(2, "A")],
        AttemptView::Question,
    );
    repo.save(&key, &second).await.unwrap();

    let loaded = repo.load(&key).await.unwrap().unwrap();
    assert_eq!(loaded, second);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quiz_attempts")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn sqlite_corrupt_payload_reads_as_absent() {
    let repo = repo("memdb_attempt_corrupt").await;
    let key = AttemptKey::new(QuizId::new(9));

    sqlx::query(
        "INSERT INTO quiz_attempts (storage_key, quiz_id, namespace, payload, updated_at)
         VALUES (?1, ?2, NULL, ?3, '2023-11-14T22:13:20Z')",
    )
    .bind(key.storage_key())
    .bind(9_i64)
    .bind("{ this is not an attempt")
    .execute(repo.pool())
    .await
    .unwrap();

    assert!(repo.load(&key).await.unwrap().is_none());

    // A fresh save replaces the unreadable record.
    let state = AttemptState::from_parts(0, vec![answer(1, "A")], AttemptView::Question);
    repo.save(&key, &state).await.unwrap();
    assert_eq!(repo.load(&key).await.unwrap(), Some(state));
}

#[tokio::test]
async fn sqlite_clear_is_scoped_and_idempotent() {
    let repo = repo("memdb_attempt_clear").await;
    let shared = AttemptKey::new(QuizId::new(10));
    let scoped = AttemptKey::namespaced(QuizId::new(10), "second-tab");
    let other_quiz = AttemptKey::new(QuizId::new(11));
    let state = AttemptState::from_parts(0, vec![answer(1, "A")], AttemptView::Question);

    for key in [&shared, &scoped, &other_quiz] {
        repo.save(key, &state).await.unwrap();
    }

    repo.clear(&shared).await.unwrap();
    repo.clear(&shared).await.unwrap();

    assert!(repo.load(&shared).await.unwrap().is_none());
    assert!(repo.load(&scoped).await.unwrap().is_some());
    assert!(repo.load(&other_quiz).await.unwrap().is_some());
}

#[tokio::test]
async fn sqlite_migrate_is_rerunnable() {
    let repo = repo("memdb_attempt_migrate").await;
    repo.migrate().await.expect("second migrate");

    let (version,): (i64,) = sqlx::query_as("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(version, 1);
}
