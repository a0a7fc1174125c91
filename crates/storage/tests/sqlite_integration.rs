use chrono::Duration;
use storage::repository::{
    AttemptRepository, PackageRepository, QuestionRepository, StorageError,
};
use storage::sqlite::SqliteRepository;
use tryout_core::model::{
    AnswerKey, AnswerOption, AnswerStatus, Block, BlockId, FinishReason, OptionId, PackageId,
    Question, QuestionId, TryoutPackage,
};
use tryout_core::time::fixed_now;
use tryout_core::TryoutPlayer;

fn build_package() -> TryoutPackage {
    TryoutPackage::new(
        PackageId::new(1),
        "Tryout SNBT #1",
        vec![
            Block::new(
                BlockId::new(10),
                "Penalaran Umum",
                vec![QuestionId::new(1), QuestionId::new(2)],
                10,
            )
            .unwrap(),
            Block::new(BlockId::new(20), "Literasi", vec![QuestionId::new(3)], 15).unwrap(),
        ],
    )
    .unwrap()
}

fn build_question(id: u64, correct: u64) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Question {id}"),
        vec![
            AnswerOption::new(OptionId::new(1), "A", "first"),
            AnswerOption::new(OptionId::new(2), "B", "second"),
            AnswerOption::new(OptionId::new(3), "C", "third"),
        ],
        OptionId::new(correct),
        Some(format!("Because of {id}")),
    )
    .unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_roundtrips_package_blocks_in_order() {
    let repo = connect("memdb_package").await;
    let package = build_package();
    repo.upsert_package(&package).await.unwrap();

    let fetched = repo
        .get_package(package.id())
        .await
        .unwrap()
        .expect("package exists");
    assert_eq!(fetched, package);

    // Upserting again replaces blocks rather than duplicating them.
    let renamed = TryoutPackage::new(
        package.id(),
        "Tryout SNBT #1 (rev)",
        vec![Block::new(BlockId::new(10), "PU", vec![QuestionId::new(2)], 5).unwrap()],
    )
    .unwrap();
    repo.upsert_package(&renamed).await.unwrap();
    let listed = repo.list_packages(10).await.unwrap();
    assert_eq!(listed, vec![renamed]);

    assert!(repo.get_package(PackageId::new(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_roundtrips_questions_and_skips_missing() {
    let repo = connect("memdb_questions").await;
    let q1 = build_question(1, 2);
    let q3 = build_question(3, 1);
    repo.upsert_question(&q1).await.unwrap();
    repo.upsert_question(&q3).await.unwrap();

    let fetched = repo
        .get_questions(&[QuestionId::new(3), QuestionId::new(2), QuestionId::new(1)])
        .await
        .unwrap();
    assert_eq!(fetched, vec![q3, q1]);
}

#[tokio::test]
async fn sqlite_persists_finished_attempt() {
    let repo = connect("memdb_attempts").await;
    let package = build_package();
    repo.upsert_package(&package).await.unwrap();

    let questions = vec![build_question(1, 2), build_question(2, 3), build_question(3, 1)];
    let key = AnswerKey::from_questions(&questions);
    let mut player = TryoutPlayer::new(package.clone(), key);
    let started = fixed_now();
    player.start(started);
    player.select_answer(QuestionId::new(1), OptionId::new(2), started);
    player.toggle_doubt(QuestionId::new(2), started);
    player.finish(started + Duration::minutes(3));

    let attempt = player.attempt().expect("finished attempt");
    let id = repo.append_attempt(&attempt).await.unwrap();

    let fetched = repo.get_attempt(id).await.unwrap();
    assert_eq!(fetched, attempt);
    assert_eq!(fetched.reason(), FinishReason::Manual);
    assert_eq!(fetched.results()[0].correct(), 1);
    assert_eq!(fetched.answers()[1].status, AnswerStatus::Doubtful);
    assert_eq!(fetched.answers()[1].selected_option, None);

    let rows = repo.list_attempts(package.id(), 5).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);

    assert!(matches!(
        repo.get_attempt(id + 100).await,
        Err(StorageError::NotFound)
    ));
}
