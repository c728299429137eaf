use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::grading::Selection;
use quiz_core::model::{
    ChapterCatalog, ChapterKey, ProgressMap, QuestionIndex, QuestionType, Streak, StudyMode,
};
use quiz_core::time::fixed_now;
use services::{
    Advance, Clock, ProgressService, RngSource, RoundLoopService, RoundStart, SessionError,
    SettingsService, SubmitOutcome,
};
use storage::json::{QuestionRecord, StoreLayout};
use storage::repository::{ProgressRepository, Storage, StorageError};
use tempfile::TempDir;

fn chapter() -> ChapterKey {
    ChapterKey::new("basics").unwrap()
}

fn layout(dir: &TempDir) -> StoreLayout {
    StoreLayout::new(
        dir.path().join("data"),
        dir.path().join("state").join("settings.json"),
    )
}

fn record(text: &str) -> QuestionRecord {
    QuestionRecord {
        question: text.to_owned(),
        correct_answers: vec!["Right".to_owned()],
        wrong_options: vec!["Wrong".to_owned(), "Other".to_owned()],
        explanation: format!("{text} explained"),
        id: None,
    }
}

fn write_questions(layout: &StoreLayout, question_type: QuestionType, texts: &[&str]) {
    let records: Vec<QuestionRecord> = texts.iter().map(|t| record(t)).collect();
    let path = layout.question_path(&chapter(), question_type);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec_pretty(&records).unwrap()).unwrap();
}

fn loop_service(storage: &Storage) -> RoundLoopService {
    RoundLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::clone(&storage.questions),
        ProgressService::new(Arc::clone(&storage.questions), Arc::clone(&storage.progress)),
        SettingsService::new(Arc::clone(&storage.settings)),
    )
    .with_rng_source(RngSource::seeded(3))
}

#[tokio::test]
async fn review_round_leaves_progress_file_untouched() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    write_questions(&layout, QuestionType::Single, &["Q0", "Q1", "Q2"]);
    let storage = Storage::json(layout.clone());

    let progress = ProgressService::new(Arc::clone(&storage.questions), Arc::clone(&storage.progress));
    progress.ensure_progress(&chapter()).await.unwrap();
    for index in 0..3 {
        for _ in 0..2 {
            progress
                .record_answer(
                    &chapter(),
                    QuestionType::Single,
                    QuestionIndex::new(index),
                    true,
                    StudyMode::LearnNew,
                )
                .await
                .unwrap();
        }
    }
    let progress_path = layout.progress_path(&chapter(), QuestionType::Single);
    let before = std::fs::read(&progress_path).unwrap();

    let service = loop_service(&storage);
    let RoundStart::Ready(mut session) = service
        .start_round(&chapter(), StudyMode::ReviewOld)
        .await
        .unwrap()
    else {
        panic!("review round should start");
    };

    loop {
        let outcome = service
            .submit_answer(&mut session, Selection::single("Wrong"))
            .await
            .unwrap();
        let SubmitOutcome::Answered(feedback) = outcome else {
            panic!("fresh item should accept an answer");
        };
        assert!(!feedback.is_correct);
        assert!(feedback.explanation.ends_with("explained"));
        if service.advance(&mut session).await.unwrap() == Advance::RoundComplete {
            break;
        }
    }

    let after = std::fs::read(&progress_path).unwrap();
    assert_eq!(before, after);

    let report = session.report();
    assert_eq!(report.answered(), 3);
    assert_eq!(report.correct(), 0);
}

#[tokio::test]
async fn corrupt_progress_counts_as_unlearned() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    write_questions(&layout, QuestionType::Single, &["Q0", "Q1"]);
    let progress_path = layout.progress_path(&chapter(), QuestionType::Single);
    std::fs::create_dir_all(progress_path.parent().unwrap()).unwrap();
    std::fs::write(&progress_path, b"{ not json").unwrap();
    let storage = Storage::json(layout);

    let service = loop_service(&storage);
    let RoundStart::Ready(mut session) = service
        .start_round(&chapter(), StudyMode::LearnNew)
        .await
        .unwrap()
    else {
        panic!("learn round should start");
    };
    assert_eq!(session.batch().len(), 2);

    let right = session.current_options().unwrap().correct_answers()[0].clone();
    service
        .submit_answer(&mut session, Selection::single(right))
        .await
        .unwrap();

    let stored: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&progress_path).unwrap()).unwrap();
    assert_eq!(stored.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn reset_and_overview_follow_question_files() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    write_questions(&layout, QuestionType::Single, &["Q0", "Q1"]);
    write_questions(&layout, QuestionType::Multi, &["M0"]);
    let storage = Storage::json(layout);
    let progress = ProgressService::new(Arc::clone(&storage.questions), Arc::clone(&storage.progress));

    for _ in 0..2 {
        progress
            .record_answer(&chapter(), QuestionType::Multi, QuestionIndex::new(0), true, StudyMode::LearnNew)
            .await
            .unwrap();
    }
    let overviews = progress.overviews(&ChapterCatalog::default()).await.unwrap();
    assert_eq!(overviews.len(), 1);
    assert_eq!((overviews[0].learned, overviews[0].total), (1, 3));

    let reset = progress.reset_chapter(&chapter()).await.unwrap();
    assert_eq!(reset, vec![QuestionType::Single, QuestionType::Multi]);
    let multi = progress.load(&chapter(), QuestionType::Multi).await.unwrap();
    assert_eq!(multi, ProgressMap::zeroed([QuestionIndex::new(0)]));
    let overviews = progress.overviews(&ChapterCatalog::default()).await.unwrap();
    assert_eq!(overviews[0].learned, 0);
}

/// Progress backend whose writes always fail.
struct ReadOnlyProgress;

#[async_trait]
impl ProgressRepository for ReadOnlyProgress {
    async fn load_progress(
        &self,
        _chapter: &ChapterKey,
        _question_type: QuestionType,
    ) -> Result<ProgressMap, StorageError> {
        Ok(ProgressMap::new())
    }

    async fn has_progress(
        &self,
        _chapter: &ChapterKey,
        _question_type: QuestionType,
    ) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn save_progress(
        &self,
        _chapter: &ChapterKey,
        _question_type: QuestionType,
        _progress: &ProgressMap,
    ) -> Result<(), StorageError> {
        Err(StorageError::Io("read-only filesystem".to_owned()))
    }
}

#[tokio::test]
async fn failed_progress_write_leaves_item_unanswered() {
    let dir = TempDir::new().unwrap();
    let layout = layout(&dir);
    write_questions(&layout, QuestionType::Single, &["Q0"]);
    let mut storage = Storage::json(layout);
    storage.progress = Arc::new(ReadOnlyProgress);
    let service = loop_service(&storage);

    let RoundStart::Ready(mut session) = service
        .start_round(&chapter(), StudyMode::LearnNew)
        .await
        .unwrap()
    else {
        panic!("learn round should start");
    };

    let err = service
        .submit_answer(&mut session, Selection::single("Right"))
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Progress(_)));
    assert!(!session.is_current_answered());
    assert_eq!(service.advance(&mut session).await.unwrap(), Advance::Blocked);

    // Review mode never writes, so the same backend still works there.
    let streak = service
        .progress()
        .record_answer(&chapter(), QuestionType::Single, QuestionIndex::new(0), true, StudyMode::ReviewOld)
        .await
        .unwrap();
    assert_eq!(streak, Streak::ZERO);
}
