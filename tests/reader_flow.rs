use std::{sync::Arc, time::Duration};

use readfolio::{
    catalog::Chapter,
    persona::{PersonaAnswers, PersonaLabel, QuestionKey},
    progress::ReadingStatus,
    session::SessionProvider,
    AppState, ContentItem, PositionInput,
};
use tempfile::TempDir;

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn catalog() -> Vec<ContentItem> {
    vec![
        ContentItem::paged("A", "Starfall", tags(&["Love wins", "Epic & Grandiose"]), 8),
        ContentItem::paged("B", "The Verdict", tags(&["Justice served"]), 4),
        ContentItem::chaptered(
            "C",
            "Masks",
            tags(&["Identity reveal"]),
            vec![
                Chapter::new(Some("One".into()), tags(&["p0", "p1", "p2"])),
                Chapter::new(Some("Two".into()), tags(&["p3", "p4"])),
            ],
        ),
    ]
}

fn onboarding_answers() -> PersonaAnswers {
    let mut answers = PersonaAnswers::new()
        .with(QuestionKey::Ending, "Love wins")
        .with(QuestionKey::FavoriteTwist, "Identity reveal");
    for vibe in ["Epic & Grandiose", "Cozy", "Whimsical"] {
        answers.toggle_vibe(vibe);
    }
    answers
}

#[tokio::test]
async fn for_you_uses_the_stored_persona() {
    let temp = TempDir::new().unwrap();
    let app = AppState::open(temp.path()).unwrap();
    let catalog = catalog();

    let unranked = app.for_you(&catalog).await.unwrap();
    assert_eq!(unranked, catalog);

    let persona = app.complete_onboarding(onboarding_answers()).await.unwrap();
    assert_eq!(persona.label(), PersonaLabel::EclecticReader);

    let ranked: Vec<String> = app
        .for_you(&catalog)
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(ranked, vec!["A", "C", "B"]);
}

#[tokio::test]
async fn onboarding_rejects_too_few_vibes() {
    let temp = TempDir::new().unwrap();
    let app = AppState::open(temp.path()).unwrap();

    let answers = PersonaAnswers::new().with(QuestionKey::Ending, "Love wins");
    assert!(app.complete_onboarding(answers).await.is_err());
    assert!(app.session.load_persona().await.unwrap().is_none());
}

#[tokio::test]
async fn closing_a_reader_persists_the_final_position() {
    let temp = TempDir::new().unwrap();
    let app = AppState::open(temp.path()).unwrap();
    app.sign_in("reader-1").await.unwrap();
    let items = catalog();

    let mut reader = app.open_reader(Arc::new(items[2].clone())).await.unwrap();
    reader.jump_to(PositionInput::paragraph(0, 2)).await.unwrap();
    reader.advance().await.unwrap();
    let entry = reader.close().await.unwrap().unwrap();
    assert_eq!(entry.absolute_position, 3);
    assert_eq!(entry.progress_percentage, 75);

    let user = app.session.current_user().await.unwrap().unwrap();
    assert_eq!(user.history.get("C").unwrap().absolute_position, 3);

    let resumed = app.open_reader(Arc::new(items[2].clone())).await.unwrap();
    assert_eq!(
        resumed.snapshot().position,
        Some(PositionInput::paragraph(1, 0))
    );
    resumed.close().await.unwrap();

    let in_progress = app.continue_reading(&items).await.unwrap();
    assert_eq!(in_progress.len(), 1);
    assert_eq!(in_progress[0].0.id, "C");
}

#[tokio::test]
async fn debounced_write_lands_after_quiet_window() {
    let temp = TempDir::new().unwrap();
    let app = AppState::open(temp.path()).unwrap();
    app.sign_in("reader-1").await.unwrap();

    let mut reader = app
        .open_reader(Arc::new(catalog()[0].clone()))
        .await
        .unwrap();
    for page in 0..5 {
        reader.jump_to(PositionInput::page(page)).await.unwrap();
    }
    let before = app.session.current_user().await.unwrap().unwrap();
    assert!(before.history.is_empty());

    tokio::time::sleep(Duration::from_millis(900)).await;

    let after = app.session.current_user().await.unwrap().unwrap();
    let entry = after.history.get("A").unwrap();
    assert_eq!(entry.absolute_position, 4);
    assert_eq!(entry.progress_percentage, 57);
    assert_eq!(app.recorder.pending_count().await, 0);
    reader.close().await.unwrap();
}

#[tokio::test]
async fn signed_out_reading_leaves_no_history() {
    let temp = TempDir::new().unwrap();
    let app = AppState::open(temp.path()).unwrap();

    let mut reader = app
        .open_reader(Arc::new(catalog()[1].clone()))
        .await
        .unwrap();
    reader.advance().await.unwrap();
    assert!(reader.close().await.unwrap().is_none());
    assert_eq!(app.shutdown().await, 0);
    assert!(app.session.current_user().await.unwrap().is_none());
}

#[tokio::test]
async fn sign_out_flushes_pending_progress() {
    let temp = TempDir::new().unwrap();
    let app = AppState::open(temp.path()).unwrap();
    app.sign_in("reader-1").await.unwrap();

    let mut reader = app
        .open_reader(Arc::new(catalog()[1].clone()))
        .await
        .unwrap();
    reader.jump_to(PositionInput::page(3)).await.unwrap();
    app.sign_out().await.unwrap();
    reader.close().await.unwrap();

    let user = app.sign_in("reader-1").await.unwrap();
    assert_eq!(user.history.get("B").unwrap().progress_percentage, 100);
}

#[tokio::test]
async fn reopening_right_after_drop_resumes_from_last_position() {
    let temp = TempDir::new().unwrap();
    let app = AppState::open(temp.path()).unwrap();
    app.sign_in("reader-1").await.unwrap();
    let item = Arc::new(catalog()[0].clone());

    let mut reader = app.open_reader(item.clone()).await.unwrap();
    reader.jump_to(PositionInput::page(5)).await.unwrap();
    drop(reader);

    let mut reopened = app.open_reader(item).await.unwrap();
    let snapshot = reopened.snapshot();
    assert_eq!(snapshot.status, ReadingStatus::Visited);
    assert_eq!(snapshot.absolute_position, 5);
    assert_eq!(snapshot.position, Some(PositionInput::page(5)));

    let next = reopened.advance().await.unwrap();
    assert_eq!(next.absolute_position, 6);
    let entry = reopened.close().await.unwrap().unwrap();
    assert_eq!(entry.absolute_position, 6);
}
