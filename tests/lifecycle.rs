mod common;

use trivia_night_back::{
    dao::models::GameStatus,
    error::ServiceError,
    services::{host_service, lifecycle_service, public_service},
};

use common::{HOST_PIN, harness};

#[tokio::test]
async fn grading_then_redo_restores_scores() {
    let h = harness();
    let (game, questions) = h.game_with_questions(2).await;
    let alice = h.join(&game.code, "A").await;
    let bob = h.join(&game.code, "B").await;

    lifecycle_service::start(&h.state, game.id).await.unwrap();
    let a_answer = h.answer(alice, questions[0].id, "Paris").await;
    let b_answer = h.answer(bob, questions[0].id, "Lyon").await;

    lifecycle_service::close_answers(&h.state, game.id).await.unwrap();
    host_service::grade_answer(&h.state, game.id, a_answer, true).await.unwrap();
    host_service::grade_answer(&h.state, game.id, b_answer, false).await.unwrap();

    let revealed = lifecycle_service::finish_grading(&h.state, game.id).await.unwrap();
    assert_eq!(revealed.status, GameStatus::Revealing);
    assert_eq!(h.score(alice).await, 1);
    assert_eq!(h.score(bob).await, 0);

    let redone = lifecycle_service::redo(&h.state, game.id).await.unwrap();
    assert_eq!(redone.status, GameStatus::Active);
    assert_eq!(redone.current_question, 0);
    assert_eq!(h.score(alice).await, 0);
    assert_eq!(h.score(bob).await, 0);
    assert_eq!(h.store.answer_count(), 0);
}

#[tokio::test]
async fn plays_through_to_finished() {
    let h = harness();
    let (game, _) = h.game_with_questions(2).await;

    lifecycle_service::start(&h.state, game.id).await.unwrap();
    for expected_index in 0..2 {
        lifecycle_service::close_answers(&h.state, game.id).await.unwrap();
        let revealed = lifecycle_service::finish_grading(&h.state, game.id).await.unwrap();
        assert_eq!(revealed.current_question, expected_index);
        let next = lifecycle_service::next(&h.state, game.id).await.unwrap();
        if expected_index == 0 {
            assert_eq!(next.status, GameStatus::Active);
            assert_eq!(next.current_question, 1);
        } else {
            assert_eq!(next.status, GameStatus::Finished);
            assert_eq!(next.current_question, 1);
        }
    }

    let err = lifecycle_service::next(&h.state, game.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn start_requires_a_question() {
    let h = harness();
    let game = h.create_game().await;

    let err = lifecycle_service::start(&h.state, game.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    let snapshot = public_service::snapshot(&h.state, game.id).await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::Lobby);
}

#[tokio::test]
async fn finish_grading_waits_for_every_grade() {
    let h = harness();
    let (game, questions) = h.game_with_questions(1).await;
    let alice = h.join(&game.code, "A").await;
    let bob = h.join(&game.code, "B").await;
    lifecycle_service::start(&h.state, game.id).await.unwrap();
    let graded = h.answer(alice, questions[0].id, "x").await;
    h.answer(bob, questions[0].id, "y").await;
    lifecycle_service::close_answers(&h.state, game.id).await.unwrap();
    host_service::grade_answer(&h.state, game.id, graded, true).await.unwrap();

    let err = lifecycle_service::finish_grading(&h.state, game.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(h.score(alice).await, 0, "no points before every answer is graded");

    let snapshot = public_service::snapshot(&h.state, game.id).await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::Grading);
}

#[tokio::test]
async fn finish_grading_without_answers_succeeds() {
    let h = harness();
    let (game, _) = h.game_with_questions(1).await;
    lifecycle_service::start(&h.state, game.id).await.unwrap();
    lifecycle_service::close_answers(&h.state, game.id).await.unwrap();

    let revealed = lifecycle_service::finish_grading(&h.state, game.id).await.unwrap();
    assert_eq!(revealed.status, GameStatus::Revealing);
}

#[tokio::test]
async fn redo_before_reveal_leaves_scores_alone() {
    let h = harness();
    let (game, questions) = h.game_with_questions(2).await;
    let alice = h.join(&game.code, "A").await;
    lifecycle_service::start(&h.state, game.id).await.unwrap();

    // Earn a point on the first question.
    let first = h.answer(alice, questions[0].id, "right").await;
    lifecycle_service::close_answers(&h.state, game.id).await.unwrap();
    host_service::grade_answer(&h.state, game.id, first, true).await.unwrap();
    lifecycle_service::finish_grading(&h.state, game.id).await.unwrap();
    lifecycle_service::next(&h.state, game.id).await.unwrap();

    // Graded but not yet reconciled on the second one.
    let second = h.answer(alice, questions[1].id, "right again").await;
    lifecycle_service::close_answers(&h.state, game.id).await.unwrap();
    host_service::grade_answer(&h.state, game.id, second, true).await.unwrap();

    let redone = lifecycle_service::redo(&h.state, game.id).await.unwrap();
    assert_eq!(redone.current_question, 1);
    assert_eq!(h.score(alice).await, 1);
    assert_eq!(h.store.answer_count(), 1, "only the redone question loses its answers");
}

#[tokio::test]
async fn redo_never_drops_a_score_below_zero() {
    let h = harness();
    let (game, questions) = h.game_with_questions(1).await;
    let alice = h.join(&game.code, "A").await;
    lifecycle_service::start(&h.state, game.id).await.unwrap();
    let answer = h.answer(alice, questions[0].id, "yes").await;
    lifecycle_service::close_answers(&h.state, game.id).await.unwrap();
    host_service::grade_answer(&h.state, game.id, answer, true).await.unwrap();
    lifecycle_service::finish_grading(&h.state, game.id).await.unwrap();

    let player = h.player(alice).await;
    h.state
        .repository()
        .await
        .unwrap()
        .set_player_score(&player, 0)
        .await
        .unwrap();

    lifecycle_service::redo(&h.state, game.id).await.unwrap();
    assert_eq!(h.score(alice).await, 0);
}

#[tokio::test]
async fn redo_is_rejected_in_lobby_and_finished() {
    let h = harness();
    let (game, _) = h.game_with_questions(1).await;
    assert!(matches!(
        lifecycle_service::redo(&h.state, game.id).await,
        Err(ServiceError::InvalidState(_))
    ));

    lifecycle_service::start(&h.state, game.id).await.unwrap();
    lifecycle_service::close_answers(&h.state, game.id).await.unwrap();
    lifecycle_service::finish_grading(&h.state, game.id).await.unwrap();
    lifecycle_service::next(&h.state, game.id).await.unwrap();
    assert!(matches!(
        lifecycle_service::redo(&h.state, game.id).await,
        Err(ServiceError::InvalidState(_))
    ));
}

#[tokio::test]
async fn reset_empties_the_game_but_keeps_its_identity() {
    let h = harness();
    let (game, questions) = h.game_with_questions(1).await;
    let alice = h.join(&game.code, "A").await;
    lifecycle_service::start(&h.state, game.id).await.unwrap();
    h.answer(alice, questions[0].id, "something").await;

    assert!(matches!(
        lifecycle_service::reset(&h.state, game.id).await,
        Err(ServiceError::InvalidState(_))
    ));

    lifecycle_service::close_answers(&h.state, game.id).await.unwrap();
    let answers = host_service::host_view(&h.state, game.id).await.unwrap().answers;
    host_service::grade_answer(&h.state, game.id, answers[0].answer.id, true)
        .await
        .unwrap();
    lifecycle_service::finish_grading(&h.state, game.id).await.unwrap();
    lifecycle_service::next(&h.state, game.id).await.unwrap();

    let reset = lifecycle_service::reset(&h.state, game.id).await.unwrap();
    assert_eq!(reset.status, GameStatus::Lobby);
    assert_eq!(reset.current_question, 0);
    assert_eq!(reset.code, game.code);

    let snapshot = public_service::snapshot(&h.state, game.id).await.unwrap();
    assert_eq!(snapshot.question_count, 0);
    assert!(snapshot.players.is_empty());
    assert_eq!(h.store.answer_count(), 0);

    assert!(
        host_service::authorize(&h.state, game.id, Some(HOST_PIN))
            .await
            .is_ok()
    );
    let again = public_service::find_by_code(&h.state, &game.code.to_lowercase())
        .await
        .unwrap();
    assert_eq!(again.id, game.id);
}

#[tokio::test]
async fn nuke_requires_confirmation_and_removes_everything() {
    let h = harness();
    let (game, questions) = h.game_with_questions(1).await;
    let alice = h.join(&game.code, "A").await;
    lifecycle_service::start(&h.state, game.id).await.unwrap();
    h.answer(alice, questions[0].id, "x").await;

    assert!(matches!(
        lifecycle_service::nuke(&h.state, game.id, false).await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(public_service::snapshot(&h.state, game.id).await.is_ok());

    lifecycle_service::nuke(&h.state, game.id, true).await.unwrap();

    assert!(matches!(
        public_service::find_by_code(&h.state, &game.code).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        public_service::snapshot(&h.state, game.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert_eq!(h.store.answer_count(), 0);
}
