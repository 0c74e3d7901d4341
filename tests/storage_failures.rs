mod common;

use trivia_night_back::{
    dao::{game_store::GameStore, models::GameStatus},
    error::ServiceError,
    services::{host_service, lifecycle_service, public_service, scoring},
};

use common::{harness, scripted::Op};

#[tokio::test]
async fn backend_failure_propagates_without_a_status_change() {
    let h = harness();
    let (game, _) = h.game_with_questions(1).await;

    h.store.set_online(false);
    let err = lifecycle_service::start(&h.state, game.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));

    h.store.set_online(true);
    let snapshot = public_service::snapshot(&h.state, game.id).await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::Lobby);
}

#[tokio::test]
async fn degraded_mode_refuses_commands() {
    let h = harness();
    let (game, _) = h.game_with_questions(1).await;

    h.state.update_degraded(true).await;
    assert!(matches!(
        lifecycle_service::start(&h.state, game.id).await,
        Err(ServiceError::Degraded)
    ));
    assert!(matches!(
        public_service::snapshot(&h.state, game.id).await,
        Err(ServiceError::Degraded)
    ));
}

#[tokio::test]
async fn failed_status_write_after_awarding_propagates_and_keeps_grading() {
    let h = harness();
    let (game, questions) = h.game_with_questions(2).await;
    let alice = h.join(&game.code, "A").await;

    lifecycle_service::start(&h.state, game.id).await.unwrap();
    let answer = h.answer(alice, questions[0].id, "Paris").await;
    lifecycle_service::close_answers(&h.state, game.id).await.unwrap();
    host_service::grade_answer(&h.state, game.id, answer, true).await.unwrap();

    h.script.fail(Op::UpdateGamePosition);
    let err = lifecycle_service::finish_grading(&h.state, game.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));
    h.script.heal();

    let snapshot = public_service::snapshot(&h.state, game.id).await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::Grading);
    assert_eq!(h.score(alice).await, 1, "points written before the failure stay");
}

#[tokio::test]
async fn failed_answer_deletion_during_redo_propagates_and_keeps_revealing() {
    let h = harness();
    let (game, questions) = h.game_with_questions(1).await;
    let alice = h.join(&game.code, "A").await;

    lifecycle_service::start(&h.state, game.id).await.unwrap();
    let answer = h.answer(alice, questions[0].id, "Paris").await;
    lifecycle_service::close_answers(&h.state, game.id).await.unwrap();
    host_service::grade_answer(&h.state, game.id, answer, true).await.unwrap();
    lifecycle_service::finish_grading(&h.state, game.id).await.unwrap();
    assert_eq!(h.score(alice).await, 1);

    h.script.fail(Op::DeleteAnswersForQuestion);
    let err = lifecycle_service::redo(&h.state, game.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));
    h.script.heal();

    let snapshot = public_service::snapshot(&h.state, game.id).await.unwrap();
    assert_eq!(snapshot.game.status, GameStatus::Revealing);
    assert_eq!(h.score(alice).await, 0, "scores were reverted before the failure");
    assert_eq!(h.store.answer_count(), 1);
    assert_eq!(h.script.calls(Op::UpdateGamePosition), 3);
}

#[tokio::test]
async fn concurrent_reconciliation_passes_can_lose_an_update() {
    let h = harness();
    let (game, questions) = h.game_with_questions(2).await;
    let alice = h.join(&game.code, "A").await;

    for question in &questions {
        let answer = h.answer(alice, question.id, "right").await;
        assert!(h.store.update_answer_grade(answer, true).await.unwrap());
    }

    let repository = h.state.repository().await.unwrap();
    h.script.reset_calls();
    h.script.gate_player_reads(2);
    let (first, second) = tokio::join!(
        scoring::award(&repository, questions[0].id),
        scoring::award(&repository, questions[1].id),
    );
    h.script.open_player_reads();

    assert_eq!(first.unwrap(), 1);
    assert_eq!(second.unwrap(), 1);
    assert_eq!(h.script.calls(Op::FindPlayer), 2, "one read per player per pass");
    assert_eq!(h.script.calls(Op::UpdatePlayerScore), 2, "one write per player per pass");
    assert_eq!(h.score(alice).await, 1, "both passes read 0, so one point is lost");
}
