use std::{sync::Arc, time::SystemTime};

use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        game_store::GameStore,
        models::{
            AnswerEntity, AnswerWithPlayerEntity, GameEntity, GameStatus, PlayerEntity,
            QuestionEntity,
        },
        storage::StorageResult,
    },
    state::changes::{ChangeFeed, ChangeKind, RowChange, Table},
};

/// Typed access layer over a [`GameStore`].
///
/// Every successful write publishes a [`RowChange`] on the shared feed so
/// watchers can refresh; reads are passed through untouched.
#[derive(Clone)]
pub struct TriviaRepository {
    store: Arc<dyn GameStore>,
    changes: Arc<ChangeFeed>,
}

impl TriviaRepository {
    pub fn new(store: Arc<dyn GameStore>, changes: Arc<ChangeFeed>) -> Self {
        Self { store, changes }
    }

    fn notify(&self, change: RowChange) {
        debug!(?change, "publishing row change");
        self.changes.publish(change);
    }

    pub async fn create_game(&self, game: GameEntity) -> StorageResult<GameEntity> {
        self.store.insert_game(game.clone()).await?;
        self.notify(RowChange::new(Table::Games, ChangeKind::Insert, game.id));
        Ok(game)
    }

    pub async fn find_game(&self, id: Uuid) -> StorageResult<Option<GameEntity>> {
        self.store.find_game(id).await
    }

    /// Resolve a game by join code. The caller normalises the code first.
    pub async fn find_game_by_code(&self, code: &str) -> StorageResult<Option<GameEntity>> {
        self.store.find_game_by_code(code.to_owned()).await
    }

    /// Write the lifecycle position of a game; `false` when the game is gone.
    pub async fn set_game_position(
        &self,
        id: Uuid,
        status: GameStatus,
        current_question: usize,
    ) -> StorageResult<bool> {
        let updated = self
            .store
            .update_game_position(id, status, current_question)
            .await?;
        if updated {
            self.notify(RowChange::new(Table::Games, ChangeKind::Update, id));
        }
        Ok(updated)
    }

    pub async fn delete_game(&self, id: Uuid) -> StorageResult<bool> {
        let deleted = self.store.delete_game(id).await?;
        if deleted {
            self.notify(RowChange::new(Table::Games, ChangeKind::Delete, id));
        }
        Ok(deleted)
    }

    pub async fn create_question(&self, question: QuestionEntity) -> StorageResult<QuestionEntity> {
        self.store.insert_question(question.clone()).await?;
        self.notify(RowChange::new(
            Table::Questions,
            ChangeKind::Insert,
            question.game_id,
        ));
        Ok(question)
    }

    pub async fn list_questions(&self, game_id: Uuid) -> StorageResult<Vec<QuestionEntity>> {
        self.store.list_questions(game_id).await
    }

    pub async fn delete_question(&self, game_id: Uuid, id: Uuid) -> StorageResult<bool> {
        let deleted = self.store.delete_question(id).await?;
        if deleted {
            self.notify(RowChange::new(Table::Questions, ChangeKind::Delete, game_id));
        }
        Ok(deleted)
    }

    pub async fn delete_questions_for_game(&self, game_id: Uuid) -> StorageResult<u64> {
        let removed = self.store.delete_questions_for_game(game_id).await?;
        if removed > 0 {
            self.notify(RowChange::new(Table::Questions, ChangeKind::Delete, game_id));
        }
        Ok(removed)
    }

    pub async fn create_player(&self, player: PlayerEntity) -> StorageResult<PlayerEntity> {
        self.store.insert_player(player.clone()).await?;
        self.notify(RowChange::new(
            Table::Players,
            ChangeKind::Insert,
            player.game_id,
        ));
        Ok(player)
    }

    pub async fn find_player(&self, id: Uuid) -> StorageResult<Option<PlayerEntity>> {
        self.store.find_player(id).await
    }

    /// Players of a game, best score first.
    pub async fn list_players(&self, game_id: Uuid) -> StorageResult<Vec<PlayerEntity>> {
        self.store.list_players(game_id).await
    }

    pub async fn set_player_score(&self, player: &PlayerEntity, score: u32) -> StorageResult<bool> {
        let updated = self.store.update_player_score(player.id, score).await?;
        if updated {
            self.notify(RowChange::new(
                Table::Players,
                ChangeKind::Update,
                player.game_id,
            ));
        }
        Ok(updated)
    }

    pub async fn delete_players_for_game(&self, game_id: Uuid) -> StorageResult<u64> {
        let removed = self.store.delete_players_for_game(game_id).await?;
        if removed > 0 {
            self.notify(RowChange::new(Table::Players, ChangeKind::Delete, game_id));
        }
        Ok(removed)
    }

    pub async fn find_answer(&self, id: Uuid) -> StorageResult<Option<AnswerEntity>> {
        self.store.find_answer(id).await
    }

    pub async fn find_player_answer(
        &self,
        player_id: Uuid,
        question_id: Uuid,
    ) -> StorageResult<Option<AnswerEntity>> {
        self.store.find_player_answer(player_id, question_id).await
    }

    /// Insert or overwrite the answer of `player` to `question_id`.
    ///
    /// An existing answer keeps its id and its grade; only the text and the
    /// submission time change.
    pub async fn upsert_answer(
        &self,
        player: &PlayerEntity,
        question_id: Uuid,
        answer_text: String,
    ) -> StorageResult<AnswerEntity> {
        let now = SystemTime::now();
        let existing = self
            .store
            .find_player_answer(player.id, question_id)
            .await?;

        let (answer, kind) = match existing {
            Some(mut answer) => {
                let updated = self
                    .store
                    .update_answer_text(answer.id, answer_text.clone(), now)
                    .await?;
                answer.answer_text = answer_text;
                answer.submitted_at = now;
                if updated {
                    (answer, ChangeKind::Update)
                } else {
                    // Row vanished between the read and the write; store it again.
                    self.store.insert_answer(answer.clone()).await?;
                    (answer, ChangeKind::Insert)
                }
            }
            None => {
                let answer = AnswerEntity {
                    id: Uuid::new_v4(),
                    player_id: player.id,
                    question_id,
                    answer_text,
                    is_correct: None,
                    submitted_at: now,
                };
                self.store.insert_answer(answer.clone()).await?;
                (answer, ChangeKind::Insert)
            }
        };

        self.notify(RowChange::new(Table::Answers, kind, player.game_id).for_question(question_id));
        Ok(answer)
    }

    pub async fn grade_answer(
        &self,
        game_id: Uuid,
        answer: &AnswerEntity,
        is_correct: bool,
    ) -> StorageResult<bool> {
        let updated = self.store.update_answer_grade(answer.id, is_correct).await?;
        if updated {
            self.notify(
                RowChange::new(Table::Answers, ChangeKind::Update, game_id)
                    .for_question(answer.question_id),
            );
        }
        Ok(updated)
    }

    /// Answers to a question joined with their authors.
    pub async fn list_answers_with_players(
        &self,
        question_id: Uuid,
    ) -> StorageResult<Vec<AnswerWithPlayerEntity>> {
        self.store.list_answers_with_players(question_id).await
    }

    pub async fn list_correct_answers(&self, question_id: Uuid) -> StorageResult<Vec<AnswerEntity>> {
        self.store.list_correct_answers(question_id).await
    }

    pub async fn delete_answers_for_question(
        &self,
        game_id: Uuid,
        question_id: Uuid,
    ) -> StorageResult<u64> {
        let removed = self.store.delete_answers_for_question(question_id).await?;
        if removed > 0 {
            self.notify(
                RowChange::new(Table::Answers, ChangeKind::Delete, game_id)
                    .for_question(question_id),
            );
        }
        Ok(removed)
    }

    pub async fn delete_answers_for_players(
        &self,
        game_id: Uuid,
        player_ids: Vec<Uuid>,
    ) -> StorageResult<u64> {
        if player_ids.is_empty() {
            return Ok(0);
        }
        let removed = self.store.delete_answers_for_players(player_ids).await?;
        if removed > 0 {
            self.notify(RowChange::new(Table::Answers, ChangeKind::Delete, game_id));
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::game_store::memory::MemoryStore;

    fn repository() -> (TriviaRepository, Arc<ChangeFeed>) {
        let changes = Arc::new(ChangeFeed::new(16));
        let store: Arc<dyn GameStore> = Arc::new(MemoryStore::new());
        (TriviaRepository::new(store, changes.clone()), changes)
    }

    fn player(game_id: Uuid) -> PlayerEntity {
        PlayerEntity {
            id: Uuid::new_v4(),
            game_id,
            name: "Ada".into(),
            score: 0,
            joined_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn upsert_keeps_a_single_answer_and_its_grade() {
        let (repository, _) = repository();
        let game_id = Uuid::new_v4();
        let player = repository.create_player(player(game_id)).await.unwrap();
        let question_id = Uuid::new_v4();

        let first = repository
            .upsert_answer(&player, question_id, "Paris".into())
            .await
            .unwrap();
        repository.grade_answer(game_id, &first, true).await.unwrap();
        let second = repository
            .upsert_answer(&player, question_id, "Lyon".into())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let stored = repository
            .find_player_answer(player.id, question_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.answer_text, "Lyon");
        assert_eq!(stored.is_correct, Some(true));
    }

    #[tokio::test]
    async fn writes_publish_row_changes() {
        let (repository, changes) = repository();
        let game_id = Uuid::new_v4();
        let mut rx = changes.subscribe(game_id);

        let player = repository.create_player(player(game_id)).await.unwrap();
        repository
            .upsert_answer(&player, Uuid::new_v4(), "42".into())
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().table, Table::Players);
        let answer_change = rx.recv().await.unwrap();
        assert_eq!(answer_change.table, Table::Answers);
        assert_eq!(answer_change.kind, ChangeKind::Insert);
        assert!(answer_change.question_id.is_some());
    }

    #[tokio::test]
    async fn noop_deletes_stay_silent() {
        let (repository, changes) = repository();
        let game_id = Uuid::new_v4();
        let mut rx = changes.subscribe(game_id);

        assert_eq!(repository.delete_players_for_game(game_id).await.unwrap(), 0);
        assert_eq!(
            repository
                .delete_answers_for_players(game_id, Vec::new())
                .await
                .unwrap(),
            0
        );
        assert!(rx.try_recv().is_err());
    }
}
