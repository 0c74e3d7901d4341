//! In-process store used when no database is configured and by the test suites.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::SystemTime,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{
        AnswerEntity, AnswerWithPlayerEntity, GameEntity, GameStatus, PlayerEntity, QuestionEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Failures raised by [`MemoryStore`].
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    /// The store was switched offline with [`MemoryStore::set_online`].
    #[error("memory store is offline")]
    Offline,
}

impl From<MemoryStoreError> for StorageError {
    fn from(err: MemoryStoreError) -> Self {
        StorageError::unavailable("memory", err)
    }
}

#[derive(Debug, Clone)]
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Default)]
struct MemoryInner {
    online: AtomicBool,
    seq: AtomicU64,
    games: DashMap<Uuid, Row<GameEntity>>,
    questions: DashMap<Uuid, Row<QuestionEntity>>,
    players: DashMap<Uuid, Row<PlayerEntity>>,
    answers: DashMap<Uuid, Row<AnswerEntity>>,
}

/// DashMap-backed [`GameStore`] keeping every table in memory.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store that accepts requests.
    pub fn new() -> Self {
        let inner = MemoryInner::default();
        inner.online.store(true, Ordering::SeqCst);
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Toggle availability; while offline every call fails like a lost connection.
    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::SeqCst);
    }

    /// Number of answer rows across all games.
    pub fn answer_count(&self) -> usize {
        self.inner.answers.len()
    }

    fn run<T, F>(&self, op: F) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&MemoryInner) -> T + Send + 'static,
    {
        let inner = self.inner.clone();
        Box::pin(async move {
            if !inner.online.load(Ordering::SeqCst) {
                return Err(MemoryStoreError::Offline.into());
            }
            Ok(op(&inner))
        })
    }
}

impl MemoryInner {
    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    fn row<T>(&self, value: T) -> Row<T> {
        Row {
            seq: self.next_seq(),
            value,
        }
    }
}

/// Drop every row matching `matches` and return how many were dropped.
///
/// The count comes from `retain` itself, so concurrent inserts cannot skew it.
fn remove_where<T>(table: &DashMap<Uuid, Row<T>>, mut matches: impl FnMut(&T) -> bool) -> u64 {
    let mut removed = 0;
    table.retain(|_, row| {
        let drop_row = matches(&row.value);
        if drop_row {
            removed += 1;
        }
        !drop_row
    });
    removed
}

impl GameStore for MemoryStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |inner| {
            let row = inner.row(game);
            inner.games.insert(row.value.id, row);
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        self.run(move |inner| inner.games.get(&id).map(|row| row.value.clone()))
    }

    fn find_game_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        self.run(move |inner| {
            inner
                .games
                .iter()
                .filter(|row| row.value.code == code)
                .min_by_key(|row| row.seq)
                .map(|row| row.value.clone())
        })
    }

    fn update_game_position(
        &self,
        id: Uuid,
        status: GameStatus,
        current_question: usize,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |inner| match inner.games.get_mut(&id) {
            Some(mut row) => {
                row.value.status = status;
                row.value.current_question = current_question;
                true
            }
            None => false,
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |inner| inner.games.remove(&id).is_some())
    }

    fn insert_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |inner| {
            let row = inner.row(question);
            inner.questions.insert(row.value.id, row);
        })
    }

    fn list_questions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        self.run(move |inner| {
            let mut rows: Vec<Row<QuestionEntity>> = inner
                .questions
                .iter()
                .filter(|row| row.value.game_id == game_id)
                .map(|row| row.clone())
                .collect();
            rows.sort_by_key(|row| (row.value.order_num, row.seq));
            rows.into_iter().map(|row| row.value).collect()
        })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |inner| inner.questions.remove(&id).is_some())
    }

    fn delete_questions_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.run(move |inner| {
            remove_where(&inner.questions, |question| question.game_id == game_id)
        })
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |inner| {
            let row = inner.row(player);
            inner.players.insert(row.value.id, row);
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        self.run(move |inner| inner.players.get(&id).map(|row| row.value.clone()))
    }

    fn list_players(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        self.run(move |inner| {
            let mut rows: Vec<Row<PlayerEntity>> = inner
                .players
                .iter()
                .filter(|row| row.value.game_id == game_id)
                .map(|row| row.clone())
                .collect();
            rows.sort_by(|a, b| {
                b.value
                    .score
                    .cmp(&a.value.score)
                    .then(a.value.joined_at.cmp(&b.value.joined_at))
                    .then(a.seq.cmp(&b.seq))
            });
            rows.into_iter().map(|row| row.value).collect()
        })
    }

    fn update_player_score(&self, id: Uuid, score: u32) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |inner| match inner.players.get_mut(&id) {
            Some(mut row) => {
                row.value.score = score;
                true
            }
            None => false,
        })
    }

    fn delete_players_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.run(move |inner| {
            remove_where(&inner.players, |player| player.game_id == game_id)
        })
    }

    fn insert_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.run(move |inner| {
            let row = inner.row(answer);
            inner.answers.insert(row.value.id, row);
        })
    }

    fn find_answer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        self.run(move |inner| inner.answers.get(&id).map(|row| row.value.clone()))
    }

    fn find_player_answer(
        &self,
        player_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        self.run(move |inner| {
            inner
                .answers
                .iter()
                .filter(|row| row.value.player_id == player_id && row.value.question_id == question_id)
                .min_by_key(|row| row.seq)
                .map(|row| row.value.clone())
        })
    }

    fn update_answer_text(
        &self,
        id: Uuid,
        answer_text: String,
        submitted_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |inner| match inner.answers.get_mut(&id) {
            Some(mut row) => {
                row.value.answer_text = answer_text;
                row.value.submitted_at = submitted_at;
                true
            }
            None => false,
        })
    }

    fn update_answer_grade(
        &self,
        id: Uuid,
        is_correct: bool,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        self.run(move |inner| match inner.answers.get_mut(&id) {
            Some(mut row) => {
                row.value.is_correct = Some(is_correct);
                true
            }
            None => false,
        })
    }

    fn list_answers_with_players(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerWithPlayerEntity>>> {
        self.run(move |inner| {
            let mut rows: Vec<Row<AnswerEntity>> = inner
                .answers
                .iter()
                .filter(|row| row.value.question_id == question_id)
                .map(|row| row.clone())
                .collect();
            rows.sort_by_key(|row| (row.value.submitted_at, row.seq));
            rows.into_iter()
                .filter_map(|row| {
                    let player = inner.players.get(&row.value.player_id)?.value.clone();
                    Some(AnswerWithPlayerEntity {
                        answer: row.value,
                        player,
                    })
                })
                .collect()
        })
    }

    fn list_correct_answers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        self.run(move |inner| {
            let mut rows: Vec<Row<AnswerEntity>> = inner
                .answers
                .iter()
                .filter(|row| {
                    row.value.question_id == question_id && row.value.is_correct == Some(true)
                })
                .map(|row| row.clone())
                .collect();
            rows.sort_by_key(|row| row.seq);
            rows.into_iter().map(|row| row.value).collect()
        })
    }

    fn delete_answers_for_question(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        self.run(move |inner| {
            remove_where(&inner.answers, |answer| answer.question_id == question_id)
        })
    }

    fn delete_answers_for_players(
        &self,
        player_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        self.run(move |inner| {
            remove_where(&inner.answers, |answer| player_ids.contains(&answer.player_id))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.run(|_| ())
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.run(|_| ())
    }
}
