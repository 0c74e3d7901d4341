use std::{collections::HashMap, sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::{DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{
    connection::{MongoConfig, establish_connection},
    error::{MongoDaoError, MongoResult},
    models::{
        ANSWER_COLLECTION, GAME_COLLECTION, MongoAnswerDocument, MongoGameDocument,
        MongoPlayerDocument, MongoQuestionDocument, PLAYER_COLLECTION, QUESTION_COLLECTION,
        doc_id, status_value,
    },
};
use crate::dao::{
    game_store::GameStore,
    models::{
        AnswerEntity, AnswerWithPlayerEntity, GameEntity, GameStatus, PlayerEntity, QuestionEntity,
    },
    storage::StorageResult,
};

/// [`GameStore`] backed by one MongoDB collection per record kind.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_client, database) = establish_connection(&self.config).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_client, database) = establish_connection(&config).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
        };
        store.ensure_indexes().await?;
        info!(database = %store.inner.config.database_name(), "MongoDB store ready");
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let specs: [(&'static str, &'static str, mongodb::bson::Document); 4] = [
            (GAME_COLLECTION, "code", doc! {"code": 1}),
            (QUESTION_COLLECTION, "game_id", doc! {"game_id": 1, "order_num": 1}),
            (PLAYER_COLLECTION, "game_id", doc! {"game_id": 1}),
            (
                ANSWER_COLLECTION,
                "player_id,question_id",
                doc! {"player_id": 1, "question_id": 1},
            ),
        ];

        let database = self.database().await;
        for (collection, index, keys) in specs {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_{index}_idx")))
                        .build(),
                )
                .build();
            database
                .collection::<mongodb::bson::Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        self.inner.database.read().await.clone()
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        self.database().await.collection(GAME_COLLECTION)
    }

    async fn questions(&self) -> Collection<MongoQuestionDocument> {
        self.database().await.collection(QUESTION_COLLECTION)
    }

    async fn players(&self) -> Collection<MongoPlayerDocument> {
        self.database().await.collection(PLAYER_COLLECTION)
    }

    async fn answers(&self) -> Collection<MongoAnswerDocument> {
        self.database().await.collection(ANSWER_COLLECTION)
    }

    async fn insert_game(&self, game: GameEntity) -> MongoResult<()> {
        let document: MongoGameDocument = game.into();
        self.games()
            .await
            .insert_one(document)
            .await
            .map_err(MongoDaoError::query(GAME_COLLECTION, "insert game"))?;
        Ok(())
    }

    async fn find_game_by(&self, filter: mongodb::bson::Document) -> MongoResult<Option<GameEntity>> {
        let document = self
            .games()
            .await
            .find_one(filter)
            .await
            .map_err(MongoDaoError::query(GAME_COLLECTION, "load game"))?;
        Ok(document.map(GameEntity::try_from).transpose()?)
    }

    async fn update_game_position(
        &self,
        id: Uuid,
        status: GameStatus,
        current_question: usize,
    ) -> MongoResult<bool> {
        let result = self
            .games()
            .await
            .update_one(
                doc_id(id),
                doc! {"$set": {
                    "status": status_value(status),
                    "current_question": current_question as i64,
                }},
            )
            .await
            .map_err(MongoDaoError::query(GAME_COLLECTION, "update game status"))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_game(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .games()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(MongoDaoError::query(GAME_COLLECTION, "delete game"))?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_question(&self, question: QuestionEntity) -> MongoResult<()> {
        let document: MongoQuestionDocument = question.into();
        self.questions()
            .await
            .insert_one(document)
            .await
            .map_err(MongoDaoError::query(QUESTION_COLLECTION, "insert question"))?;
        Ok(())
    }

    async fn list_questions(&self, game_id: Uuid) -> MongoResult<Vec<QuestionEntity>> {
        let documents: Vec<MongoQuestionDocument> = self
            .questions()
            .await
            .find(doc! {"game_id": game_id.to_string()})
            .sort(doc! {"order_num": 1, "created_at": 1})
            .await
            .map_err(MongoDaoError::query(QUESTION_COLLECTION, "list questions"))?
            .try_collect()
            .await
            .map_err(MongoDaoError::query(QUESTION_COLLECTION, "list questions"))?;

        Ok(documents
            .into_iter()
            .map(QuestionEntity::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn delete_questions(&self, filter: mongodb::bson::Document) -> MongoResult<u64> {
        let result = self
            .questions()
            .await
            .delete_many(filter)
            .await
            .map_err(MongoDaoError::query(QUESTION_COLLECTION, "delete questions"))?;
        Ok(result.deleted_count)
    }

    async fn insert_player(&self, player: PlayerEntity) -> MongoResult<()> {
        let document: MongoPlayerDocument = player.into();
        self.players()
            .await
            .insert_one(document)
            .await
            .map_err(MongoDaoError::query(PLAYER_COLLECTION, "insert player"))?;
        Ok(())
    }

    async fn find_players(
        &self,
        filter: mongodb::bson::Document,
    ) -> MongoResult<Vec<PlayerEntity>> {
        let documents: Vec<MongoPlayerDocument> = self
            .players()
            .await
            .find(filter)
            .sort(doc! {"score": -1, "joined_at": 1})
            .await
            .map_err(MongoDaoError::query(PLAYER_COLLECTION, "list players"))?
            .try_collect()
            .await
            .map_err(MongoDaoError::query(PLAYER_COLLECTION, "list players"))?;

        Ok(documents
            .into_iter()
            .map(PlayerEntity::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn update_player_score(&self, id: Uuid, score: u32) -> MongoResult<bool> {
        let result = self
            .players()
            .await
            .update_one(doc_id(id), doc! {"$set": {"score": i64::from(score)}})
            .await
            .map_err(MongoDaoError::query(PLAYER_COLLECTION, "update player score"))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_players_for_game(&self, game_id: Uuid) -> MongoResult<u64> {
        let result = self
            .players()
            .await
            .delete_many(doc! {"game_id": game_id.to_string()})
            .await
            .map_err(MongoDaoError::query(PLAYER_COLLECTION, "delete players"))?;
        Ok(result.deleted_count)
    }

    async fn insert_answer(&self, answer: AnswerEntity) -> MongoResult<()> {
        let document: MongoAnswerDocument = answer.into();
        self.answers()
            .await
            .insert_one(document)
            .await
            .map_err(MongoDaoError::query(ANSWER_COLLECTION, "insert answer"))?;
        Ok(())
    }

    async fn find_answers(
        &self,
        filter: mongodb::bson::Document,
    ) -> MongoResult<Vec<AnswerEntity>> {
        let documents: Vec<MongoAnswerDocument> = self
            .answers()
            .await
            .find(filter)
            .sort(doc! {"submitted_at": 1})
            .await
            .map_err(MongoDaoError::query(ANSWER_COLLECTION, "list answers"))?
            .try_collect()
            .await
            .map_err(MongoDaoError::query(ANSWER_COLLECTION, "list answers"))?;

        Ok(documents
            .into_iter()
            .map(AnswerEntity::try_from)
            .collect::<Result<_, _>>()?)
    }

    async fn update_answer(&self, id: Uuid, update: mongodb::bson::Document) -> MongoResult<bool> {
        let result = self
            .answers()
            .await
            .update_one(doc_id(id), doc! {"$set": update})
            .await
            .map_err(MongoDaoError::query(ANSWER_COLLECTION, "update answer"))?;
        Ok(result.matched_count > 0)
    }

    async fn list_answers_with_players(
        &self,
        question_id: Uuid,
    ) -> MongoResult<Vec<AnswerWithPlayerEntity>> {
        let answers = self
            .find_answers(doc! {"question_id": question_id.to_string()})
            .await?;
        if answers.is_empty() {
            return Ok(Vec::new());
        }

        let author_ids: Vec<String> = answers.iter().map(|a| a.player_id.to_string()).collect();
        let authors: HashMap<Uuid, PlayerEntity> = self
            .find_players(doc! {"_id": {"$in": author_ids}})
            .await?
            .into_iter()
            .map(|player| (player.id, player))
            .collect();

        Ok(answers
            .into_iter()
            .filter_map(|answer| {
                let player = authors.get(&answer.player_id)?.clone();
                Some(AnswerWithPlayerEntity { answer, player })
            })
            .collect())
    }

    async fn delete_answers(&self, filter: mongodb::bson::Document) -> MongoResult<u64> {
        let result = self
            .answers()
            .await
            .delete_many(filter)
            .await
            .map_err(MongoDaoError::query(ANSWER_COLLECTION, "delete answers"))?;
        Ok(result.deleted_count)
    }
}

impl GameStore for MongoGameStore {
    fn insert_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game_by(doc_id(id)).await.map_err(Into::into) })
    }

    fn find_game_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_game_by(doc! {"code": code})
                .await
                .map_err(Into::into)
        })
    }

    fn update_game_position(
        &self,
        id: Uuid,
        status: GameStatus,
        current_question: usize,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_game_position(id, status, current_question)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(id).await.map_err(Into::into) })
    }

    fn insert_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_question(question).await.map_err(Into::into) })
    }

    fn list_questions(
        &self,
        game_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_questions(game_id).await.map_err(Into::into) })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let deleted = store.delete_questions(doc_id(id)).await?;
            Ok(deleted > 0)
        })
    }

    fn delete_questions_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_questions(doc! {"game_id": game_id.to_string()})
                .await
                .map_err(Into::into)
        })
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_player(player).await.map_err(Into::into) })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let players = store.find_players(doc_id(id)).await?;
            Ok(players.into_iter().next())
        })
    }

    fn list_players(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_players(doc! {"game_id": game_id.to_string()})
                .await
                .map_err(Into::into)
        })
    }

    fn update_player_score(&self, id: Uuid, score: u32) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.update_player_score(id, score).await.map_err(Into::into) })
    }

    fn delete_players_for_game(&self, game_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_players_for_game(game_id)
                .await
                .map_err(Into::into)
        })
    }

    fn insert_answer(&self, answer: AnswerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_answer(answer).await.map_err(Into::into) })
    }

    fn find_answer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let answers = store.find_answers(doc_id(id)).await?;
            Ok(answers.into_iter().next())
        })
    }

    fn find_player_answer(
        &self,
        player_id: Uuid,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let answers = store
                .find_answers(doc! {
                    "player_id": player_id.to_string(),
                    "question_id": question_id.to_string(),
                })
                .await?;
            Ok(answers.into_iter().next())
        })
    }

    fn update_answer_text(
        &self,
        id: Uuid,
        answer_text: String,
        submitted_at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_answer(
                    id,
                    doc! {
                        "answer_text": answer_text,
                        "submitted_at": DateTime::from_system_time(submitted_at),
                    },
                )
                .await
                .map_err(Into::into)
        })
    }

    fn update_answer_grade(
        &self,
        id: Uuid,
        is_correct: bool,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_answer(id, doc! {"is_correct": is_correct})
                .await
                .map_err(Into::into)
        })
    }

    fn list_answers_with_players(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerWithPlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_answers_with_players(question_id)
                .await
                .map_err(Into::into)
        })
    }

    fn list_correct_answers(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_answers(doc! {"question_id": question_id.to_string(), "is_correct": true})
                .await
                .map_err(Into::into)
        })
    }

    fn delete_answers_for_question(
        &self,
        question_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_answers(doc! {"question_id": question_id.to_string()})
                .await
                .map_err(Into::into)
        })
    }

    fn delete_answers_for_players(
        &self,
        player_ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let ids: Vec<String> = player_ids.iter().map(Uuid::to_string).collect();
            store
                .delete_answers(doc! {"player_id": {"$in": ids}})
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
