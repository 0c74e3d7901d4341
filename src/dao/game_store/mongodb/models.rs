use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::CorruptDocument;
use crate::dao::models::{AnswerEntity, GameEntity, GameStatus, PlayerEntity, QuestionEntity};

pub const GAME_COLLECTION: &str = "games";
pub const QUESTION_COLLECTION: &str = "questions";
pub const PLAYER_COLLECTION: &str = "players";
pub const ANSWER_COLLECTION: &str = "answers";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    id: String,
    code: String,
    host_pin: String,
    status: GameStatus,
    current_question: i64,
    created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    id: String,
    game_id: String,
    text: String,
    correct_answer: Option<String>,
    order_num: i32,
    created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    id: String,
    game_id: String,
    name: String,
    score: i64,
    joined_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAnswerDocument {
    #[serde(rename = "_id")]
    id: String,
    player_id: String,
    question_id: String,
    answer_text: String,
    is_correct: Option<bool>,
    submitted_at: DateTime,
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

/// Stored representation of a status, matching its serde name.
pub fn status_value(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Lobby => "lobby",
        GameStatus::Active => "active",
        GameStatus::Grading => "grading",
        GameStatus::Revealing => "revealing",
        GameStatus::Finished => "finished",
    }
}

fn parse_id(collection: &'static str, raw: &str) -> Result<Uuid, CorruptDocument> {
    Uuid::parse_str(raw).map_err(|_| CorruptDocument {
        collection,
        id: raw.to_owned(),
    })
}

impl From<GameEntity> for MongoGameDocument {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id.to_string(),
            code: value.code,
            host_pin: value.host_pin,
            status: value.status,
            current_question: value.current_question as i64,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoGameDocument> for GameEntity {
    type Error = CorruptDocument;

    fn try_from(value: MongoGameDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(GAME_COLLECTION, &value.id)?,
            code: value.code,
            host_pin: value.host_pin,
            status: value.status,
            current_question: value.current_question.max(0) as usize,
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl From<QuestionEntity> for MongoQuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            game_id: value.game_id.to_string(),
            text: value.text,
            correct_answer: value.correct_answer,
            order_num: value.order_num,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoQuestionDocument> for QuestionEntity {
    type Error = CorruptDocument;

    fn try_from(value: MongoQuestionDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(QUESTION_COLLECTION, &value.id)?,
            game_id: parse_id(QUESTION_COLLECTION, &value.game_id)?,
            text: value.text,
            correct_answer: value.correct_answer,
            order_num: value.order_num,
            created_at: value.created_at.to_system_time(),
        })
    }
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id.to_string(),
            game_id: value.game_id.to_string(),
            name: value.name,
            score: i64::from(value.score),
            joined_at: DateTime::from_system_time(value.joined_at),
        }
    }
}

impl TryFrom<MongoPlayerDocument> for PlayerEntity {
    type Error = CorruptDocument;

    fn try_from(value: MongoPlayerDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(PLAYER_COLLECTION, &value.id)?,
            game_id: parse_id(PLAYER_COLLECTION, &value.game_id)?,
            name: value.name,
            score: u32::try_from(value.score.max(0)).unwrap_or(u32::MAX),
            joined_at: value.joined_at.to_system_time(),
        })
    }
}

impl From<AnswerEntity> for MongoAnswerDocument {
    fn from(value: AnswerEntity) -> Self {
        Self {
            id: value.id.to_string(),
            player_id: value.player_id.to_string(),
            question_id: value.question_id.to_string(),
            answer_text: value.answer_text,
            is_correct: value.is_correct,
            submitted_at: DateTime::from_system_time(value.submitted_at),
        }
    }
}

impl TryFrom<MongoAnswerDocument> for AnswerEntity {
    type Error = CorruptDocument;

    fn try_from(value: MongoAnswerDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(ANSWER_COLLECTION, &value.id)?,
            player_id: parse_id(ANSWER_COLLECTION, &value.player_id)?,
            question_id: parse_id(ANSWER_COLLECTION, &value.question_id)?,
            answer_text: value.answer_text,
            is_correct: value.is_correct,
            submitted_at: value.submitted_at.to_system_time(),
        })
    }
}
