use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A card as returned by the Wekan API. The summary form (list endpoint)
/// omits most fields, so everything past id/title is defaulted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub swimlane_id: Option<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CardField>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub end_at: Option<String>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Card {
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignees.iter().any(|a| a == user_id)
    }
}

/// One `(fieldId, rawValue)` pair on a card. The server enforces no type on
/// the value, so it stays an untyped scalar until a codec interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardField {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub value: Value,
}

/// A card comment. Older Wekan versions use `comment`/`userId`, newer ones
/// `text`/`authorId`; both spellings are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(rename = "authorId", default)]
    pub author_id: Option<String>,
}

impl Comment {
    pub fn author(&self) -> Option<&str> {
        self.author_id.as_deref().or(self.user_id.as_deref())
    }

    pub fn body(&self) -> &str {
        self.text
            .as_deref()
            .or(self.comment.as_deref())
            .unwrap_or("")
    }
}

/// Batch descriptor for the token-accumulation run. Serialized shape matches
/// the `CARDS_JSON` contract: `[{"id","boardId","listId","title"}]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRef {
    pub id: String,
    pub board_id: String,
    pub list_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardComment {
    pub id: String,
    pub author: String,
    pub text: String,
}

/// A card joined with its board/list/swimlane titles, custom fields mapped
/// by name, and chronological comments with resolved author names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub board: EntityRef,
    pub list: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swimlane: Option<EntityRef>,
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub custom_fields: serde_json::Map<String, Value>,
    pub comments: Vec<CardComment>,
}

impl DetailedCard {
    pub fn to_card_ref(&self) -> CardRef {
        CardRef {
            id: self.id.clone(),
            board_id: self.board.id.clone(),
            list_id: self.list.id.clone(),
            title: self.title.clone(),
        }
    }
}
