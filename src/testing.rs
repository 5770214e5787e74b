//! Shared in-memory `BoardApi` double for driver and locator tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::model::board::{Board, CustomFieldDef, List, Swimlane};
use crate::model::card::{Card, CardField, Comment};
use crate::wekan::BoardApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub card_id: String,
    pub from_list_id: String,
    pub to_list_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpdate {
    pub card_id: String,
    pub field_name: String,
    pub value: String,
}

pub struct MockBoard {
    boards: Vec<Board>,
    primary: String,
    lists: HashMap<String, Vec<List>>,
    /// (board_id, list_id) -> cards in that list.
    cards: HashMap<(String, String), Vec<Card>>,
    defs: HashMap<String, Vec<CustomFieldDef>>,
    comments: HashMap<String, Vec<Comment>>,
    fail_moves: bool,
    fail_comments: bool,
    pub moves: Mutex<Vec<MoveRecord>>,
    pub field_updates: Mutex<Vec<FieldUpdate>>,
}

impl MockBoard {
    pub fn new(board_id: &str) -> Self {
        Self {
            boards: vec![Board {
                id: board_id.to_string(),
                title: format!("Board {board_id}"),
            }],
            primary: board_id.to_string(),
            lists: HashMap::new(),
            cards: HashMap::new(),
            defs: HashMap::new(),
            comments: HashMap::new(),
            fail_moves: false,
            fail_comments: false,
            moves: Mutex::new(Vec::new()),
            field_updates: Mutex::new(Vec::new()),
        }
    }

    /// Add a further board (empty unless populated via the `*_on` methods).
    pub fn with_board(mut self, board_id: &str, title: &str) -> Self {
        self.boards.push(Board {
            id: board_id.to_string(),
            title: title.to_string(),
        });
        self
    }

    pub fn with_list(self, list_id: &str, title: &str) -> Self {
        let primary = self.primary.clone();
        self.with_list_on(&primary, list_id, title)
    }

    pub fn with_list_on(mut self, board_id: &str, list_id: &str, title: &str) -> Self {
        self.lists.entry(board_id.to_string()).or_default().push(List {
            id: list_id.to_string(),
            title: title.to_string(),
        });
        self
    }

    pub fn with_card(
        self,
        list_id: &str,
        card_id: &str,
        title: &str,
        assignees: &[&str],
        fields: &[(&str, Value)],
    ) -> Self {
        let primary = self.primary.clone();
        self.with_card_on(&primary, list_id, card_id, title, assignees, fields)
    }

    pub fn with_card_on(
        mut self,
        board_id: &str,
        list_id: &str,
        card_id: &str,
        title: &str,
        assignees: &[&str],
        fields: &[(&str, Value)],
    ) -> Self {
        let card = Card {
            id: card_id.to_string(),
            title: title.to_string(),
            description: None,
            list_id: Some(list_id.to_string()),
            swimlane_id: None,
            assignees: assignees.iter().map(|a| a.to_string()).collect(),
            custom_fields: fields
                .iter()
                .map(|(id, value)| CardField {
                    id: id.to_string(),
                    value: value.clone(),
                })
                .collect(),
            start_at: None,
            end_at: None,
            due_at: None,
            created_at: None,
        };
        self.cards
            .entry((board_id.to_string(), list_id.to_string()))
            .or_default()
            .push(card);
        self
    }

    pub fn with_field_def(self, def_id: &str, name: &str) -> Self {
        let primary = self.primary.clone();
        self.with_field_def_on(&primary, def_id, name)
    }

    pub fn with_field_def_on(mut self, board_id: &str, def_id: &str, name: &str) -> Self {
        self.defs
            .entry(board_id.to_string())
            .or_default()
            .push(CustomFieldDef {
                id: def_id.to_string(),
                name: name.to_string(),
                field_type: "text".to_string(),
            });
        self
    }

    pub fn with_comment(mut self, card_id: &str, comment_id: &str, author: &str, text: &str) -> Self {
        self.comments
            .entry(card_id.to_string())
            .or_default()
            .push(Comment {
                id: comment_id.to_string(),
                text: Some(text.to_string()),
                comment: None,
                user_id: None,
                author_id: Some(author.to_string()),
            });
        self
    }

    pub fn failing_moves(mut self) -> Self {
        self.fail_moves = true;
        self
    }

    pub fn failing_comments(mut self) -> Self {
        self.fail_comments = true;
        self
    }
}

#[async_trait]
impl BoardApi for MockBoard {
    async fn boards(&self, _user_id: &str) -> Result<Vec<Board>> {
        Ok(self.boards.clone())
    }

    async fn lists(&self, board_id: &str) -> Result<Vec<List>> {
        Ok(self.lists.get(board_id).cloned().unwrap_or_default())
    }

    async fn swimlanes(&self, _board_id: &str) -> Result<Vec<Swimlane>> {
        Ok(Vec::new())
    }

    async fn cards(&self, board_id: &str, list_id: &str) -> Result<Vec<Card>> {
        Ok(self
            .cards
            .get(&(board_id.to_string(), list_id.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn card(&self, board_id: &str, list_id: &str, card_id: &str) -> Result<Card> {
        self.cards
            .get(&(board_id.to_string(), list_id.to_string()))
            .and_then(|cards| cards.iter().find(|c| c.id == card_id))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("GET card {card_id} in list {list_id} -> 404"))
    }

    async fn custom_fields(&self, board_id: &str) -> Result<Vec<CustomFieldDef>> {
        Ok(self.defs.get(board_id).cloned().unwrap_or_default())
    }

    async fn comments(&self, _board_id: &str, card_id: &str) -> Result<Vec<Comment>> {
        if self.fail_comments {
            anyhow::bail!("GET comments for card {card_id} -> 500");
        }
        Ok(self.comments.get(card_id).cloned().unwrap_or_default())
    }

    async fn move_card(
        &self,
        board_id: &str,
        from_list_id: &str,
        card_id: &str,
        to_list_id: &str,
    ) -> Result<Card> {
        if self.fail_moves {
            anyhow::bail!("PUT card {card_id} -> 500");
        }
        let mut card = self.card(board_id, from_list_id, card_id).await?;
        card.list_id = Some(to_list_id.to_string());
        self.moves.lock().unwrap().push(MoveRecord {
            card_id: card_id.to_string(),
            from_list_id: from_list_id.to_string(),
            to_list_id: to_list_id.to_string(),
        });
        Ok(card)
    }

    async fn update_card_field(
        &self,
        board_id: &str,
        _list_id: &str,
        card_id: &str,
        field_name: &str,
        value: &str,
    ) -> Result<()> {
        let defs = self.custom_fields(board_id).await?;
        if crate::fields::find_field(&defs, field_name).is_none() {
            anyhow::bail!("custom field not found: {field_name}");
        }
        self.field_updates.lock().unwrap().push(FieldUpdate {
            card_id: card_id.to_string(),
            field_name: field_name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    async fn username(&self, user_id: &str) -> String {
        format!("user-{user_id}")
    }
}
