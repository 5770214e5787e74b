use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::fields;
use crate::model::board::{Board, CustomFieldDef, List, Swimlane};
use crate::model::card::{Card, CardField, Comment};

#[derive(Debug, thiserror::Error)]
pub enum WekanError {
    #[error("no authentication method provided; set WEKAN_API_TOKEN or WEKAN_USERNAME + WEKAN_PASSWORD")]
    NoAuth,
    #[error("login failed -> {0}")]
    Login(u16),
    #[error("{method} {path} -> {status}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Default)]
pub struct WekanOpts {
    pub base_url: String,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct WekanUser {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    profile: Option<WekanUserProfile>,
}

#[derive(Deserialize)]
struct WekanUserProfile {
    #[serde(default)]
    fullname: Option<String>,
}

impl WekanUser {
    fn display_name(&self) -> String {
        self.profile
            .as_ref()
            .and_then(|p| p.fullname.clone())
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Wekan REST client. Authenticates with a pre-supplied API token or by
/// logging in with username/password; the obtained session token is cached
/// for the lifetime of the client (one run).
pub struct WekanClient {
    opts: WekanOpts,
    client: reqwest::Client,
    session_token: Mutex<Option<String>>,
    /// userId -> display name. None until `load_users` has run once.
    user_cache: Mutex<Option<HashMap<String, String>>>,
}

impl WekanClient {
    pub fn new(opts: WekanOpts) -> Self {
        Self {
            opts,
            client: reqwest::Client::new(),
            session_token: Mutex::new(None),
            user_cache: Mutex::new(None),
        }
    }

    async fn auth_token(&self) -> Result<String, WekanError> {
        if let Some(token) = &self.opts.token {
            return Ok(token.clone());
        }
        let mut cached = self.session_token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let (username, password) = match (&self.opts.username, &self.opts.password) {
            (Some(u), Some(p)) => (u, p),
            _ => return Err(WekanError::NoAuth),
        };
        let resp = self
            .client
            .post(format!("{}/users/login", self.opts.base_url))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(WekanError::Login(resp.status().as_u16()));
        }
        let login: LoginResponse = resp.json().await?;
        *cached = Some(login.token.clone());
        Ok(login.token)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, WekanError> {
        let token = self.auth_token().await?;
        let resp = self
            .client
            .get(format!("{}{path}", self.opts.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(WekanError::Status {
                method: "GET",
                path: path.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }

    async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, WekanError> {
        let token = self.auth_token().await?;
        let resp = self
            .client
            .put(format!("{}{path}", self.opts.base_url))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(WekanError::Status {
                method: "PUT",
                path: path.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json().await?)
    }

    /// Populate the username cache from `/api/users`. Safe to call more than
    /// once; only the first call hits the API. A fetch failure leaves the
    /// cache empty so per-id fallback lookups still work.
    pub async fn load_users(&self) {
        let mut cache = self.user_cache.lock().await;
        if cache.is_some() {
            return;
        }
        let users: Vec<WekanUser> = match self.get("/api/users").await {
            Ok(users) => users,
            Err(err) => {
                eprintln!("[ERROR] Failed to load users: {err}");
                Vec::new()
            }
        };
        let map = users
            .into_iter()
            .map(|u| {
                let name = u.display_name();
                (u.id, name)
            })
            .collect();
        *cache = Some(map);
    }
}

/// The board API surface the reconciliation drivers depend on. Kept as a
/// trait so drivers and the card locator can be exercised against a mock.
#[async_trait]
pub trait BoardApi: Send + Sync {
    async fn boards(&self, user_id: &str) -> Result<Vec<Board>>;
    async fn lists(&self, board_id: &str) -> Result<Vec<List>>;
    async fn swimlanes(&self, board_id: &str) -> Result<Vec<Swimlane>>;
    async fn cards(&self, board_id: &str, list_id: &str) -> Result<Vec<Card>>;
    /// Full card form; fails when the card is absent from that list.
    async fn card(&self, board_id: &str, list_id: &str, card_id: &str) -> Result<Card>;
    async fn custom_fields(&self, board_id: &str) -> Result<Vec<CustomFieldDef>>;
    async fn comments(&self, board_id: &str, card_id: &str) -> Result<Vec<Comment>>;
    async fn move_card(
        &self,
        board_id: &str,
        from_list_id: &str,
        card_id: &str,
        to_list_id: &str,
    ) -> Result<Card>;
    /// Resolve `field_name` to its id on the board and persist `value` on
    /// the card, preserving the card's other custom-field entries.
    async fn update_card_field(
        &self,
        board_id: &str,
        list_id: &str,
        card_id: &str,
        field_name: &str,
        value: &str,
    ) -> Result<()>;
    /// Display name for a user id; degrades to the id itself.
    async fn username(&self, user_id: &str) -> String;
}

#[async_trait]
impl BoardApi for WekanClient {
    async fn boards(&self, user_id: &str) -> Result<Vec<Board>> {
        Ok(self.get(&format!("/api/users/{user_id}/boards")).await?)
    }

    async fn lists(&self, board_id: &str) -> Result<Vec<List>> {
        Ok(self.get(&format!("/api/boards/{board_id}/lists")).await?)
    }

    async fn swimlanes(&self, board_id: &str) -> Result<Vec<Swimlane>> {
        Ok(self.get(&format!("/api/boards/{board_id}/swimlanes")).await?)
    }

    async fn cards(&self, board_id: &str, list_id: &str) -> Result<Vec<Card>> {
        Ok(self
            .get(&format!("/api/boards/{board_id}/lists/{list_id}/cards"))
            .await?)
    }

    async fn card(&self, board_id: &str, list_id: &str, card_id: &str) -> Result<Card> {
        Ok(self
            .get(&format!(
                "/api/boards/{board_id}/lists/{list_id}/cards/{card_id}"
            ))
            .await?)
    }

    async fn custom_fields(&self, board_id: &str) -> Result<Vec<CustomFieldDef>> {
        Ok(self
            .get(&format!("/api/boards/{board_id}/custom-fields"))
            .await?)
    }

    async fn comments(&self, board_id: &str, card_id: &str) -> Result<Vec<Comment>> {
        Ok(self
            .get(&format!("/api/boards/{board_id}/cards/{card_id}/comments"))
            .await?)
    }

    async fn move_card(
        &self,
        board_id: &str,
        from_list_id: &str,
        card_id: &str,
        to_list_id: &str,
    ) -> Result<Card> {
        Ok(self
            .put(
                &format!("/api/boards/{board_id}/lists/{from_list_id}/cards/{card_id}"),
                &json!({ "listId": to_list_id }),
            )
            .await?)
    }

    async fn update_card_field(
        &self,
        board_id: &str,
        list_id: &str,
        card_id: &str,
        field_name: &str,
        value: &str,
    ) -> Result<()> {
        let card = self.card(board_id, list_id, card_id).await?;
        let defs = self.custom_fields(board_id).await?;
        let def = fields::find_field(&defs, field_name).ok_or_else(|| {
            let available: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
            anyhow::anyhow!(
                "custom field not found: {field_name} (available: {})",
                available.join(", ")
            )
        })?;

        let mut updated: Vec<CardField> = card.custom_fields;
        match updated.iter_mut().find(|cf| cf.id == def.id) {
            Some(entry) => entry.value = json!(value),
            None => updated.push(CardField {
                id: def.id.clone(),
                value: json!(value),
            }),
        }

        let _: serde_json::Value = self
            .put(
                &format!("/api/boards/{board_id}/lists/{list_id}/cards/{card_id}"),
                &json!({ "customFields": updated }),
            )
            .await?;
        Ok(())
    }

    async fn username(&self, user_id: &str) -> String {
        if user_id.is_empty() {
            return "Unknown".to_string();
        }
        self.load_users().await;
        {
            let cache = self.user_cache.lock().await;
            if let Some(name) = cache.as_ref().and_then(|m| m.get(user_id)) {
                return name.clone();
            }
        }
        // Not in the bulk listing; try an individual lookup and cache the
        // id itself when that fails too.
        let name = match self.get::<WekanUser>(&format!("/api/users/{user_id}")).await {
            Ok(user) => user.display_name(),
            Err(_) => user_id.to_string(),
        };
        let mut cache = self.user_cache.lock().await;
        cache
            .get_or_insert_with(HashMap::new)
            .insert(user_id.to_string(), name.clone());
        name
    }
}
