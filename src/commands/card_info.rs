use anyhow::Result;
use serde::Serialize;

use crate::fields;
use crate::locate::locate_card;
use crate::wekan::BoardApi;

const UUID_FIELD: &str = "uuid";

/// Derived metadata for one card, printed as a single JSON value.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub uuid: String,
    pub agent_comment_count: usize,
    pub list_id: String,
}

/// Resolve a card's uuid field, acting-user comment count, and current list.
///
/// The card is searched across all of the board's lists since it may have
/// moved; an unreachable card yields the zero-value info rather than an
/// error, so shell callers can branch on the JSON instead of the exit code.
pub async fn card_info(
    api: &dyn BoardApi,
    board_id: &str,
    card_id: &str,
    user_id: &str,
) -> Result<CardInfo> {
    let lists = api.lists(board_id).await?;
    let Some((card, list_id)) = locate_card(api, board_id, card_id, &lists).await else {
        return Ok(CardInfo::default());
    };

    let defs = api.custom_fields(board_id).await?;
    let uuid = fields::field_text(&card.custom_fields, fields::find_field(&defs, UUID_FIELD))
        .unwrap_or_default();

    let comments = api.comments(board_id, card_id).await?;
    let agent_comment_count = comments
        .iter()
        .filter(|c| c.author() == Some(user_id))
        .count();

    Ok(CardInfo {
        uuid,
        agent_comment_count,
        list_id,
    })
}
