use anyhow::{bail, Context, Result};

use crate::fields;
use crate::locate::locate_card;
use crate::model::card::CardRef;
use crate::wekan::BoardApi;

pub const TOKENS_FIELD: &str = "Tokens Consumidos";

/// Counters for one token-accumulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulateReport {
    pub total_cards: usize,
    pub updated_cards: usize,
    pub skipped_cards: usize,
}

/// Add `per_card_tokens` to the tracked token counter of every card in the
/// batch.
///
/// Each card is re-located across its board's lists first (a peer automation
/// may have moved it), and the current value is re-read before accumulating
/// so the write reflects the freshest state. A per-card failure is logged
/// and the batch continues; a non-positive delta short-circuits the whole
/// run before any API call.
pub async fn run(
    api: &dyn BoardApi,
    cards: &[CardRef],
    per_card_tokens: i64,
) -> Result<AccumulateReport> {
    let mut report = AccumulateReport::default();

    if per_card_tokens <= 0 {
        println!("No tokens to accumulate.");
        return Ok(report);
    }
    if cards.is_empty() {
        println!("No cards to accumulate tokens for.");
        return Ok(report);
    }

    for card_ref in cards {
        report.total_cards += 1;
        match accumulate_one(api, card_ref, per_card_tokens).await {
            Ok((current, new_value)) => {
                report.updated_cards += 1;
                println!(
                    "Card {} ({}): {current} + {per_card_tokens} = {new_value} tokens",
                    card_ref.id, card_ref.title
                );
            }
            Err(err) => {
                report.skipped_cards += 1;
                eprintln!(
                    "[ERROR] Failed to update card {} ({}): {err:#}",
                    card_ref.id, card_ref.title
                );
            }
        }
    }

    Ok(report)
}

/// Locate, read, accumulate, write back. No step before the final write
/// mutates anything, so any failure leaves the card untouched.
async fn accumulate_one(
    api: &dyn BoardApi,
    card_ref: &CardRef,
    per_card_tokens: i64,
) -> Result<(i64, i64)> {
    let lists = api
        .lists(&card_ref.board_id)
        .await
        .context("failed to list board lists")?;

    let Some((card, list_id)) = locate_card(api, &card_ref.board_id, &card_ref.id, &lists).await
    else {
        bail!("card not found in any list of board {}", card_ref.board_id);
    };

    let defs = api.custom_fields(&card_ref.board_id).await?;
    let Some(def) = fields::find_field(&defs, TOKENS_FIELD) else {
        bail!(
            "custom field '{TOKENS_FIELD}' not found on board {}",
            card_ref.board_id
        );
    };

    let current = fields::field_value(&card.custom_fields, Some(def))
        .map(fields::parse_token_value)
        .unwrap_or(0);
    let new_value = fields::accumulate_tokens(current, per_card_tokens);

    api.update_card_field(
        &card_ref.board_id,
        &list_id,
        &card_ref.id,
        TOKENS_FIELD,
        &new_value.to_string(),
    )
    .await?;

    Ok((current, new_value))
}
