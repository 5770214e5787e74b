use anyhow::Result;

use crate::fields;
use crate::prs::{self, PrOracle};
use crate::wekan::BoardApi;

/// Counters for one merge-check run, threaded through the batch loop and
/// returned at the end. `merged_cards` and `moved_cards` may diverge: a card
/// whose PRs are all merged still counts as merged when the move itself
/// fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckPrsReport {
    pub total_cards: usize,
    pub merged_cards: usize,
    pub moved_cards: usize,
    pub skipped_cards: usize,
}

const PR_FIELD: &str = "PR";

/// Walk every accessible board, inspect the cards in its "Merge" list, and
/// move each card whose linked PRs are all merged to the board's
/// "Pendente de Testes" list.
///
/// Boards without both a source list (title containing "merge") and a
/// destination list (title containing both "pendente" and "teste") are
/// skipped before any card is examined. The card snapshot of the source list
/// is taken before any move, so a card moved by this run is not re-examined.
pub async fn run(
    api: &dyn BoardApi,
    oracle: &dyn PrOracle,
    user_id: &str,
) -> Result<CheckPrsReport> {
    let mut report = CheckPrsReport::default();

    println!("[INFO] Fetching boards...");
    let boards = api.boards(user_id).await?;
    if boards.is_empty() {
        println!("[INFO] No boards found.");
        return Ok(report);
    }

    for board in &boards {
        println!("[INFO] Processing board: {} ({})", board.title, board.id);

        let lists = api.lists(&board.id).await?;
        let merge_list = lists
            .iter()
            .find(|l| l.title.to_lowercase().contains("merge"));
        let Some(merge_list) = merge_list else {
            println!("[INFO]   No 'Merge' list on board {} - skipping", board.title);
            continue;
        };
        let dest_list = lists.iter().find(|l| {
            let title = l.title.to_lowercase();
            title.contains("pendente") && title.contains("teste")
        });
        let Some(dest_list) = dest_list else {
            println!(
                "[INFO]   No 'Pendente de Testes' list on board {} - skipping",
                board.title
            );
            continue;
        };

        let defs = api.custom_fields(&board.id).await?;
        let cards = api.cards(&board.id, &merge_list.id).await?;
        if cards.is_empty() {
            println!("[INFO]   No cards in '{}'", merge_list.title);
            continue;
        }

        for card in &cards {
            report.total_cards += 1;
            println!("[INFO]   Checking card: {} ({})", card.title, card.id);

            let full = match api.card(&board.id, &merge_list.id, &card.id).await {
                Ok(full) => full,
                Err(err) => {
                    eprintln!("[ERROR]     Failed to fetch card {}: {err:#}", card.id);
                    report.skipped_cards += 1;
                    continue;
                }
            };

            if !full.is_assigned_to(user_id) {
                println!("[INFO]     Not assigned to acting user - skipping");
                report.skipped_cards += 1;
                continue;
            }

            let pr_field = fields::field_text(
                &full.custom_fields,
                fields::find_field(&defs, PR_FIELD),
            );
            let Some(pr_field) = pr_field else {
                println!("[INFO]     PR field empty - skipping");
                report.skipped_cards += 1;
                continue;
            };

            let urls = prs::extract_pr_urls(&pr_field);
            if urls.is_empty() {
                println!("[INFO]     No PR references in field value {pr_field:?} - skipping");
                report.skipped_cards += 1;
                continue;
            }

            let decision = prs::check_all(oracle, &urls).await;
            if decision.all_merged {
                report.merged_cards += 1;
                println!("[SUCCESS]     All {} PR(s) merged", decision.checks.len());
                println!("[INFO]     Moving card to '{}'...", dest_list.title);
                match api
                    .move_card(&board.id, &merge_list.id, &card.id, &dest_list.id)
                    .await
                {
                    Ok(_) => {
                        report.moved_cards += 1;
                        println!("[SUCCESS]     Card moved");
                    }
                    Err(err) => {
                        eprintln!("[ERROR]     Failed to move card {}: {err:#}", card.id);
                    }
                }
            } else {
                let pending: Vec<String> = decision
                    .pending()
                    .map(|c| format!("{} ({})", c.url, c.state))
                    .collect();
                println!(
                    "[INFO]     Pending: {} of {} - {}",
                    pending.len(),
                    decision.checks.len(),
                    pending.join(", ")
                );
                report.skipped_cards += 1;
            }
        }
    }

    Ok(report)
}

pub fn print_summary(report: &CheckPrsReport) {
    println!("==========================================");
    println!("[INFO] Merge check finished");
    println!("[INFO]   Cards in 'Merge' lists: {}", report.total_cards);
    println!("[INFO]   Cards with all PRs merged: {}", report.merged_cards);
    println!("[INFO]   Cards moved: {}", report.moved_cards);
    println!("[INFO]   Cards skipped: {}", report.skipped_cards);
    println!("==========================================");
}
