use std::collections::HashMap;

use anyhow::Result;
use futures::future::join_all;

use crate::model::card::{CardComment, CardRef, DetailedCard, EntityRef};
use crate::wekan::BoardApi;

fn is_pending_list(title: &str) -> bool {
    let title = title.to_lowercase();
    title.starts_with("backlog") || title == "em desenvolvimento"
}

/// Collect the acting user's pending cards across all boards, joined with
/// board/list/swimlane titles, named custom fields, and chronological
/// comments.
///
/// Pending lists are those titled `Backlog*` or exactly `Em Desenvolvimento`
/// (case-insensitive); cards are filtered by assignee membership only, with
/// no comment-author or uuid-based exclusion. Board metadata (lists,
/// swimlanes, field definitions) is fetched concurrently per board; card
/// iteration stays sequential.
pub async fn pending_cards(api: &dyn BoardApi, user_id: &str) -> Result<Vec<DetailedCard>> {
    let mut results = Vec::new();

    let boards = api.boards(user_id).await?;
    for board in &boards {
        let (lists, swimlanes, defs) = tokio::try_join!(
            api.lists(&board.id),
            api.swimlanes(&board.id),
            api.custom_fields(&board.id)
        )?;

        let field_names: HashMap<&str, &str> = defs
            .iter()
            .map(|d| (d.id.as_str(), d.name.as_str()))
            .collect();

        for list in lists.iter().filter(|l| is_pending_list(&l.title)) {
            let cards = api.cards(&board.id, &list.id).await?;
            for card in &cards {
                if !card.is_assigned_to(user_id) {
                    continue;
                }

                let (full, raw_comments) = tokio::join!(
                    api.card(&board.id, &list.id, &card.id),
                    api.comments(&board.id, &card.id)
                );
                let full = full?;
                // Comment fetch failure degrades to "no comments".
                let mut ordered = raw_comments.unwrap_or_default();
                // The API returns comments newest-first.
                ordered.reverse();

                let authors = join_all(
                    ordered
                        .iter()
                        .map(|c| api.username(c.author().unwrap_or(""))),
                )
                .await;
                let comments: Vec<CardComment> = ordered
                    .iter()
                    .zip(authors)
                    .map(|(c, author)| CardComment {
                        id: c.id.clone(),
                        author,
                        text: c.body().to_string(),
                    })
                    .collect();

                let mut custom_fields = serde_json::Map::new();
                for cf in &full.custom_fields {
                    let name = field_names
                        .get(cf.id.as_str())
                        .copied()
                        .unwrap_or(cf.id.as_str());
                    custom_fields.insert(name.to_string(), cf.value.clone());
                }

                let swimlane = full
                    .swimlane_id
                    .as_deref()
                    .and_then(|id| swimlanes.iter().find(|s| s.id == id))
                    .map(|s| EntityRef {
                        id: s.id.clone(),
                        title: s.title.clone(),
                    });

                results.push(DetailedCard {
                    id: full.id.clone(),
                    title: full.title.clone(),
                    description: full.description.clone().unwrap_or_default(),
                    board: EntityRef {
                        id: board.id.clone(),
                        title: board.title.clone(),
                    },
                    list: EntityRef {
                        id: list.id.clone(),
                        title: list.title.clone(),
                    },
                    swimlane,
                    assignees: full.assignees.clone(),
                    start_at: full.start_at.clone(),
                    end_at: full.end_at.clone(),
                    due_at: full.due_at.clone(),
                    created_at: full.created_at.clone(),
                    custom_fields,
                    comments,
                });
            }
        }
    }

    Ok(results)
}

/// Print pending-card metadata as a single JSON array on stdout:
/// `[{"id","boardId","listId","title"}]`.
pub async fn print_pending_json(api: &dyn BoardApi, user_id: &str) -> Result<()> {
    let cards = pending_cards(api, user_id).await?;
    let refs: Vec<CardRef> = cards.iter().map(|c| c.to_card_ref()).collect();
    println!("{}", serde_json::to_string(&refs)?);
    Ok(())
}

/// Exit-code probe: 0 when at least one pending card exists, 1 when none.
pub async fn has_pending(api: &dyn BoardApi, user_id: &str) -> Result<i32> {
    let cards = pending_cards(api, user_id).await?;
    if cards.is_empty() {
        println!("No pending cards found");
        Ok(1)
    } else {
        println!("{} pending card(s) found", cards.len());
        Ok(0)
    }
}
