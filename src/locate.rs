use crate::model::board::List;
use crate::model::card::Card;
use crate::wekan::BoardApi;

/// Find a card's current list by probing each list in order.
///
/// The card may have been moved by a peer automation since the caller last
/// observed it, so its remembered list id is only a hint. A fetch failure on
/// one list is the expected negative result and iteration continues; the
/// first list that yields the card wins. None means the card is no longer
/// reachable on this board; callers skip with a diagnostic, never abort.
pub async fn locate_card(
    api: &dyn BoardApi,
    board_id: &str,
    card_id: &str,
    lists: &[List],
) -> Option<(Card, String)> {
    for list in lists {
        match api.card(board_id, &list.id, card_id).await {
            Ok(card) => return Some((card, list.id.clone())),
            Err(_) => continue,
        }
    }
    None
}
