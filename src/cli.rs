use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Merge-check run: move cards with fully-merged PRs out of "Merge".
    CheckPrs,
    /// Token accumulation run over a `CARDS_JSON` batch.
    AccumulateTokens,
    /// Print pending-card metadata as JSON.
    PendingCards,
    /// Exit 0 when pending cards exist, 1 otherwise.
    HasPending,
    /// Print one card's derived metadata as JSON.
    CardInfo,
}

pub fn parse_command(args: &[String]) -> Result<Command> {
    let Some(name) = args.first() else {
        bail!("Missing subcommand.\n\n{}", usage());
    };
    let command = match name.as_str() {
        "check-prs" => Command::CheckPrs,
        "accumulate-tokens" => Command::AccumulateTokens,
        "pending-cards" => Command::PendingCards,
        "has-pending" => Command::HasPending,
        "card-info" => Command::CardInfo,
        other => bail!("Unknown subcommand: {other}\n\n{}", usage()),
    };
    if args.len() > 1 {
        bail!(
            "Unexpected argument: {} (parameters are passed via environment variables)",
            args[1]
        );
    }
    Ok(command)
}

pub fn usage() -> String {
    [
        "wekan-sync — keep Wekan card state in sync with PR status and token usage",
        "",
        "USAGE:",
        "  wekan-sync <subcommand>",
        "",
        "SUBCOMMANDS:",
        "  check-prs          Move cards in 'Merge' lists whose PRs are all merged",
        "  accumulate-tokens  Add PER_CARD_TOKENS to each card in CARDS_JSON",
        "  pending-cards      Print pending-card metadata as JSON",
        "  has-pending        Exit 0 if pending cards exist, 1 otherwise",
        "  card-info          Print uuid/comment-count/list for CARD_ID on BOARD_ID",
        "",
        "ENVIRONMENT:",
        "  WEKAN_BASE_URL     Wekan base URL (required)",
        "  WEKAN_API_TOKEN    API token, or WEKAN_USERNAME + WEKAN_PASSWORD",
        "  WEKAN_USER_ID      Acting user id (required)",
        "  CARDS_JSON         accumulate-tokens: [{id, boardId, listId, title}]",
        "  PER_CARD_TOKENS    accumulate-tokens: tokens to add per card",
        "  CARD_ID, BOARD_ID  card-info: the card to inspect",
        "",
        "Values may also come from ~/.wekan-sync/config.toml (environment wins).",
    ]
    .join("\n")
}

pub fn print_help() {
    println!("{}", usage());
}
