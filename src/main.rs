mod cli;
mod commands;
mod config;
mod fields;
mod locate;
mod model;
mod prs;
#[cfg(test)]
mod testing;
mod wekan;

use anyhow::{Context, Result};
use serde_json::json;

use cli::Command;
use config::Config;
use model::card::CardRef;
use prs::GhCli;
use wekan::WekanClient;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help" || a == "help") {
        cli::print_help();
        return;
    }

    // Exit codes: 0 success (including nothing-to-do), 1 reserved for
    // has-pending = none, 2 configuration/auth failure or any error that
    // escapes the batch loop. Per-card failures never reach here.
    let code = match run(&args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[ERROR] {err:#}");
            2
        }
    };
    std::process::exit(code);
}

async fn run(args: &[String]) -> Result<i32> {
    let command = cli::parse_command(args)?;
    let config = Config::load()?;
    let client = WekanClient::new(config.wekan_opts());

    match command {
        Command::CheckPrs => {
            GhCli::ensure_auth().await?;
            println!("==========================================");
            println!("[INFO] Starting merged-PR check");
            println!(
                "[INFO] User: {}",
                config.username.as_deref().unwrap_or("token-based")
            );
            println!("[INFO] User ID: {}", config.user_id);
            println!("==========================================");
            let report = commands::check_prs::run(&client, &GhCli, &config.user_id).await?;
            commands::check_prs::print_summary(&report);
            Ok(0)
        }
        Command::AccumulateTokens => {
            // parseInt semantics: "1000" and "1000 tokens" both read 1000,
            // anything without a numeric prefix reads 0 and no-ops the run.
            let per_card_tokens = config::env_var("PER_CARD_TOKENS")
                .map(|raw| fields::parse_token_value(&json!(raw)))
                .unwrap_or(0);
            let cards_json = config::env_var("CARDS_JSON").unwrap_or_else(|| "[]".to_string());
            if per_card_tokens <= 0 {
                println!("No tokens to accumulate.");
                return Ok(0);
            }
            let cards: Vec<CardRef> =
                serde_json::from_str(&cards_json).context("Invalid CARDS_JSON")?;
            commands::accumulate::run(&client, &cards, per_card_tokens).await?;
            Ok(0)
        }
        Command::PendingCards => {
            commands::pending::print_pending_json(&client, &config.user_id).await?;
            Ok(0)
        }
        Command::HasPending => commands::pending::has_pending(&client, &config.user_id).await,
        Command::CardInfo => {
            let card_id = config::env_var("CARD_ID").context("CARD_ID is required")?;
            let board_id = config::env_var("BOARD_ID").context("BOARD_ID is required")?;
            let info =
                commands::card_info::card_info(&client, &board_id, &card_id, &config.user_id)
                    .await?;
            println!("{}", serde_json::to_string(&info)?);
            Ok(0)
        }
    }
}
