use std::fmt;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;

fn pr_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://github\.com/[^/]+/[^/]+/pull/\d+").unwrap())
}

fn pr_shape_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"github\.com/[^/]+/[^/]+/pull/\d+").unwrap())
}

/// Extract every GitHub PR URL from a free-text field value, in order of
/// appearance. Issue URLs and surrounding prose are ignored; duplicates are
/// preserved as separate entries.
pub fn extract_pr_urls(text: &str) -> Vec<String> {
    pr_url_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Resolved state of one PR reference. `InvalidUrl` and `Error` are terminal
/// non-merge states; neither retries within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Merged,
    Open,
    Closed,
    InvalidUrl,
    Error,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrState::Merged => "MERGED",
            PrState::Open => "OPEN",
            PrState::Closed => "CLOSED",
            PrState::InvalidUrl => "INVALID_URL",
            PrState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// External reviewer-state oracle. Implementations answer with one of
/// Merged/Open/Closed or fail; shape validation and failure mapping happen
/// in [`check_one`], not here.
#[async_trait]
pub trait PrOracle: Send + Sync {
    async fn state(&self, pr_url: &str) -> Result<PrState>;
}

/// Oracle backed by the `gh` CLI.
pub struct GhCli;

impl GhCli {
    /// Preflight: fail fast when `gh` is missing or unauthenticated, so the
    /// run aborts before touching the board.
    pub async fn ensure_auth() -> Result<()> {
        let output = tokio::process::Command::new("gh")
            .args(["auth", "status"])
            .output()
            .await
            .context("Failed to run gh CLI")?;
        if !output.status.success() {
            anyhow::bail!("gh (GitHub CLI) is not authenticated. Run 'gh auth login' first.");
        }
        Ok(())
    }
}

#[async_trait]
impl PrOracle for GhCli {
    async fn state(&self, pr_url: &str) -> Result<PrState> {
        let output = tokio::process::Command::new("gh")
            .args(["pr", "view", pr_url, "--json", "state", "-q", ".state"])
            .output()
            .await
            .context("Failed to run gh CLI")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("gh pr view failed: {}", stderr.trim());
        }

        match String::from_utf8_lossy(&output.stdout).trim() {
            "MERGED" => Ok(PrState::Merged),
            "OPEN" => Ok(PrState::Open),
            "CLOSED" => Ok(PrState::Closed),
            other => anyhow::bail!("unexpected PR state from gh: {other}"),
        }
    }
}

/// Resolve one reference. A URL that does not look like a PR yields
/// `InvalidUrl` without querying the oracle; an oracle failure yields
/// `Error`. Never propagates, so one bad reference cannot abort a batch.
pub async fn check_one(oracle: &dyn PrOracle, pr_url: &str) -> PrState {
    if !pr_shape_regex().is_match(pr_url) {
        return PrState::InvalidUrl;
    }
    match oracle.state(pr_url).await {
        Ok(state) => state,
        Err(err) => {
            eprintln!("[ERROR]     PR state query failed for {pr_url}: {err:#}");
            PrState::Error
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrCheck {
    pub url: String,
    pub state: PrState,
}

/// Aggregated merge decision over a card's references.
#[derive(Debug, Clone)]
pub struct MergeDecision {
    /// True iff every reference resolved to Merged. An empty reference set
    /// is false: zero references means no positive merge evidence.
    pub all_merged: bool,
    pub checks: Vec<PrCheck>,
}

impl MergeDecision {
    /// References that still block the merge decision, in input order.
    pub fn pending(&self) -> impl Iterator<Item = &PrCheck> {
        self.checks.iter().filter(|c| c.state != PrState::Merged)
    }
}

/// Check every reference sequentially and reduce to one decision,
/// preserving per-reference detail in input order.
pub async fn check_all(oracle: &dyn PrOracle, urls: &[String]) -> MergeDecision {
    let mut checks = Vec::with_capacity(urls.len());
    for url in urls {
        let state = check_one(oracle, url).await;
        checks.push(PrCheck {
            url: url.clone(),
            state,
        });
    }
    let all_merged = !checks.is_empty() && checks.iter().all(|c| c.state == PrState::Merged);
    MergeDecision { all_merged, checks }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Oracle answering from a fixed url -> state table, recording queries.
    pub(crate) struct MockOracle {
        states: HashMap<String, PrState>,
        pub queried: Mutex<Vec<String>>,
    }

    impl MockOracle {
        pub(crate) fn new(entries: &[(&str, PrState)]) -> Self {
            Self {
                states: entries
                    .iter()
                    .map(|(u, s)| (u.to_string(), *s))
                    .collect(),
                queried: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PrOracle for MockOracle {
        async fn state(&self, pr_url: &str) -> Result<PrState> {
            self.queried.lock().unwrap().push(pr_url.to_string());
            match self.states.get(pr_url) {
                Some(state) => Ok(*state),
                None => anyhow::bail!("oracle unreachable"),
            }
        }
    }

    #[test]
    fn extract_empty_input_yields_empty() {
        assert!(extract_pr_urls("").is_empty());
        assert!(extract_pr_urls("no urls here").is_empty());
    }

    #[test]
    fn extract_single_url() {
        assert_eq!(
            extract_pr_urls("https://github.com/owner/repo/pull/123"),
            vec!["https://github.com/owner/repo/pull/123"]
        );
    }

    #[test]
    fn extract_multiple_urls_in_order() {
        let text = "https://github.com/o/r1/pull/1, https://github.com/o/r2/pull/2";
        assert_eq!(
            extract_pr_urls(text),
            vec![
                "https://github.com/o/r1/pull/1",
                "https://github.com/o/r2/pull/2"
            ]
        );
    }

    #[test]
    fn extract_ignores_issue_urls_and_prose() {
        let text = "see https://github.com/o/r/issues/9 and maybe \
                    https://github.com/o/r/pull/42 later";
        assert_eq!(extract_pr_urls(text), vec!["https://github.com/o/r/pull/42"]);
    }

    #[test]
    fn extract_accepts_http_and_preserves_duplicates() {
        let text = "http://github.com/o/r/pull/1 https://github.com/o/r/pull/1";
        assert_eq!(
            extract_pr_urls(text),
            vec![
                "http://github.com/o/r/pull/1",
                "https://github.com/o/r/pull/1"
            ]
        );
    }

    #[tokio::test]
    async fn check_one_invalid_shape_skips_oracle() {
        let oracle = MockOracle::new(&[]);
        let state = check_one(&oracle, "https://example.com/not-a-pr").await;
        assert_eq!(state, PrState::InvalidUrl);
        assert!(oracle.queried.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn check_one_maps_oracle_failure_to_error() {
        let oracle = MockOracle::new(&[]);
        let state = check_one(&oracle, "https://github.com/o/r/pull/7").await;
        assert_eq!(state, PrState::Error);
    }

    #[tokio::test]
    async fn check_all_empty_is_not_merged() {
        let oracle = MockOracle::new(&[]);
        let decision = check_all(&oracle, &[]).await;
        assert!(!decision.all_merged);
        assert!(decision.checks.is_empty());
    }

    #[tokio::test]
    async fn check_all_single_merged() {
        let url = "https://github.com/o/r/pull/1".to_string();
        let oracle = MockOracle::new(&[(url.as_str(), PrState::Merged)]);
        let decision = check_all(&oracle, std::slice::from_ref(&url)).await;
        assert!(decision.all_merged);
    }

    #[tokio::test]
    async fn check_all_mixed_preserves_order() {
        let urls = vec![
            "https://github.com/o/r/pull/1".to_string(),
            "https://github.com/o/r/pull/2".to_string(),
        ];
        let oracle = MockOracle::new(&[
            (urls[0].as_str(), PrState::Merged),
            (urls[1].as_str(), PrState::Open),
        ]);
        let decision = check_all(&oracle, &urls).await;
        assert!(!decision.all_merged);
        assert_eq!(decision.checks.len(), 2);
        assert_eq!(decision.checks[0].state, PrState::Merged);
        assert_eq!(decision.checks[1].state, PrState::Open);
        let pending: Vec<_> = decision.pending().collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url, urls[1]);
    }
}
