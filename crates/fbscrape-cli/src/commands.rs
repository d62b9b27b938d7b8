//! Command handlers: build a scraper, run one report, print JSON.

use std::io::{IsTerminal, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use fbscrape::{snapshot, Fetcher, ScraperConfig, Scraper};

use crate::output::print_json;

fn scraper(config: ScraperConfig) -> anyhow::Result<Scraper<Fetcher>> {
    let fetcher = Fetcher::new(&config).context("failed to set up HTTP client")?;
    Ok(Scraper::new(config, fetcher))
}

pub async fn friends(config: ScraperConfig, compact: bool) -> anyhow::Result<()> {
    let friends = scraper(config)?.friends().await?;
    print_json(&friends, compact)
}

pub async fn details(
    config: ScraperConfig,
    ids: Vec<String>,
    include_mutual: bool,
    compact: bool,
) -> anyhow::Result<()> {
    let keys = if ids.is_empty() { read_stdin_keys()? } else { ids };
    let report = scraper(config)?.friend_details(&keys, include_mutual).await?;
    print_json(&report, compact)
}

fn read_stdin_keys() -> anyhow::Result<Vec<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!("no entity ids given: pass ids as arguments or pipe JSON on stdin");
    }
    let mut text = String::new();
    stdin
        .lock()
        .read_to_string(&mut text)
        .context("failed to read stdin")?;
    Ok(fbscrape::parse_entity_keys(&text)?)
}

pub async fn timeline(config: ScraperConfig, id: &str, compact: bool) -> anyhow::Result<()> {
    let posts = scraper(config)?.timeline(id).await?;
    print_json(&posts, compact)
}

pub async fn likes(config: ScraperConfig, id: &str, compact: bool) -> anyhow::Result<()> {
    let likes = scraper(config)?.likes(id).await?;
    print_json(&likes, compact)
}

/// Poll until `iterations` polls have run or Ctrl-C arrives during a sleep.
pub async fn active(
    config: ScraperConfig,
    snapshot_path: &Path,
    interval_secs: u64,
    iterations: Option<u64>,
    compact: bool,
) -> anyhow::Result<()> {
    let mut log = snapshot::load(snapshot_path)
        .with_context(|| format!("failed to read snapshot {}", snapshot_path.display()))?;
    let mut scraper = scraper(config)?;
    let interval = Duration::from_secs(interval_secs.max(1));
    let mut polls = 0u64;

    loop {
        match scraper.poll_presence(&mut log, Some(snapshot_path)).await {
            Ok(changed) => tracing::info!(poll = polls + 1, changed, "presence poll"),
            // Transient: the next poll is the retry.
            Err(e) if e.is_entity_scoped() => tracing::warn!("presence poll failed: {e}"),
            Err(e) => return Err(e.into()),
        }
        polls += 1;
        if iterations.is_some_and(|n| polls >= n) {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping after {polls} polls");
                break;
            }
        }
    }

    print_json(&log, compact)
}
