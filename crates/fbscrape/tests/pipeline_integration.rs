//! End-to-end pipeline tests against saved markup.
//!
//! Every page is served from a `MemorySource`, so these exercise the
//! public API from piped input to assembled JSON without a network.

use assert_json_diff::assert_json_eq;
use chrono::NaiveDate;
use fbscrape::{
    merge, parse_entity_keys, snapshot, MemorySource, PresenceLog, ScrapeError, Scraper,
    ScraperConfig, SessionCookies,
};
use serde_json::json;
use tempfile::TempDir;

// ── Fixtures ──

const BASE: &str = "https://mbasic.test";

fn config() -> ScraperConfig {
    ScraperConfig::new(SessionCookies::new("1000", "secret").unwrap()).with_base_url(BASE)
}

fn about_markup() -> &'static str {
    r#"<html><head><title>User One</title></head><body>
        <div id="root">
          <a href="/u1?v=timeline&amp;lst=1000%3A11%3A1568000000">Timeline</a>
          <div id="work">
            <a href="/acme"><img src="" alt="Acme Corp"></a>
            <a href="/initech"><img src="" alt="Initech"></a>
          </div>
          <div id="education">
            <a href="/uni"><img src="" alt="State University"></a>
          </div>
          <div id="relationship"><div>Relationship</div><div>In a relationship</div></div>
          <div title="Birthday"><span>Birthday</span><div>1 January 1984</div></div>
          <div title="Gender">
            <span>Gender</span><span aria-hidden="true"> · </span><span>Edit</span>
            <div>Female</div>
          </div>
          <div title="Skype"><div>user.one</div></div>
          <div title="Favourite Food"><div>Pizza</div></div>
        </div>
    </body></html>"#
}

// ── Friend details ──

#[tokio::test]
async fn test_details_from_piped_keys_with_unresolvable_entity() {
    let cfg = config();
    let source = MemorySource::new().with_page(cfg.about_url("u1"), about_markup());
    let keys = parse_entity_keys(r#"["u1", "u2"]"#).unwrap();

    let mut scraper = Scraper::new(cfg, source);
    let report = scraper.friend_details(&keys, false).await.unwrap();

    assert_json_eq!(
        report,
        json!({
            "u1": {
                "name": "User One",
                "id": 11,
                "gender": "Female",
                "day_and_month_of_birth": "1 January",
                "year_of_birth": 1984,
                "relationship": "In a relationship",
                "work": "Acme Corp",
                "education": "State University",
                "skype": "user.one"
            },
            "u2": {}
        })
    );
}

#[tokio::test]
async fn test_details_from_friends_output() {
    let cfg = config();
    let friends_page = r#"<div id="friends_center_main">
        <a href="/friends/hovercard/mbasic/?uid=11&amp;r=1">User One</a></div>"#;
    let source = MemorySource::new()
        .with_page(cfg.friends_url(), friends_page)
        .with_page(cfg.about_url("11"), about_markup());

    let mut scraper = Scraper::new(cfg, source);
    let friends = scraper.friends().await.unwrap();

    // The friends report is itself valid piped input for details.
    let piped = serde_json::to_string(&friends).unwrap();
    let keys = parse_entity_keys(&piped).unwrap();
    assert_eq!(keys, vec!["11"]);

    let report = scraper.friend_details(&keys, false).await.unwrap();
    assert_eq!(report["11"]["id"], json!(11));
}

#[test]
fn test_malformed_input_is_rejected() {
    assert!(matches!(
        parse_entity_keys("\"u1\""),
        Err(ScrapeError::Validation(_))
    ));
}

// ── Timeline and likes ──

#[tokio::test]
async fn test_timeline_report_shape() {
    let cfg = config();
    let page = r#"<div id="tlFeed">
        <div role="article">
          <abbr>Yesterday at 18:30</abbr>
          <span id="like_42"><a href="/like">Like</a></span>
          <a href="/ufi/reaction/profile/browser/?ft_ent_identifier=42">1,204</a>
          <a href="/story.php?story_fbid=42">17 Comments</a>
        </div>
        <div role="article">
          <abbr>whenever</abbr>
          <span id="like_41"><a href="/like">Like</a></span>
        </div>
    </div>"#;
    let source = MemorySource::new().with_page(cfg.timeline_url("u1"), page);
    let now = NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();

    let mut scraper = Scraper::new(cfg, source).with_now(now);
    let posts = scraper.timeline("u1").await.unwrap();

    assert_json_eq!(
        serde_json::to_value(&posts).unwrap(),
        json!({
            "42": {
                "id": 42,
                "timestamp": "2026-10-15T18:30:00",
                "display_time": "Yesterday at 18:30",
                "like_count": 1204,
                "comment_count": 17
            },
            "41": {
                "id": 41,
                "display_time": "whenever",
                "like_count": 0,
                "comment_count": 0
            }
        })
    );
}

// ── Presence ──

#[tokio::test]
async fn test_presence_polls_accumulate_in_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("active.json");

    // A previous run left one observation behind.
    let mut seed = PresenceLog::new();
    seed.observe("111", 50);
    snapshot::persist(&path, &seed).unwrap();

    let cfg = config();
    let body = r#"for (;;); {"t":"msg","ms":[
        {"type":"chatproxy-presence","buddyList":{"111":{"lat":50},"222":{"lat":70}}},
        {"type":"buddylist_overlay","overlay":{"111":{"la":90}}}
    ]}"#;
    let source = MemorySource::new().with_page(cfg.presence_url(), body);
    let mut scraper = Scraper::new(cfg, source);

    let mut log = snapshot::load(&path).unwrap();
    assert!(scraper.poll_presence(&mut log, Some(&path)).await.unwrap());
    assert!(!scraper.poll_presence(&mut log, Some(&path)).await.unwrap());

    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_json_eq!(on_disk, json!({"111": [50, 90], "222": [70]}));
    assert_eq!(scraper.source().requested().len(), 2);
}

#[test]
fn test_merge_is_idempotent_on_loaded_snapshot() {
    let mut first = PresenceLog::new();
    first.observe("111", 1);
    first.observe("111", 2);

    let (merged, changed) = merge(first.clone(), first.clone());
    assert!(!changed);
    assert_eq!(merged, first);
}
