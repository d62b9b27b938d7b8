//! Field normalizer: pure functions from raw extracted text to typed values.
//!
//! Mandatory identifiers fail loudly with [`ScrapeError::MalformedId`];
//! every other field degrades to omission when it cannot be parsed.

use crate::error::{ScrapeError, ScrapeResult};
use crate::extract::{RawAbout, RawArticle, RawFriendPage, ABOUT_LABELS};
use crate::model::{FriendEntry, Post, ProfileFields};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Relationship statuses, checked in this order against the section text.
pub const RELATIONSHIP_CHOICES: &[&str] = &[
    "In a relationship",
    "Engaged",
    "Married",
    "In a civil partnership",
    "In a domestic partnership",
    "In an open relationship",
    "It's complicated",
    "Separated",
    "Divorced",
    "Widowed",
    "Single",
];

/// Birthday split into the parts that were actually present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BirthdayParts {
    pub day_and_month: Option<String>,
    pub year: Option<i32>,
}

/// Split a free-text birthday such as `1 January 1984`, `January 1, 1984`,
/// `1 January` or `1984`.
pub fn split_birthday(raw: &str) -> BirthdayParts {
    let tokens: Vec<&str> = raw
        .split_whitespace()
        .map(|t| t.trim_end_matches(','))
        .filter(|t| !t.is_empty())
        .collect();

    let Some((last, rest)) = tokens.split_last() else {
        return BirthdayParts::default();
    };

    let year = (last.len() == 4 && last.chars().all(|c| c.is_ascii_digit()))
        .then(|| last.parse::<i32>().ok())
        .flatten();

    let day_tokens = if year.is_some() { rest } else { &tokens[..] };
    let day_and_month = (!day_tokens.is_empty()).then(|| day_tokens.join(" "));

    BirthdayParts {
        day_and_month,
        year,
    }
}

/// Parse a year such as `1984`; anything else is omitted.
pub fn parse_year(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|y| (1000..=9999).contains(y))
}

/// First non-empty entry in source document order.
pub fn first_entry(entries: &[String]) -> Option<String> {
    entries
        .iter()
        .map(|e| e.trim())
        .find(|e| !e.is_empty())
        .map(str::to_string)
}

/// First known relationship status mentioned in the section text.
pub fn relationship_status(text: &str) -> Option<&'static str> {
    RELATIONSHIP_CHOICES
        .iter()
        .find(|choice| text.contains(*choice))
        .copied()
}

/// Output field name for an about-page label, e.g. `Birth Name` → `birth_name`.
pub fn field_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            key.push(ch.to_ascii_lowercase());
        } else if !key.ends_with('_') {
            key.push('_');
        }
    }
    key.trim_matches('_').to_string()
}

/// Coerce an identifier to an integer.
pub fn parse_id(raw: &str) -> ScrapeResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ScrapeError::MalformedId(raw.to_string()))
}

/// Profile id from a timeline link such as `/mark?v=timeline&lst=1%3A4%3A2`.
pub fn entity_id_from_timeline_href(href: &str) -> ScrapeResult<u64> {
    let segment = href
        .split("%3A")
        .nth(1)
        .ok_or_else(|| ScrapeError::MalformedId(href.to_string()))?;
    parse_id(segment)
}

/// Post id from a like span id such as `like_1234`.
pub fn post_id_from_anchor(anchor_id: &str) -> ScrapeResult<u64> {
    let digits: String = anchor_id
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    parse_id(&digits).map_err(|_| ScrapeError::MalformedId(anchor_id.to_string()))
}

/// Profile key from a site-relative link: `/profile.php?id=123&…` → `123`,
/// `/username?fref=…` → `username`. Multi-segment paths are not profiles.
pub fn profile_key_from_href(href: &str) -> Option<String> {
    let href = href.trim();
    let rest = href.strip_prefix('/')?;
    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));

    if path == "profile.php" {
        return query
            .split('&')
            .find_map(|pair| pair.strip_prefix("id="))
            .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
            .map(str::to_string);
    }
    if path.is_empty() || path.contains('/') || path.ends_with(".php") {
        return None;
    }
    Some(path.to_string())
}

/// Integer count in display text: `5`, `1,234`, `3 Comments`, `1.2K`.
/// Missing or unparseable text counts as zero.
pub fn parse_count(text: Option<&str>) -> u64 {
    let Some(text) = text else {
        return 0;
    };
    let start = match text.find(|c: char| c.is_ascii_digit()) {
        Some(i) => i,
        None => return 0,
    };
    let number: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let suffix = text[start + number.len()..].chars().next();

    let multiplier = match suffix {
        Some('K') | Some('k') => 1_000.0,
        Some('M') | Some('m') if !text[start + number.len()..].starts_with("min") => 1_000_000.0,
        _ => 1.0,
    };
    if multiplier > 1.0 {
        let value: f64 = number.replace(',', "").parse().unwrap_or(0.0);
        return (value * multiplier).round() as u64;
    }
    number
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// Parse a display time relative to `now`.
///
/// Handles `Just now`, `15 mins`, `3 hrs`, `Yesterday at 10:02`,
/// `13 May 2008 at 10:02`, `May 13, 2008 at 10:02 AM`, and the same
/// without year (current year) or without time (midnight).
pub fn parse_display_time(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = text.to_ascii_lowercase();

    if lower == "just now" {
        return Some(now);
    }
    if let Some(ago) = relative_duration(&lower) {
        return now.checked_sub_signed(ago);
    }

    let (day_part, time_part) = match text.split_once(" at ") {
        Some((d, t)) => (d.trim(), Some(t.trim())),
        None => (text.as_str(), None),
    };
    let time = match time_part {
        Some(t) => parse_clock(t)?,
        None => NaiveTime::MIN,
    };

    let date = match day_part.to_ascii_lowercase().as_str() {
        "today" => now.date(),
        "yesterday" => now.date().pred_opt()?,
        _ => parse_calendar_date(day_part, now)?,
    };
    Some(date.and_time(time))
}

/// Offset for `15 mins` or `3 hrs`; `None` when unrecognized or out of range.
fn relative_duration(lower: &str) -> Option<Duration> {
    let (amount, unit) = lower.split_once(' ')?;
    let amount: i64 = amount.parse().ok()?;
    match unit {
        "min" | "mins" | "minute" | "minutes" => Duration::try_minutes(amount),
        "hr" | "hrs" | "hour" | "hours" => Duration::try_hours(amount),
        _ => None,
    }
}

fn parse_clock(text: &str) -> Option<NaiveTime> {
    ["%H:%M", "%I:%M %p", "%I:%M%p"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

fn parse_calendar_date(text: &str, now: NaiveDateTime) -> Option<NaiveDate> {
    const WITH_YEAR: &[&str] = &["%d %B %Y", "%B %d, %Y", "%B %d %Y"];

    if let Some(date) = WITH_YEAR
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Some(date);
    }
    // Posts from the current year omit it.
    let with_year = format!("{} {}", text.trim_end_matches(','), now.date().format("%Y"));
    ["%d %B %Y", "%B %d %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&with_year, fmt).ok())
}

/// Map raw about-page candidates to profile fields.
///
/// The profile id is mandatory; every other field is omitted when absent.
pub fn normalize_about(raw: &RawAbout) -> ScrapeResult<ProfileFields> {
    let mut fields = ProfileFields {
        name: raw.title.clone(),
        id: Some(entity_id_from_timeline_href(&raw.timeline_href)?),
        ..Default::default()
    };

    for label in ABOUT_LABELS {
        let Some(value) = first_entry(raw.candidates(label)) else {
            continue;
        };
        match *label {
            "Birthday" => {
                let parts = split_birthday(&value);
                fields.day_and_month_of_birth = parts.day_and_month;
                if parts.year.is_some() {
                    fields.year_of_birth = parts.year;
                }
            }
            "Year of birth" => {
                if fields.year_of_birth.is_none() {
                    fields.year_of_birth = parse_year(&value);
                }
            }
            "Address" => fields.address = Some(value),
            "Gender" => fields.gender = Some(value),
            "Interested in" => fields.interested_in = Some(value),
            "Languages" => fields.languages = Some(value),
            "Birth Name" => fields.birth_name = Some(value),
            "Maiden Name" => fields.maiden_name = Some(value),
            "Nickname" => fields.nickname = Some(value),
            "Mobile" => fields.mobile = Some(value),
            "Political Views" => fields.political_views = Some(value),
            "Religious views" => fields.religious_views = Some(value),
            "Websites" => fields.websites = Some(value),
            other => {
                fields.social.insert(field_key(other), value);
            }
        }
    }

    fields.work = first_entry(&raw.work);
    fields.education = first_entry(&raw.education);
    fields.relationship = raw
        .relationship
        .as_deref()
        .and_then(relationship_status)
        .map(str::to_string);

    Ok(fields)
}

/// Map a raw article to a post. The post id is mandatory.
pub fn normalize_article(raw: &RawArticle, now: NaiveDateTime) -> ScrapeResult<Post> {
    Ok(Post {
        id: post_id_from_anchor(&raw.like_anchor_id)?,
        timestamp: parse_display_time(&raw.display_time, now),
        display_time: raw.display_time.clone(),
        like_count: parse_count(raw.likes_text.as_deref()),
        comment_count: parse_count(raw.comments_text.as_deref()),
    })
}

/// Friend entries with a display name, in page order.
pub fn normalize_friends(page: &RawFriendPage) -> Vec<(String, FriendEntry)> {
    page.friends
        .iter()
        .map(|f| {
            let name = (!f.name.is_empty()).then(|| f.name.clone());
            (f.key.clone(), FriendEntry { name })
        })
        .collect()
}
