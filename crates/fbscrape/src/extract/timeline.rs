//! Timeline extraction: posts, year navigation links and the "Show more" link.

use super::{css, link_by_text, text_of, PageSelector, Selection};
use regex::Regex;
use scraper::{ElementRef, Html};

/// One timeline post as found in the markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawArticle {
    /// `id` of the like span, e.g. `like_1234`; carries the post id.
    pub like_anchor_id: String,
    /// Display time from the `<abbr>` element.
    pub display_time: String,
    /// Text of the reactions link, e.g. `12`.
    pub likes_text: Option<String>,
    /// Text of the comments link, e.g. `3 Comments`.
    pub comments_text: Option<String>,
}

/// Everything extracted from one timeline page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTimeline {
    pub articles: Vec<RawArticle>,
    /// Links to per-year sections, in document order.
    pub year_links: Vec<String>,
    /// Link to the next chunk of posts; `None` on the last page.
    pub show_more: Option<String>,
}

pub struct TimelineSelector {
    like_id: Regex,
    year: Regex,
    comments: Regex,
}

impl TimelineSelector {
    pub fn new() -> Self {
        Self {
            like_id: Regex::new(r"^like_\d+").expect("static regex is valid"),
            year: Regex::new(r"\d{4}").expect("static regex is valid"),
            comments: Regex::new(r"(?i)^\d[\d,.]*\s*comments?\b").expect("static regex is valid"),
        }
    }

    fn article(&self, article: &ElementRef<'_>) -> Option<RawArticle> {
        let Some(abbr) = article.select(&css("abbr")).next() else {
            tracing::debug!("skipping article without timestamp, likely a shared original");
            return None;
        };

        let Some(like_anchor_id) = article
            .select(&css("[id]"))
            .filter_map(|el| el.value().attr("id"))
            .find(|id| self.like_id.is_match(id))
        else {
            tracing::debug!("skipping article without a like link");
            return None;
        };

        let likes_text = article
            .select(&css(r#"a[href*="/ufi/reaction/profile/browser/"]"#))
            .map(|a| text_of(&a))
            .find(|t| !t.is_empty());

        let comments_text = article
            .select(&css("a"))
            .map(|a| text_of(&a))
            .find(|t| self.comments.is_match(t));

        Some(RawArticle {
            like_anchor_id: like_anchor_id.to_string(),
            display_time: text_of(&abbr),
            likes_text,
            comments_text,
        })
    }
}

impl Default for TimelineSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSelector for TimelineSelector {
    type Output = RawTimeline;
    const PAGE: &'static str = "timeline";

    fn select(&self, document: &Html) -> Selection<RawTimeline> {
        let Some(feed) = document.select(&css("#tlFeed")).next() else {
            return Selection::NotFound;
        };

        let articles = feed
            .select(&css(r#"div[role="article"]"#))
            .filter_map(|a| self.article(&a))
            .collect();

        let year_links = feed
            .select(&css("a[href]"))
            .filter(|a| self.year.is_match(&text_of(a)))
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect();

        let show_more = link_by_text(&document.root_element(), &["Show more"]);

        Selection::Found(RawTimeline {
            articles,
            year_links,
            show_more,
        })
    }
}
