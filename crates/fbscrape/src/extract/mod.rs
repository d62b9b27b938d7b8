//! Markup extractor: locate page regions and pull out raw field candidates.
//!
//! Each page kind has its own [`PageSelector`]. A selector either finds its
//! top-level container and returns raw candidates (possibly several per
//! logical field, in document order), or reports [`Selection::NotFound`].
//! [`extract`] turns a missing container into
//! [`ScrapeError::StructureNotFound`], so a stale extractor is never
//! mistaken for an empty page.

pub mod about;
pub mod friends;
pub mod likers;
pub mod presence;
pub mod timeline;

pub use about::{AboutSelector, RawAbout, ABOUT_LABELS};
pub use friends::{FriendsSelector, MutualFriendsSelector, RawFriend, RawFriendPage};
pub use likers::{LikersSelector, RawLikersPage};
pub use presence::parse_presence;
pub use timeline::{RawArticle, RawTimeline, TimelineSelector};

use crate::error::{MissingCause, ScrapeError, ScrapeResult};
use scraper::{ElementRef, Html, Selector};

/// Outcome of running a selector against a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<T> {
    Found(T),
    NotFound,
}

/// Page-kind specific extraction.
pub trait PageSelector {
    type Output;

    /// Page kind, used in error messages and logs.
    const PAGE: &'static str;

    fn select(&self, document: &Html) -> Selection<Self::Output>;
}

/// Parse markup and run a selector over it.
pub fn extract<S: PageSelector>(markup: &str, selector: &S) -> ScrapeResult<S::Output> {
    let document = Html::parse_document(markup);
    match selector.select(&document) {
        Selection::Found(output) => Ok(output),
        Selection::NotFound => {
            let cause = if has_login_form(&document) {
                MissingCause::LoginRequired
            } else {
                MissingCause::LayoutChanged
            };
            tracing::error!(page = S::PAGE, "failed to parse page: {cause}");
            Err(ScrapeError::StructureNotFound {
                page: S::PAGE,
                cause,
            })
        }
    }
}

fn has_login_form(document: &Html) -> bool {
    document
        .select(&css(r#"input[name="login"]"#))
        .next()
        .is_some()
}

/// Compile a selector written in this crate.
pub(crate) fn css(selector: &'static str) -> Selector {
    Selector::parse(selector).expect("static CSS selector is valid")
}

/// Visible text of an element with whitespace collapsed.
pub(crate) fn text_of(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Href of the first anchor whose text starts with one of the given labels.
pub(crate) fn link_by_text(root: &ElementRef<'_>, labels: &[&str]) -> Option<String> {
    root.select(&css("a[href]"))
        .find(|a| {
            let text = text_of(a).to_ascii_lowercase();
            labels
                .iter()
                .any(|label| text.starts_with(&label.to_ascii_lowercase()))
        })
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
}
