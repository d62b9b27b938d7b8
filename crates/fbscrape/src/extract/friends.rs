//! Friend-list extraction: the logged-in account's friends center and a
//! profile's mutual friends list.
//!
//! JavaScript has to be disabled when fetching these pages, otherwise the
//! markup does not contain the user ids. The mobile basic site never runs
//! scripts, which is why the default base URL points there.

use super::{css, link_by_text, text_of, PageSelector, Selection};
use crate::normalize::profile_key_from_href;
use regex::Regex;
use scraper::Html;

/// One friend link: the profile key (numeric id or username) and the display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFriend {
    pub key: String,
    pub name: String,
}

/// One page of a friend list plus the link to the next page, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFriendPage {
    pub friends: Vec<RawFriend>,
    pub next: Option<String>,
}

/// The friends center (`#friends_center_main`), keyed by numeric `uid`.
pub struct FriendsSelector {
    uid: Regex,
}

impl FriendsSelector {
    pub fn new() -> Self {
        Self {
            uid: Regex::new(r"uid=(\d+)").expect("static regex is valid"),
        }
    }
}

impl Default for FriendsSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSelector for FriendsSelector {
    type Output = RawFriendPage;
    const PAGE: &'static str = "friends";

    fn select(&self, document: &Html) -> Selection<RawFriendPage> {
        let Some(main) = document.select(&css("#friends_center_main")).next() else {
            return Selection::NotFound;
        };

        let mut page = RawFriendPage::default();
        for link in main.select(&css("a[href]")) {
            let href = link.value().attr("href").unwrap_or("");
            if let Some(uid) = self.uid.captures(href).and_then(|c| c.get(1)) {
                page.friends.push(RawFriend {
                    key: uid.as_str().to_string(),
                    name: text_of(&link),
                });
            } else if page.next.is_none()
                && href.contains("/friends/center/friends/")
                && href.contains("ppk=")
            {
                page.next = Some(href.split_whitespace().collect());
            }
        }
        Selection::Found(page)
    }
}

/// A profile's mutual friends list (`#root`), keyed by profile key.
#[derive(Default)]
pub struct MutualFriendsSelector;

impl PageSelector for MutualFriendsSelector {
    type Output = RawFriendPage;
    const PAGE: &'static str = "mutual friends";

    fn select(&self, document: &Html) -> Selection<RawFriendPage> {
        let Some(root) = document.select(&css("#root")).next() else {
            return Selection::NotFound;
        };

        let friends = root
            .select(&css(r#"a[href*="fref=fr_tab"]"#))
            .filter_map(|link| {
                let key = profile_key_from_href(link.value().attr("href")?)?;
                let name = text_of(&link);
                (!name.is_empty()).then_some(RawFriend { key, name })
            })
            .collect();

        Selection::Found(RawFriendPage {
            friends,
            next: link_by_text(&root, &["See more", "See More Friends"]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::extract::extract;

    #[test]
    fn test_friends_page_two_friends() {
        let html = r#"
            <div id="friends_center_main">
                <a href="/privacyx/selector/"></a>
                <a class="bn" href="/friends/hovercard/mbasic/?
                    uid=111&amp;redirectURI=https%3A%2F%2Fm.facebook.com
                ">Mark</a>
                <a class="bn" href="/friends/hovercard/mbasic/?
                    uid=222&amp;redirectURI=https%3A%2F%2Fm.facebook.com
                ">Dave</a>
                <a href="/friends/center/friends/?ppk=1&amp;tid=u_0_0&amp;bph=1#friends_center_main">See more</a>
            </div>"#;

        let page = extract(html, &FriendsSelector::new()).unwrap();
        assert_eq!(
            page.friends,
            vec![
                RawFriend { key: "111".into(), name: "Mark".into() },
                RawFriend { key: "222".into(), name: "Dave".into() },
            ]
        );
        assert_eq!(
            page.next.as_deref(),
            Some("/friends/center/friends/?ppk=1&tid=u_0_0&bph=1#friends_center_main")
        );
    }

    #[test]
    fn test_friends_page_without_friends() {
        let html = r#"<div id="friends_center_main"><a href="/privacyx/selector/"></a></div>"#;
        let page = extract(html, &FriendsSelector::new()).unwrap();
        assert!(page.friends.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_empty_document_is_structure_not_found() {
        let err = extract("", &FriendsSelector::new()).unwrap_err();
        assert!(matches!(err, ScrapeError::StructureNotFound { page: "friends", .. }));
    }

    #[test]
    fn test_mutual_friends_keys_and_next_link() {
        let html = r#"
            <div id="root">
                <table><tr><td><a href="/paul.smith?fref=fr_tab">Paul Smith</a></td></tr></table>
                <table><tr><td><a href="/profile.php?id=333&amp;fref=fr_tab">Anna</a></td></tr></table>
                <div id="m_more_mutual_friends"><a href="/mark/friends?mutual=1&amp;startindex=24">See More Friends</a></div>
            </div>"#;

        let page = extract(html, &MutualFriendsSelector).unwrap();
        assert_eq!(
            page.friends,
            vec![
                RawFriend { key: "paul.smith".into(), name: "Paul Smith".into() },
                RawFriend { key: "333".into(), name: "Anna".into() },
            ]
        );
        assert_eq!(
            page.next.as_deref(),
            Some("/mark/friends?mutual=1&startindex=24")
        );
    }
}
