//! Reaction-page extraction: who liked a post.

use super::{css, PageSelector, Selection};
use crate::normalize::profile_key_from_href;
use scraper::Html;

/// Links inside the reactions container that never point at a person.
const NON_PROFILE_LINKS: &[&str] = &["add_friend.php", "ufi/reaction", "home.php?"];

/// One page of likers plus the link to the next page, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLikersPage {
    /// Profile keys (username or numeric id), in document order.
    pub likers: Vec<String>,
    pub next: Option<String>,
}

#[derive(Default)]
pub struct LikersSelector;

impl PageSelector for LikersSelector {
    type Output = RawLikersPage;
    const PAGE: &'static str = "likers";

    fn select(&self, document: &Html) -> Selection<RawLikersPage> {
        let Some(container) = document.select(&css("#objects_container")).next() else {
            return Selection::NotFound;
        };

        let mut page = RawLikersPage::default();
        for link in container.select(&css(r#"a[href^="/"]"#)) {
            let attrs = link.value();
            let href = attrs.attr("href").unwrap_or("");

            if page.next.is_none() && href.contains("ufi/reaction/profile/browser/fetch") {
                page.next = Some(href.to_string());
                continue;
            }
            if attrs.attr("role").is_some()
                || NON_PROFILE_LINKS.iter().any(|bad| href.contains(bad))
            {
                continue;
            }
            if let Some(key) = profile_key_from_href(href) {
                page.likers.push(key);
            }
        }
        Selection::Found(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::extract::extract;

    #[test]
    fn test_likers_filters_non_profile_links() {
        let html = r#"
            <div id="objects_container">
                <a role="button" href="/ufi/badLink">All 2</a>
                <a class="bn" href="/username1">Mark</a>
                <a class="bn" href="bad/Link1">Mark</a>
                <a class="bn" href="/username2">Paul</a>
                <a href="/a/mobile/friends/add_friend.php?id=123"></a>
                <a class="bn" href="badLink2">Dave</a>
                <a href="/ufi/reaction/profile/browser/fetch/?limit=10&amp;shown_ids=1">See more</a>
            </div>"#;

        let page = extract(html, &LikersSelector).unwrap();
        assert_eq!(page.likers, vec!["username1", "username2"]);
        assert_eq!(
            page.next.as_deref(),
            Some("/ufi/reaction/profile/browser/fetch/?limit=10&shown_ids=1")
        );
    }

    #[test]
    fn test_unavailable_post_has_no_likers() {
        let html = r#"
            <div id="objects_container">
                <span>The page you requested cannot be displayed</span>
                <a href="/home.php?rand=852723744">Back to home</a>
            </div>"#;

        let page = extract(html, &LikersSelector).unwrap();
        assert!(page.likers.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn test_login_page() {
        let html = r#"<input name="login" type="submit" value="Log In">"#;
        assert!(matches!(
            extract(html, &LikersSelector),
            Err(ScrapeError::StructureNotFound { page: "likers", .. })
        ));
    }
}
