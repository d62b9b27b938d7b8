//! About-page extraction.
//!
//! The container is the profile's timeline link, which carries the numeric
//! id in its `lst` query parameter. Without it there is no way to tell whose
//! page this is, so its absence is a structural failure.

use super::{css, text_of, PageSelector, Selection};
use regex::Regex;
use scraper::{ElementRef, Html};

/// Labels of the about-page rows that are extracted. Any other row is ignored.
pub const ABOUT_LABELS: &[&str] = &[
    "AIM",
    "Address",
    "BBM",
    "Birth Name",
    "Birthday",
    "Facebook",
    "Foursquare",
    "Gadu-Gadu",
    "Gender",
    "ICQ",
    "Instagram",
    "Interested in",
    "Languages",
    "LinkedIn",
    "Maiden Name",
    "Mobile",
    "Nickname",
    "Political Views",
    "Religious views",
    "Skype",
    "Snapchat",
    "Twitter",
    "VK",
    "Websites",
    "Windows Live Messenger",
    "Year of birth",
];

/// Raw candidates from an about page, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAbout {
    /// Page `<title>` text, which is the profile name.
    pub title: Option<String>,
    /// Href of the timeline link holding the numeric id.
    pub timeline_href: String,
    /// Candidate values per known label, in document order.
    pub labelled: Vec<(&'static str, Vec<String>)>,
    /// `alt` texts of the work section images, in document order.
    pub work: Vec<String>,
    /// `alt` texts of the education section images, in document order.
    pub education: Vec<String>,
    /// Full text of the relationship section.
    pub relationship: Option<String>,
}

impl RawAbout {
    /// Candidates for a label; empty when the row is absent.
    pub fn candidates(&self, label: &str) -> &[String] {
        self.labelled
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }
}

pub struct AboutSelector {
    timeline_href: Regex,
}

impl AboutSelector {
    pub fn new() -> Self {
        Self {
            timeline_href: Regex::new(r"^/.*\?v=timeline.lst=\d+%3A\d+%3A")
                .expect("static regex is valid"),
        }
    }
}

impl Default for AboutSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSelector for AboutSelector {
    type Output = RawAbout;
    const PAGE: &'static str = "about";

    fn select(&self, document: &Html) -> Selection<RawAbout> {
        let Some(timeline_href) = document
            .select(&css("a[href]"))
            .filter_map(|a| a.value().attr("href"))
            .find(|href| self.timeline_href.is_match(href))
            .map(str::to_string)
        else {
            return Selection::NotFound;
        };

        let title = document
            .select(&css("title"))
            .next()
            .map(|t| text_of(&t))
            .filter(|t| !t.is_empty());

        let rows = css("div[title]");
        let mut labelled: Vec<(&'static str, Vec<String>)> = Vec::new();
        for row in document.select(&rows) {
            let Some(title_attr) = row.value().attr("title") else {
                continue;
            };
            let Some(label) = ABOUT_LABELS.iter().find(|l| **l == title_attr) else {
                continue;
            };
            let value = row_value(&row, label);
            match labelled.iter_mut().find(|(l, _)| l == label) {
                Some((_, values)) => values.push(value),
                None => labelled.push((*label, vec![value])),
            }
        }

        let relationship = document
            .select(&css("div#relationship"))
            .next()
            .map(|el| text_of(&el));

        Selection::Found(RawAbout {
            title,
            timeline_href,
            labelled,
            work: section_image_alts(document, "div#work"),
            education: section_image_alts(document, "div#education"),
            relationship,
        })
    }
}

/// Text of a labelled row without the label itself and the " · Edit" decoration.
fn row_value(row: &ElementRef<'_>, label: &str) -> String {
    row.text()
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != label && *t != "·" && *t != "Edit")
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn section_image_alts(document: &Html, section: &'static str) -> Vec<String> {
    let img = css("img[alt]");
    document
        .select(&css(section))
        .flat_map(|s| s.select(&img).collect::<Vec<_>>())
        .filter_map(|img| img.value().attr("alt"))
        .map(|alt| alt.trim().to_string())
        .filter(|alt| !alt.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MissingCause, ScrapeError};
    use crate::extract::extract;

    const TIMELINE_LINK: &str = r#"<a href="/mark?v=timeline&amp;lst=1%3A4%3A2">Timeline</a>"#;

    fn about(body: &str) -> RawAbout {
        let html = format!("<html><body>{TIMELINE_LINK}{body}</body></html>");
        extract(&html, &AboutSelector::new()).unwrap()
    }

    #[test]
    fn test_title_and_timeline_href() {
        let html = format!(
            r#"<html><head><title id="pageTitle">Mark Zuckerberg</title></head><body>{TIMELINE_LINK}</body></html>"#
        );
        let raw = extract(&html, &AboutSelector::new()).unwrap();
        assert_eq!(raw.title.as_deref(), Some("Mark Zuckerberg"));
        assert_eq!(raw.timeline_href, "/mark?v=timeline&lst=1%3A4%3A2");
    }

    #[test]
    fn test_missing_timeline_link_is_structure_not_found() {
        let err = extract("<title>Someone</title>", &AboutSelector::new()).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::StructureNotFound {
                page: "about",
                cause: MissingCause::LayoutChanged
            }
        ));
    }

    #[test]
    fn test_labelled_row_plain() {
        let raw = about(
            r#"<div class="timeline aboutme">
                 <div class="dc dd dq" title="Birthday"><div class="dv">14 May 1984</div></div>
               </div>"#,
        );
        assert_eq!(raw.candidates("Birthday"), ["14 May 1984".to_string()]);
    }

    #[test]
    fn test_labelled_row_with_edit_decoration() {
        let raw = about(
            r#"<div class="_5cds _2lcw _5cdu" title="Gender">
                 <span class="du dm x">Gender</span>
                 <span aria-hidden="true"> · </span>
                 <span class="dl">Edit</span>
                 <div class="_5cdv r">Male</div>
               </div>"#,
        );
        assert_eq!(raw.candidates("Gender"), ["Male".to_string()]);
    }

    #[test]
    fn test_unknown_labels_ignored() {
        let raw = about(r#"<div title="Favourite Colour"><div>Blue</div></div>"#);
        assert!(raw.labelled.is_empty());
        assert!(raw.candidates("Favourite Colour").is_empty());
    }

    #[test]
    fn test_multiple_candidates_kept_in_order() {
        let raw = about(
            r#"<div title="Mobile"><div>111</div></div>
               <div title="Mobile"><div>222</div></div>"#,
        );
        assert_eq!(
            raw.candidates("Mobile"),
            ["111".to_string(), "222".to_string()]
        );
    }

    #[test]
    fn test_work_and_education_alts_in_document_order() {
        let raw = about(
            r#"<div id="work">
                 <a class="bm" href=""><img src="" alt="1st work"></a>
                 <a class="bm" href=""><img src="" alt="2nd work"></a>
               </div>
               <div id="education">
                 <a class="bm" href=""><img src="" alt="1st education"></a>
               </div>"#,
        );
        assert_eq!(raw.work, vec!["1st work", "2nd work"]);
        assert_eq!(raw.education, vec!["1st education"]);
    }

    #[test]
    fn test_relationship_text() {
        let raw = about(
            r#"<div id="relationship"><div class="cq">Relationship</div><div class="cu do cv">Married to <a class="bu" href="/someone">Someone</a> since 14 March 2010</div></div>"#,
        );
        assert_eq!(
            raw.relationship.as_deref(),
            Some("Relationship Married to Someone since 14 March 2010")
        );
    }

    #[test]
    fn test_absent_sections_are_empty() {
        let raw = about("");
        assert!(raw.work.is_empty());
        assert!(raw.education.is_empty());
        assert!(raw.relationship.is_none());
        assert!(raw.title.is_none());
    }
}
