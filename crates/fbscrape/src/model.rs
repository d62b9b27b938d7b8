//! Typed records produced by the normalizer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Profile details from an about page. Absent fields are omitted from output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interested_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_and_month_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_of_birth: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maiden_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub political_views: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub religious_views: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websites: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    /// Messenger and social network handles (`skype`, `twitter`, ...).
    #[serde(flatten)]
    pub social: BTreeMap<String, String>,
}

/// A friend list entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A timeline post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    /// Parsed display time; omitted when the display text is not understood.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
    pub display_time: String,
    pub like_count: u64,
    pub comment_count: u64,
}

/// One like: which post, and when that post was published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEvent {
    pub post_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_fields_omitted() {
        let fields = ProfileFields {
            name: Some("Mark".into()),
            id: Some(4),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&fields).unwrap(),
            json!({"name": "Mark", "id": 4})
        );
    }

    #[test]
    fn test_social_handles_flattened() {
        let mut fields = ProfileFields::default();
        fields.social.insert("skype".into(), "mark.s".into());
        fields.year_of_birth = Some(1984);
        assert_eq!(
            serde_json::to_value(&fields).unwrap(),
            json!({"year_of_birth": 1984, "skype": "mark.s"})
        );
    }

    #[test]
    fn test_post_timestamp_format() {
        let post = Post {
            id: 1,
            timestamp: NaiveDateTime::parse_from_str("2008-05-13 10:02", "%Y-%m-%d %H:%M").ok(),
            display_time: "13 May 2008 at 10:02".into(),
            like_count: 0,
            comment_count: 0,
        };
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["timestamp"], json!("2008-05-13T10:02:00"));
    }
}
