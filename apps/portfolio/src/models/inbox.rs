//! Content submitted by visitors: comments, contact messages, newsletter sign-ups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::identifier::Identifier;
use crate::repository::store::{Direction, Record, Table};

pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: Identifier,
    pub post_id: String,
    pub user_name: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMessage {
    pub id: Identifier,
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subscriber {
    pub id: Identifier,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A comment as typed into the public form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentDraft {
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub content: String,
}

impl CommentDraft {
    pub fn into_comment(self) -> Comment {
        let user_name = match self.user_name.trim() {
            "" => ANONYMOUS.to_string(),
            name => name.to_string(),
        };
        Comment {
            id: Identifier::New,
            post_id: self.post_id,
            user_name,
            content: self.content,
            created_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl MessageDraft {
    pub fn into_message(self) -> ContactMessage {
        ContactMessage {
            id: Identifier::New,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message,
            created_at: None,
        }
    }
}

pub fn format_timestamp(at: &Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

impl Record for Comment {
    const TABLE: Table = Table {
        name: "comments",
        columns: &["id", "post_id", "user_name", "content", "created_at"],
        order: Some(("created_at", Direction::Desc)),
    };

    fn id(&self) -> &Identifier {
        &self.id
    }
}

impl Record for ContactMessage {
    const TABLE: Table = Table {
        name: "messages",
        columns: &["id", "name", "email", "message", "created_at"],
        order: Some(("created_at", Direction::Desc)),
    };

    fn id(&self) -> &Identifier {
        &self.id
    }
}

impl Record for Subscriber {
    const TABLE: Table = Table {
        name: "subscribers",
        columns: &["id", "email", "created_at"],
        order: Some(("created_at", Direction::Desc)),
    };

    fn id(&self) -> &Identifier {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_comment_author_becomes_anonymous() {
        let draft = CommentDraft {
            post_id: "p1".into(),
            user_name: "   ".into(),
            content: "Nice read".into(),
        };
        assert_eq!(draft.into_comment().user_name, ANONYMOUS);
    }

    #[test]
    fn test_unsaved_comment_omits_created_at() {
        let comment = CommentDraft {
            post_id: "p1".into(),
            user_name: "Rina".into(),
            content: "Thanks".into(),
        }
        .into_comment();
        let value = serde_json::to_value(&comment).unwrap();
        assert!(value.get("created_at").is_none());
        assert_eq!(value["user_name"], "Rina");
    }
}
