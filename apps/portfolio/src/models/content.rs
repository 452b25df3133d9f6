use serde::{Deserialize, Serialize};

use crate::models::identifier::Identifier;
use crate::repository::store::{Direction, Record, Table};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: Identifier,
    pub name: String,
    pub tagline: String,
    pub bio: String,
    pub avatar_url: String,
    pub logo_url: Option<String>,
    pub cv_url: String,
    pub portfolio_url: Option<String>,
    pub years_experience: Option<String>,
    pub brands_handled: Option<String>,
    pub email: String,
    pub github: String,
    pub linkedin: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceKind {
    #[default]
    Work,
    Education,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub id: Identifier,
    pub role: String,
    pub company: String,
    /// Free-text label such as "2020 - 2022"; not a parsed range.
    pub period: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ExperienceKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub id: Identifier,
    pub name: String,
    pub category: String,
    /// Proficiency percentage. Stored as entered; only rendering clamps it.
    pub level: i32,
}

impl Skill {
    pub fn display_level(&self) -> i32 {
        self.level.clamp(0, 100)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: Identifier,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub gallery: Vec<String>,
    pub tags: Vec<String>,
    pub category: String,
    pub demo_url: Option<String>,
    pub repo_url: Option<String>,
}

impl Project {
    /// Carousel slides: the gallery, or the main image alone when the gallery is empty.
    pub fn slides(&self) -> Vec<&str> {
        let gallery: Vec<&str> = self
            .gallery
            .iter()
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
            .collect();
        if gallery.is_empty() {
            vec![self.image_url.as_str()]
        } else {
            gallery
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPost {
    pub id: Identifier,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub cover_image: String,
    /// Timestamp as stored by the backend (ISO-8601, date part may stand alone).
    pub created_at: String,
    pub category: String,
    pub slug: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub tags: Vec<String>,
}

impl BlogPost {
    /// Path segment of the detail page: the slug when set, else the id.
    pub fn address(&self) -> String {
        match non_empty(&self.slug) {
            Some(slug) => slug.to_string(),
            None => self.id.to_string(),
        }
    }

    /// Detail page URL with the address percent-encoded as one path segment.
    pub fn path(&self) -> String {
        format!("/blog/{}", urlencoding::encode(&self.address()))
    }

    pub fn published_on(&self) -> &str {
        self.created_at.get(..10).unwrap_or(&self.created_at)
    }
}

/// Treats a blank optional text field as absent.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Finds the post a detail URL points at: slug first, then raw id.
pub fn find_post<'a>(posts: &'a [BlogPost], address: &str) -> Option<&'a BlogPost> {
    posts
        .iter()
        .find(|p| non_empty(&p.slug) == Some(address))
        .or_else(|| posts.iter().find(|p| p.id.as_existing() == Some(address)))
}

impl Record for Profile {
    const TABLE: Table = Table {
        name: "profiles",
        columns: &[
            "id",
            "name",
            "tagline",
            "bio",
            "avatar_url",
            "logo_url",
            "cv_url",
            "portfolio_url",
            "years_experience",
            "brands_handled",
            "email",
            "github",
            "linkedin",
        ],
        order: None,
    };

    fn id(&self) -> &Identifier {
        &self.id
    }
}

impl Record for Experience {
    const TABLE: Table = Table {
        name: "experiences",
        columns: &["id", "role", "company", "period", "description", "type"],
        order: Some(("period", Direction::Desc)),
    };

    fn id(&self) -> &Identifier {
        &self.id
    }
}

impl Record for Skill {
    const TABLE: Table = Table {
        name: "skills",
        columns: &["id", "name", "category", "level"],
        order: None,
    };

    fn id(&self) -> &Identifier {
        &self.id
    }
}

impl Record for Project {
    const TABLE: Table = Table {
        name: "projects",
        columns: &[
            "id",
            "title",
            "description",
            "image_url",
            "gallery",
            "tags",
            "category",
            "demo_url",
            "repo_url",
        ],
        order: None,
    };

    fn id(&self) -> &Identifier {
        &self.id
    }
}

impl Record for BlogPost {
    const TABLE: Table = Table {
        name: "posts",
        columns: &[
            "id",
            "title",
            "excerpt",
            "content",
            "cover_image",
            "created_at",
            "category",
            "slug",
            "meta_title",
            "meta_description",
            "tags",
        ],
        order: Some(("created_at", Direction::Desc)),
    };

    fn id(&self) -> &Identifier {
        &self.id
    }
}
