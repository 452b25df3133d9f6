//! Built-in content served while no backend is reachable, so the public site
//! is never blank during first-run setup. None of it is ever written back
//! automatically.

use crate::models::content::{BlogPost, Experience, ExperienceKind, Profile, Project, Skill};
use crate::models::identifier::Identifier;

/// Stable, well-formed UUIDs so fallback entries can still be opened in the editor.
fn builtin_id(seq: u32) -> Identifier {
    Identifier::existing(format!("00000000-0000-4000-8000-{seq:012x}"))
}

/// The default profile has no id: saving it creates (or adopts) the real row.
pub fn profile() -> Profile {
    Profile {
        id: Identifier::New,
        name: "Alex Pradana".into(),
        tagline: "Digital Marketer & Creative Generalist".into(),
        bio: "I help brands grow with measurable digital strategy and visuals that \
              stick. Design, content and a fast website, handled end to end."
            .into(),
        avatar_url: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?fit=crop&w=400&h=400"
            .into(),
        logo_url: None,
        cv_url: "#".into(),
        portfolio_url: Some("#".into()),
        years_experience: Some("4+".into()),
        brands_handled: Some("20+".into()),
        email: "alex@example.com".into(),
        github: "https://github.com".into(),
        linkedin: "https://linkedin.com".into(),
    }
}

pub fn experiences() -> Vec<Experience> {
    let entry = |seq, role: &str, company: &str, period: &str, description: &str, kind| Experience {
        id: builtin_id(seq),
        role: role.into(),
        company: company.into(),
        period: period.into(),
        description: description.into(),
        kind,
    };
    vec![
        entry(
            0x101,
            "Digital Marketing Lead",
            "Growth Agency",
            "2022 - Present",
            "Runs monthly paid-media budgets across industries; lifted average ROAS by 3x.",
            ExperienceKind::Work,
        ),
        entry(
            0x102,
            "Content Specialist & Web Admin",
            "Creative Studio",
            "2020 - 2022",
            "Owned social content strategy and client WordPress maintenance.",
            ExperienceKind::Work,
        ),
        entry(
            0x103,
            "Freelance WordPress Developer",
            "Self Employed",
            "2019 - 2020",
            "Landing pages and company profiles for small businesses.",
            ExperienceKind::Work,
        ),
        entry(
            0x104,
            "B.A. Communication Studies",
            "University of Indonesia",
            "2015 - 2019",
            "Advertising and public relations track, graduated cum laude.",
            ExperienceKind::Education,
        ),
    ]
}

pub fn skills() -> Vec<Skill> {
    let skill = |seq, name: &str, category: &str, level| Skill {
        id: builtin_id(seq),
        name: name.into(),
        category: category.into(),
        level,
    };
    vec![
        skill(0x201, "SEO & SEM", "Marketing", 90),
        skill(0x202, "Meta Ads", "Marketing", 95),
        skill(0x203, "Google Analytics 4", "Marketing", 85),
        skill(0x204, "Canva & Photoshop", "Creative", 85),
        skill(0x205, "Video Editing", "Creative", 80),
        skill(0x206, "WordPress", "Web Dev", 90),
        skill(0x207, "HTML/CSS", "Web Dev", 75),
        skill(0x208, "Client Management", "Soft Skills", 90),
    ]
}

pub fn projects() -> Vec<Project> {
    vec![
        Project {
            id: builtin_id(0x301),
            title: "Growth Marketing for a Fashion Label".into(),
            description: "SEO, short-form video and conversion ads combined into one \
                          campaign; revenue doubled within three months."
                .into(),
            image_url: "https://images.unsplash.com/photo-1556740758-90de374c12ad?auto=format&fit=crop&w=800&q=80"
                .into(),
            gallery: vec![
                "https://images.unsplash.com/photo-1556740758-90de374c12ad?auto=format&fit=crop&w=800&q=80".into(),
                "https://images.unsplash.com/photo-1460925895917-afdab827c52f?auto=format&fit=crop&w=800&q=80".into(),
            ],
            tags: vec!["Meta Ads".into(), "SEO".into(), "Content Strategy".into()],
            category: "Digital Marketing".into(),
            demo_url: Some("#".into()),
            repo_url: None,
        },
        Project {
            id: builtin_id(0x302),
            title: "Corporate Company Profile".into(),
            description: "WordPress build focused on Core Web Vitals and a mobile-first layout.".into(),
            image_url: "https://images.unsplash.com/photo-1460925895917-afdab827c52f?auto=format&fit=crop&w=800&q=80"
                .into(),
            gallery: Vec::new(),
            tags: vec!["WordPress".into(), "CSS".into()],
            category: "WordPress Dev".into(),
            demo_url: Some("#".into()),
            repo_url: None,
        },
        Project {
            id: builtin_id(0x303),
            title: "Coffee Shop Rebrand".into(),
            description: "Logo, menu, packaging and social feed for a neighbourhood roastery.".into(),
            image_url: "https://images.unsplash.com/photo-1511920170033-f8396924c348?auto=format&fit=crop&w=800&q=80"
                .into(),
            gallery: Vec::new(),
            tags: vec!["Branding".into(), "Social Media".into()],
            category: "Creative".into(),
            demo_url: None,
            repo_url: None,
        },
    ]
}

pub fn posts() -> Vec<BlogPost> {
    let post = |seq, title: &str, slug: &str, excerpt: &str, created_at: &str, category: &str| BlogPost {
        id: builtin_id(seq),
        title: title.into(),
        excerpt: excerpt.into(),
        content: format!("## {title}\n\n{excerpt}\n\n- Draft content\n- Replace from the dashboard"),
        cover_image: "https://images.unsplash.com/photo-1571721795195-a2ca2d337096?auto=format&fit=crop&w=800&q=80"
            .into(),
        created_at: created_at.into(),
        category: category.into(),
        slug: Some(slug.into()),
        meta_title: None,
        meta_description: None,
        tags: vec![category.to_string()],
    };
    vec![
        post(
            0x401,
            "SEO Strategy for 2024",
            "seo-strategy-2024",
            "Search keeps changing. A practical checklist for staying on page one.",
            "2024-01-10",
            "SEO",
        ),
        post(
            0x402,
            "WordPress vs Site Builders",
            "wordpress-vs-site-builders",
            "Why WordPress still wins for long-lived business sites.",
            "2023-11-20",
            "WordPress",
        ),
        post(
            0x403,
            "Copy That Sells",
            "copy-that-sells",
            "Headlines and calls to action that measurably lift conversion.",
            "2023-10-15",
            "Copywriting",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_collections_are_never_empty() {
        assert!(!experiences().is_empty());
        assert!(!skills().is_empty());
        assert!(!projects().is_empty());
        assert!(!posts().is_empty());
    }

    #[test]
    fn test_builtin_ids_are_uuids() {
        let id = builtin_id(0x101);
        let raw = id.as_existing().unwrap();
        assert_eq!(raw.len(), 36);
        assert!(uuid::Uuid::parse_str(raw).is_ok());
    }
}
