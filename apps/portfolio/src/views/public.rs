use crate::markdown;
use crate::models::content::{non_empty, BlogPost, Experience, ExperienceKind, Profile, Project, Skill};
use crate::models::inbox::{format_timestamp, Comment};
use crate::repository::ContentSnapshot;
use crate::views::{escape, flash, public_page, Meta};

const TEASER_LEN: usize = 3;

/// Categories in first-seen order.
pub fn distinct_categories<'a>(categories: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for category in categories {
        if !seen.contains(&category) {
            seen.push(category);
        }
    }
    seen
}

fn hero(profile: &Profile) -> String {
    format!(
        "<section id=\"hero\"><div><h1>{name}</h1><p class=\"tagline\">{tagline}</p>\
         <a class=\"button\" href=\"{cv}\" target=\"_blank\" rel=\"noreferrer\">Download CV</a>\
         <ul class=\"socials\"><li><a href=\"{github}\">GitHub</a></li>\
         <li><a href=\"{linkedin}\">LinkedIn</a></li>\
         <li><a href=\"mailto:{email}\">Email</a></li></ul></div>\
         <img class=\"avatar\" src=\"{avatar}\" alt=\"{name}\"></section>",
        name = escape(&profile.name),
        tagline = escape(&profile.tagline),
        cv = escape(&profile.cv_url),
        github = escape(&profile.github),
        linkedin = escape(&profile.linkedin),
        email = escape(&profile.email),
        avatar = escape(&profile.avatar_url),
    )
}

fn about(profile: &Profile) -> String {
    format!(
        "<section id=\"about\"><h2>About</h2><p>{bio}</p><dl class=\"stats\">\
         <div><dt>Years experience</dt><dd>{years}</dd></div>\
         <div><dt>Brands handled</dt><dd>{brands}</dd></div></dl></section>",
        bio = escape(&profile.bio),
        years = escape(non_empty(&profile.years_experience).unwrap_or("5+")),
        brands = escape(non_empty(&profile.brands_handled).unwrap_or("12+")),
    )
}

fn experience_section(experiences: &[Experience]) -> String {
    let items: String = experiences
        .iter()
        .map(|exp| {
            let kind = match exp.kind {
                ExperienceKind::Work => "work",
                ExperienceKind::Education => "education",
            };
            format!(
                "<li class=\"{kind}\"><span class=\"period\">{period}</span>\
                 <h3>{role}</h3><p class=\"company\">{company}</p><p>{description}</p></li>",
                period = escape(&exp.period),
                role = escape(&exp.role),
                company = escape(&exp.company),
                description = escape(&exp.description),
            )
        })
        .collect();
    format!("<section id=\"experience\"><h2>Experience</h2><ol class=\"timeline\">{items}</ol></section>")
}

fn skills_section(skills: &[Skill]) -> String {
    let groups: String = distinct_categories(skills.iter().map(|s| s.category.as_str()))
        .into_iter()
        .map(|category| {
            let rows: String = skills
                .iter()
                .filter(|s| s.category == category)
                .map(|s| {
                    let level = s.display_level();
                    format!(
                        "<li><span>{name}</span><span>{level}%</span>\
                         <div class=\"bar\"><div style=\"width: {level}%\"></div></div></li>",
                        name = escape(&s.name),
                    )
                })
                .collect();
            format!("<div class=\"skill-group\"><h3>{}</h3><ul>{rows}</ul></div>", escape(category))
        })
        .collect();
    format!("<section id=\"skills\"><h2>Skills</h2>{groups}</section>")
}

fn tag_list(tags: &[String], limit: usize) -> String {
    let items: String = tags
        .iter()
        .take(limit)
        .map(|t| format!("<li>{}</li>", escape(t)))
        .collect();
    format!("<ul class=\"tags\">{items}</ul>")
}

fn project_card(project: &Project) -> String {
    let slides: String = project
        .slides()
        .into_iter()
        .map(|url| {
            format!(
                "<li><img src=\"{}\" alt=\"{}\" loading=\"lazy\"></li>",
                escape(url),
                escape(&project.title)
            )
        })
        .collect();
    let mut links = String::new();
    if let Some(demo) = non_empty(&project.demo_url) {
        links.push_str(&format!("<a href=\"{}\">Live demo</a>", escape(demo)));
    }
    if let Some(repo) = non_empty(&project.repo_url) {
        links.push_str(&format!("<a href=\"{}\">Source</a>", escape(repo)));
    }
    format!(
        "<article class=\"project\"><ul class=\"carousel\">{slides}</ul>\
         <p class=\"category\">{category}</p><h3>{title}</h3><p>{description}</p>\
         {tags}<div class=\"links\">{links}</div></article>",
        category = escape(&project.category),
        title = escape(&project.title),
        description = escape(&project.description),
        tags = tag_list(&project.tags, 3),
    )
}

fn post_card(post: &BlogPost) -> String {
    format!(
        "<article class=\"post\"><a href=\"{path}\">\
         <img src=\"{cover}\" alt=\"\" loading=\"lazy\"><p class=\"meta\">{category} · {date}</p>\
         <h3>{title}</h3><p>{excerpt}</p></a>{tags}</article>",
        path = escape(&post.path()),
        cover = escape(&post.cover_image),
        category = escape(&post.category),
        date = escape(post.published_on()),
        title = escape(&post.title),
        excerpt = escape(&post.excerpt),
        tags = tag_list(&post.tags, 2),
    )
}

fn newsletter(message: Option<&Result<String, String>>) -> String {
    format!(
        "<section id=\"newsletter\"><h2>Newsletter</h2><p>Marketing notes, once a month.</p>\
         {flash}<form method=\"post\" action=\"/subscribe\">\
         <input type=\"email\" name=\"email\" placeholder=\"you@example.com\" required>\
         <button type=\"submit\">Subscribe</button></form></section>",
        flash = flash(message),
    )
}

pub fn home(data: &ContentSnapshot, newsletter_message: Option<&Result<String, String>>) -> String {
    let projects: String = data.projects.iter().take(TEASER_LEN).map(project_card).collect();
    let posts: String = data.posts.iter().take(TEASER_LEN).map(post_card).collect();
    let main = format!(
        "{hero}{about}{experience}{skills}\
         <section id=\"projects\"><h2>Selected Work</h2>{projects}<a href=\"/projects\">All projects</a></section>\
         <section id=\"blog\"><h2>Latest Writing</h2>{posts}<a href=\"/blog\">All posts</a></section>\
         {newsletter}",
        hero = hero(&data.profile),
        about = about(&data.profile),
        experience = experience_section(&data.experiences),
        skills = skills_section(&data.skills),
        newsletter = newsletter(newsletter_message),
    );
    let meta = Meta {
        title: format!("{} | {}", data.profile.name, data.profile.tagline),
        description: Some(data.profile.bio.clone()),
    };
    public_page(&meta, &data.profile.name, &main)
}

/// Project listing, optionally filtered to one category.
pub fn projects(data: &ContentSnapshot, category: Option<&str>) -> String {
    let categories = distinct_categories(data.projects.iter().map(|p| p.category.as_str()));
    let active = category.filter(|c| categories.contains(c));
    let mut filters = format!(
        "<a href=\"/projects\"{}>All</a>",
        if active.is_none() { " class=\"active\"" } else { "" }
    );
    for c in &categories {
        filters.push_str(&format!(
            "<a href=\"/projects?category={}\"{}>{}</a>",
            escape(&urlencoding::encode(c)),
            if active == Some(*c) { " class=\"active\"" } else { "" },
            escape(c)
        ));
    }
    let cards: String = data
        .projects
        .iter()
        .filter(|p| active.map_or(true, |c| p.category == c))
        .map(project_card)
        .collect();
    let portfolio = non_empty(&data.profile.portfolio_url)
        .map(|url| {
            format!(
                "<a class=\"button\" href=\"{}\" target=\"_blank\" rel=\"noreferrer\">Download portfolio (PDF)</a>",
                escape(url)
            )
        })
        .unwrap_or_default();
    let main = format!(
        "<section><h1>Projects</h1>{portfolio}<nav class=\"filters\">{filters}</nav>\
         <div class=\"grid\">{cards}</div></section>"
    );
    public_page(&Meta::titled(format!("Projects | {}", data.profile.name)), &data.profile.name, &main)
}

pub fn blog(data: &ContentSnapshot) -> String {
    let main = match data.posts.split_first() {
        None => "<section><h1>Blog</h1><p>No posts yet.</p></section>".to_string(),
        Some((featured, rest)) => {
            let others: String = rest.iter().map(post_card).collect();
            format!(
                "<section><h1>Blog</h1><div class=\"featured\">{}</div><div class=\"grid\">{others}</div></section>",
                post_card(featured)
            )
        }
    };
    public_page(&Meta::titled(format!("Blog | {}", data.profile.name)), &data.profile.name, &main)
}

pub fn blog_detail(
    data: &ContentSnapshot,
    post: &BlogPost,
    comments: &[Comment],
    comment_message: Option<&Result<String, String>>,
) -> String {
    let thread: String = if comments.is_empty() {
        "<p>No comments yet. Be the first.</p>".to_string()
    } else {
        comments
            .iter()
            .map(|c| {
                format!(
                    "<li><p class=\"author\">{name} <time>{at}</time></p><p>{content}</p></li>",
                    name = escape(&c.user_name),
                    at = escape(&format_timestamp(&c.created_at)),
                    content = escape(&c.content),
                )
            })
            .collect()
    };
    let main = format!(
        "<article class=\"post-detail\"><a href=\"/blog\">Back to blog</a>\
         <p class=\"meta\">{category} · {date}</p><h1>{title}</h1>\
         <img class=\"cover\" src=\"{cover}\" alt=\"\">{body}{tags}</article>\
         <section id=\"comments\"><h2>Comments ({count})</h2><ul>{thread}</ul>\
         {flash}<form method=\"post\" action=\"{path}/comments\">\
         <input name=\"user_name\" placeholder=\"Name (optional)\">\
         <textarea name=\"content\" rows=\"4\" required></textarea>\
         <button type=\"submit\">Post comment</button></form></section>",
        category = escape(&post.category),
        date = escape(post.published_on()),
        title = escape(&post.title),
        cover = escape(&post.cover_image),
        body = markdown::render(&post.content),
        tags = tag_list(&post.tags, usize::MAX),
        count = comments.len(),
        flash = flash(comment_message),
        path = escape(&post.path()),
    );
    let meta = Meta {
        title: non_empty(&post.meta_title).unwrap_or(&post.title).to_string(),
        description: Some(
            non_empty(&post.meta_description)
                .unwrap_or(&post.excerpt)
                .to_string(),
        ),
    };
    public_page(&meta, &data.profile.name, &main)
}

pub fn contact(data: &ContentSnapshot, message: Option<&Result<String, String>>) -> String {
    let profile = &data.profile;
    let main = format!(
        "<section id=\"contact\"><h1>Let's talk</h1><ul class=\"channels\">\
         <li><a href=\"mailto:{email}\">{email}</a></li>\
         <li><a href=\"{linkedin}\">LinkedIn</a></li><li><a href=\"{github}\">GitHub</a></li></ul>\
         {flash}<form method=\"post\" action=\"/contact\">\
         <input name=\"name\" placeholder=\"Your name\" required>\
         <input type=\"email\" name=\"email\" placeholder=\"you@example.com\" required>\
         <textarea name=\"message\" rows=\"6\" required></textarea>\
         <button type=\"submit\">Send message</button></form></section>",
        email = escape(&profile.email),
        linkedin = escape(&profile.linkedin),
        github = escape(&profile.github),
        flash = flash(message),
    );
    public_page(&Meta::titled(format!("Contact | {}", profile.name)), &profile.name, &main)
}

pub fn not_found(site_name: &str, what: &str) -> String {
    let main = format!(
        "<section><h1>Not found</h1><p>{}</p><a href=\"/\">Back home</a></section>",
        escape(what)
    );
    public_page(&Meta::titled("Not found"), site_name, &main)
}
