//! `robots.txt` and `sitemap.xml` for the public site.

use std::io::Write;

use axum::{extract::State, http::header, response::IntoResponse};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::json;
use tracing::{error, warn};

use crate::app::AppState;
use crate::database::models::{BlogPost, PortfolioItem};
use crate::database::{DatabaseError, Repository, Store};
use crate::error::{ApiError, ApiResult};
use crate::filter::SortDirection;

/// Public pages that always appear in the sitemap: path, priority, change frequency
const STATIC_PAGES: &[(&str, &str, &str)] = &[
    ("/", "1.0", "daily"),
    ("/services", "0.9", "weekly"),
    ("/portfolio", "0.9", "weekly"),
    ("/blog", "0.8", "daily"),
    ("/about", "0.8", "monthly"),
    ("/team", "0.7", "monthly"),
    ("/careers", "0.7", "weekly"),
    ("/contact", "0.8", "monthly"),
];

/// GET /robots.txt
pub async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_txt(&state.config.site.base_url),
    )
}

pub fn robots_txt(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    [
        "User-agent: *",
        "Allow: /",
        "Disallow: /api/",
        "Disallow: /dashboard/",
        "Disallow: /login",
        "",
        "User-agent: Googlebot",
        "Allow: /",
        "Disallow: /api/",
        "Disallow: /dashboard/",
        "",
        "User-agent: GPTBot",
        "Disallow: /",
        "",
        "User-agent: CCBot",
        "Disallow: /",
        "",
        format!("Sitemap: {}/sitemap.xml", base).as_str(),
        format!("Host: {}", base).as_str(),
        "",
    ]
    .join("\n")
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub last_modified: Option<String>,
    pub change_frequency: &'static str,
    pub priority: &'static str,
}

/// GET /sitemap.xml - a failed lookup drops its entries, never the sitemap
pub async fn sitemap(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let base = state.config.site.base_url.trim_end_matches('/');
    let (posts, portfolio) = futures::join!(published_posts(&state.store), portfolio_items(&state.store));

    let mut entries: Vec<SitemapEntry> = STATIC_PAGES
        .iter()
        .map(|&(path, priority, change_frequency)| SitemapEntry {
            loc: format!("{}{}", base, path),
            last_modified: None,
            change_frequency,
            priority,
        })
        .collect();

    match posts {
        Ok(posts) => entries.extend(posts.into_iter().map(|post| SitemapEntry {
            loc: format!("{}/blog/{}", base, post.slug),
            last_modified: Some(post.updated_at),
            change_frequency: "weekly",
            priority: "0.7",
        })),
        Err(e) => warn!("Sitemap omits blog posts: {}", e),
    }
    match portfolio {
        Ok(items) => entries.extend(items.into_iter().map(|item| SitemapEntry {
            loc: format!("{}/portfolio/{}", base, item.slug),
            last_modified: Some(item.updated_at),
            change_frequency: "monthly",
            priority: "0.6",
        })),
        Err(e) => warn!("Sitemap omits portfolio items: {}", e),
    }

    let xml = render_sitemap(&entries).map_err(|e| {
        error!("Sitemap rendering failed: {}", e);
        ApiError::Internal
    })?;
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}

async fn published_posts(store: &Store) -> Result<Vec<BlogPost>, DatabaseError> {
    let repo = Repository::<BlogPost>::new(store);
    let mut filter = repo.filter()?;
    filter
        .where_eq("is_published", json!(true))?
        .order("published_at", SortDirection::Desc)?;
    repo.list(filter).await
}

async fn portfolio_items(store: &Store) -> Result<Vec<PortfolioItem>, DatabaseError> {
    let repo = Repository::<PortfolioItem>::new(store);
    let mut filter = repo.filter()?;
    filter.order("display_order", SortDirection::Asc)?;
    repo.list(filter).await
}

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub fn render_sitemap(entries: &[SitemapEntry]) -> Result<Vec<u8>, quick_xml::Error> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NS));
    writer.write_event(Event::Start(urlset))?;
    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        text_element(&mut writer, "loc", &entry.loc)?;
        if let Some(last_modified) = &entry.last_modified {
            text_element(&mut writer, "lastmod", last_modified)?;
        }
        text_element(&mut writer, "changefreq", entry.change_frequency)?;
        text_element(&mut writer, "priority", entry.priority)?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    Ok(writer.into_inner())
}

/// `<name>text</name>`, with the text escaped
fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robots_lists_crawlers_and_sitemap() {
        let robots = robots_txt("https://agency.example/");
        assert!(robots.starts_with("User-agent: *\nAllow: /\nDisallow: /api/\nDisallow: /dashboard/\nDisallow: /login\n"));
        assert!(robots.contains("User-agent: GPTBot\nDisallow: /\n"));
        assert!(robots.contains("User-agent: CCBot\nDisallow: /\n"));
        assert!(robots.contains("Sitemap: https://agency.example/sitemap.xml"));
        assert!(robots.contains("Host: https://agency.example\n"));
    }

    #[test]
    fn sitemap_escapes_text() {
        let xml = render_sitemap(&[SitemapEntry {
            loc: "https://agency.example/blog/a&b<c>".to_string(),
            last_modified: Some("2024-05-01T00:00:00.000Z".to_string()),
            change_frequency: "weekly",
            priority: "0.7",
        }])
        .unwrap();
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert!(xml.contains("<loc>https://agency.example/blog/a&amp;b&lt;c&gt;</loc>"));
        assert!(xml.contains("<lastmod>2024-05-01T00:00:00.000Z</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn entries_without_last_modified_skip_lastmod() {
        let xml = render_sitemap(&[SitemapEntry {
            loc: "https://agency.example/".to_string(),
            last_modified: None,
            change_frequency: "daily",
            priority: "1.0",
        }])
        .unwrap();
        let xml = String::from_utf8(xml).unwrap();
        assert_eq!(xml.matches("<url>").count(), 1);
        assert!(!xml.contains("<lastmod>"));
    }
}
