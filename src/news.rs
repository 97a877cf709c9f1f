//! F1 news fetcher.
//!
//! Pulls recent articles from a list of RSS feeds, condenses each to a short
//! paragraph, and formats them for the prediction prompt. Feeds are tried in
//! order; the first one that yields any articles wins.

use anyhow::{Context, Result};
use chrono::Utc;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::warn;

use crate::types::{NewsArticle, NewsCache};

/// One `<item>` from an RSS feed
#[derive(Debug, Default, Clone)]
pub struct RssItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub published: String,
}

/// Parse the `<item>` elements of an RSS document.
pub fn parse_rss(xml: &str) -> Result<Vec<RssItem>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut items = Vec::new();
    let mut current: Option<RssItem> = None;
    let mut field: Option<&'static str> = None;

    loop {
        match reader
            .read_event_into(&mut buf)
            .context("Malformed RSS document")?
        {
            Event::Start(e) => match e.name().as_ref() {
                b"item" => current = Some(RssItem::default()),
                b"title" => field = Some("title"),
                b"description" | b"summary" => field = Some("description"),
                b"link" => field = Some("link"),
                b"pubDate" | b"updated" => field = Some("published"),
                _ => field = None,
            },
            Event::End(e) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
                field = None;
            }
            Event::Text(e) => {
                if let (Some(item), Some(name)) = (current.as_mut(), field) {
                    let text = e.unescape().context("Bad text in RSS document")?;
                    append_field(item, name, &text);
                }
            }
            Event::CData(e) => {
                if let (Some(item), Some(name)) = (current.as_mut(), field) {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    append_field(item, name, &text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn append_field(item: &mut RssItem, name: &str, text: &str) {
    let slot = match name {
        "title" => &mut item.title,
        "description" => &mut item.description,
        "link" => &mut item.link,
        "published" => &mut item.published,
        _ => return,
    };
    slot.push_str(text);
}

/// Condense an article to a short paragraph: title plus description, basic
/// HTML stripped, truncated to roughly two sentences.
pub fn condense(title: &str, description: &str) -> String {
    let text = description
        .replace("<p>", "")
        .replace("</p>", "")
        .replace("<br>", " ");
    let text = text.trim();

    let combined = if !title.is_empty() && !text.is_empty() {
        format!("{}. {}", title, text)
    } else if !title.is_empty() {
        title.to_string()
    } else {
        text.to_string()
    };

    if combined.chars().count() > 200 {
        let head: String = combined.chars().take(197).collect();
        format!("{}...", head)
    } else {
        combined.trim().to_string()
    }
}

/// Derive a display name for a feed from its URL.
pub fn source_name(feed_url: &str) -> &'static str {
    if feed_url.contains("motorsport") {
        "Motorsport.com"
    } else if feed_url.contains("sky") {
        "Sky Sports"
    } else if feed_url.contains("bbci") {
        "BBC Sport"
    } else {
        "F1 News"
    }
}

fn articles_from_feed(feed_url: &str, xml: &str, limit: usize) -> Result<Vec<NewsArticle>> {
    let items = parse_rss(xml)?;
    let source = source_name(feed_url);

    let articles = items
        .iter()
        .take(limit)
        .filter_map(|item| {
            let summary = condense(&item.title, &item.description);
            if summary.is_empty() {
                return None;
            }
            Some(NewsArticle {
                title: item.title.clone(),
                summary,
                source: source.to_string(),
                published_at: item.published.clone(),
                url: item.link.clone(),
            })
        })
        .collect();

    Ok(articles)
}

/// Fetch the latest articles, trying feeds in order.
///
/// A feed that errors or yields nothing is skipped; an empty result means
/// every feed failed, which callers treat as "no news", not an error.
pub async fn fetch_news(
    client: &reqwest::Client,
    feeds: &[String],
    limit: usize,
) -> Vec<NewsArticle> {
    for feed_url in feeds {
        let fetched: Result<String> = async {
            let resp = client
                .get(feed_url)
                .send()
                .await
                .with_context(|| format!("Request failed: {}", feed_url))?
                .error_for_status()
                .with_context(|| format!("Non-success status: {}", feed_url))?;
            resp.text()
                .await
                .with_context(|| format!("Failed to read body: {}", feed_url))
        }
        .await;

        let xml = match fetched {
            Ok(xml) => xml,
            Err(e) => {
                warn!("Skipping feed {}: {:#}", feed_url, e);
                continue;
            }
        };

        match articles_from_feed(feed_url, &xml, limit) {
            Ok(articles) if !articles.is_empty() => return articles,
            Ok(_) => continue,
            Err(e) => {
                warn!("Skipping feed {}: {:#}", feed_url, e);
                continue;
            }
        }
    }

    Vec::new()
}

/// Wrap fetched articles in a cache document with a fetch timestamp.
pub fn news_cache(articles: Vec<NewsArticle>) -> NewsCache {
    NewsCache {
        fetched_at: Utc::now().to_rfc3339(),
        articles,
    }
}

/// Render the numbered news block used in the prediction prompt.
pub fn format_news_for_prompt(articles: &[NewsArticle]) -> String {
    if articles.is_empty() {
        return "(No recent F1 news available)".to_string();
    }

    let mut lines = vec!["**Recent F1 News:**".to_string()];
    for (i, article) in articles.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, article.summary));
        let date: String = article.published_at.chars().take(10).collect();
        lines.push(format!("   (Source: {}, {})", article.source, date));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>F1 News Feed</title>
    <link>https://example.com/f1</link>
    <item>
      <title>Verstappen takes pole in Austin</title>
      <description><![CDATA[<p>A dominant lap puts the champion on top.</p>]]></description>
      <link>https://example.com/f1/1</link>
      <pubDate>2026-08-20T10:00:00Z</pubDate>
    </item>
    <item>
      <title>Ferrari confirm upgrade package</title>
      <description>New floor arrives for the next round.</description>
      <link>https://example.com/f1/2</link>
      <pubDate>2026-08-19T09:00:00Z</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_items() {
        let items = parse_rss(SAMPLE_RSS).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Verstappen takes pole in Austin");
        assert_eq!(items[0].link, "https://example.com/f1/1");
        assert_eq!(items[0].published, "2026-08-20T10:00:00Z");
        // Channel-level title/link must not leak into items
        assert_eq!(items[1].title, "Ferrari confirm upgrade package");
    }

    #[test]
    fn test_parse_rss_empty_document() {
        let items = parse_rss("<rss><channel></channel></rss>").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_condense_strips_html_and_combines() {
        let out = condense("Headline", "<p>Body text.</p>");
        assert_eq!(out, "Headline. Body text.");
    }

    #[test]
    fn test_condense_truncates_long_text() {
        let long = "x".repeat(300);
        let out = condense("T", &long);
        assert_eq!(out.chars().count(), 200);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_condense_title_only() {
        assert_eq!(condense("Just a headline", ""), "Just a headline");
        assert_eq!(condense("", ""), "");
    }

    #[test]
    fn test_source_name() {
        assert_eq!(source_name("https://feeds.motorsport.com/f1/news"), "Motorsport.com");
        assert_eq!(source_name("https://feeds.news.sky.com/sports/f1"), "Sky Sports");
        assert_eq!(
            source_name("https://feeds.bbci.co.uk/sport/formula1/rss.xml"),
            "BBC Sport"
        );
        assert_eq!(source_name("https://other.example.com/rss"), "F1 News");
    }

    #[test]
    fn test_articles_from_feed_respects_limit() {
        let articles =
            articles_from_feed("https://feeds.bbci.co.uk/sport/formula1/rss.xml", SAMPLE_RSS, 1)
                .unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "BBC Sport");
        assert!(articles[0].summary.starts_with("Verstappen takes pole"));
    }

    #[test]
    fn test_format_news_for_prompt() {
        let articles = vec![NewsArticle {
            title: "T".to_string(),
            summary: "T. Body.".to_string(),
            source: "BBC Sport".to_string(),
            published_at: "2026-08-20T10:00:00Z".to_string(),
            url: "https://example.com".to_string(),
        }];

        let block = format_news_for_prompt(&articles);
        assert!(block.starts_with("**Recent F1 News:**"));
        assert!(block.contains("1. T. Body."));
        assert!(block.contains("(Source: BBC Sport, 2026-08-20)"));
    }

    #[test]
    fn test_format_news_for_prompt_empty() {
        assert_eq!(
            format_news_for_prompt(&[]),
            "(No recent F1 news available)"
        );
    }
}
