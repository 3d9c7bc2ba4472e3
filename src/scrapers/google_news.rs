//! Google News RSS search, used when no NewsAPI key is configured.
//!
//! The feed is plain RSS 2.0. Each `<item>` becomes a [`FetchedArticle`];
//! the HTML `<description>` is flattened to text and reused as the snippet.
//!
//! Item `<link>`s point at `news.google.com` redirect pages, which carry no
//! article body. When the description links to the publisher, that URL is
//! used instead.

use crate::models::FetchedArticle;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument};
use url::Url;

const GOOGLE_NEWS_SEARCH_URL: &str = "https://news.google.com/rss/search";
const GOOGLE_NEWS_HOST: &str = "news.google.com";

/// Whether `link` is a Google News redirect page rather than a publisher URL.
pub fn is_google_news_link(link: &str) -> bool {
    Url::parse(link).is_ok_and(|url| url.host_str() == Some(GOOGLE_NEWS_HOST))
}

/// First http(s) link in the description that does not point back at Google News.
fn publisher_link(description_html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(description_html);
    let anchors = Selector::parse("a[href]").ok()?;
    fragment
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| {
            Url::parse(href).is_ok_and(|url| matches!(url.scheme(), "http" | "https")) && !is_google_news_link(href)
        })
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
}

#[derive(Debug, Default)]
struct Item {
    title: String,
    link: String,
    description: String,
}

impl Item {
    fn push(&mut self, field: Field, text: &str) {
        match field {
            Field::Title => self.title.push_str(text),
            Field::Link => self.link.push_str(text),
            Field::Description => self.description.push_str(text),
        }
    }

    fn into_article(self) -> FetchedArticle {
        let title = self.title.trim();
        let description = html_to_text(&self.description);
        let url = publisher_link(&self.description).unwrap_or_else(|| self.link.trim().to_string());
        FetchedArticle {
            title: if title.is_empty() {
                FetchedArticle::NO_TITLE.to_string()
            } else {
                title.to_string()
            },
            content: description.clone(),
            description: if description.is_empty() {
                FetchedArticle::NO_DESCRIPTION.to_string()
            } else {
                description
            },
            url,
        }
    }
}

fn html_to_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse an RSS body into at most `limit` articles. Items without a link are skipped.
///
/// # Errors
///
/// Returns an error on malformed XML.
pub fn parse_feed(xml: &str, limit: usize) -> Result<Vec<FetchedArticle>, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);
    let mut articles = Vec::new();
    let mut current: Option<Item> = None;
    let mut field: Option<Field> = None;

    while articles.len() < limit {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"item" => {
                    current = Some(Item::default());
                    field = None;
                }
                b"title" => field = Some(Field::Title),
                b"link" => field = Some(Field::Link),
                b"description" => field = Some(Field::Description),
                _ => field = None,
            },
            Event::End(e) => {
                field = None;
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take().filter(|i| !i.link.trim().is_empty()) {
                        articles.push(item.into_article());
                    }
                }
            }
            Event::Text(e) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    item.push(f, &e.decode()?);
                }
            }
            Event::CData(e) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    item.push(f, &String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if let (Some(item), Some(f)) = (current.as_mut(), field) {
                    if let Some(ch) = e.resolve_char_ref()? {
                        item.push(f, ch.encode_utf8(&mut [0; 4]));
                    } else if let Some(text) = resolve_predefined_entity(&e.decode()?) {
                        item.push(f, text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(articles)
}

/// Search Google News for `company`, keeping at most `limit` articles.
#[instrument(level = "info", skip(client))]
pub async fn fetch_articles(
    client: &Client,
    company: &str,
    limit: usize,
) -> Result<Vec<FetchedArticle>, Box<dyn Error>> {
    let url = format!(
        "{}?q={}&hl=en-US&gl=US&ceid=US:en",
        GOOGLE_NEWS_SEARCH_URL,
        urlencoding::encode(company)
    );
    debug!(%url, "Requesting Google News RSS");

    let response = client.get(&url).send().await?.error_for_status()?;
    let body = response.text().await?;
    let articles = parse_feed(&body, limit)?;
    let redirects = articles.iter().filter(|a| is_google_news_link(&a.url)).count();
    if redirects > 0 {
        info!(
            redirects,
            "Some articles only have Google News redirect links; their content will likely not be extracted"
        );
    }
    info!(count = articles.len(), "Fetched articles from Google News");
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"Tesla" - Google News</title>
    <item>
      <title>Tesla &amp; SpaceX shares rally - Example Times</title>
      <link>https://news.google.com/rss/articles/abc</link>
      <description>&lt;a href="https://example.com/a"&gt;Tesla &amp;amp; SpaceX shares rally&lt;/a&gt;&amp;nbsp;&lt;font&gt;Example Times&lt;/font&gt;</description>
      <source url="https://example.com">Example Times</source>
    </item>
    <item>
      <title><![CDATA[Recall widens]]></title>
      <link>https://news.google.com/rss/articles/def</link>
    </item>
    <item>
      <title>No link here</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_reads_items() {
        let articles = parse_feed(SAMPLE_RSS, 10).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Tesla & SpaceX shares rally - Example Times");
        assert_eq!(articles[0].url, "https://example.com/a");
        assert_eq!(articles[1].url, "https://news.google.com/rss/articles/def");
        assert!(articles[0].description.starts_with("Tesla & SpaceX shares rally"));
        assert_eq!(articles[1].title, "Recall widens");
        assert_eq!(articles[1].description, FetchedArticle::NO_DESCRIPTION);
    }

    #[test]
    fn test_parse_feed_respects_limit() {
        let articles = parse_feed(SAMPLE_RSS, 1).unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn test_parse_feed_empty_channel() {
        let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        assert!(parse_feed(xml, 10).unwrap().is_empty());
    }

    #[test]
    fn test_publisher_link_skips_google_redirects() {
        assert_eq!(
            publisher_link(r#"<a href="https://news.google.com/rss/articles/x">t</a> <a href="https://example.com/story">s</a>"#),
            Some("https://example.com/story".to_string())
        );
        assert_eq!(
            publisher_link(r#"<a href="https://news.google.com/rss/articles/x">only google</a>"#),
            None
        );
        assert_eq!(publisher_link("plain text"), None);
        assert_eq!(publisher_link(r#"<a href="/relative">r</a>"#), None);
    }

    #[test]
    fn test_google_redirect_link_kept_when_no_publisher_link() {
        let xml = r#"<rss version="2.0"><channel><item>
            <title>Story</title>
            <link>https://news.google.com/rss/articles/xyz</link>
            <description>&lt;a href="https://news.google.com/rss/articles/xyz"&gt;Story&lt;/a&gt;</description>
        </item></channel></rss>"#;
        let articles = parse_feed(xml, 10).unwrap();
        assert_eq!(articles[0].url, "https://news.google.com/rss/articles/xyz");
        assert!(is_google_news_link(&articles[0].url));
        assert!(!is_google_news_link("https://example.com/a"));
        assert!(!is_google_news_link("not a url"));
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(html_to_text("<a href=\"x\">One</a>\n <b>two</b>"), "One two");
    }
}
