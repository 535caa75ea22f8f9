// tests/publish_feed.rs
//
// Published documents are parsed back with feed-rs, the same parser the
// harvester uses for incoming feeds.

use chrono::DateTime;

use feed_harvester::ingest::providers::xml_feed::XmlFeedReader;
use feed_harvester::publish::{collect_aggregate, publish_aggregate, publish_catalog};
use feed_harvester::Entry;

const BASE: &str = "http://media.test:8000";

fn at(s: &str) -> DateTime<chrono::FixedOffset> {
    DateTime::parse_from_rfc3339(s).expect("rfc3339")
}

fn rss(items: &[(&str, &str, &str)]) -> String {
    let mut body = String::from(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>x</title>\
         <link>https://x.test</link><description>x</description>",
    );
    for (title, link, date) in items {
        body.push_str(&format!(
            "<item><title>{title}</title><link>{link}</link>\
             <description>{title} body</description><pubDate>{date}</pubDate></item>"
        ));
    }
    body.push_str("</channel></rss>");
    body
}

#[test]
fn catalog_feed_is_oldest_first_with_enclosures() {
    let entries = vec![
        Entry::new("Chan", "UC1", "Newer", "n", at("2024-06-05T10:00:00+00:00"), "https://v/2"),
        Entry::new("Chan", "UC1", "Older", &"x".repeat(2000), at("2024-06-01T10:00:00+00:00"), "https://v/1"),
    ];
    let xml = publish_catalog(&entries, BASE).expect("render");
    assert!(xml.contains("href=\"http://media.test:8000/rss\""));
    assert!(xml.contains("type=\"video/mp4\""));
    assert!(xml.contains("length=\"0\""));
    assert!(xml.contains("http://media.test:8000/videos/Chan_UC1/2024/2024-06-01_Older.mp4"));

    let feed = feed_rs::parser::parse(xml.as_bytes()).expect("published rss parses");
    assert_eq!(feed.title.map(|t| t.content).as_deref(), Some("YouTube Video Downloader RSS Feed"));
    let titles: Vec<String> = feed
        .entries
        .iter()
        .map(|e| e.title.as_ref().map(|t| t.content.clone()).unwrap_or_default())
        .collect();
    assert_eq!(titles, vec!["Older", "Newer"]);

    let first_desc = feed.entries[0]
        .summary
        .as_ref()
        .map(|t| t.content.chars().count())
        .unwrap_or_default();
    assert_eq!(first_desc, 1300);
}

#[tokio::test]
async fn mixed_feed_merges_sources_in_time_order() {
    let reader = XmlFeedReader::from_fixtures([
        (
            "https://a.test/rss",
            rss(&[("A late", "https://a.test/2", "Wed, 05 Jun 2024 10:00:00 +0000")]),
        ),
        (
            "https://b.test/rss",
            rss(&[("B early", "https://b.test/1", "Sat, 01 Jun 2024 10:00:00 +0000")]),
        ),
    ]);
    let urls = vec!["https://a.test/rss".to_string(), "https://b.test/rss".to_string()];

    let items = collect_aggregate(&reader, &urls).await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "B early");
    assert_eq!(items[1].title, "A late");

    let xml = publish_aggregate(&reader, &urls, BASE).await.expect("render");
    assert!(xml.contains("<title>Combined RSS Feed</title>"));
    assert!(xml.contains("href=\"http://media.test:8000/mixed-rss\""));
    assert!(!xml.contains("<enclosure"));

    let feed = feed_rs::parser::parse(xml.as_bytes()).expect("mixed rss parses");
    assert_eq!(feed.entries.len(), 2);
    assert_eq!(
        feed.entries[0].published.map(|d| d.to_rfc3339()).as_deref(),
        Some("2024-06-01T10:00:00+00:00")
    );
}

#[tokio::test]
async fn unreachable_feed_is_skipped() {
    let reader = XmlFeedReader::from_fixtures([(
        "https://a.test/rss",
        rss(&[("Only", "https://a.test/1", "Sat, 01 Jun 2024 10:00:00 +0000")]),
    )]);
    let urls = vec!["https://down.test/rss".to_string(), "https://a.test/rss".to_string()];

    let items = collect_aggregate(&reader, &urls).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Only");
}

#[tokio::test]
async fn empty_feed_list_gives_an_empty_channel() {
    let reader = XmlFeedReader::from_fixtures(Vec::<(String, String)>::new());
    let xml = publish_aggregate(&reader, &[], BASE).await.expect("render");
    let feed = feed_rs::parser::parse(xml.as_bytes()).expect("parses");
    assert!(feed.entries.is_empty());
}
