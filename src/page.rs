// src/page.rs
//! Server-rendered browsing page: newest entries first, plus disk, clock and
//! network panels.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::catalog::Entry;
use crate::publish::media_url;
use crate::stats::{DiskUsage, NetworkStats};

/// Zones shown on the page with the local currency.
pub const WORLD_CLOCKS: [(Tz, &str, &str); 3] = [
    (chrono_tz::Europe::Amsterdam, "Euro", "€"),
    (chrono_tz::Europe::London, "Pound Sterling", "£"),
    (chrono_tz::America::New_York, "US Dollar", "$"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockInfo {
    pub zone: String,
    pub city: String,
    pub current_time: String,
    pub currency: &'static str,
    pub symbol: &'static str,
}

pub fn world_clocks(now: DateTime<Utc>) -> Vec<ClockInfo> {
    WORLD_CLOCKS
        .iter()
        .map(|(tz, currency, symbol)| {
            let zone = tz.name().to_string();
            let city = zone
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .replace('_', " ");
            ClockInfo {
                current_time: now.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string(),
                zone,
                city,
                currency: *currency,
                symbol: *symbol,
            }
        })
        .collect()
}

/// Everything the page shows, gathered by the handler.
pub struct PageData<'a> {
    pub entries: &'a [Entry],
    pub disk: Option<DiskUsage>,
    pub clocks: Vec<ClockInfo>,
    pub network: NetworkStats,
}

/// Entries sorted newest first; ties keep catalog order.
pub fn newest_first(entries: &[Entry]) -> Vec<&Entry> {
    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    sorted
}

pub fn render(data: &PageData<'_>) -> String {
    let mut html = String::with_capacity(4096 + data.entries.len() * 512);
    html.push_str(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Downloaded Videos</title>\n\
         <link rel=\"alternate\" type=\"application/rss+xml\" href=\"/rss\">\n</head>\n<body>\n",
    );

    html.push_str("<section id=\"status\">\n");
    match data.disk {
        Some(d) => {
            let _ = writeln!(
                html,
                "<p>Disk: {} GB total, {} GB used, {} GB free</p>",
                d.total, d.used, d.free
            );
        }
        None => html.push_str("<p>Disk: unavailable</p>\n"),
    }
    let _ = writeln!(
        html,
        "<p>Network: {:.1} MB current, {:.2} GB total, {:.2} GB daily average</p>",
        data.network.current_mb,
        data.network.total_gb,
        data.network.average_gb()
    );
    html.push_str("<ul class=\"clocks\">\n");
    for c in &data.clocks {
        let _ = writeln!(
            html,
            "<li>{} ({}): {} &middot; {} {}</li>",
            encode_text(&c.city),
            encode_text(&c.zone),
            encode_text(&c.current_time),
            encode_text(c.currency),
            encode_text(c.symbol)
        );
    }
    html.push_str("</ul>\n</section>\n<main>\n");

    if data.entries.is_empty() {
        html.push_str("<p>No videos yet.</p>\n");
    }
    for e in newest_first(data.entries) {
        let src = media_url("", &e.local_path);
        let _ = write!(
            html,
            "<article>\n<h2>{title}</h2>\n<p class=\"meta\">{source} &middot; {date}</p>\n\
             <video controls preload=\"none\" src=\"{src}\"></video>\n\
             <p><a href=\"{link}\">Original</a></p>\n<p class=\"description\">{desc}</p>\n</article>\n",
            title = encode_text(&e.title),
            source = encode_text(&e.source_name),
            date = e.published_at.format("%Y-%m-%d %H:%M"),
            src = encode_double_quoted_attribute(&src),
            link = encode_double_quoted_attribute(&e.original_link),
            desc = encode_text(&e.description),
        );
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn clocks_follow_zone_offsets() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let clocks = world_clocks(now);
        assert_eq!(clocks.len(), 3);
        assert_eq!(clocks[0].city, "Amsterdam");
        assert_eq!(clocks[0].current_time, "2024-01-15 13:00:00");
        assert_eq!(clocks[1].current_time, "2024-01-15 12:00:00");
        assert_eq!(clocks[2].city, "New York");
        assert_eq!(clocks[2].current_time, "2024-01-15 07:00:00");
        assert_eq!(clocks[1].symbol, "£");
    }

    #[test]
    fn render_escapes_and_orders_newest_first() {
        let old = chrono::DateTime::parse_from_rfc3339("2024-06-01T10:00:00+00:00").unwrap();
        let new = chrono::DateTime::parse_from_rfc3339("2024-06-05T10:00:00+00:00").unwrap();
        let entries = vec![
            Entry::new("chan", "id", "older one", "<b>x</b>", old, "https://v/1"),
            Entry::new("chan", "id", "newer one", "d", new, "https://v/2"),
        ];
        let html = render(&PageData {
            entries: &entries,
            disk: Some(DiskUsage { total: 100, used: 40, free: 60 }),
            clocks: vec![],
            network: NetworkStats::default(),
        });
        let newer = html.find("newer one").unwrap();
        let older = html.find("older one").unwrap();
        assert!(newer < older);
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("100 GB total, 40 GB used, 60 GB free"));
        assert!(html.contains("/videos/chan_id/2024/2024-06-05_newer%20one.mp4"));
    }
}
