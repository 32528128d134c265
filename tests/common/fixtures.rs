//! Board, export and timestamp fixtures

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Value, json};

/// Token cookie value accepted by the fake service
pub const TOKEN: &str = "5f0c-token-cookie";

/// Username returned by the fake members endpoint
pub const USERNAME: &str = "alice_smith";

/// Fixed run timestamp: 2024-03-07 09:05
pub fn run_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 7)
        .and_then(|d| d.and_hms_opt(9, 5, 0))
        .unwrap_or_default()
}

/// A board entry as returned by the members boards endpoint
pub fn board_json(base: &str, id: &str, short_link: &str, name: &str, closed: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "closed": closed,
        "shortLink": short_link,
        "shortUrl": format!("{base}/b/{short_link}"),
    })
}

/// A board export referencing the given attachment and background URLs
pub fn export_json(id: &str, attachments: &[String], backgrounds: &[String]) -> String {
    let cards: Vec<Value> = attachments
        .iter()
        .map(|url| json!({"name": "card", "attachments": [{"bytes": 12, "url": url}]}))
        .collect();
    let scaled: Vec<Value> = backgrounds
        .iter()
        .map(|url| json!({"width": 1280, "height": 853, "url": url}))
        .collect();
    json!({
        "id": id,
        "prefs": {"backgroundImageScaled": scaled},
        "cards": cards,
    })
    .to_string()
}
