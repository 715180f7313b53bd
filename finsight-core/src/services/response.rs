//! Model response post-processing
//!
//! Models wrap JSON in markdown fences, drift between field-name
//! conventions, and leave values null. Everything the client sees goes
//! through here first.

use serde_json::{Map, Value as JsonValue};

use crate::domain::result::{Error, Result};
use crate::domain::{ChatAnswer, ChatEntry};

pub const PLACEHOLDER_HEADER: &str = "Insight";
pub const PLACEHOLDER_DETAIL: &str = "No data available for this period.";
pub const PLACEHOLDER_CHAT_HEADER: &str = "Here's what I found";

const HEADER_KEYS: &[&str] = &[
    "header", "title", "heading", "label", "name", "question", "category", "key",
];

const DETAIL_KEYS: &[&str] = &[
    "detail",
    "details",
    "text",
    "message",
    "description",
    "answer",
    "value",
    "content",
    "body",
];

const ENTRY_LIST_KEYS: &[&str] = &["entries", "answers", "items", "messages"];

/// Remove a surrounding ```json / ``` fence
///
/// Text that is not fenced is returned unchanged, so stripping twice is
/// the same as stripping once.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return text;
    };

    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parse the model text into a JSON object
///
/// Falls back to the outermost `{...}` when the model surrounded the JSON
/// with prose. On failure the error keeps the raw text for diagnostics.
pub fn parse_payload(raw: &str) -> Result<JsonValue> {
    let cleaned = strip_code_fences(raw);

    let parsed = match serde_json::from_str::<JsonValue>(cleaned) {
        Ok(value) => value,
        Err(err) => match embedded_object(cleaned) {
            Some(value) => value,
            None => return Err(Error::malformed(err.to_string(), raw)),
        },
    };

    if parsed.is_object() {
        Ok(parsed)
    } else {
        Err(Error::malformed("expected a JSON object", raw))
    }
}

fn embedded_object(text: &str) -> Option<JsonValue> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<JsonValue>(&text[start..=end])
        .ok()
        .filter(JsonValue::is_object)
}

/// Render a JSON value as display text; `None` for null or blank
pub fn value_to_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_text).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        JsonValue::Object(map) => fields_to_text(map, None),
    }
}

fn fields_to_text(map: &Map<String, JsonValue>, skip: Option<&str>) -> Option<String> {
    let parts: Vec<String> = map
        .iter()
        .filter(|(k, _)| Some(k.as_str()) != skip)
        .filter_map(|(k, v)| value_to_text(v).map(|text| format!("{}: {}", k, text)))
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// First key from `keys` present in the map with a non-empty value
fn first_text<'a>(map: &Map<String, JsonValue>, keys: &[&'a str]) -> Option<(&'a str, String)> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(value_to_text).map(|text| (*key, text)))
}

/// Coerce any answer-entry shape into `{header, detail}`
pub fn normalize_entry(value: &JsonValue) -> ChatEntry {
    let JsonValue::Object(map) = value else {
        return ChatEntry::new(PLACEHOLDER_HEADER, text_or_placeholder(value));
    };

    let header = first_text(map, HEADER_KEYS);
    let detail = first_text(map, DETAIL_KEYS).map(|(_, text)| text);
    let has_detail_key = DETAIL_KEYS.iter().any(|key| map.contains_key(*key));

    match (header, detail) {
        (Some((_, header)), Some(detail)) => ChatEntry::new(header, detail),
        (Some((_, header)), None) if has_detail_key => ChatEntry::new(header, PLACEHOLDER_DETAIL),
        // {"category": "Food", "amount": 150} - the remaining fields are the detail
        (Some((key, header)), None) => ChatEntry::new(
            header,
            fields_to_text(map, Some(key)).unwrap_or_else(|| PLACEHOLDER_DETAIL.to_string()),
        ),
        (None, Some(detail)) => ChatEntry::new(PLACEHOLDER_HEADER, detail),
        (None, None) => match single_custom_pair(map) {
            // {"Food": "₹150 (2 entries)"}
            Some((key, inner)) => ChatEntry::new(key.clone(), text_or_placeholder(inner)),
            None => ChatEntry::new(PLACEHOLDER_HEADER, text_or_placeholder(value)),
        },
    }
}

fn text_or_placeholder(value: &JsonValue) -> String {
    value_to_text(value).unwrap_or_else(|| PLACEHOLDER_DETAIL.to_string())
}

/// The only pair of a one-key object whose key is not a known field name
fn single_custom_pair(map: &Map<String, JsonValue>) -> Option<(&String, &JsonValue)> {
    if map.len() != 1 {
        return None;
    }
    map.iter()
        .next()
        .filter(|(key, _)| !HEADER_KEYS.contains(&key.as_str()) && !DETAIL_KEYS.contains(&key.as_str()))
}

/// Coerce the `chat` part of a payload into a `ChatAnswer`
pub fn normalize_chat(value: &JsonValue) -> ChatAnswer {
    let (header, entries) = match value {
        JsonValue::Object(map) => {
            let list = ENTRY_LIST_KEYS.iter().find_map(|key| map.get(*key));
            let header = first_text(map, &["header", "title", "heading"]).map(|(_, text)| text);

            let entries = match list {
                Some(JsonValue::Array(items)) => items.iter().map(normalize_entry).collect(),
                Some(JsonValue::Null) | None => {
                    if first_text(map, DETAIL_KEYS).is_some() {
                        vec![normalize_entry(value)]
                    } else {
                        Vec::new()
                    }
                }
                Some(single) => vec![normalize_entry(single)],
            };
            (header, entries)
        }
        JsonValue::Array(items) => (None, items.iter().map(normalize_entry).collect()),
        JsonValue::Null => (None, Vec::new()),
        other => (None, vec![normalize_entry(other)]),
    };

    let entries = if entries.is_empty() {
        vec![ChatEntry::new(PLACEHOLDER_HEADER, PLACEHOLDER_DETAIL)]
    } else {
        entries
    };

    ChatAnswer {
        header: header.unwrap_or_else(|| PLACEHOLDER_CHAT_HEADER.to_string()),
        entries,
    }
}

/// Make sure every insight group has string `header` and `detail`
///
/// Other group fields (`type`, `category`, `transactions`) are kept.
pub fn normalize_insight_groups(value: &JsonValue) -> Vec<JsonValue> {
    let groups: Vec<&JsonValue> = match value {
        JsonValue::Array(items) => items.iter().collect(),
        JsonValue::Null => Vec::new(),
        other => vec![other],
    };

    groups
        .into_iter()
        .map(|group| match group {
            JsonValue::Object(map) => {
                let header = first_text(map, HEADER_KEYS)
                    .map(|(_, text)| text)
                    .unwrap_or_else(|| PLACEHOLDER_HEADER.to_string());
                let detail = first_text(map, DETAIL_KEYS)
                    .map(|(_, text)| text)
                    .unwrap_or_else(|| PLACEHOLDER_DETAIL.to_string());

                let mut normalized = map.clone();
                normalized.insert("header".to_string(), JsonValue::String(header));
                normalized.insert("detail".to_string(), JsonValue::String(detail));
                JsonValue::Object(normalized)
            }
            other => {
                let entry = normalize_entry(other);
                serde_json::json!({"header": entry.header, "detail": entry.detail})
            }
        })
        .collect()
}

/// Normalize a parsed payload in place of its `insight_groups` and `chat`
pub fn normalize_payload(mut payload: JsonValue) -> JsonValue {
    if let Some(map) = payload.as_object_mut() {
        if let Some(groups) = map.get("insight_groups") {
            let normalized = normalize_insight_groups(groups);
            map.insert("insight_groups".to_string(), JsonValue::Array(normalized));
        }
        if let Some(chat) = map.get("chat") {
            let normalized = normalize_chat(chat);
            if let Ok(value) = serde_json::to_value(normalized) {
                map.insert("chat".to_string(), value);
            }
        }
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_json_fence() {
        let raw = "```json\n{\"insight_groups\": []}\n```";
        assert_eq!(strip_code_fences(raw), "{\"insight_groups\": []}");

        let raw = "```\n{\"chat\": {}}\n```";
        assert_eq!(strip_code_fences(raw), "{\"chat\": {}}");
    }

    #[test]
    fn test_strip_is_idempotent() {
        let unfenced = "  {\"a\": 1}\n";
        assert_eq!(strip_code_fences(unfenced), unfenced);

        let fenced = "```json\n{\"a\": 1}\n```";
        let once = strip_code_fences(fenced);
        assert_eq!(strip_code_fences(once), once);
    }

    #[test]
    fn test_strip_fence_without_closing() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_payload_fenced() {
        let value = parse_payload("```json\n{\"insight_groups\": [{\"header\": \"Hi\"}]}\n```").unwrap();
        assert_eq!(value["insight_groups"][0]["header"], json!("Hi"));
    }

    #[test]
    fn test_parse_payload_embedded_in_prose() {
        let value = parse_payload("Sure! Here is your data:\n{\"chat\": {\"header\": \"x\"}}\nHope it helps.")
            .unwrap();
        assert_eq!(value["chat"]["header"], json!("x"));
    }

    #[test]
    fn test_parse_payload_malformed_keeps_raw() {
        let raw = "I could not analyze that, sorry.";
        match parse_payload(raw) {
            Err(Error::MalformedResponse { message, raw: kept }) => {
                assert!(!message.is_empty());
                assert_eq!(kept, raw);
            }
            other => panic!("expected malformed response, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_payload_rejects_non_object() {
        assert!(matches!(
            parse_payload("[1, 2, 3]"),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_normalize_entry_shapes() {
        assert_eq!(
            normalize_entry(&json!({"header": "Food", "detail": "₹150 at Food (2 entries)"})),
            ChatEntry::new("Food", "₹150 at Food (2 entries)")
        );
        assert_eq!(
            normalize_entry(&json!({"title": "Fuel", "text": "₹40"})),
            ChatEntry::new("Fuel", "₹40")
        );
        assert_eq!(
            normalize_entry(&json!({"question": "Top?", "answer": "Rent"})),
            ChatEntry::new("Top?", "Rent")
        );
        assert_eq!(
            normalize_entry(&json!({"Food": "₹150 (2 entries)"})),
            ChatEntry::new("Food", "₹150 (2 entries)")
        );
        assert_eq!(
            normalize_entry(&json!({"category": "Food", "amount": 150, "count": 2})),
            ChatEntry::new("Food", "amount: 150, count: 2")
        );
        assert_eq!(
            normalize_entry(&json!("You spent less this month.")),
            ChatEntry::new(PLACEHOLDER_HEADER, "You spent less this month.")
        );
        assert_eq!(
            normalize_entry(&json!({"header": "Savings", "detail": ["Cook at home", "Cancel Hotstar"]})),
            ChatEntry::new("Savings", "Cook at home; Cancel Hotstar")
        );
    }

    #[test]
    fn test_normalize_entry_placeholders() {
        assert_eq!(
            normalize_entry(&json!(null)),
            ChatEntry::new(PLACEHOLDER_HEADER, PLACEHOLDER_DETAIL)
        );
        assert_eq!(
            normalize_entry(&json!({"header": "Food", "detail": null})),
            ChatEntry::new("Food", PLACEHOLDER_DETAIL)
        );
        assert_eq!(
            normalize_entry(&json!({"header": "", "detail": "  "})),
            ChatEntry::new(PLACEHOLDER_HEADER, PLACEHOLDER_DETAIL)
        );
    }

    #[test]
    fn test_normalize_chat_variants() {
        let answer = normalize_chat(&json!({
            "header": "June spending",
            "entries": [{"title": "Food", "message": "₹150"}, "Keep it up!"]
        }));
        assert_eq!(answer.header, "June spending");
        assert_eq!(answer.entries.len(), 2);
        assert_eq!(answer.entries[1].detail, "Keep it up!");

        let answer = normalize_chat(&json!("You are on track."));
        assert_eq!(answer.header, PLACEHOLDER_CHAT_HEADER);
        assert_eq!(answer.entries[0].detail, "You are on track.");

        let answer = normalize_chat(&json!({"header": null, "entries": null}));
        assert_eq!(answer.header, PLACEHOLDER_CHAT_HEADER);
        assert_eq!(answer.entries, vec![ChatEntry::new(PLACEHOLDER_HEADER, PLACEHOLDER_DETAIL)]);

        let answer = normalize_chat(&json!({"header": "Total", "entries": {"label": "Spent", "value": 900}}));
        assert_eq!(answer.entries, vec![ChatEntry::new("Spent", "900")]);
    }

    #[test]
    fn test_normalize_payload_keeps_group_fields() {
        let payload = normalize_payload(json!({
            "insight_groups": [
                {"header": "High Spend", "detail": null, "type": "High Spend", "category": "Food"},
                "Plain text insight"
            ],
            "chat": {"header": "Hi", "entries": []}
        }));

        let groups = payload["insight_groups"].as_array().unwrap();
        assert_eq!(groups[0]["detail"], json!(PLACEHOLDER_DETAIL));
        assert_eq!(groups[0]["type"], json!("High Spend"));
        assert_eq!(groups[0]["category"], json!("Food"));
        assert_eq!(groups[1]["detail"], json!("Plain text insight"));
        assert_eq!(payload["chat"]["entries"][0]["header"], json!(PLACEHOLDER_HEADER));
    }
}
