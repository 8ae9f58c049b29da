//! Quest list passthrough.

use serde_json::Value;
use tracing::warn;

/// `/client/quest/list`: locate the quest array and return the response as is
pub fn quest_list(output: String) -> String {
    if output.trim().is_empty() {
        return output;
    }
    let Ok(body) = serde_json::from_str::<Value>(&output) else {
        return output;
    };
    if quest_array(&body).is_none() {
        match body.as_object() {
            Some(root) => {
                let keys: Vec<&str> = root.keys().map(String::as_str).collect();
                warn!(keys = %keys.join(", "), "quest list hook could not locate quest array");
            }
            None => warn!("quest list hook could not locate quest array (non-object root)"),
        }
    }
    output
}

/// The quest array of a quest list response.
///
/// Looked up as the root itself, then `data`, `data.quests`, `data.data` and
/// `quests`, each key also tried capitalized.
pub fn quest_array(body: &Value) -> Option<&Vec<Value>> {
    if let Some(array) = body.as_array() {
        return Some(array);
    }
    let root = body.as_object()?;

    if let Some(array) = ["data", "Data"]
        .iter()
        .find_map(|key| root.get(*key).and_then(Value::as_array))
    {
        return Some(array);
    }
    if let Some(data) = ["data", "Data"]
        .iter()
        .find_map(|key| root.get(*key).filter(|v| v.is_object()))
    {
        if let Some(array) = get(data, "quests").and_then(Value::as_array) {
            return Some(array);
        }
        if let Some(array) = get(data, "data").and_then(Value::as_array) {
            return Some(array);
        }
    }
    get(body, "quests").and_then(Value::as_array)
}

/// A key as given, then capitalized
fn get<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    let capitalized = format!("{}{}", key[..1].to_ascii_uppercase(), &key[1..]);
    value.get(key).or_else(|| value.get(capitalized.as_str()))
}
