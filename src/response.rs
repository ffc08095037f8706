//! Bridge reply decoding.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An `error` entry in a bridge reply.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReplyError {
    #[serde(rename = "type", default)]
    pub kind: i64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

/// One entry of a bridge reply array.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyItem {
    /// An acknowledged attribute: resource path to the value applied
    Success(Map<String, Value>),
    /// A rejected attribute
    Error(ReplyError),
}

/// A decoded reply to a PUT.
///
/// The bridge answers writes with an array of per-attribute
/// `{"success": {"<path>": <value>}}` or `{"error": {...}}` objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BridgeReply {
    items: Vec<ReplyItem>,
}

impl BridgeReply {
    /// Decode a reply body, tolerating bodies that are not reply arrays.
    pub fn parse(body: &Value) -> Self {
        match serde_json::from_value::<Vec<ReplyItem>>(body.clone()) {
            Ok(items) => BridgeReply { items },
            Err(e) => {
                warn!("Unexpected bridge reply {}: {}", body, e);
                BridgeReply::default()
            }
        }
    }

    pub fn items(&self) -> &[ReplyItem] {
        &self.items
    }

    /// The value acknowledged for `path`, if any.
    pub fn acknowledged(&self, path: &str) -> Option<&Value> {
        self.items.iter().find_map(|item| match item {
            ReplyItem::Success(map) => map.get(path),
            ReplyItem::Error(_) => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &ReplyError> {
        self.items.iter().filter_map(|item| match item {
            ReplyItem::Error(e) => Some(e),
            ReplyItem::Success(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_success_and_error() {
        let reply = BridgeReply::parse(&json!([
            {"success": {"/groups/1/action/bri": 200}},
            {"error": {"type": 6, "address": "/groups/1/action/xy", "description": "parameter, xy, not available"}},
        ]));
        assert_eq!(reply.items().len(), 2);
        assert_eq!(reply.acknowledged("/groups/1/action/bri"), Some(&json!(200)));
        assert_eq!(reply.acknowledged("/groups/1/action/ct"), None);

        let errors: Vec<_> = reply.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, 6);
        assert_eq!(errors[0].address, "/groups/1/action/xy");
    }

    #[test]
    fn test_parse_unexpected_body() {
        let reply = BridgeReply::parse(&json!({"message": "nope"}));
        assert!(reply.items().is_empty());
        assert_eq!(reply.acknowledged("/groups/1/lights"), None);
    }
}
