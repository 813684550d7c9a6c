//! Salt event bus messages

use serde::{Deserialize, Serialize};

/// One message from the Salt event stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaltEvent {
    /// Event bus tag, e.g. `salt/job/20230101/ret/node-1`
    pub tag: String,

    /// Event payload
    #[serde(default)]
    pub data: serde_json::Value,
}

impl SaltEvent {
    /// Whether this event belongs to the given job.
    ///
    /// Matching is sub-string containment on the tag, so job ids that are
    /// prefixes of one another cross-match (see the subscription tests, which
    /// pin this behavior).
    pub fn matches_jid(&self, jid: &str) -> bool {
        self.tag.contains(jid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_containment_matches_prefix_jids() {
        let exact = SaltEvent {
            tag: "salt/job/1234/ret".to_string(),
            data: serde_json::Value::Null,
        };
        let longer = SaltEvent {
            tag: "salt/job/12345/ret".to_string(),
            data: serde_json::Value::Null,
        };

        // Both accepted for jid 1234: containment, not equality
        assert!(exact.matches_jid("1234"));
        assert!(longer.matches_jid("1234"));
        assert!(!exact.matches_jid("9999"));
    }
}
