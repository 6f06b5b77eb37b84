use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_FALLBACK_CHANNEL: &str = "g88a";

/// Groups whose own channel name is already taken.
const CHANNEL_OVERRIDES: [(&str, &str); 2] = [("g88", "g88a"), ("g29", "g29a")];

/// Webhook body for one chat post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub channel: String,
    pub username: String,
    pub text: String,
}

/// Maps device ids (`<group>_<name>`) to chat channel names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {
    overrides: BTreeMap<String, String>,
    fallback: String,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::with_fallback(DEFAULT_FALLBACK_CHANNEL)
    }
}

impl ChannelMap {
    pub fn with_fallback(fallback: impl Into<String>) -> Self {
        Self {
            overrides: CHANNEL_OVERRIDES
                .iter()
                .map(|(group, channel)| (group.to_string(), channel.to_string()))
                .collect(),
            fallback: fallback.into(),
        }
    }

    /// Channel name without the leading `#`.
    pub fn channel_for_device(&self, device: &str) -> String {
        let group = match device.find('_') {
            Some(position) if position > 0 => &device[..position],
            _ => self.fallback.as_str(),
        };
        self.overrides
            .get(group)
            .cloned()
            .unwrap_or_else(|| group.to_string())
    }

    pub fn message_for(&self, device: &str, text: impl Into<String>) -> ChatMessage {
        ChatMessage {
            channel: format!("#{}", self.channel_for_device(device)),
            username: device.to_string(),
            text: text.into(),
        }
    }
}
