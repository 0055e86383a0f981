//! UI-agnostic message state
//!
//! These types describe what a chat thread shows, independent of how it is
//! drawn. The terminal UI renders them; the sync engine produces them.

use serde::{Deserialize, Serialize};

/// Coarse author classification of a rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Human,
    Ai,
}

/// Role an AI participant plays in a discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiRole {
    Expert,
    Moderator,
    Companion,
}

impl UiRole {
    /// Maps a service role tag (`MODERATOR`, `EXPERT`, `COMPANION`).
    pub fn from_wire(role: &str) -> Option<Self> {
        match role {
            "MODERATOR" => Some(UiRole::Moderator),
            "EXPERT" => Some(UiRole::Expert),
            "COMPANION" => Some(UiRole::Companion),
            _ => None,
        }
    }

    /// Maps a role name regardless of case.
    pub fn parse(role: &str) -> Option<Self> {
        match role.to_lowercase().as_str() {
            "moderator" => Some(UiRole::Moderator),
            "expert" => Some(UiRole::Expert),
            "companion" => Some(UiRole::Companion),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UiRole::Expert => "expert",
            UiRole::Moderator => "moderator",
            UiRole::Companion => "companion",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            UiRole::Expert => "Expert",
            UiRole::Moderator => "Moderator",
            UiRole::Companion => "Companion",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            UiRole::Expert => "EXP",
            UiRole::Moderator => "MOD",
            UiRole::Companion => "COM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub count: u32,
}

impl Reaction {
    pub fn new(emoji: &str, count: u32) -> Self {
        Self {
            emoji: emoji.to_string(),
            count,
        }
    }
}

/// A message as shown in the thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub author: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UiRole>,
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_typing: bool,
}

impl UiMessage {
    pub fn is_ai(&self) -> bool {
        self.kind == MessageKind::Ai
    }

    /// Messages written by the local user are labelled "You".
    pub fn is_current_user(&self) -> bool {
        self.author == "You"
    }

    /// Bumps the tally for `emoji`, adding it when absent.
    pub fn react(&mut self, emoji: &str) {
        match self.reactions.iter_mut().find(|r| r.emoji == emoji) {
            Some(reaction) => reaction.count += 1,
            None => self.reactions.push(Reaction::new(emoji, 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> UiMessage {
        UiMessage {
            id: "1".to_string(),
            kind: MessageKind::Human,
            author: "You".to_string(),
            avatar: "You".to_string(),
            role: None,
            content: "hi".to_string(),
            timestamp: "10:30".to_string(),
            reactions: Vec::new(),
            is_typing: false,
        }
    }

    #[test]
    fn test_role_from_wire_is_case_sensitive() {
        assert_eq!(UiRole::from_wire("EXPERT"), Some(UiRole::Expert));
        assert_eq!(UiRole::from_wire("expert"), None);
        assert_eq!(UiRole::from_wire("HUMAN"), None);
    }

    #[test]
    fn test_role_parse_ignores_case() {
        assert_eq!(UiRole::parse("Moderator"), Some(UiRole::Moderator));
        assert_eq!(UiRole::parse("COMPANION"), Some(UiRole::Companion));
        assert_eq!(UiRole::parse("SCRIBE"), None);
    }

    #[test]
    fn test_react_increments_existing_tally() {
        let mut msg = message();
        msg.react("👍");
        msg.react("👍");
        msg.react("💡");
        assert_eq!(msg.reactions, vec![Reaction::new("👍", 2), Reaction::new("💡", 1)]);
    }

    #[test]
    fn test_serializes_like_the_web_client() {
        let json = serde_json::to_value(message()).unwrap();
        assert_eq!(json["type"], "human");
        assert!(json.get("isTyping").is_none());
        assert!(json.get("role").is_none());
    }
}
