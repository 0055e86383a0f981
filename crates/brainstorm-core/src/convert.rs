//! Wire to UI conversion.
//!
//! The avatar and author rules here match what the web client shows, so
//! both frontends render the same transcript identically.

use chrono::{Local, LocalResult, TimeZone};

use crate::api::{Agent, Message};
use crate::state::{MessageKind, UiMessage, UiRole};

pub const HUMAN_ROLE: &str = "HUMAN";
pub const HUMAN_AVATAR: &str = "HU";
pub const HUMAN_AUTHOR: &str = "Human";
pub const AI_LABEL: &str = "AI";

const TIME_FORMAT: &str = "%H:%M";

/// Formats epoch milliseconds as local `HH:MM`.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms) {
        LocalResult::Single(time) => time.format(TIME_FORMAT).to_string(),
        LocalResult::Ambiguous(earliest, _) => earliest.format(TIME_FORMAT).to_string(),
        LocalResult::None => String::new(),
    }
}

pub fn current_time() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

fn first_chars(text: &str, count: usize) -> String {
    text.chars().take(count).collect()
}

fn role_abbreviation(role: &str) -> &'static str {
    UiRole::from_wire(role)
        .map(|role| role.abbreviation())
        .unwrap_or(AI_LABEL)
}

fn display_name(agent: Option<&Agent>) -> Option<&str> {
    agent
        .map(|agent| agent.display_name.as_str())
        .filter(|name| !name.is_empty())
}

pub fn convert_api_message(message: &Message) -> UiMessage {
    let is_ai = message.agent_role != HUMAN_ROLE;
    let name = display_name(message.agent.as_ref());

    let avatar = if !is_ai {
        HUMAN_AVATAR.to_string()
    } else if let Some(name) = name {
        first_chars(name, 3).to_uppercase()
    } else {
        role_abbreviation(&message.agent_role).to_string()
    };

    let author = if is_ai {
        name.unwrap_or(AI_LABEL).to_string()
    } else {
        HUMAN_AUTHOR.to_string()
    };

    UiMessage {
        id: message.msg_id.clone(),
        kind: if is_ai { MessageKind::Ai } else { MessageKind::Human },
        author,
        avatar,
        role: if is_ai { UiRole::from_wire(&message.agent_role) } else { None },
        content: message.message.clone(),
        timestamp: format_timestamp(message.timestamp),
        reactions: Vec::new(),
        is_typing: false,
    }
}

/// Builds the thread entry for an agent's reply to a send or a poll.
pub fn reply_message(id: String, agent: &Agent, content: &str) -> UiMessage {
    let author = if agent.display_name.is_empty() {
        AI_LABEL.to_string()
    } else {
        agent.display_name.clone()
    };

    let avatar = if agent.tag.is_empty() {
        UiRole::parse(&agent.role)
            .map(|role| role.abbreviation())
            .unwrap_or(AI_LABEL)
            .to_string()
    } else {
        first_chars(&agent.tag, 3)
    };

    UiMessage {
        id,
        kind: MessageKind::Ai,
        author,
        avatar,
        role: UiRole::parse(&agent.role),
        content: content.to_string(),
        timestamp: current_time(),
        reactions: Vec::new(),
        is_typing: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(role: &str, agent: Option<Agent>) -> Message {
        Message {
            discussion_id: "d-1".to_string(),
            msg_id: "m-1".to_string(),
            agent_id: "a-1".to_string(),
            agent_role: role.to_string(),
            message: "Let's start with the onboarding flow".to_string(),
            timestamp: 1_700_000_000_000,
            agent,
        }
    }

    fn named(name: &str) -> Agent {
        Agent {
            display_name: name.to_string(),
            ..Agent::default()
        }
    }

    #[test]
    fn test_human_role_converts_to_human() {
        let ui = convert_api_message(&wire("HUMAN", Some(named("Anshika"))));
        assert_eq!(ui.kind, MessageKind::Human);
        assert_eq!(ui.author, "Human");
        assert_eq!(ui.avatar, "HU");
        assert_eq!(ui.role, None);
    }

    #[test]
    fn test_any_other_role_is_ai() {
        for role in ["MODERATOR", "EXPERT", "COMPANION", "SCRIBE", "human", ""] {
            let ui = convert_api_message(&wire(role, None));
            assert_eq!(ui.kind, MessageKind::Ai, "role {:?}", role);
        }
    }

    #[test]
    fn test_display_name_drives_author_and_avatar() {
        let ui = convert_api_message(&wire("EXPERT", Some(named("ada lovelace"))));
        assert_eq!(ui.author, "ada lovelace");
        assert_eq!(ui.avatar, "ADA");
        assert_eq!(ui.role, Some(UiRole::Expert));
    }

    #[test]
    fn test_avatar_falls_back_to_role_abbreviation() {
        assert_eq!(convert_api_message(&wire("MODERATOR", None)).avatar, "MOD");
        assert_eq!(convert_api_message(&wire("EXPERT", Some(named("")))).avatar, "EXP");
        assert_eq!(convert_api_message(&wire("COMPANION", None)).avatar, "COM");
        let unknown = convert_api_message(&wire("SCRIBE", None));
        assert_eq!(unknown.avatar, "AI");
        assert_eq!(unknown.author, "AI");
        assert_eq!(unknown.role, None);
    }

    #[test]
    fn test_short_display_name_avatar() {
        let ui = convert_api_message(&wire("COMPANION", Some(named("Jo"))));
        assert_eq!(ui.avatar, "JO");
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let message = wire("MODERATOR", Some(named("Mod Squad")));
        let first = convert_api_message(&message);
        let second = convert_api_message(&message);
        assert_eq!(first, second);
        assert!(first.reactions.is_empty());
        assert!(!first.is_typing);
    }

    #[test]
    fn test_timestamp_is_local_hours_and_minutes() {
        let formatted = format_timestamp(1_700_000_000_000);
        let expected = Local
            .timestamp_millis_opt(1_700_000_000_000)
            .unwrap()
            .format("%H:%M")
            .to_string();
        assert_eq!(formatted, expected);
        assert_eq!(formatted.len(), 5);
        assert_eq!(&formatted[2..3], ":");
    }

    #[test]
    fn test_reply_uses_tag_prefix_for_avatar() {
        let agent = Agent {
            display_name: "Strategist".to_string(),
            role: "EXPERT".to_string(),
            tag: "Marketing".to_string(),
            ..Agent::default()
        };
        let ui = reply_message("r-1".to_string(), &agent, "Consider a launch checklist");
        assert_eq!(ui.avatar, "Mar");
        assert_eq!(ui.author, "Strategist");
        assert_eq!(ui.role, Some(UiRole::Expert));
        assert_eq!(ui.kind, MessageKind::Ai);
    }

    #[test]
    fn test_reply_without_tag_or_name() {
        let agent = Agent {
            role: "Moderator".to_string(),
            ..Agent::default()
        };
        let ui = reply_message("r-2".to_string(), &agent, "Let's recap");
        assert_eq!(ui.author, "AI");
        assert_eq!(ui.avatar, "MOD");
        assert_eq!(ui.role, Some(UiRole::Moderator));

        let anonymous = reply_message("r-3".to_string(), &Agent::default(), "...");
        assert_eq!(anonymous.avatar, "AI");
        assert_eq!(anonymous.role, None);
    }
}
