use serde::{Deserialize, Serialize};

use crate::api::Agent;
use crate::state::{MessageKind, UiRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Active,
    Away,
}

impl Presence {
    pub fn label(&self) -> &'static str {
        match self {
            Presence::Active => "Active",
            Presence::Away => "Away",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub kind: MessageKind,
    pub role: Option<UiRole>,
    pub status: Presence,
    pub avatar: String,
}

impl Participant {
    pub fn human(name: &str, avatar: &str, status: Presence) -> Self {
        Self {
            name: name.to_string(),
            kind: MessageKind::Human,
            role: None,
            status,
            avatar: avatar.to_string(),
        }
    }

    pub fn ai(name: &str, avatar: &str, role: UiRole) -> Self {
        Self {
            name: name.to_string(),
            kind: MessageKind::Ai,
            role: Some(role),
            status: Presence::Active,
            avatar: avatar.to_string(),
        }
    }

    pub fn from_agent(agent: &Agent) -> Self {
        let role = UiRole::parse(&agent.role);
        let avatar = role
            .map(|role| role.abbreviation().to_string())
            .unwrap_or_else(|| agent.display_name.chars().take(2).collect::<String>().to_uppercase());
        Self {
            name: agent.display_name.clone(),
            kind: MessageKind::Ai,
            role,
            status: Presence::Active,
            avatar,
        }
    }
}

/// The participant list for the active room. The app owns it and panes
/// ask it to change instead of broadcasting events to one another.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p.name == name)
    }

    /// Adds an agent unless someone with the same display name is already
    /// present. Returns whether the roster changed.
    pub fn add_agent(&mut self, agent: &Agent) -> bool {
        if agent.display_name.is_empty() || self.contains(&agent.display_name) {
            return false;
        }
        tracing::info!(agent = %agent.display_name, "adding participant");
        self.participants.push(Participant::from_agent(agent));
        true
    }

    /// (humans, ai) head counts.
    pub fn counts(&self) -> (usize, usize) {
        let humans = self
            .participants
            .iter()
            .filter(|p| p.kind == MessageKind::Human)
            .count();
        (humans, self.participants.len() - humans)
    }
}
