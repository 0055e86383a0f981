//! Built-in sample content.
//!
//! Used when the service is unreachable or a room has no discussion bound.
//! Everything the UI might fall back to lives here so there is one place
//! to change it.

use crate::api::Agent;
use crate::roster::{Participant, Presence};
use crate::state::{MessageKind, Reaction, UiMessage, UiRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomCategory {
    Chat,
    Brainstorm,
    Research,
}

impl RoomCategory {
    pub fn all() -> [RoomCategory; 3] {
        [RoomCategory::Chat, RoomCategory::Brainstorm, RoomCategory::Research]
    }

    pub fn title(&self) -> &'static str {
        match self {
            RoomCategory::Chat => "Discussions",
            RoomCategory::Brainstorm => "Brainstorming",
            RoomCategory::Research => "Research",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub category: RoomCategory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedIdea {
    pub content: String,
    pub author: String,
    pub timestamp: String,
    pub votes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingSession {
    pub title: String,
    pub time: String,
    pub participants: u32,
}

#[derive(Debug, Clone)]
pub struct SeedData {
    pub messages: Vec<UiMessage>,
    pub agents: Vec<Agent>,
    pub rooms: Vec<Room>,
    pub participants: Vec<Participant>,
    pub pinned_ideas: Vec<PinnedIdea>,
    pub sessions: Vec<UpcomingSession>,
}

impl Default for SeedData {
    fn default() -> Self {
        Self::builtin()
    }
}

fn seed_message(
    id: &str,
    author: &str,
    avatar: &str,
    role: Option<UiRole>,
    content: &str,
    timestamp: &str,
    reactions: &[(&str, u32)],
) -> UiMessage {
    UiMessage {
        id: id.to_string(),
        kind: if role.is_some() { MessageKind::Ai } else { MessageKind::Human },
        author: author.to_string(),
        avatar: avatar.to_string(),
        role,
        content: content.to_string(),
        timestamp: timestamp.to_string(),
        reactions: reactions
            .iter()
            .map(|(emoji, count)| Reaction::new(emoji, *count))
            .collect(),
        is_typing: false,
    }
}

fn seed_agent(id: &str, name: &str, role: &str, tag: &str, description: &str) -> Agent {
    Agent {
        id: id.to_string(),
        role: role.to_string(),
        description: description.to_string(),
        designation: format!("AI {}", role.to_lowercase()),
        tag: tag.to_string(),
        display_name: name.to_string(),
        can_direct_others: role == "MODERATOR",
        ..Agent::default()
    }
}

fn room(id: &str, name: &str, category: RoomCategory) -> Room {
    Room {
        id: id.to_string(),
        name: name.to_string(),
        category,
    }
}

impl SeedData {
    pub fn builtin() -> Self {
        let messages = vec![
            seed_message(
                "1",
                "Anshika",
                "AN",
                None,
                "Hey everyone! I've been thinking about our user onboarding flow. What if we made it more interactive?",
                "10:30",
                &[("👍", 3), ("💡", 1)],
            ),
            seed_message(
                "2",
                "AI Expert",
                "EX",
                Some(UiRole::Expert),
                "That's a great direction, Anshika! Interactive onboarding can increase completion rates by up to 40%. I'd suggest starting with progressive disclosure - show users one feature at a time with hands-on tasks.",
                "10:32",
                &[("🎯", 2)],
            ),
            seed_message(
                "3",
                "Akash",
                "AK",
                None,
                "Love the progressive disclosure idea! We could also add gamification elements - maybe a progress bar or achievement badges?",
                "10:34",
                &[("🚀", 4)],
            ),
            seed_message(
                "4",
                "AI Moderator",
                "MOD",
                Some(UiRole::Moderator),
                "Excellent ideas flowing! Let me summarize what we have so far:\n\n• Interactive onboarding flow\n• Progressive disclosure approach\n• Gamification with progress tracking\n\nShall we dive deeper into any of these concepts?",
                "10:36",
                &[("📝", 2)],
            ),
            seed_message(
                "5",
                "AI Companion",
                "COM",
                Some(UiRole::Companion),
                "I love the energy in this discussion! 🌟 These ideas could really make the user experience delightful. What do you think about adding some micro-animations to make the onboarding feel more alive?",
                "10:38",
                &[("✨", 5)],
            ),
        ];

        let agents = vec![
            seed_agent(
                "agent-expert",
                "AI Expert",
                "EXPERT",
                "Product",
                "Brings domain knowledge and data to the conversation",
            ),
            seed_agent(
                "agent-moderator",
                "AI Moderator",
                "MODERATOR",
                "Facilitation",
                "Keeps the discussion on track and summarizes progress",
            ),
            seed_agent(
                "agent-companion",
                "AI Companion",
                "COMPANION",
                "Facilitation",
                "Encourages ideas and keeps the energy up",
            ),
        ];

        let rooms = vec![
            room("general", "General Discussion", RoomCategory::Chat),
            room("product-ideas", "Product Ideas", RoomCategory::Brainstorm),
            room("strategy", "Strategy Planning", RoomCategory::Brainstorm),
            room("user-research", "User Research", RoomCategory::Research),
        ];

        let participants = vec![
            Participant::human("You", "You", Presence::Active),
            Participant::human("Sarah Chen", "SC", Presence::Active),
            Participant::human("Mike Rodriguez", "MR", Presence::Away),
            Participant::ai("AI Expert", "EX", UiRole::Expert),
            Participant::ai("AI Moderator", "MOD", UiRole::Moderator),
            Participant::ai("AI Companion", "COM", UiRole::Companion),
        ];

        let pinned_ideas = vec![
            PinnedIdea {
                content: "Implement real-time collaborative whiteboard feature".to_string(),
                author: "AI Expert".to_string(),
                timestamp: "2 mins ago".to_string(),
                votes: 8,
            },
            PinnedIdea {
                content: "Add voice-to-text for faster brainstorming sessions".to_string(),
                author: "Sarah Chen".to_string(),
                timestamp: "5 mins ago".to_string(),
                votes: 12,
            },
            PinnedIdea {
                content: "Create templates for different meeting types".to_string(),
                author: "AI Moderator".to_string(),
                timestamp: "8 mins ago".to_string(),
                votes: 6,
            },
        ];

        let sessions = vec![
            UpcomingSession {
                title: "Product Roadmap Review".to_string(),
                time: "Tomorrow, 2:00 PM".to_string(),
                participants: 6,
            },
            UpcomingSession {
                title: "User Feedback Analysis".to_string(),
                time: "Friday, 10:00 AM".to_string(),
                participants: 4,
            },
        ];

        Self {
            messages,
            agents,
            rooms,
            participants,
            pinned_ideas,
            sessions,
        }
    }

    pub fn rooms_in(&self, category: RoomCategory) -> impl Iterator<Item = &Room> {
        self.rooms.iter().filter(move |room| room.category == category)
    }
}
