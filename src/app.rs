use std::sync::Arc;

use brainstorm_core::{
    group_by_tag, Agent, AgentDirectory, ApiClient, DiscussionApi, DiscussionSync, PinnedIdea,
    QueryCache, QueryOptions, Room, RoomCategory, Roster, SeedData,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Rooms,
    Thread,
    Sidebar,
    Input,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Rooms => FocusPane::Thread,
            FocusPane::Thread => FocusPane::Sidebar,
            FocusPane::Sidebar => FocusPane::Input,
            FocusPane::Input => FocusPane::Rooms,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusPane::Rooms => FocusPane::Input,
            FocusPane::Thread => FocusPane::Rooms,
            FocusPane::Sidebar => FocusPane::Thread,
            FocusPane::Input => FocusPane::Sidebar,
        }
    }
}

/// One line of the agent directory: a tag heading or an agent under it.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryRow {
    Tag(String),
    Agent(Agent),
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub status: Option<String>,

    // Rooms
    pub rooms: Vec<Room>,
    pub room_state: ListState,
    pub active_room: String,
    pub nav_collapsed: bool,

    // Thread
    pub sync: DiscussionSync,
    pub selected_message: Option<usize>,
    pub thread_scroll: u16,
    pub follow_tail: bool,

    // Composer
    pub input: String,
    pub input_cursor: usize,

    // Collaboration sidebar
    pub roster: Roster,
    pub pinned_ideas: Vec<PinnedIdea>,
    pub directory_rows: Vec<DirectoryRow>,
    pub directory_state: ListState,
    pub directory_task: Option<JoinHandle<Vec<Agent>>>,

    // Animation state
    pub animation_frame: u8,

    // Panel areas for mouse hit-testing (updated during render)
    pub rooms_area: Option<Rect>,
    pub thread_area: Option<Rect>,
    pub sidebar_area: Option<Rect>,

    // Data
    pub config: Config,
    pub seed: SeedData,
    api: Arc<dyn DiscussionApi>,
    cache: QueryCache,
}

impl App {
    pub fn new(config: Config, seed: SeedData, start_room: Option<&str>) -> Self {
        let api: Arc<dyn DiscussionApi> = Arc::new(ApiClient::new(&config.api_base_url));
        Self::with_api(config, seed, start_room, api)
    }

    pub fn with_api(
        config: Config,
        seed: SeedData,
        start_room: Option<&str>,
        api: Arc<dyn DiscussionApi>,
    ) -> Self {
        let cache = QueryCache::new(QueryOptions::default());

        let rooms: Vec<Room> = RoomCategory::all()
            .into_iter()
            .flat_map(|category| seed.rooms_in(category).cloned())
            .collect();
        let room_idx = start_room
            .and_then(|id| rooms.iter().position(|room| room.id == id))
            .unwrap_or(0);
        let active_room = rooms
            .get(room_idx)
            .map(|room| room.id.clone())
            .unwrap_or_default();

        let mut room_state = ListState::default();
        room_state.select(Some(room_idx));

        let sync = open_room(&api, &cache, &config, &seed, &active_room);

        let directory = AgentDirectory::new(&config.agents_url);
        let fallback_agents = seed.agents.clone();
        let directory_task = tokio::spawn(async move { directory.fetch_or(&fallback_agents).await });

        let mut app = Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: FocusPane::Input,
            status: None,

            rooms,
            room_state,
            active_room,
            nav_collapsed: false,

            sync,
            selected_message: None,
            thread_scroll: 0,
            follow_tail: true,

            input: String::new(),
            input_cursor: 0,

            roster: Roster::new(seed.participants.clone()),
            pinned_ideas: seed.pinned_ideas.clone(),
            directory_rows: Vec::new(),
            directory_state: ListState::default(),
            directory_task: Some(directory_task),

            animation_frame: 0,

            rooms_area: None,
            thread_area: None,
            sidebar_area: None,

            config,
            seed,
            api,
            cache,
        };
        let agents = app.seed.agents.clone();
        app.set_directory(&agents);
        app
    }

    pub fn active_room(&self) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == self.active_room)
    }

    // Room navigation
    pub fn rooms_nav_down(&mut self) {
        let len = self.rooms.len();
        if len > 0 {
            let i = self.room_state.selected().unwrap_or(0);
            self.room_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn rooms_nav_up(&mut self) {
        let i = self.room_state.selected().unwrap_or(0);
        self.room_state.select(Some(i.saturating_sub(1)));
    }

    /// Switches to the highlighted room. The previous room's sync is
    /// dropped, which cancels its timer and any in-flight requests.
    pub fn enter_selected_room(&mut self) {
        let Some(room) = self
            .room_state
            .selected()
            .and_then(|i| self.rooms.get(i))
            .cloned()
        else {
            return;
        };
        if room.id == self.active_room {
            return;
        }

        tracing::info!(room = %room.id, "switching room");
        self.sync = open_room(&self.api, &self.cache, &self.config, &self.seed, &room.id);
        self.active_room = room.id;
        self.selected_message = None;
        self.thread_scroll = 0;
        self.follow_tail = true;
        self.sync.note_input(&self.input);
    }

    pub fn toggle_nav(&mut self) {
        self.nav_collapsed = !self.nav_collapsed;
    }

    // Thread
    pub fn thread_nav_down(&mut self) {
        let len = self.sync.messages().len();
        if len > 0 {
            let next = self.selected_message.map_or(0, |i| (i + 1).min(len - 1));
            self.selected_message = Some(next);
        }
    }

    pub fn thread_nav_up(&mut self) {
        if let Some(i) = self.selected_message {
            self.selected_message = Some(i.saturating_sub(1));
        } else if !self.sync.messages().is_empty() {
            self.selected_message = Some(self.sync.messages().len() - 1);
        }
    }

    pub fn scroll_thread_down(&mut self, lines: u16) {
        self.follow_tail = false;
        self.thread_scroll = self.thread_scroll.saturating_add(lines);
    }

    pub fn scroll_thread_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.thread_scroll = self.thread_scroll.saturating_sub(lines);
    }

    pub fn jump_to_latest(&mut self) {
        self.follow_tail = true;
        self.selected_message = None;
    }

    /// Pins the selected message to the sidebar, once.
    pub fn pin_selected_message(&mut self) {
        let Some(message) = self
            .selected_message
            .and_then(|i| self.sync.messages().get(i))
        else {
            return;
        };
        if message.is_typing || self.pinned_ideas.iter().any(|idea| idea.content == message.content) {
            return;
        }

        self.pinned_ideas.insert(
            0,
            PinnedIdea {
                content: message.content.clone(),
                author: message.author.clone(),
                timestamp: "just now".to_string(),
                votes: 0,
            },
        );
        self.status = Some(format!("Pinned idea from {}", message.author));
    }

    pub fn react_to_selected(&mut self, emoji: &str) {
        if let Some(i) = self.selected_message {
            if let Some(message) = self.sync.messages_mut().get_mut(i) {
                if !message.is_typing {
                    message.react(emoji);
                }
            }
        }
    }

    // Composer
    pub fn input_changed(&mut self) {
        self.sync.note_input(&self.input);
    }

    pub fn submit_input(&mut self) {
        let text = std::mem::take(&mut self.input);
        self.input_cursor = 0;

        if let Some(user) = text.trim().strip_prefix("/user ") {
            self.set_user_id(user.trim());
        } else if self.sync.discussion_id().is_none() && !text.trim().is_empty() {
            self.status = Some("This room is not connected to a discussion".to_string());
        } else {
            self.sync.send_message(&text);
            self.follow_tail = true;
        }

        self.input_changed();
    }

    pub fn set_user_id(&mut self, user_id: &str) {
        if user_id.is_empty() {
            return;
        }
        self.sync.set_user_id(user_id);
        self.config.user_id = user_id.to_string();
        if let Err(err) = Config::save_user_id(user_id) {
            tracing::warn!("could not persist user id: {}", err);
        }
        self.status = Some(format!("Sending as {}", user_id));
    }

    // Collaboration sidebar
    pub fn set_directory(&mut self, agents: &[Agent]) {
        self.directory_rows = group_by_tag(agents)
            .into_iter()
            .flat_map(|group| {
                std::iter::once(DirectoryRow::Tag(group.tag))
                    .chain(group.agents.into_iter().map(DirectoryRow::Agent))
            })
            .collect();

        let first_agent = self
            .directory_rows
            .iter()
            .position(|row| matches!(row, DirectoryRow::Agent(_)));
        self.directory_state.select(first_agent);
    }

    /// Picks up the directory fetch once it has finished.
    pub async fn poll_directory(&mut self) {
        if !self.directory_task.as_ref().is_some_and(|task| task.is_finished()) {
            return;
        }
        if let Some(task) = self.directory_task.take() {
            match task.await {
                Ok(agents) => self.set_directory(&agents),
                Err(err) => tracing::error!("agent directory task failed: {}", err),
            }
        }
    }

    pub fn directory_nav_down(&mut self) {
        let start = self.directory_state.selected().map_or(0, |i| i + 1);
        if let Some(next) = (start..self.directory_rows.len())
            .find(|&i| matches!(self.directory_rows[i], DirectoryRow::Agent(_)))
        {
            self.directory_state.select(Some(next));
        }
    }

    pub fn directory_nav_up(&mut self) {
        let end = self.directory_state.selected().unwrap_or(0);
        if let Some(prev) = (0..end)
            .rev()
            .find(|&i| matches!(self.directory_rows[i], DirectoryRow::Agent(_)))
        {
            self.directory_state.select(Some(prev));
        }
    }

    pub fn selected_agent(&self) -> Option<&Agent> {
        match self.directory_state.selected().and_then(|i| self.directory_rows.get(i)) {
            Some(DirectoryRow::Agent(agent)) => Some(agent),
            _ => None,
        }
    }

    pub fn add_selected_agent(&mut self) {
        let Some(agent) = self.selected_agent().cloned() else {
            return;
        };
        self.status = Some(if self.roster.add_agent(&agent) {
            format!("{} joined the room", agent.display_name)
        } else {
            format!("{} is already here", agent.display_name)
        });
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.sync.has_pending_reply() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

fn open_room(
    api: &Arc<dyn DiscussionApi>,
    cache: &QueryCache,
    config: &Config,
    seed: &SeedData,
    room_id: &str,
) -> DiscussionSync {
    let mut sync = DiscussionSync::new(
        Arc::clone(api),
        cache.clone(),
        config.discussion_for(room_id),
        seed.messages.clone(),
        config.sync_options(),
    );
    sync.set_user_id(config.user_id.clone());
    sync
}
