pub mod activity;
pub mod agents;
pub mod api;
pub mod convert;
pub mod discussion;
pub mod error;
pub mod query;
pub mod roster;
pub mod seed;
pub mod state;

// Re-export main types for convenience
pub use activity::Activity;
pub use agents::{group_by_tag, AgentDirectory, AgentGroup};
pub use api::{Agent, ApiClient, Discussion, DiscussionApi, Message};
pub use discussion::{DiscussionSync, LoadState, SyncEvent, SyncOptions};
pub use error::{ApiError, ApiResult};
pub use query::{QueryCache, QueryOptions};
pub use roster::{Participant, Presence, Roster};
pub use seed::{PinnedIdea, Room, RoomCategory, SeedData, UpcomingSession};
pub use state::{MessageKind, Reaction, UiMessage, UiRole};
