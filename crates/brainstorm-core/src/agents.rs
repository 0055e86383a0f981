use std::collections::BTreeMap;

use reqwest::Client;
use serde::Deserialize;

use crate::api::{read_json, Agent};
use crate::error::ApiResult;

pub const DEFAULT_AGENTS_URL: &str = "http://localhost:9696/api/agents";

/// Group heading for agents without a tag.
pub const UNTAGGED: &str = "Other";

/// The directory endpoint answers with either one agent or a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum AgentPayload {
    Many(Vec<Agent>),
    One(Agent),
}

impl From<AgentPayload> for Vec<Agent> {
    fn from(payload: AgentPayload) -> Self {
        match payload {
            AgentPayload::Many(agents) => agents,
            AgentPayload::One(agent) => vec![agent],
        }
    }
}

#[derive(Clone)]
pub struct AgentDirectory {
    client: Client,
    url: String,
}

impl AgentDirectory {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch(&self) -> ApiResult<Vec<Agent>> {
        let response = self.client.get(&self.url).send().await?;
        let payload: AgentPayload = read_json(response).await?;
        Ok(payload.into())
    }

    /// Fetches the directory, falling back to `fallback` on any failure.
    pub async fn fetch_or(&self, fallback: &[Agent]) -> Vec<Agent> {
        match self.fetch().await {
            Ok(agents) => {
                tracing::info!(count = agents.len(), "loaded agent directory");
                agents
            }
            Err(err) => {
                tracing::warn!(url = %self.url, "agent directory unavailable, using fallback: {}", err);
                fallback.to_vec()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentGroup {
    pub tag: String,
    pub agents: Vec<Agent>,
}

/// Groups agents by tag: groups sorted alphabetically, agents within a
/// group by display name.
pub fn group_by_tag(agents: &[Agent]) -> Vec<AgentGroup> {
    let mut groups: BTreeMap<String, Vec<Agent>> = BTreeMap::new();

    for agent in agents {
        let tag = if agent.tag.trim().is_empty() {
            UNTAGGED.to_string()
        } else {
            agent.tag.clone()
        };
        groups.entry(tag).or_default().push(agent.clone());
    }

    groups
        .into_iter()
        .map(|(tag, mut agents)| {
            agents.sort_by(|a, b| {
                a.display_name
                    .cmp(&b.display_name)
                    .then_with(|| a.id.cmp(&b.id))
            });
            AgentGroup { tag, agents }
        })
        .collect()
}
