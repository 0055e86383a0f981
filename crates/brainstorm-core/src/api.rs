use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:9696/api";

/// An agent profile as served by the discussion service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Agent {
    pub id: String,
    pub role: String,
    pub description: String,
    pub designation: String,
    pub tag: String,
    pub functional_prompt: String,
    pub module_prompt: String,
    pub soft_skills: String,
    pub display_name: String,
    pub avatar_url: String,
    pub can_direct_others: bool,
}

/// A transcript entry in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub discussion_id: String,
    pub msg_id: String,
    pub agent_id: String,
    pub agent_role: String,
    pub message: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Discussion {
    pub id: String,
    pub description: String,
    pub title: String,
    pub agent_participants: Vec<String>,
    pub human_participants: Vec<String>,
    pub moderator_id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionResponse {
    pub discussion: Discussion,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub response_message: String,
    pub response_agent: Agent,
}

/// Reply to an unsolicited poll; the service may have nothing to say.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoResponse {
    pub response_message: Option<String>,
    pub response_agent: Option<Agent>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest<'a> {
    discussion_id: &'a str,
    user_id: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AutoResponseRequest<'a> {
    discussion_id: &'a str,
}

/// The endpoints the sync engine needs. Implemented over HTTP by
/// [`ApiClient`]; tests substitute an in-memory service.
#[async_trait]
pub trait DiscussionApi: Send + Sync {
    async fn fetch_discussion(&self, discussion_id: &str) -> ApiResult<DiscussionResponse>;

    async fn send_message(
        &self,
        discussion_id: &str,
        user_id: &str,
        message: &str,
    ) -> ApiResult<SendMessageResponse>;

    async fn request_auto_response(&self, discussion_id: &str) -> ApiResult<AutoResponse>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn discussion_url(&self, discussion_id: &str) -> String {
        format!("{}/discussions/full/{}", self.base_url, discussion_id)
    }

    fn conversation_url(&self) -> String {
        format!("{}/conversation/message", self.base_url)
    }
}

/// Reads the body as text first so a bad payload is reported as a decode
/// error rather than a transport one.
pub(crate) async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl DiscussionApi for ApiClient {
    async fn fetch_discussion(&self, discussion_id: &str) -> ApiResult<DiscussionResponse> {
        let url = self.discussion_url(discussion_id);
        tracing::debug!(%url, "fetching discussion");

        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }

    async fn send_message(
        &self,
        discussion_id: &str,
        user_id: &str,
        message: &str,
    ) -> ApiResult<SendMessageResponse> {
        let request = SendMessageRequest {
            discussion_id,
            user_id,
            message,
        };

        let response = self
            .client
            .post(self.conversation_url())
            .json(&request)
            .send()
            .await?;
        read_json(response).await
    }

    async fn request_auto_response(&self, discussion_id: &str) -> ApiResult<AutoResponse> {
        let request = AutoResponseRequest { discussion_id };

        let response = self
            .client
            .post(self.conversation_url())
            .json(&request)
            .send()
            .await?;
        read_json(response).await
    }
}
