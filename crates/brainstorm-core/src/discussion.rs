//! Discussion synchronization.
//!
//! [`DiscussionSync`] owns the visible thread for one discussion. Network
//! work runs on spawned tasks that report back through a channel; every
//! state change happens in [`DiscussionSync::apply`] on the caller's task,
//! so a placeholder swap is a single update from the renderer's point of
//! view.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::activity::Activity;
use crate::api::{AutoResponse, Discussion, DiscussionApi, DiscussionResponse, SendMessageResponse};
use crate::convert::{self, convert_api_message, current_time, reply_message};
use crate::error::ApiResult;
use crate::query::QueryCache;
use crate::state::{MessageKind, UiMessage, UiRole};

pub const DEFAULT_USER_ID: &str = "human_user_001";
pub const SEND_ERROR_TEXT: &str = "Sorry, there was an error sending your message. Please try again.";
pub const TYPING_CONTENT: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Poll for an unsolicited agent reply once the user goes quiet.
    pub auto_fetch: bool,
    /// How long the user must be inactive before polling.
    pub inactivity_threshold: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            auto_fetch: true,
            inactivity_threshold: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No discussion bound; the thread shows seed messages.
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Results delivered from background work back to the owning task.
#[derive(Debug)]
pub enum SyncEvent {
    Loaded {
        generation: u64,
        result: ApiResult<DiscussionResponse>,
    },
    Replied {
        placeholder_id: String,
        result: ApiResult<SendMessageResponse>,
    },
    AutoReplied {
        placeholder_id: String,
        result: ApiResult<AutoResponse>,
    },
    InactivityElapsed {
        epoch: u64,
    },
}

pub struct DiscussionSync {
    api: Arc<dyn DiscussionApi>,
    cache: QueryCache,
    discussion_id: Option<String>,
    options: SyncOptions,

    messages: Vec<UiMessage>,
    discussion: Option<Discussion>,
    load_state: LoadState,
    user_id: String,

    activity: Activity,
    last_activity: Instant,
    load_generation: u64,
    timer_epoch: u64,
    timer: Option<JoinHandle<()>>,
    in_flight: Vec<JoinHandle<()>>,

    tx: mpsc::UnboundedSender<SyncEvent>,
    rx: mpsc::UnboundedReceiver<SyncEvent>,
}

impl DiscussionSync {
    /// Binds to `discussion_id`, or shows `fallback_messages` when there is
    /// none. Must be called inside a tokio runtime.
    pub fn new(
        api: Arc<dyn DiscussionApi>,
        cache: QueryCache,
        discussion_id: Option<String>,
        fallback_messages: Vec<UiMessage>,
        options: SyncOptions,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut sync = Self {
            api,
            cache,
            discussion_id,
            options,
            messages: Vec::new(),
            discussion: None,
            load_state: LoadState::Idle,
            user_id: DEFAULT_USER_ID.to_string(),
            activity: Activity::Idle,
            last_activity: Instant::now(),
            load_generation: 0,
            timer_epoch: 0,
            timer: None,
            in_flight: Vec::new(),
            tx,
            rx,
        };

        match sync.discussion_id.clone() {
            Some(id) => match sync.cache.cached(&id) {
                Some(data) => {
                    tracing::debug!(discussion = %id, "using cached transcript");
                    sync.apply_transcript(data);
                }
                None => sync.start_load(id),
            },
            None => sync.messages = fallback_messages,
        }

        sync.rearm_timer();
        sync
    }

    pub fn discussion_id(&self) -> Option<&str> {
        self.discussion_id.as_deref()
    }

    pub fn discussion(&self) -> Option<&Discussion> {
        self.discussion.as_ref()
    }

    pub fn messages(&self) -> &[UiMessage] {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut [UiMessage] {
        &mut self.messages
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.load_state {
            LoadState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn has_pending_reply(&self) -> bool {
        self.messages.iter().any(|m| m.is_typing)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        self.user_id = user_id.into();
    }

    /// Re-issues the discussion fetch, ignoring the freshness window.
    pub fn refetch(&mut self) {
        if let Some(id) = self.discussion_id.clone() {
            self.start_load(id);
        }
    }

    /// Tracks the input box so the inactivity poll never fires mid-sentence.
    pub fn note_input(&mut self, text: &str) {
        let next = self.activity.on_input(text);
        if next != self.activity {
            self.activity = next;
            self.rearm_timer();
        }
    }

    pub fn send_message(&mut self, content: &str) {
        let content = content.trim();
        let discussion_id = match self.discussion_id.clone() {
            Some(id) if !content.is_empty() => id,
            _ => {
                self.record_activity();
                return;
            }
        };

        self.messages.push(UiMessage {
            id: local_id("local"),
            kind: MessageKind::Human,
            author: "You".to_string(),
            avatar: "You".to_string(),
            role: None,
            content: content.to_string(),
            timestamp: current_time(),
            reactions: Vec::new(),
            is_typing: false,
        });

        let placeholder_id = local_id("typing");
        self.messages.push(placeholder(
            placeholder_id.clone(),
            "Moderator",
            "MOD",
            Some(UiRole::Moderator),
        ));

        self.activity = self.activity.on_request();
        self.record_activity();

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let user_id = self.user_id.clone();
        let message = content.to_string();
        tracing::info!(discussion = %discussion_id, "sending message");

        self.spawn(async move {
            let result = api.send_message(&discussion_id, &user_id, &message).await;
            let _ = tx.send(SyncEvent::Replied {
                placeholder_id,
                result,
            });
        });
    }

    /// Waits for the next background result. Never yields `None` while the
    /// instance is alive since it holds its own sender.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        self.rx.recv().await
    }

    /// Applies every result that has already arrived. Returns how many.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    pub fn apply(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Loaded { generation, result } => {
                if generation != self.load_generation {
                    tracing::debug!(generation, "dropping superseded transcript");
                    return;
                }
                match result {
                    Ok(data) => self.apply_transcript(data),
                    Err(err) => {
                        tracing::error!("failed to load discussion: {}", err);
                        self.load_state = LoadState::Failed(err.to_string());
                    }
                }
            }
            SyncEvent::Replied {
                placeholder_id,
                result,
            } => {
                self.remove_message(&placeholder_id);
                let reply = match result {
                    Ok(response) => reply_message(
                        local_id("reply"),
                        &response.response_agent,
                        &response.response_message,
                    ),
                    Err(err) => {
                        tracing::error!("error sending message: {}", err);
                        system_error()
                    }
                };
                self.messages.push(reply);
                self.activity = self.activity.on_reply();
                self.record_activity();
            }
            SyncEvent::AutoReplied {
                placeholder_id,
                result,
            } => {
                self.remove_message(&placeholder_id);
                match result {
                    Ok(AutoResponse {
                        response_message: Some(text),
                        response_agent,
                    }) if !text.is_empty() => {
                        let agent = response_agent.unwrap_or_default();
                        self.messages.push(reply_message(local_id("auto"), &agent, &text));
                    }
                    Ok(_) => tracing::debug!("auto-fetch returned no reply"),
                    Err(err) => tracing::warn!("error auto-fetching response: {}", err),
                }
                self.activity = self.activity.on_reply();
                self.record_activity();
            }
            SyncEvent::InactivityElapsed { epoch } => {
                if epoch != self.timer_epoch || !self.activity.is_idle() {
                    return;
                }
                if self.last_activity.elapsed() >= self.options.inactivity_threshold {
                    tracing::info!("user inactive, auto-fetching response");
                    self.start_auto_fetch();
                } else {
                    self.rearm_timer();
                }
            }
        }
    }

    /// Cancels the timer and every outstanding request. Further results are
    /// never applied. Also runs on drop.
    pub fn dispose(&mut self) {
        self.timer_epoch += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        for task in self.in_flight.drain(..) {
            task.abort();
        }
        self.rx.close();
    }

    fn apply_transcript(&mut self, data: DiscussionResponse) {
        self.messages = data.messages.iter().map(convert_api_message).collect();
        self.discussion = Some(data.discussion);
        self.load_state = LoadState::Ready;
    }

    fn start_load(&mut self, discussion_id: String) {
        self.load_generation += 1;
        if self.discussion.is_none() {
            self.load_state = LoadState::Loading;
        }

        let generation = self.load_generation;
        let api = Arc::clone(&self.api);
        let cache = self.cache.clone();
        let tx = self.tx.clone();

        self.spawn(async move {
            let result = cache.fetch(api.as_ref(), &discussion_id).await;
            let _ = tx.send(SyncEvent::Loaded { generation, result });
        });
    }

    fn start_auto_fetch(&mut self) {
        let Some(discussion_id) = self.discussion_id.clone() else {
            return;
        };

        let placeholder_id = local_id("typing-auto");
        self.messages
            .push(placeholder(placeholder_id.clone(), convert::AI_LABEL, convert::AI_LABEL, None));
        self.activity = self.activity.on_request();
        self.rearm_timer();

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.spawn(async move {
            let result = api.request_auto_response(&discussion_id).await;
            let _ = tx.send(SyncEvent::AutoReplied {
                placeholder_id,
                result,
            });
        });
    }

    fn record_activity(&mut self) {
        self.last_activity = Instant::now();
        self.rearm_timer();
    }

    /// Replaces any pending timer. A new one is armed only while idle.
    fn rearm_timer(&mut self) {
        self.timer_epoch += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        if !self.options.auto_fetch || self.discussion_id.is_none() || !self.activity.is_idle() {
            return;
        }

        let epoch = self.timer_epoch;
        let deadline = self.last_activity + self.options.inactivity_threshold;
        let tx = self.tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(SyncEvent::InactivityElapsed { epoch });
        }));
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.in_flight.retain(|handle| !handle.is_finished());
        self.in_flight.push(tokio::spawn(task));
    }

    fn remove_message(&mut self, id: &str) {
        self.messages.retain(|m| m.id != id);
    }
}

impl Drop for DiscussionSync {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn local_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

fn placeholder(id: String, author: &str, avatar: &str, role: Option<UiRole>) -> UiMessage {
    UiMessage {
        id,
        kind: MessageKind::Ai,
        author: author.to_string(),
        avatar: avatar.to_string(),
        role,
        content: TYPING_CONTENT.to_string(),
        timestamp: current_time(),
        reactions: Vec::new(),
        is_typing: true,
    }
}

fn system_error() -> UiMessage {
    UiMessage {
        id: local_id("error"),
        kind: MessageKind::Ai,
        author: "System".to_string(),
        avatar: "SYS".to_string(),
        role: None,
        content: SEND_ERROR_TEXT.to_string(),
        timestamp: current_time(),
        reactions: Vec::new(),
        is_typing: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Agent, Message};
    use crate::error::ApiError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct FakeService {
        transcript: Mutex<Vec<Message>>,
        fail_fetch: AtomicBool,
        fail_send: AtomicBool,
        fail_auto: AtomicBool,
        auto_reply: Mutex<Option<String>>,
        gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
        fetch_calls: AtomicU32,
        auto_calls: AtomicU32,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl FakeService {
        fn with_transcript(messages: Vec<Message>) -> Arc<Self> {
            let service = Self::default();
            *service.transcript.lock() = messages;
            Arc::new(service)
        }

        fn gate(&self, message: &str) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().insert(message.to_string(), rx);
            tx
        }
    }

    fn unavailable() -> ApiError {
        ApiError::Status {
            status: 500,
            body: "boom".to_string(),
        }
    }

    fn expert() -> Agent {
        Agent {
            display_name: "Ada".to_string(),
            role: "EXPERT".to_string(),
            tag: "Research".to_string(),
            ..Agent::default()
        }
    }

    #[async_trait]
    impl DiscussionApi for FakeService {
        async fn fetch_discussion(&self, discussion_id: &str) -> ApiResult<DiscussionResponse> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            Ok(DiscussionResponse {
                discussion: Discussion {
                    id: discussion_id.to_string(),
                    title: "Onboarding".to_string(),
                    ..Discussion::default()
                },
                messages: self.transcript.lock().clone(),
            })
        }

        async fn send_message(
            &self,
            _discussion_id: &str,
            user_id: &str,
            message: &str,
        ) -> ApiResult<SendMessageResponse> {
            let gate = self.gates.lock().remove(message);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.sent.lock().push((user_id.to_string(), message.to_string()));
            if self.fail_send.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            Ok(SendMessageResponse {
                response_message: format!("re: {}", message),
                response_agent: expert(),
            })
        }

        async fn request_auto_response(&self, _discussion_id: &str) -> ApiResult<AutoResponse> {
            self.auto_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_auto.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            let text = self.auto_reply.lock().clone();
            Ok(AutoResponse {
                response_message: text,
                response_agent: Some(expert()),
            })
        }
    }

    fn wire(id: &str, role: &str, text: &str) -> Message {
        Message {
            discussion_id: "d-1".to_string(),
            msg_id: id.to_string(),
            agent_id: "a-1".to_string(),
            agent_role: role.to_string(),
            message: text.to_string(),
            timestamp: 1_700_000_000_000,
            agent: None,
        }
    }

    fn manual() -> SyncOptions {
        SyncOptions {
            auto_fetch: false,
            ..SyncOptions::default()
        }
    }

    async fn loaded(service: Arc<FakeService>, options: SyncOptions) -> DiscussionSync {
        let mut sync = DiscussionSync::new(
            service,
            QueryCache::default(),
            Some("d-1".to_string()),
            Vec::new(),
            options,
        );
        let event = sync.next_event().await.unwrap();
        sync.apply(event);
        sync
    }

    async fn settle(sync: &mut DiscussionSync) {
        let event = sync.next_event().await.unwrap();
        sync.apply(event);
    }

    fn typing_count(sync: &DiscussionSync) -> usize {
        sync.messages().iter().filter(|m| m.is_typing).count()
    }

    #[tokio::test]
    async fn test_initial_load_converts_transcript() {
        let service = FakeService::with_transcript(vec![
            wire("m-1", "HUMAN", "What if onboarding were interactive?"),
            wire("m-2", "EXPERT", "Progressive disclosure works well"),
        ]);
        let sync = loaded(service, manual()).await;

        assert_eq!(sync.load_state(), &LoadState::Ready);
        assert_eq!(sync.discussion().unwrap().title, "Onboarding");
        let ids: Vec<&str> = sync.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m-1", "m-2"]);
        assert_eq!(sync.messages()[1].avatar, "EXP");
    }

    #[tokio::test]
    async fn test_empty_transcript_is_ready_not_error() {
        let sync = loaded(FakeService::with_transcript(Vec::new()), manual()).await;
        assert_eq!(sync.load_state(), &LoadState::Ready);
        assert!(sync.messages().is_empty());
        assert!(sync.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_surfaces_error_after_retries() {
        let service = FakeService::with_transcript(Vec::new());
        service.fail_fetch.store(true, Ordering::SeqCst);
        let sync = loaded(Arc::clone(&service), manual()).await;

        assert!(matches!(sync.load_state(), LoadState::Failed(_)));
        assert!(sync.error().unwrap().contains("500"));
        assert_eq!(service.fetch_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_without_discussion_uses_fallback() {
        let fallback = vec![reply_message("seed-1".to_string(), &expert(), "Welcome")];
        let mut sync = DiscussionSync::new(
            FakeService::with_transcript(Vec::new()),
            QueryCache::default(),
            None,
            fallback.clone(),
            SyncOptions::default(),
        );

        assert_eq!(sync.messages(), fallback.as_slice());
        assert_eq!(sync.load_state(), &LoadState::Idle);

        sync.send_message("Hello");
        assert_eq!(sync.messages(), fallback.as_slice());
    }

    #[tokio::test]
    async fn test_blank_messages_are_ignored() {
        let service = FakeService::with_transcript(vec![wire("m-1", "EXPERT", "hi")]);
        let mut sync = loaded(Arc::clone(&service), manual()).await;
        let before = sync.messages().to_vec();

        sync.send_message("");
        sync.send_message("   ");

        assert_eq!(sync.messages(), before.as_slice());
        assert!(service.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn test_send_appends_human_then_reply() {
        let service = FakeService::with_transcript(Vec::new());
        let mut sync = loaded(Arc::clone(&service), manual()).await;
        sync.set_user_id("sarah");

        sync.send_message("  Hello  ");
        assert_eq!(sync.messages().len(), 2);
        assert_eq!(sync.messages()[0].content, "Hello");
        assert_eq!(sync.messages()[0].author, "You");
        assert!(sync.messages()[1].is_typing);
        assert_eq!(sync.messages()[1].author, "Moderator");
        assert!(sync.has_pending_reply());

        settle(&mut sync).await;

        assert_eq!(sync.messages().len(), 2);
        assert_eq!(typing_count(&sync), 0);
        let reply = &sync.messages()[1];
        assert_eq!(reply.content, "re: Hello");
        assert_eq!(reply.author, "Ada");
        assert_eq!(reply.avatar, "Res");
        assert_eq!(reply.role, Some(UiRole::Expert));
        assert_eq!(
            service.sent.lock().as_slice(),
            &[("sarah".to_string(), "Hello".to_string())]
        );
        assert!(sync.activity().is_idle());
    }

    #[tokio::test]
    async fn test_send_failure_leaves_system_message() {
        let service = FakeService::with_transcript(Vec::new());
        service.fail_send.store(true, Ordering::SeqCst);
        let mut sync = loaded(service, manual()).await;

        sync.send_message("Hello");
        settle(&mut sync).await;

        let messages = sync.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].author, "System");
        assert_eq!(messages[1].content, SEND_ERROR_TEXT);
        assert_eq!(typing_count(&sync), 0);
    }

    #[tokio::test]
    async fn test_concurrent_sends_keep_separate_placeholders() {
        let service = FakeService::with_transcript(Vec::new());
        let first_gate = service.gate("first");
        let second_gate = service.gate("second");
        let mut sync = loaded(Arc::clone(&service), manual()).await;

        sync.send_message("first");
        sync.send_message("second");
        assert_eq!(typing_count(&sync), 2);
        let placeholders: Vec<String> = sync
            .messages()
            .iter()
            .filter(|m| m.is_typing)
            .map(|m| m.id.clone())
            .collect();
        assert_ne!(placeholders[0], placeholders[1]);

        second_gate.send(()).unwrap();
        settle(&mut sync).await;

        assert_eq!(typing_count(&sync), 1);
        assert!(sync.messages().iter().any(|m| m.id == placeholders[0]));
        assert_eq!(sync.messages().last().unwrap().content, "re: second");
        assert!(!sync.activity().is_idle());

        first_gate.send(()).unwrap();
        settle(&mut sync).await;

        assert_eq!(typing_count(&sync), 0);
        let contents: Vec<&str> = sync.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "re: second", "re: first"]);
        assert!(sync.activity().is_idle());
    }

    #[tokio::test]
    async fn test_refetch_reproduces_same_thread() {
        let service = FakeService::with_transcript(vec![
            wire("m-1", "MODERATOR", "Let's summarise"),
            wire("m-2", "HUMAN", "Sounds good"),
        ]);
        let mut sync = loaded(Arc::clone(&service), manual()).await;
        let before = sync.messages().to_vec();

        sync.refetch();
        assert!(!sync.is_loading());
        settle(&mut sync).await;

        assert_eq!(sync.messages(), before.as_slice());
        assert_eq!(service.fetch_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let service = FakeService::with_transcript(vec![wire("m-1", "EXPERT", "cached")]);
        let cache = QueryCache::default();
        let api: Arc<dyn DiscussionApi> = service.clone();

        let mut first = DiscussionSync::new(
            Arc::clone(&api),
            cache.clone(),
            Some("d-1".to_string()),
            Vec::new(),
            manual(),
        );
        settle(&mut first).await;
        drop(first);

        let second = DiscussionSync::new(api, cache, Some("d-1".to_string()), Vec::new(), manual());
        assert_eq!(second.load_state(), &LoadState::Ready);
        assert_eq!(second.messages()[0].content, "cached");
        assert_eq!(service.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactivity_fetches_unsolicited_reply() {
        let service = FakeService::with_transcript(Vec::new());
        *service.auto_reply.lock() = Some("Any thoughts on pricing?".to_string());
        let mut sync = loaded(Arc::clone(&service), SyncOptions::default()).await;

        let start = Instant::now();
        settle(&mut sync).await;
        assert!(start.elapsed() >= Duration::from_secs(29));
        assert_eq!(typing_count(&sync), 1);
        assert_eq!(sync.messages()[0].author, "AI");

        settle(&mut sync).await;
        assert_eq!(typing_count(&sync), 0);
        assert_eq!(sync.messages().len(), 1);
        assert_eq!(sync.messages()[0].content, "Any thoughts on pricing?");
        assert_eq!(service.auto_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_fetch_failure_is_silent() {
        let service = FakeService::with_transcript(vec![wire("m-1", "EXPERT", "hi")]);
        service.fail_auto.store(true, Ordering::SeqCst);
        let mut sync = loaded(service, SyncOptions::default()).await;

        settle(&mut sync).await;
        settle(&mut sync).await;

        assert_eq!(sync.messages().len(), 1);
        assert_eq!(sync.messages()[0].id, "m-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_auto_reply_is_dropped() {
        let service = FakeService::with_transcript(Vec::new());
        let mut sync = loaded(service, SyncOptions::default()).await;

        settle(&mut sync).await;
        settle(&mut sync).await;

        assert!(sync.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_composing_holds_off_inactivity_poll() {
        let service = FakeService::with_transcript(Vec::new());
        let mut sync = loaded(Arc::clone(&service), SyncOptions::default()).await;

        sync.note_input("half a thought");
        assert_eq!(sync.activity(), Activity::Composing);

        let waited = tokio::time::timeout(Duration::from_secs(120), sync.next_event()).await;
        assert!(waited.is_err());
        assert_eq!(service.auto_calls.load(Ordering::SeqCst), 0);

        sync.note_input("");
        settle(&mut sync).await;
        assert_eq!(typing_count(&sync), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_pushes_the_poll_back() {
        let service = FakeService::with_transcript(Vec::new());
        let mut sync = loaded(Arc::clone(&service), SyncOptions::default()).await;

        tokio::time::advance(Duration::from_secs(20)).await;
        sync.send_message("");

        let start = Instant::now();
        settle(&mut sync).await;
        assert!(start.elapsed() >= Duration::from_secs(29));
        assert_eq!(typing_count(&sync), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_draft_typed_while_waiting_holds_off_poll() {
        let service = FakeService::with_transcript(Vec::new());
        let gate = service.gate("first");
        let mut sync = loaded(Arc::clone(&service), SyncOptions::default()).await;

        sync.send_message("first");
        sync.note_input("");
        sync.note_input("half a second thought");
        gate.send(()).unwrap();
        settle(&mut sync).await;

        assert_eq!(sync.activity(), Activity::Composing);
        assert_eq!(typing_count(&sync), 0);

        let waited = tokio::time::timeout(Duration::from_secs(120), sync.next_event()).await;
        assert!(waited.is_err());
        assert_eq!(typing_count(&sync), 0);
        assert_eq!(service.auto_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_reply_restarts_inactivity_window() {
        let service = FakeService::with_transcript(Vec::new());
        let gate = service.gate("slow");
        let mut sync = loaded(Arc::clone(&service), SyncOptions::default()).await;

        sync.send_message("slow");
        tokio::time::advance(Duration::from_secs(45)).await;
        gate.send(()).unwrap();
        settle(&mut sync).await;
        assert_eq!(typing_count(&sync), 0);
        assert!(sync.activity().is_idle());

        let start = Instant::now();
        settle(&mut sync).await;
        assert!(start.elapsed() >= Duration::from_secs(29));
        assert_eq!(typing_count(&sync), 1);
    }

    #[tokio::test]
    async fn test_dispose_cancels_outstanding_send() {
        let service = FakeService::with_transcript(Vec::new());
        let gate = service.gate("late");
        let mut sync = loaded(Arc::clone(&service), manual()).await;

        sync.send_message("late");
        drop(sync);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(gate.is_closed());
        assert!(service.sent.lock().is_empty());
    }
}
