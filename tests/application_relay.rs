//! Chat relay tests with a scripted agent and a recording chat surface

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use beanstack::application::relay::{
    ChannelKind, ChatSurface, EventKind, InboundEvent, PostedMessage, ProgressTicker, RelayBot,
    PROGRESS_MESSAGES,
};
use beanstack::infrastructure::agent_builder::{Conversation, ConverseReply};
use common::{setup, with_timeout, TEST_TIMEOUT_SHORT};

#[derive(Default)]
struct RecordingSurface {
    next_id: AtomicUsize,
    posts: Mutex<Vec<(String, String, String)>>,
    updates: Mutex<Vec<(String, String)>>,
}

impl RecordingSurface {
    fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().unwrap().clone()
    }

    fn last_update(&self) -> Option<String> {
        self.updates().last().map(|(_, text)| text.clone())
    }
}

#[async_trait]
impl ChatSurface for RecordingSurface {
    async fn post(&self, channel: &str, thread: &str, text: &str) -> Result<PostedMessage> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.posts.lock().unwrap().push((
            channel.to_string(),
            thread.to_string(),
            text.to_string(),
        ));
        Ok(PostedMessage {
            channel: channel.to_string(),
            id,
        })
    }

    async fn update(&self, message: &PostedMessage, text: &str) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((message.id.clone(), text.to_string()));
        Ok(())
    }
}

/// Agent that answers after `delay`, or fails
struct ScriptedAgent {
    delay: Duration,
    fail: bool,
    seen: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedAgent {
    fn answering(delay: Duration) -> Self {
        Self {
            delay,
            fail: false,
            seen: Mutex::new(vec![]),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::answering(Duration::ZERO)
        }
    }
}

#[async_trait]
impl Conversation for ScriptedAgent {
    async fn converse(&self, input: &str, conversation_id: Option<&str>) -> Result<ConverseReply> {
        self.seen
            .lock()
            .unwrap()
            .push((input.to_string(), conversation_id.map(String::from)));
        tokio::time::sleep(self.delay).await;
        if self.fail {
            anyhow::bail!("agent unavailable");
        }
        Ok(ConverseReply {
            conversation_id: Some("conv-1".to_string()),
            message: "**Revenue** is up in [Austin](https://kb.local/austin)".to_string(),
        })
    }
}

fn event(kind: EventKind, channel_kind: ChannelKind, thread: Option<&str>, text: &str) -> InboundEvent {
    InboundEvent {
        kind,
        channel: "C1".to_string(),
        channel_kind,
        ts: "100.1".to_string(),
        thread_ts: thread.map(String::from),
        text: text.to_string(),
        bot_id: None,
        subtype: None,
    }
}

fn bot(agent: Arc<ScriptedAgent>, surface: Arc<RecordingSurface>) -> RelayBot {
    RelayBot::new(agent, surface, "UBOT")
        .unwrap()
        .with_tick(Duration::from_millis(10))
}

#[test]
fn test_routing_policy() {
    let bot = bot(
        Arc::new(ScriptedAgent::answering(Duration::ZERO)),
        Arc::new(RecordingSurface::default()),
    );

    // channel chatter outside an active thread is ignored
    let chatter = event(EventKind::Message, ChannelKind::Channel, Some("100.1"), "hi all");
    assert!(bot.route(&chatter).is_none());

    // a mention strips the tag and activates its thread
    let mention = event(
        EventKind::Mention,
        ChannelKind::Channel,
        None,
        "<@UBOT> how did Austin do?",
    );
    let turn = bot.route(&mention).unwrap();
    assert_eq!(turn.text, "how did Austin do?");
    assert_eq!(turn.thread, "100.1");
    assert!(bot.is_active("100.1"));

    // follow-ups in that thread are answered without a mention
    let follow_up = event(EventKind::Message, ChannelKind::Channel, Some("100.1"), "and Portland?");
    assert_eq!(bot.route(&follow_up).unwrap().text, "and Portland?");

    let mut from_bot = event(EventKind::Message, ChannelKind::Direct, None, "beep");
    from_bot.bot_id = Some("B1".to_string());
    assert!(bot.route(&from_bot).is_none());

    let mut edited = event(EventKind::Message, ChannelKind::Direct, None, "fixed typo");
    edited.subtype = Some("message_changed".to_string());
    assert!(bot.route(&edited).is_none());

    let dm = event(EventKind::Message, ChannelKind::Direct, None, "any closures?");
    assert_eq!(bot.route(&dm).unwrap().thread, "100.1");

    let empty_mention = event(EventKind::Mention, ChannelKind::Channel, None, "<@UBOT>  ");
    assert!(bot.route(&empty_mention).is_none());
}

#[tokio::test]
async fn test_reply_replaces_status_message() {
    setup();
    let agent = Arc::new(ScriptedAgent::answering(Duration::from_millis(100)));
    let surface = Arc::new(RecordingSurface::default());
    let bot = bot(agent.clone(), surface.clone());

    let dm = event(EventKind::Message, ChannelKind::Direct, Some("T1"), "weekly summary?");
    let handled = with_timeout(TEST_TIMEOUT_SHORT, bot.handle_event(&dm))
        .await
        .unwrap();
    assert!(handled);

    let posts = surface.posts.lock().unwrap().clone();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].2, PROGRESS_MESSAGES[0]);

    let updates = surface.updates();
    assert!(updates.len() >= 2, "expected progress updates, got {:?}", updates);
    assert!(updates[..updates.len() - 1]
        .iter()
        .all(|(_, text)| PROGRESS_MESSAGES.contains(&text.as_str())));
    assert_eq!(
        surface.last_update().unwrap(),
        "*Revenue* is up in <https://kb.local/austin|Austin>"
    );
    assert_eq!(bot.conversation_id("T1").as_deref(), Some("conv-1"));

    // no ticker updates after the turn completed
    let settled = surface.updates().len();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(surface.updates().len(), settled);
}

#[tokio::test]
async fn test_conversation_continues_in_thread() {
    let agent = Arc::new(ScriptedAgent::answering(Duration::ZERO));
    let surface = Arc::new(RecordingSurface::default());
    let bot = bot(agent.clone(), surface);

    let first = event(EventKind::Message, ChannelKind::Direct, Some("T1"), "first");
    let second = event(EventKind::Message, ChannelKind::Direct, Some("T1"), "second");
    bot.handle_event(&first).await.unwrap();
    bot.handle_event(&second).await.unwrap();

    let seen = agent.seen.lock().unwrap().clone();
    assert_eq!(seen[0], ("first".to_string(), None));
    assert_eq!(seen[1], ("second".to_string(), Some("conv-1".to_string())));
}

#[tokio::test]
async fn test_agent_error_keeps_map_unchanged() {
    let surface = Arc::new(RecordingSurface::default());
    let bot = bot(Arc::new(ScriptedAgent::failing()), surface.clone());

    let dm = event(EventKind::Message, ChannelKind::Direct, Some("T9"), "hello");
    assert!(bot.handle_event(&dm).await.unwrap());

    assert!(bot.conversation_id("T9").is_none());
    let last = surface.last_update().unwrap();
    assert!(last.starts_with("Something went wrong:"), "{}", last);
    assert!(last.contains("agent unavailable"));
}

#[tokio::test]
async fn test_ticker_stops_cleanly() {
    let surface = Arc::new(RecordingSurface::default());
    let message = PostedMessage {
        channel: "C1".to_string(),
        id: "42".to_string(),
    };
    let ticker = ProgressTicker::start(surface.clone(), message, Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(55)).await;
    let updates = ticker.stop().await;

    assert!(updates >= 1);
    assert_eq!(surface.updates().len(), updates);
    assert_eq!(surface.updates()[0].1, PROGRESS_MESSAGES[1]);

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(surface.updates().len(), updates);
}
