//! Chat relay
//!
//! Forwards chat messages to the hosted agent and posts its replies back.
//! While the agent is working, a background ticker keeps editing a status
//! message; it is always stopped and joined before a turn completes.
//!
//! The chat platform sits behind `ChatSurface`. `CliSurface` drives the relay
//! from a terminal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use regex::Regex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::infrastructure::agent_builder::Conversation;

/// Status texts cycled while waiting for the agent
pub const PROGRESS_MESSAGES: [&str; 6] = [
    ":coffee: Thinking...",
    ":coffee: Working on it...",
    ":coffee: Processing...",
    ":coffee: Searching reports...",
    ":coffee: Crunching numbers...",
    ":coffee: Almost there...",
];

pub const DEFAULT_TICK: Duration = Duration::from_secs(3);

/// A message the relay posted and may edit later
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub id: String,
}

/// Chat platform seam
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Post `text` into `thread` of `channel`
    async fn post(&self, channel: &str, thread: &str, text: &str) -> Result<PostedMessage>;

    /// Replace the text of a posted message
    async fn update(&self, message: &PostedMessage, text: &str) -> Result<()>;
}

/// Kind of inbound chat event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The bot was tagged
    Mention,
    /// Plain message
    Message,
}

/// Where an event was posted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Direct,
    Channel,
}

/// Inbound chat event
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub kind: EventKind,
    pub channel: String,
    pub channel_kind: ChannelKind,
    /// Id of the message itself
    pub ts: String,
    /// Thread the message belongs to, if any
    pub thread_ts: Option<String>,
    pub text: String,
    pub bot_id: Option<String>,
    pub subtype: Option<String>,
}

/// A user turn the relay will answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub channel: String,
    pub thread: String,
    pub text: String,
}

/// Markdown to chat markup
pub struct ChatMarkup {
    link: Regex,
    bold: Regex,
    header: Regex,
    strike: Regex,
    bullet: Regex,
}

impl ChatMarkup {
    pub fn new() -> Result<Self> {
        Ok(Self {
            link: Regex::new(r"\[([^\]]+)\]\(([^)]+)\)")?,
            bold: Regex::new(r"\*\*(.+?)\*\*")?,
            header: Regex::new(r"(?m)^#{1,3}\s+(.+)$")?,
            strike: Regex::new(r"~~(.+?)~~")?,
            bullet: Regex::new(r"(?m)^[-*]\s+")?,
        })
    }

    /// Links, bold, headers, strikethrough and bullets, in that order
    pub fn convert(&self, text: &str) -> String {
        let text = self.link.replace_all(text, "<${2}|${1}>");
        let text = self.bold.replace_all(&text, "*${1}*");
        let text = self.header.replace_all(&text, "*${1}*");
        let text = self.strike.replace_all(&text, "~${1}~");
        self.bullet.replace_all(&text, "• ").into_owned()
    }
}

/// Background task cycling the status message
pub struct ProgressTicker {
    done: oneshot::Sender<()>,
    handle: JoinHandle<usize>,
}

impl ProgressTicker {
    /// Start cycling from the second progress message, one update per `tick`
    pub fn start(surface: Arc<dyn ChatSurface>, message: PostedMessage, tick: Duration) -> Self {
        let (done, mut done_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut idx = 1;
            let mut updates = 0;
            loop {
                tokio::select! {
                    _ = &mut done_rx => break,
                    _ = tokio::time::sleep(tick) => {
                        let text = PROGRESS_MESSAGES[idx % PROGRESS_MESSAGES.len()];
                        if let Err(e) = surface.update(&message, text).await {
                            debug!("Progress update failed: {:#}", e);
                        }
                        idx += 1;
                        updates += 1;
                    }
                }
            }
            updates
        });

        Self { done, handle }
    }

    /// Signal the ticker and wait for it to exit. Returns the number of
    /// updates it made.
    pub async fn stop(self) -> usize {
        let _ = self.done.send(());
        match self.handle.await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("Progress ticker ended abnormally: {}", e);
                0
            }
        }
    }
}

/// Relay between a chat surface and the hosted agent
pub struct RelayBot {
    agent: Arc<dyn Conversation>,
    surface: Arc<dyn ChatSurface>,
    bot_user_id: String,
    markup: ChatMarkup,
    tick: Duration,
    /// thread id -> agent conversation id
    conversations: DashMap<String, String>,
    /// threads the bot was mentioned in
    active_threads: DashSet<String>,
}

impl RelayBot {
    pub fn new(
        agent: Arc<dyn Conversation>,
        surface: Arc<dyn ChatSurface>,
        bot_user_id: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            agent,
            surface,
            bot_user_id: bot_user_id.into(),
            markup: ChatMarkup::new()?,
            tick: DEFAULT_TICK,
            conversations: DashMap::new(),
            active_threads: DashSet::new(),
        })
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn conversation_id(&self, thread: &str) -> Option<String> {
        self.conversations.get(thread).map(|id| id.value().clone())
    }

    pub fn is_active(&self, thread: &str) -> bool {
        self.active_threads.contains(thread)
    }

    /// Decide whether an event gets an answer.
    ///
    /// Mentions are answered with the bot tag stripped and mark their thread
    /// active. Messages from bots or with a subtype are ignored. Direct
    /// messages are always answered; channel messages only inside active
    /// threads.
    pub fn route(&self, event: &InboundEvent) -> Option<Turn> {
        match event.kind {
            EventKind::Mention => {
                let tag = format!("<@{}>", self.bot_user_id);
                let text = event.text.replace(&tag, "").trim().to_string();
                if text.is_empty() {
                    return None;
                }
                let thread = event.thread_ts.clone().unwrap_or_else(|| event.ts.clone());
                self.active_threads.insert(thread.clone());
                Some(Turn {
                    channel: event.channel.clone(),
                    thread,
                    text,
                })
            }
            EventKind::Message => {
                if event.bot_id.is_some() || event.subtype.is_some() {
                    return None;
                }
                let text = event.text.trim();
                if text.is_empty() {
                    return None;
                }
                let in_active_thread = event
                    .thread_ts
                    .as_deref()
                    .is_some_and(|t| self.is_active(t));
                if !in_active_thread && event.channel_kind != ChannelKind::Direct {
                    return None;
                }
                Some(Turn {
                    channel: event.channel.clone(),
                    thread: event.thread_ts.clone().unwrap_or_else(|| event.ts.clone()),
                    text: text.to_string(),
                })
            }
        }
    }

    /// Route and answer one event. Returns whether it was answered.
    pub async fn handle_event(&self, event: &InboundEvent) -> Result<bool> {
        match self.route(event) {
            Some(turn) => {
                self.respond(&turn).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Answer a turn. Agent failures are shown in the status message and
    /// leave the conversation map untouched.
    pub async fn respond(&self, turn: &Turn) -> Result<()> {
        let status = self
            .surface
            .post(&turn.channel, &turn.thread, PROGRESS_MESSAGES[0])
            .await
            .context("failed to post status message")?;

        let ticker = ProgressTicker::start(self.surface.clone(), status.clone(), self.tick);
        let existing = self.conversation_id(&turn.thread);
        let result = self.agent.converse(&turn.text, existing.as_deref()).await;
        ticker.stop().await;

        match result {
            Ok(reply) => {
                if let Some(id) = reply.conversation_id {
                    self.conversations.insert(turn.thread.clone(), id);
                }
                self.surface
                    .update(&status, &self.markup.convert(&reply.message))
                    .await
            }
            Err(e) => {
                warn!("Agent call failed for thread {}: {:#}", turn.thread, e);
                self.surface
                    .update(&status, &format!("Something went wrong: {}", e))
                    .await
            }
        }
    }
}

/// Terminal chat surface
pub struct CliSurface {
    next_id: AtomicU64,
}

impl CliSurface {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for CliSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatSurface for CliSurface {
    async fn post(&self, channel: &str, _thread: &str, text: &str) -> Result<PostedMessage> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        println!("[agent] {}", text);
        Ok(PostedMessage {
            channel: channel.to_string(),
            id,
        })
    }

    async fn update(&self, _message: &PostedMessage, text: &str) -> Result<()> {
        println!("[agent] {}", text);
        Ok(())
    }
}

/// Read lines from stdin as direct messages in one conversation thread
pub async fn run_terminal(bot: &RelayBot) -> Result<()> {
    const CHANNEL: &str = "terminal";
    info!("Relay ready, type a question (Ctrl-D to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seq = 0u64;
    while let Some(line) = lines.next_line().await? {
        seq += 1;
        let event = InboundEvent {
            kind: EventKind::Message,
            channel: CHANNEL.to_string(),
            channel_kind: ChannelKind::Direct,
            ts: seq.to_string(),
            thread_ts: Some(CHANNEL.to_string()),
            text: line,
            bot_id: None,
            subtype: None,
        };
        if let Err(e) = bot.handle_event(&event).await {
            warn!("Relay error: {:#}", e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_conversion() {
        let markup = ChatMarkup::new().unwrap();
        assert_eq!(
            markup.convert("See [the report](https://x.io/r/1)"),
            "See <https://x.io/r/1|the report>"
        );
        assert_eq!(markup.convert("**Revenue** is up"), "*Revenue* is up");
        assert_eq!(markup.convert("## Summary\nok"), "*Summary*\nok");
        assert_eq!(markup.convert("~~old~~ new"), "~old~ new");
        assert_eq!(markup.convert("- one\n* two"), "• one\n• two");
    }
}
