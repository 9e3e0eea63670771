use std::collections::VecDeque;

use futures::stream::{self, StreamExt};
use log::{debug, warn};

use crate::error::{AdvisorError, Result};
use crate::llm::client::{ByteStream, GeminiClient};
use crate::llm::config::GeminiConfig;
use crate::llm::sse::SseDecoder;
use crate::llm::types::{Content, GenerateContentResponse};
use crate::profile::Profile;
use crate::prompts::system_instruction;
use crate::session::{ChatSession, ChunkStream, SessionFactory};

/// Creates Gemini-backed sessions.
///
/// The credential is resolved once, here. Without one every session still
/// gets created, and each send fails with a configuration error.
pub struct GeminiSessionFactory {
    client: Option<GeminiClient>,
}

impl GeminiSessionFactory {
    pub fn new(config: &GeminiConfig) -> Self {
        let client = match GeminiClient::new(config) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("{}; advisor requests will fail until it is configured", e);
                None
            }
        };
        Self { client }
    }

    pub fn from_env() -> Self {
        Self::new(&GeminiConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }
}

impl SessionFactory for GeminiSessionFactory {
    type Session = GeminiSession;

    fn create(&self, profile: Profile) -> GeminiSession {
        GeminiSession {
            client: self.client.clone(),
            profile,
            system: Content::system(system_instruction(profile)),
            history: Vec::new(),
        }
    }
}

pub struct GeminiSession {
    client: Option<GeminiClient>,
    profile: Profile,
    system: Content,
    history: Vec<Content>,
}

impl GeminiSession {
    /// Completed turns, alternating user and model.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    async fn open(&self, turn: &Content) -> Result<ByteStream> {
        let client = self.client.as_ref().ok_or_else(|| {
            AdvisorError::Configuration("GEMINI_API_KEY is not set".to_string())
        })?;

        let mut contents: Vec<&Content> = self.history.iter().collect();
        contents.push(turn);
        client.stream_generate_content(&self.system, contents).await
    }
}

impl ChatSession for GeminiSession {
    fn profile(&self) -> Profile {
        self.profile
    }

    fn system_instruction(&self) -> &str {
        self.system
            .parts
            .first()
            .map(|p| p.text.as_str())
            .unwrap_or_default()
    }

    fn send_streaming<'a>(&'a mut self, prompt: &str) -> ChunkStream<'a> {
        let state = TurnState::Start {
            session: self,
            turn: Content::user(prompt),
        };
        stream::try_unfold(state, |state| next_chunk(state)).boxed()
    }
}

enum TurnState<'a> {
    Start {
        session: &'a mut GeminiSession,
        turn: Content,
    },
    Streaming(Box<ActiveTurn<'a>>),
}

struct ActiveTurn<'a> {
    session: &'a mut GeminiSession,
    turn: Content,
    body: ByteStream,
    body_done: bool,
    decoder: SseDecoder,
    payloads: VecDeque<String>,
    pending: VecDeque<String>,
    reply: String,
}

impl ActiveTurn<'_> {
    fn accept(&mut self, payload: &str) -> Result<()> {
        let response: GenerateContentResponse = serde_json::from_str(payload)?;
        if let Some(reason) = response.block_reason() {
            return Err(AdvisorError::Request(format!(
                "Prompt blocked by the model: {}",
                reason
            )));
        }

        let text = response.text();
        if !text.is_empty() {
            self.pending.push_back(text);
        }
        Ok(())
    }
}

async fn next_chunk<'a>(state: TurnState<'a>) -> Result<Option<(String, TurnState<'a>)>> {
    let mut active = match state {
        TurnState::Start { session, turn } => {
            let body = session.open(&turn).await?;
            Box::new(ActiveTurn {
                session,
                turn,
                body,
                body_done: false,
                decoder: SseDecoder::new(),
                payloads: VecDeque::new(),
                pending: VecDeque::new(),
                reply: String::new(),
            })
        }
        TurnState::Streaming(active) => active,
    };

    loop {
        if let Some(text) = active.pending.pop_front() {
            active.reply.push_str(&text);
            return Ok(Some((text, TurnState::Streaming(active))));
        }

        // One payload at a time, so text decoded before a bad event still goes out.
        if let Some(payload) = active.payloads.pop_front() {
            active.accept(&payload)?;
            continue;
        }

        if active.body_done {
            let ActiveTurn {
                session,
                turn,
                reply,
                ..
            } = *active;
            debug!(
                "Turn complete: {} chars, {} turns in history",
                reply.len(),
                session.history.len() + 2
            );
            // Only a finished exchange joins the history.
            session.history.push(turn);
            session.history.push(Content::model(reply));
            return Ok(None);
        }

        match active.body.next().await {
            Some(bytes) => {
                let bytes = bytes?;
                let payloads = active.decoder.push(&bytes);
                active.payloads.extend(payloads);
            }
            None => {
                active.body_done = true;
                let last = active.decoder.finish();
                active.payloads.extend(last);
            }
        }
    }
}
