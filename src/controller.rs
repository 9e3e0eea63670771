use futures::channel::mpsc::UnboundedSender;
use futures::StreamExt;
use log::{debug, info, warn};
use std::future::Future;

use crate::error::{AdvisorError, Result};
use crate::ingestion::parse_transactions;
use crate::profile::Profile;
use crate::render::{format_response, transaction_table, TransactionTable};
use crate::schema::Transaction;
use crate::session::{ChatSession, SessionFactory};
use crate::summary::build_prompt;
use crate::transcript::{EntryKind, Transcript};

pub const THINKING_PLACEHOLDER: &str = "Thinking...";
pub const FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while contacting the advisor. Please try again.";
pub const CONFIGURATION_MESSAGE: &str =
    "The advisor is not configured. Set GEMINI_API_KEY and restart the app.";
pub const INTERRUPTED_MESSAGE: &str =
    "The advisor's reply was interrupted. Please try again.";
pub const FORMAT_HINT: &str =
    "No valid transactions found. Upload a CSV whose first line is a header, followed by date,description,amount rows.";

#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    ProfileSelected { profile: Profile },
    InputDisabled,
    UserMessage { text: String },
    ResponseStarted,
    /// `html` is the whole reply so far, re-rendered from scratch.
    ResponseUpdated { chunk: String, html: String },
    ResponseCompleted { html: String },
    ResponseFailed { message: String },
    SuggestionsOffered { prompts: Vec<String> },
    InputEnabled,
    TransactionsLoaded { file_name: String, count: usize, message: String },
    AttachmentFailed { message: String },
    AttachmentCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingProfile,
    InputEnabled,
    RequestInFlight,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Ignored,
    NoProfile,
    /// A configuration error was already reported for this session.
    Halted,
    /// Another request is still streaming.
    Busy,
    Completed { response: String },
    Failed(AdvisorError),
}

impl SubmitOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SubmitOutcome::Completed { .. })
    }
}

/// Everything a conversation tracks between user actions.
pub struct ConversationState<S> {
    profile: Option<Profile>,
    session: Option<S>,
    transactions: Vec<Transaction>,
    attachment: Option<String>,
    in_flight: bool,
    halted: bool,
}

impl<S> Default for ConversationState<S> {
    fn default() -> Self {
        Self {
            profile: None,
            session: None,
            transactions: Vec::new(),
            attachment: None,
            in_flight: false,
            halted: false,
        }
    }
}

#[derive(Default)]
struct EventSink(Option<UnboundedSender<ConversationEvent>>);

impl EventSink {
    fn emit(&self, event: ConversationEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.unbounded_send(event);
        }
    }
}

pub struct ConversationController<F: SessionFactory> {
    factory: F,
    state: ConversationState<F::Session>,
    transcript: Transcript,
    events: EventSink,
}

impl<F: SessionFactory> ConversationController<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            state: ConversationState::default(),
            transcript: Transcript::new(),
            events: EventSink::default(),
        }
    }

    pub fn with_events(mut self, sender: UnboundedSender<ConversationEvent>) -> Self {
        self.events = EventSink(Some(sender));
        self
    }

    pub fn phase(&self) -> Phase {
        if self.state.session.is_none() {
            Phase::AwaitingProfile
        } else if self.state.in_flight {
            Phase::RequestInFlight
        } else {
            Phase::InputEnabled
        }
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state.profile
    }

    pub fn session(&self) -> Option<&F::Session> {
        self.state.session.as_ref()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    /// Name of the attached file, if any.
    pub fn attachment(&self) -> Option<&str> {
        self.state.attachment.as_deref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.in_flight
    }

    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Starts a fresh conversation for `profile`, dropping any previous session.
    pub fn select_profile(&mut self, profile: Profile) {
        let session = self.factory.create(profile);
        info!("Advisor session started for profile: {}", profile);

        self.state.profile = Some(profile);
        self.state.session = Some(session);
        self.state.halted = false;
        self.transcript.clear();
        self.events.emit(ConversationEvent::ProfileSelected { profile });
    }

    /// Sends `text` to the advisor and streams the reply into the transcript.
    ///
    /// Input is disabled for the whole request and re-enabled on every exit
    /// path. The model receives the text prefixed with a summary of loaded
    /// transactions; the transcript shows only what the user typed.
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }
        let Some(session) = self.state.session.as_mut() else {
            return SubmitOutcome::NoProfile;
        };
        if self.state.halted {
            return SubmitOutcome::Halted;
        }
        if self.state.in_flight {
            return SubmitOutcome::Busy;
        }

        let prompt = build_prompt(text, &self.state.transactions);
        debug!(
            "Submitting {} chars ({} with transaction context)",
            text.len(),
            prompt.len()
        );

        let mut flight = InFlight::begin(
            &mut self.state.in_flight,
            &mut self.transcript,
            &self.events,
            text,
        );
        let result = stream_reply(session, &prompt, &mut flight).await;

        let outcome = match result {
            Ok(reply) => {
                let html = format_response(&reply);
                flight.settle(
                    EntryKind::Advisor {
                        html: html.clone(),
                        pending: false,
                    },
                    ConversationEvent::ResponseCompleted { html },
                );
                debug!("Advisor reply complete ({} chars)", reply.len());
                SubmitOutcome::Completed { response: reply }
            }
            Err(err) => {
                let message = if err.is_configuration() {
                    CONFIGURATION_MESSAGE
                } else {
                    FAILURE_MESSAGE
                };
                warn!("Advisor request failed: {}", err);

                flight.settle(
                    EntryKind::Failure {
                        message: message.to_string(),
                    },
                    ConversationEvent::ResponseFailed {
                        message: message.to_string(),
                    },
                );
                if err.is_configuration() {
                    self.state.halted = true;
                }
                SubmitOutcome::Failed(err)
            }
        };

        if outcome.is_completed() && self.transcript.user_turns() == 1 {
            self.offer_suggestions();
        }

        outcome
    }

    /// Submits the `index`-th quick reply of the active profile.
    pub async fn choose_suggestion(&mut self, index: usize) -> SubmitOutcome {
        let Some(profile) = self.state.profile else {
            return SubmitOutcome::NoProfile;
        };
        match profile.suggested_prompts().get(index) {
            Some(prompt) => self.submit(prompt).await,
            None => SubmitOutcome::Ignored,
        }
    }

    /// Replaces the loaded transactions with the contents of `file_name`.
    ///
    /// `read` is the pending file read. A failed read clears any previous
    /// upload instead of keeping stale data.
    pub async fn attach_file<R>(&mut self, file_name: &str, read: R) -> Result<usize>
    where
        R: Future<Output = std::io::Result<String>>,
    {
        match read.await {
            Ok(raw) => {
                self.state.transactions = parse_transactions(&raw);
                self.state.attachment = Some(file_name.to_string());

                let count = self.state.transactions.len();
                let message = if count > 0 {
                    format!(
                        "Loaded {} transactions from {}. Your totals will be shared with the advisor when you send a message.",
                        count, file_name
                    )
                } else {
                    FORMAT_HINT.to_string()
                };
                info!("Attached {} with {} transactions", file_name, count);

                self.transcript.push(EntryKind::Upload {
                    file_name: file_name.to_string(),
                    count,
                    message: message.clone(),
                });
                self.events.emit(ConversationEvent::TransactionsLoaded {
                    file_name: file_name.to_string(),
                    count,
                    message,
                });
                Ok(count)
            }
            Err(err) => {
                self.state.transactions.clear();
                self.state.attachment = None;

                let message = format!("Could not read {}: {}", file_name, err);
                warn!("{}", message);

                self.transcript.push(EntryKind::Notice {
                    message: message.clone(),
                });
                self.events
                    .emit(ConversationEvent::AttachmentFailed { message });
                Err(AdvisorError::FileRead(err))
            }
        }
    }

    pub fn remove_attachment(&mut self) {
        self.state.transactions.clear();
        self.state.attachment = None;
        self.events.emit(ConversationEvent::AttachmentCleared);
    }

    pub fn view_transactions(&self) -> TransactionTable {
        transaction_table(&self.state.transactions)
    }

    fn offer_suggestions(&mut self) {
        let Some(profile) = self.state.profile else {
            return;
        };
        let prompts: Vec<String> = profile
            .suggested_prompts()
            .iter()
            .map(|p| p.to_string())
            .collect();

        self.transcript.push(EntryKind::Suggestions {
            prompts: prompts.clone(),
        });
        self.events
            .emit(ConversationEvent::SuggestionsOffered { prompts });
    }
}

/// One request's hold on the input controls.
///
/// Created when a submission is accepted. Dropping it re-enables input, so the
/// flag is released even if the request future is dropped mid-stream; an
/// unsettled reply slot is then marked as interrupted.
struct InFlight<'a> {
    in_flight: &'a mut bool,
    transcript: &'a mut Transcript,
    events: &'a EventSink,
    slot: usize,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn begin(
        in_flight: &'a mut bool,
        transcript: &'a mut Transcript,
        events: &'a EventSink,
        text: &str,
    ) -> Self {
        *in_flight = true;
        events.emit(ConversationEvent::InputDisabled);

        transcript.push(EntryKind::User {
            text: text.to_string(),
        });
        events.emit(ConversationEvent::UserMessage {
            text: text.to_string(),
        });

        let slot = transcript.push(EntryKind::Advisor {
            html: THINKING_PLACEHOLDER.to_string(),
            pending: true,
        });
        events.emit(ConversationEvent::ResponseStarted);

        Self {
            in_flight,
            transcript,
            events,
            slot,
            settled: false,
        }
    }

    fn update(&mut self, chunk: String, reply: &str) {
        let html = format_response(reply);
        self.transcript.replace(
            self.slot,
            EntryKind::Advisor {
                html: html.clone(),
                pending: true,
            },
        );
        self.events
            .emit(ConversationEvent::ResponseUpdated { chunk, html });
    }

    fn settle(mut self, kind: EntryKind, event: ConversationEvent) {
        self.transcript.replace(self.slot, kind);
        self.events.emit(event);
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Advisor request dropped before the reply finished");
            self.transcript.replace(
                self.slot,
                EntryKind::Failure {
                    message: INTERRUPTED_MESSAGE.to_string(),
                },
            );
            self.events.emit(ConversationEvent::ResponseFailed {
                message: INTERRUPTED_MESSAGE.to_string(),
            });
        }
        *self.in_flight = false;
        self.events.emit(ConversationEvent::InputEnabled);
    }
}

async fn stream_reply<S: ChatSession>(
    session: &mut S,
    prompt: &str,
    flight: &mut InFlight<'_>,
) -> Result<String> {
    let mut stream = session.send_streaming(prompt);
    let mut reply = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        reply.push_str(&chunk);
        flight.update(chunk, &reply);
    }

    Ok(reply)
}
