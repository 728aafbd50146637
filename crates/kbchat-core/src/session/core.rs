use crate::config::{SecretStore, Settings};
use crate::constants::errors;
use crate::context::{PromptAssembler, Role, Transcript, Turn};
use crate::error::KbChatError;
use crate::llm::GenerationClient;
use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Events emitted while a turn is processed - the interface between a
/// session and whatever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A turn was appended to the transcript.
    TurnRecorded(Turn),
    /// The request has been issued; fragments may follow.
    Generating,
    Fragment(String),
    /// The reply was recorded; the session is awaiting input again.
    Completed,
    /// The error turn was recorded; the session is awaiting input again.
    Failed(String),
}

impl SessionEvent {
    /// The lifecycle state a session is in once it has emitted this event.
    /// Recording the assistant turn happens before the terminal event and
    /// does not change state.
    pub fn turn_state(&self) -> Option<TurnState> {
        match self {
            SessionEvent::TurnRecorded(turn) if turn.role() == Role::User => {
                Some(TurnState::UserSubmitted)
            }
            SessionEvent::TurnRecorded(_) => None,
            SessionEvent::Generating | SessionEvent::Fragment(_) => Some(TurnState::Generating),
            SessionEvent::Completed => Some(TurnState::Complete),
            SessionEvent::Failed(_) => Some(TurnState::Failed),
        }
    }
}

/// Per-turn lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingInput,
    UserSubmitted,
    Generating,
    Complete,
    Failed,
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Complete | TurnState::Failed)
    }
}

/// Result of one interaction cycle. Generation failures end up here,
/// never as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Complete(String),
    Failed(String),
}

impl TurnOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, TurnOutcome::Complete(_))
    }
}

/// One interactive chat session. Owns its transcript; whoever owns the
/// session is the only one who can submit to it.
pub struct ChatSession {
    id: Uuid,
    client: Box<dyn GenerationClient>,
    assembler: PromptAssembler,
    transcript: Transcript,
}

impl ChatSession {
    pub fn new(client: Box<dyn GenerationClient>, assembler: PromptAssembler) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            assembler,
            transcript: Transcript::new(),
        }
    }

    /// Build a session from settings. The credential is resolved before any
    /// client exists, so a missing key fails without a request being made.
    pub fn from_settings(settings: &Settings, secrets: &SecretStore) -> Result<Self, KbChatError> {
        let api_key = settings.api_key(secrets)?;
        let assembler = settings.build_assembler()?;
        let client = settings.build_client(api_key);
        Ok(Self::new(Box::new(client), assembler))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Run one cycle without observing events.
    pub async fn submit(&mut self, question: impl Into<String>) -> TurnOutcome {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        self.submit_with_events(question, &tx).await
    }

    /// Run one cycle, emitting [`SessionEvent`]s through the channel.
    ///
    /// Exactly one user turn and one assistant turn are appended, whether
    /// generation succeeds or fails.
    pub async fn submit_with_events(
        &mut self,
        question: impl Into<String>,
        event_tx: &UnboundedSender<SessionEvent>,
    ) -> TurnOutcome {
        let question = question.into();

        self.record(Turn::user(question.as_str()), event_tx);

        let payload = self.assembler.assemble(&question);

        let _ = event_tx.send(SessionEvent::Generating);

        match self.stream_reply(&payload, event_tx).await {
            Ok(reply) => {
                tracing::info!(session = %self.id, chars = reply.len(), "turn complete");
                self.record(Turn::assistant(reply.as_str()), event_tx);
                let _ = event_tx.send(SessionEvent::Completed);
                TurnOutcome::Complete(reply)
            }
            Err(e) => {
                let reason = match e {
                    KbChatError::Generation(reason) => reason,
                    other => other.to_string(),
                };
                tracing::warn!(session = %self.id, error = %reason, "generation failed");
                self.record(
                    Turn::assistant(format!("{}{}", errors::TURN_PREFIX, reason)),
                    event_tx,
                );
                let _ = event_tx.send(SessionEvent::Failed(reason.clone()));
                TurnOutcome::Failed(reason)
            }
        }
    }

    /// Issue the request and concatenate fragments in arrival order.
    /// The partial text is dropped if the stream fails.
    async fn stream_reply(
        &self,
        payload: &str,
        event_tx: &UnboundedSender<SessionEvent>,
    ) -> Result<String, KbChatError> {
        let mut stream = self.client.generate_stream(payload).await?;

        let mut reply = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            reply.push_str(&fragment);
            let _ = event_tx.send(SessionEvent::Fragment(fragment));
        }

        Ok(reply)
    }

    fn record(&mut self, turn: Turn, event_tx: &UnboundedSender<SessionEvent>) {
        let recorded = self.transcript.append(turn).clone();
        let _ = event_tx.send(SessionEvent::TurnRecorded(recorded));
    }
}
