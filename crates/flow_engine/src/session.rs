//! Session state machine and controller.
//!
//! One session owns the message ring, the widget state and the single
//! pending-confirmation slot. Submissions are serialized: a submit that
//! arrives while another is in flight is rejected with `Busy` instead of
//! interleaving. All observable activity (state changes, streaming text,
//! speak requests) goes out on an unbounded event channel the UI drains.

use crate::classifier::classify;
use crate::extractor::{extract, fill_pending};
use crate::generation::{ChatMessage, GenerationEngine};
use crate::prompt::{analysis_prompt, system_context};
use crate::router::{self, route, GenerationTask, RouteOutcome};
use crate::services::Services;
use chrono::Local;
use flow_common::{
    AssistantConfig, Message, Panel, PendingConfirmation, Response, SessionError, SideEffect,
    Utterance, WidgetState,
};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Words that abandon an open confirmation instead of filling it.
const CANCEL_WORDS: &[&str] = &["cancela", "cancelar", "olvídalo", "olvidalo", "no importa"];

/// Outbound events for the UI shell.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(WidgetState),
    /// Cumulative streamed text for the in-flight response.
    StreamingText(String),
    /// Voice output request; only emitted when voice is enabled.
    Speak(String),
}

/// Conversation log plus the pending slot. No I/O.
pub struct ConversationSession {
    messages: VecDeque<Message>,
    pending: Option<PendingConfirmation>,
    state: WidgetState,
    max_messages: usize,
}

impl ConversationSession {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            pending: None,
            state: WidgetState::Idle,
            max_messages: max_messages.max(2),
        }
    }

    /// Append a message, evicting the oldest once the ring is full.
    pub fn push(&mut self, message: Message) {
        if self.messages.len() >= self.max_messages {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Trailing window mapped to wire messages, oldest first.
    pub fn history(&self, window: usize) -> Vec<ChatMessage> {
        let skip = self.messages.len().saturating_sub(window);
        self.messages.iter().skip(skip).map(ChatMessage::from).collect()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn pending(&self) -> Option<&PendingConfirmation> {
        self.pending.as_ref()
    }

    pub fn take_pending(&mut self) -> Option<PendingConfirmation> {
        self.pending.take()
    }
}

/// Drives a session: classify, extract, route, generate, emit events.
pub struct SessionController {
    config: AssistantConfig,
    session: ConversationSession,
    engine: GenerationEngine,
    services: Services,
    events: mpsc::UnboundedSender<SessionEvent>,
    in_flight: bool,
    current_panel: Option<Panel>,
}

impl SessionController {
    /// Build a controller and the event stream the UI should drain.
    pub fn new(
        config: AssistantConfig,
        engine: GenerationEngine,
        services: Services,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = ConversationSession::new(config.max_messages);
        (
            Self {
                config,
                session,
                engine,
                services,
                events,
                in_flight: false,
                current_panel: None,
            },
            rx,
        )
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn current_panel(&self) -> Option<Panel> {
        self.current_panel
    }

    /// Start voice capture. Only valid from idle; otherwise ignored.
    pub fn begin_listening(&mut self) {
        if self.session.state == WidgetState::Idle {
            self.set_state(WidgetState::Listening);
        }
    }

    /// Abandon voice capture without a transcript.
    pub fn cancel_listening(&mut self) {
        if self.session.state == WidgetState::Listening {
            self.set_state(WidgetState::Idle);
        }
    }

    /// The UI finished playing back spoken output.
    pub fn playback_finished(&mut self) {
        if self.session.state == WidgetState::Speaking {
            self.set_state(WidgetState::Idle);
        }
    }

    /// Hard reset of the widget state, e.g. when the user dismisses the
    /// assistant mid-response. Dropping the submit future aborts any
    /// in-flight provider request.
    pub fn cancel(&mut self) {
        self.in_flight = false;
        self.set_state(WidgetState::Idle);
    }

    /// Handle one utterance end to end. Exactly one assistant message is
    /// appended per accepted submission, error paths included.
    pub async fn submit(&mut self, utterance: Utterance) -> Result<Response, SessionError> {
        if self.in_flight {
            return Err(SessionError::Busy);
        }
        self.in_flight = true;
        let response = self.handle(utterance).await;
        self.in_flight = false;
        Ok(response)
    }

    async fn handle(&mut self, utterance: Utterance) -> Response {
        self.set_state(WidgetState::Thinking);
        let text = utterance.text.clone();

        // An open confirmation consumes the utterance before any fresh
        // classification runs.
        if let Some(pending) = self.session.take_pending() {
            let response = self.resume_confirmation(pending, &text);
            return self.finish(response).await;
        }

        let intent = classify(&text);
        let today = Local::now().date_naive();
        let entities = extract(&text, intent.kind, today);
        debug!(intent = %intent.kind, "utterance classified");

        self.session.push(
            Message::user(&text)
                .with_intent(intent.clone())
                .with_entities(entities.clone()),
        );

        let mut pending = None;
        let outcome = route(&text, &intent, entities, &mut pending, &self.services);
        self.session.pending = pending;

        let response = match outcome {
            RouteOutcome::Done(response) => response,
            RouteOutcome::Generate(task) => self.generate(task).await,
        };
        self.finish(response).await
    }

    /// Fill, complete or cancel an open confirmation with a follow-up reply.
    fn resume_confirmation(
        &mut self,
        mut pending: PendingConfirmation,
        reply: &str,
    ) -> Response {
        self.session.push(Message::user(reply));

        let lowered = reply.trim().to_lowercase();
        if CANCEL_WORDS.iter().any(|w| lowered.contains(w)) {
            info!("pending record creation cancelled");
            return Response::info("De acuerdo, cancelé el registro.");
        }

        fill_pending(&mut pending, reply);
        if pending.is_complete() {
            let PendingConfirmation {
                record_type,
                amount,
                concept,
                destination,
                date,
                original,
            } = pending;
            // is_complete() guarantees both fields.
            let (Some(amount), Some(concept)) = (amount, concept) else {
                return Response::error("Perdí los datos del registro, intenta de nuevo.");
            };
            router::record_created(record_type, amount, concept, destination, date, &original)
        } else {
            let question = router::clarification_question(&pending);
            self.session.pending = Some(pending);
            question
        }
    }

    async fn generate(&mut self, task: GenerationTask) -> Response {
        let stats = self.services.data.stats().unwrap_or_default();
        match task {
            GenerationTask::Conversation => {
                let mut messages =
                    vec![ChatMessage::system(system_context(&stats, self.current_panel))];
                messages.extend(self.session.history(self.config.history_window));

                let events = self.events.clone();
                self.engine
                    .generate(&messages, &mut move |text| {
                        let _ = events.send(SessionEvent::StreamingText(text.to_string()));
                    })
                    .await
            }
            GenerationTask::Analysis { query } => {
                self.engine.analyze(&analysis_prompt(&query, &stats)).await
            }
        }
    }

    async fn finish(&mut self, response: Response) -> Response {
        if let Some(SideEffect::Navigate { panel }) = response.side_effect {
            self.current_panel = Some(panel);
        }
        self.session.push(Message::assistant(&response.text));

        if self.config.voice.enabled && !response.is_error() {
            self.set_state(WidgetState::Speaking);
            let _ = self.events.send(SessionEvent::Speak(response.text.clone()));
        } else {
            self.set_state(WidgetState::Idle);
        }
        response
    }

    fn set_state(&mut self, state: WidgetState) {
        if self.session.state != state {
            self.session.state = state;
            let _ = self.events.send(SessionEvent::StateChanged(state));
        }
    }
}
