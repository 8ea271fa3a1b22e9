//! Relay service: the per-exchange pipeline behind the chat transport.
//!
//! One inbound event goes through gate, preprocessing, normalization and
//! dispatch, and comes back as at most one reply string. Every failure is
//! caught here and turned into a user-facing reply; nothing propagates to
//! the transport loop.

use std::sync::Arc;

use coachbot_types::envelope::ContentEnvelope;
use coachbot_types::error::{PreprocessError, RelayError};
use coachbot_types::inbound::{InboundEvent, InboundPayload};
use coachbot_types::session::{ChatId, ThreadId};
use secrecy::SecretString;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::backend::AssistantBackend;
use crate::clock::Clock;
use crate::dispatcher::RunDispatcher;
use crate::gate::{AccessGate, Authorization};
use crate::normalizer::{MessageNormalizer, NormalizedInput};
use crate::preprocess::{AudioTranscoder, SpeechToText, VoicePreprocessor};
use crate::session::repository::SessionRepository;
use crate::session::store::SessionStore;

pub const GREETING: &str = "Hello! I am your Telegram bot. I can handle text, images, and audio messages. How can I help you today?";

pub const HELP_TEXT: &str = "Available commands:
/start - Start the bot
/help - Show this help message
/subscribe <code> - Subscribe this chat

You can send:
• Text messages
• Images (photos)
• Voice messages
• Documents";

pub const NOT_SUBSCRIBED: &str =
    "This chat is not subscribed. Send /subscribe <code> to get started.";
pub const SUBSCRIBED: &str = "Subscription active. Send me a message to get started.";
pub const ALREADY_SUBSCRIBED: &str = "This chat is already subscribed.";
pub const INVALID_CODE: &str = "That subscription code is not valid.";

/// Which apology to use when an exchange fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modality {
    Text,
    Image,
    Voice,
    File,
}

impl Modality {
    fn of(payload: &InboundPayload) -> Self {
        Self::from_kind(payload.kind())
    }

    fn from_kind(kind: &str) -> Self {
        match kind {
            "image" => Modality::Image,
            "voice" => Modality::Voice,
            "document" => Modality::File,
            _ => Modality::Text,
        }
    }

    fn apology(self) -> &'static str {
        match self {
            Modality::Text => "Sorry, I encountered an error processing your message.",
            Modality::Image => "Sorry, I encountered an error processing your image.",
            Modality::Voice => "Sorry, I encountered an error processing your voice message.",
            Modality::File => "Sorry, I encountered an error processing your file.",
        }
    }
}

/// Apology for an exchange of the given payload kind that failed before it
/// reached the relay, e.g. when the transport could not download the media.
pub fn apology_for(kind: &str) -> &'static str {
    Modality::from_kind(kind).apology()
}

pub struct RelayService<R, B, T, S>
where
    R: SessionRepository,
    B: AssistantBackend,
    T: AudioTranscoder,
    S: SpeechToText,
{
    store: Arc<SessionStore<R>>,
    gate: AccessGate<R>,
    dispatcher: RunDispatcher<B>,
    normalizer: MessageNormalizer,
    voice: VoicePreprocessor<T, S>,
    clock: Arc<dyn Clock>,
}

impl<R, B, T, S> RelayService<R, B, T, S>
where
    R: SessionRepository,
    B: AssistantBackend,
    T: AudioTranscoder,
    S: SpeechToText,
{
    pub fn new(
        store: Arc<SessionStore<R>>,
        subscription_secret: SecretString,
        dispatcher: RunDispatcher<B>,
        voice: VoicePreprocessor<T, S>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gate: AccessGate::new(store.clone(), subscription_secret),
            normalizer: MessageNormalizer::new(clock.clone()),
            store,
            dispatcher,
            voice,
            clock,
        }
    }

    pub fn store(&self) -> &SessionStore<R> {
        &self.store
    }

    /// Process one inbound event and produce the reply, if any.
    ///
    /// `None` means nothing should be sent (unsupported content). An empty
    /// string is a real reply and must still be delivered.
    pub async fn handle(&self, event: InboundEvent) -> Option<String> {
        let span = info_span!(
            "relay.exchange",
            chat_id = %event.chat_id,
            kind = event.payload.kind(),
        );

        async move {
            let modality = Modality::of(&event.payload);
            match self.exchange(event).await {
                Ok(reply) => reply,
                Err(err) => self.reply_for(err, modality),
            }
        }
        .instrument(span)
        .await
    }

    async fn exchange(&self, event: InboundEvent) -> Result<Option<String>, RelayError> {
        let InboundEvent {
            chat_id,
            sender_id,
            payload,
        } = event;
        let chat_id = &chat_id;

        match payload {
            InboundPayload::Command { name, args, raw } => {
                self.command(chat_id, &name, &args, &raw).await
            }

            InboundPayload::Text(text) => {
                let thread_id = self.gate.require(chat_id).await?;
                let envelope = self.normalizer.text(&text);
                self.dispatch(chat_id, &thread_id, envelope).await
            }

            InboundPayload::Image { url, caption } => {
                let thread_id = self.gate.require(chat_id).await?;
                let envelope = self.normalizer.image(&url, caption.as_deref());
                self.dispatch(chat_id, &thread_id, envelope).await
            }

            InboundPayload::Voice { audio } => {
                let thread_id = self.gate.require(chat_id).await?;
                let sender = sender_id.as_deref().unwrap_or(chat_id.as_str());
                let (transcript, _artifacts) =
                    self.voice.prepare(&audio, sender, self.clock.now()).await?;
                info!(chars = transcript.len(), "Voice message transcribed");

                let envelope = self
                    .normalizer
                    .normalize(NormalizedInput::Voice {
                        transcript: &transcript,
                    })
                    .ok_or_else(|| RelayError::Unsupported("voice".into()))?;
                self.dispatch(chat_id, &thread_id, envelope).await
            }

            InboundPayload::Document {
                file_name,
                bytes,
                caption,
            } => {
                let thread_id = self.gate.require(chat_id).await?;
                let file = self
                    .dispatcher
                    .backend()
                    .upload_file(&file_name, bytes)
                    .await
                    .map_err(PreprocessError::Upload)?;
                debug!(file_id = %file.id, file_name = %file_name, "Document uploaded");

                let envelope = self.normalizer.document(&file, caption.as_deref());
                self.dispatch(chat_id, &thread_id, envelope).await
            }

            InboundPayload::Unsupported { kind } => {
                self.gate.require(chat_id).await?;
                Err(RelayError::Unsupported(kind))
            }
        }
    }

    async fn command(
        &self,
        chat_id: &ChatId,
        name: &str,
        args: &str,
        raw: &str,
    ) -> Result<Option<String>, RelayError> {
        match name {
            "start" => match self.gate.authorize(chat_id).await? {
                Authorization::Authorized(_) => Ok(Some(GREETING.to_string())),
                Authorization::Rejected => Ok(Some(NOT_SUBSCRIBED.to_string())),
            },
            "help" => Ok(Some(HELP_TEXT.to_string())),
            "subscribe" => {
                self.gate
                    .subscribe(chat_id, args, self.dispatcher.backend())
                    .await?;
                Ok(Some(SUBSCRIBED.to_string()))
            }
            _ => {
                let thread_id = self.gate.require(chat_id).await?;
                let envelope = self.normalizer.text(raw);
                self.dispatch(chat_id, &thread_id, envelope).await
            }
        }
    }

    /// Submit the envelope, then record the interaction.
    ///
    /// A failed touch does not void a reply that the backend already
    /// produced; it is only logged.
    async fn dispatch(
        &self,
        chat_id: &ChatId,
        thread_id: &ThreadId,
        envelope: ContentEnvelope,
    ) -> Result<Option<String>, RelayError> {
        let reply = self.dispatcher.submit(thread_id, &envelope).await?;

        if let Err(e) = self.store.touch(chat_id).await {
            warn!(chat_id = %chat_id, error = %e, "Failed to record interaction");
        }

        Ok(Some(reply))
    }

    fn reply_for(&self, err: RelayError, modality: Modality) -> Option<String> {
        match err {
            RelayError::Unauthorized => {
                info!("Refused unsubscribed chat");
                Some(NOT_SUBSCRIBED.to_string())
            }
            RelayError::AlreadySubscribed => Some(ALREADY_SUBSCRIBED.to_string()),
            RelayError::InvalidCredential => Some(INVALID_CODE.to_string()),
            RelayError::Unsupported(kind) => {
                debug!(kind = %kind, "Ignoring unsupported message");
                None
            }
            RelayError::RunFailed(ref dispatch) => {
                error!(
                    error = %dispatch,
                    run_id = dispatch.run_id().unwrap_or("-"),
                    ?modality,
                    "Run failed"
                );
                Some(modality.apology().to_string())
            }
            RelayError::Persistence(_) | RelayError::Preprocess(_) => {
                error!(error = %err, ?modality, "Exchange failed");
                Some(modality.apology().to_string())
            }
        }
    }
}
