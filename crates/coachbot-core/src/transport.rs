//! Outbound side of the chat transport.
//!
//! Inbound replies are returned from `RelayService::handle`; this port is
//! only needed by flows that are not triggered by an inbound event.

use coachbot_types::error::DeliveryError;
use coachbot_types::session::ChatId;

/// Delivers plain-text messages to a chat.
pub trait OutboundChannel: Send + Sync {
    fn send_text(
        &self,
        chat_id: &ChatId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), DeliveryError>> + Send;
}

impl<T: OutboundChannel> OutboundChannel for std::sync::Arc<T> {
    fn send_text(
        &self,
        chat_id: &ChatId,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), DeliveryError>> + Send {
        (**self).send_text(chat_id, text)
    }
}
