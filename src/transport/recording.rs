//! In-memory transport that records every message it is handed

use parking_lot::Mutex;

use super::{OutboundMessage, Transport};
use crate::core::types::ObjectId;

#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(ObjectId, OutboundMessage)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in send order
    pub fn messages(&self) -> Vec<(ObjectId, OutboundMessage)> {
        self.sent.lock().clone()
    }

    /// Messages addressed to one recipient, in send order
    pub fn messages_for(&self, recipient: ObjectId) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| *to == recipient)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Count messages to `recipient` matching a predicate
    pub fn count_for(&self, recipient: ObjectId, predicate: impl Fn(&OutboundMessage) -> bool) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|(to, message)| *to == recipient && predicate(message))
            .count()
    }

    /// Drain the log
    pub fn take(&self) -> Vec<(ObjectId, OutboundMessage)> {
        std::mem::take(&mut *self.sent.lock())
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.lock().is_empty()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, recipient: ObjectId, message: OutboundMessage) {
        self.sent.lock().push((recipient, message));
    }
}
