//! Notifications produced by replaying an exchange.
//!
//! # Responsibilities
//! - Carry the payload and response code produced by the resource
//! - Carry the message type chosen by the relation (CON for control notifications)
//! - Carry the observe number stamped by the orderer
//! - Give every delivery attempt an identity so acknowledgments can be matched

use uuid::Uuid;

use super::request::MessageType;

/// Subset of CoAP response codes the observe core cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    /// 2.05
    Content,
    /// 2.03
    Valid,
    /// 4.04
    NotFound,
    /// 4.05
    MethodNotAllowed,
    /// 5.00
    InternalServerError,
    /// 5.03
    ServiceUnavailable,
}

impl ResponseCode {
    /// 2.xx codes keep a relation alive; anything else ends it.
    pub fn is_success(self) -> bool {
        matches!(self, ResponseCode::Content | ResponseCode::Valid)
    }
}

/// A response (notification) bound for the observing client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Identity of this delivery attempt.
    pub id: Uuid,
    pub code: ResponseCode,
    pub message_type: MessageType,
    /// Observe option value, set by the notification orderer.
    pub observe: Option<u32>,
    pub payload: Vec<u8>,
}

impl Response {
    /// Create a non-confirmable response with a fresh id.
    pub fn new(code: ResponseCode, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            message_type: MessageType::Non,
            observe: None,
            payload: payload.into(),
        }
    }

    /// 2.05 Content with the given payload.
    pub fn content(payload: impl Into<Vec<u8>>) -> Self {
        Self::new(ResponseCode::Content, payload)
    }

    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    pub fn is_confirmable(&self) -> bool {
        self.message_type.is_confirmable()
    }
}
