//! Observe request as seen by the relation.

/// CoAP message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Confirmable: must be acknowledged by the peer.
    Con,
    /// Non-confirmable.
    Non,
    Ack,
    Rst,
}

impl MessageType {
    pub fn is_confirmable(self) -> bool {
        self == MessageType::Con
    }
}

/// The original request that established an observe relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Target resource path (e.g. "/sensors/temp").
    pub path: String,
    /// Client token, echoed in every notification.
    pub token: Vec<u8>,
    /// Message type the client used for the registration.
    pub message_type: MessageType,
    /// Observe option value (0 = register, 1 = deregister).
    pub observe: Option<u32>,
}

impl Request {
    /// Build a confirmable GET with `observe = 0`.
    pub fn observe(path: impl Into<String>, token: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            token: token.into(),
            message_type: MessageType::Con,
            observe: Some(0),
        }
    }

    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    /// True if the request asks to register an observe relation.
    pub fn is_registration(&self) -> bool {
        self.observe == Some(0)
    }
}
