//! Event Encoder
//!
//! Turns a withdrawal event into the message body shipped to the topic.

use crate::domain::WithdrawalEvent;

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Event cannot be encoded: {0}")]
    Unsupported(String),
}

/// Serializes withdrawal events. Must be deterministic and side-effect free.
pub trait EventEncoder: Send + Sync {
    fn encode(&self, event: &WithdrawalEvent) -> Result<String, EncodingError>;
}

/// JSON body: `{"amount":"30.00","accountId":1,"status":"SUCCESSFUL"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventEncoder;

impl EventEncoder for JsonEventEncoder {
    fn encode(&self, event: &WithdrawalEvent) -> Result<String, EncodingError> {
        Ok(serde_json::to_string(event)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_json_shape() {
        let event = WithdrawalEvent::successful(AccountId::new(1), dec!(30.00));

        let body = JsonEventEncoder.encode(&event).unwrap();
        assert_eq!(body, r#"{"amount":30.00,"accountId":1,"status":"SUCCESSFUL"}"#);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let event = WithdrawalEvent::successful(AccountId::new(12), dec!(0.125));

        let first = JsonEventEncoder.encode(&event).unwrap();
        let second = JsonEventEncoder.encode(&event).unwrap();
        assert_eq!(first, second);

        let decoded: WithdrawalEvent = serde_json::from_str(&first).unwrap();
        assert_eq!(decoded, event);
    }
}
