//! Wire record for negotiation messages

use crate::error::{BargainError, Result};
use crate::negotiation::{Action, ActionKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record as written to the wire
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WireRecord {
    pub kind: ActionKind,
    pub price: u64,
    pub message: String,
    /// Sender's round counter. Advisory only.
    pub round: u32,
}

impl WireRecord {
    pub fn new(action: &Action, round: u32) -> Self {
        Self {
            kind: action.kind(),
            price: action.price().unwrap_or(0),
            message: action.message().to_string(),
            round,
        }
    }

    pub fn into_action(self) -> Action {
        Action::from_parts(self.kind, self.price, self.message)
    }
}

/// Record as read from the wire. Every field is optional and loosely typed so
/// that output from older peers and generative sources still parses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct InboundRecord {
    #[serde(default, alias = "type", alias = "action")]
    kind: Option<String>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    round: Option<Value>,
}

impl InboundRecord {
    /// Validate against the record schema, filling documented defaults
    pub(crate) fn validate(self) -> Result<WireRecord> {
        let kind = self
            .kind
            .as_deref()
            .map(ActionKind::normalize)
            .unwrap_or(ActionKind::Counter);

        let price = match self.price {
            None | Some(Value::Null) => 0,
            Some(value) => parse_price(&value)?,
        };

        let message = match self.message {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
        };

        let round = self
            .round
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|r| u32::try_from(r).ok())
            .unwrap_or(0);

        Ok(WireRecord {
            kind,
            price,
            message,
            round,
        })
    }
}

fn parse_price(value: &Value) -> Result<u64> {
    match value {
        Value::Number(number) => {
            if let Some(price) = number.as_u64() {
                Ok(price)
            } else if let Some(price) = number.as_i64() {
                Err(negative_price(price))
            } else {
                let price = number.as_f64().unwrap_or(0.0);
                if price < 0.0 {
                    Err(BargainError::ProtocolViolation(format!(
                        "negative price {}",
                        price
                    )))
                } else {
                    Ok(price.trunc() as u64)
                }
            }
        }
        Value::String(text) => {
            let cleaned: String = text
                .trim()
                .chars()
                .filter(|c| !matches!(c, ',' | '_' | '₹' | ' '))
                .collect();
            if cleaned.starts_with('-') {
                return Err(BargainError::ProtocolViolation(format!(
                    "negative price {:?}",
                    text
                )));
            }
            cleaned
                .parse::<u64>()
                .or_else(|_| cleaned.parse::<f64>().map(|p| p.trunc() as u64))
                .map_err(|_| BargainError::Parse(format!("price is not a number: {:?}", text)))
        }
        other => Err(BargainError::Parse(format!(
            "price has unsupported type: {}",
            other
        ))),
    }
}

fn negative_price(price: i64) -> BargainError {
    BargainError::ProtocolViolation(format!("negative price {}", price))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound(raw: &str) -> Result<WireRecord> {
        serde_json::from_str::<InboundRecord>(raw).unwrap().validate()
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let record = inbound(r#"{"kind":"counter"}"#).unwrap();
        assert_eq!(record.kind, ActionKind::Counter);
        assert_eq!(record.price, 0);
        assert_eq!(record.message, "");
        assert_eq!(record.round, 0);
    }

    #[test]
    fn test_legacy_discriminant_fields() {
        let record = inbound(r#"{"type":"offer","price":252000,"message":"hi"}"#).unwrap();
        assert_eq!(record.kind, ActionKind::Offer);

        let record = inbound(r#"{"action":"accept","price":160000}"#).unwrap();
        assert_eq!(record.kind, ActionKind::Accept);
    }

    #[test]
    fn test_price_coercion() {
        assert_eq!(inbound(r#"{"price":150000.9}"#).unwrap().price, 150_000);
        assert_eq!(inbound(r#"{"price":"1,50,000"}"#).unwrap().price, 150_000);
        assert_eq!(inbound(r#"{"price":null}"#).unwrap().price, 0);
        assert!(matches!(
            inbound(r#"{"price":"cheap"}"#),
            Err(BargainError::Parse(_))
        ));
    }

    #[test]
    fn test_negative_price_is_protocol_violation() {
        assert!(matches!(
            inbound(r#"{"kind":"counter","price":-5}"#),
            Err(BargainError::ProtocolViolation(_))
        ));
        assert!(matches!(
            inbound(r#"{"kind":"counter","price":"-5"}"#),
            Err(BargainError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_wire_record_serialization() {
        let record = WireRecord::new(&Action::reject("no thanks"), 4);
        let serialized = serde_json::to_string(&record).unwrap();
        assert_eq!(
            serialized,
            r#"{"kind":"reject","price":0,"message":"no thanks","round":4}"#
        );
    }
}
