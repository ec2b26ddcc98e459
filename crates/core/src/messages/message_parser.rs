//! Envelope decoding and per-type payload parsing.

use log::{debug, warn};
use serde_json::{Map, Value};

use super::messages_model::{Envelope, InboundMessage, LastFileUpdate, PortfolioPositionsMessage};
use crate::constants::{
    DATA_TYPE_ACCOUNTS, DATA_TYPE_LAST_FILE_UPDATE, DATA_TYPE_PORTFOLIO_POSITIONS,
    DATA_TYPE_PORTFOLIO_VALUES,
};
use crate::errors::{MessageError, Result};
use crate::normalize::{parse_account, parse_portfolio_patch, parse_position_patch};
use crate::positions::PositionPatch;
use crate::utils::{
    coerce_count, coerce_optional_string, coerce_ratio, coerce_timestamp,
};

/// Reads the transport envelope from a raw message.
pub fn parse_envelope(raw: &Value) -> Result<Envelope> {
    let object = raw
        .as_object()
        .ok_or_else(|| MessageError::invalid_shape("message", "expected an object"))?;
    let data_type = object
        .get("data_type")
        .and_then(Value::as_str)
        .ok_or_else(|| MessageError::MissingField("data_type".to_string()))?;

    Ok(Envelope {
        entry_id: object.get("entry_id").and_then(coerce_optional_string),
        data_type: data_type.to_string(),
        data: object.get("data").cloned().unwrap_or(Value::Null),
    })
}

/// Decodes the envelope payload according to its `data_type`.
pub fn decode_message(envelope: &Envelope) -> Result<InboundMessage> {
    let data = &envelope.data;
    let message = match envelope.data_type.as_str() {
        DATA_TYPE_ACCOUNTS => InboundMessage::Accounts(
            list_payload(data, "accounts")?
                .iter()
                .filter_map(parse_account)
                .collect(),
        ),
        DATA_TYPE_PORTFOLIO_VALUES => InboundMessage::PortfolioValues(
            list_payload(data, "portfolios")?
                .iter()
                .filter_map(parse_portfolio_patch)
                .collect(),
        ),
        DATA_TYPE_PORTFOLIO_POSITIONS => {
            let items: Vec<&Value> = match data {
                Value::Array(items) => items.iter().collect(),
                Value::Object(_) => vec![data],
                _ => {
                    return Err(MessageError::invalid_shape(
                        DATA_TYPE_PORTFOLIO_POSITIONS,
                        "expected an object or a list",
                    )
                    .into())
                }
            };
            let mut messages = Vec::with_capacity(items.len());
            for item in items {
                match parse_positions_message(item) {
                    Ok(message) => messages.push(message),
                    Err(e) => warn!("Skipping positions entry: {}", e),
                }
            }
            InboundMessage::PortfolioPositions(messages)
        }
        DATA_TYPE_LAST_FILE_UPDATE => InboundMessage::LastFileUpdate(parse_last_file_update(data)?),
        other => InboundMessage::Unknown(other.to_string()),
    };
    Ok(message)
}

/// Accepts either a bare list or an object wrapping the list under `key`.
fn list_payload<'a>(data: &'a Value, key: &str) -> Result<&'a [Value]> {
    let list = match data {
        Value::Array(items) => Some(items),
        Value::Object(object) => object.get(key).and_then(Value::as_array),
        _ => None,
    };
    list.map(Vec::as_slice)
        .ok_or_else(|| MessageError::invalid_shape(key, "expected a list").into())
}

/// Parses the payload for one portfolio.
///
/// A `normalized_payload` object supersedes `positions` and fills in any
/// provenance fields the message itself leaves out.
pub fn parse_positions_message(raw: &Value) -> Result<PortfolioPositionsMessage> {
    let object = raw
        .as_object()
        .ok_or_else(|| MessageError::invalid_shape("portfolio_positions", "expected an object"))?;
    let portfolio_uuid = ["portfolio_uuid", "uuid"]
        .iter()
        .find_map(|key| object.get(*key).and_then(coerce_optional_string))
        .ok_or_else(|| MessageError::MissingField("portfolio_uuid".to_string()))?;

    let error = object.get("error").and_then(coerce_optional_string);
    let payload = object.get("normalized_payload").and_then(Value::as_object);
    let text = |key: &str| {
        object
            .get(key)
            .and_then(coerce_optional_string)
            .or_else(|| payload.and_then(|p| p.get(key)).and_then(coerce_optional_string))
    };

    let positions = match (payload.and_then(|p| p.get("positions")), object.get("positions")) {
        (Some(normalized), _) => parse_normalized_positions(normalized)?,
        (None, Some(Value::Array(items))) => items.iter().filter_map(parse_position_patch).collect(),
        (None, Some(Value::Null) | None) if error.is_some() => Vec::new(),
        (None, Some(_)) => {
            return Err(MessageError::invalid_shape("positions", "expected a list").into())
        }
        (None, None) => return Err(MessageError::MissingField("positions".to_string()).into()),
    };

    Ok(PortfolioPositionsMessage {
        portfolio_uuid,
        positions,
        error,
        chunk_index: read_chunk_field(object, "chunk_index"),
        chunk_count: read_chunk_field(object, "chunk_count"),
        coverage_ratio: object
            .get("coverage_ratio")
            .and_then(coerce_ratio)
            .or_else(|| payload.and_then(|p| p.get("coverage_ratio")).and_then(coerce_ratio)),
        provenance: text("provenance"),
        metric_run_uuid: text("metric_run_uuid"),
        generated_at: object
            .get("generated_at")
            .and_then(coerce_timestamp)
            .or_else(|| payload.and_then(|p| p.get("generated_at")).and_then(coerce_timestamp)),
    })
}

/// Pre-normalized positions deserialize directly; entries that don't are
/// run through the lenient parser instead.
fn parse_normalized_positions(raw: &Value) -> Result<Vec<PositionPatch>> {
    let items = raw
        .as_array()
        .ok_or_else(|| MessageError::invalid_shape("normalized_payload.positions", "expected a list"))?;
    Ok(items
        .iter()
        .filter_map(|item| match serde_json::from_value::<PositionPatch>(item.clone()) {
            Ok(patch) => Some(patch),
            Err(e) => {
                debug!("Normalized position did not decode ({}), parsing leniently", e);
                parse_position_patch(item)
            }
        })
        .collect())
}

fn read_chunk_field(object: &Map<String, Value>, key: &str) -> Option<u32> {
    object
        .get(key)
        .and_then(coerce_count)
        .and_then(|value| u32::try_from(value).ok())
}

fn parse_last_file_update(data: &Value) -> Result<LastFileUpdate> {
    let raw = match data {
        Value::Object(object) => object.get("last_file_update").unwrap_or(&Value::Null),
        other => other,
    };
    let text = coerce_optional_string(raw)
        .ok_or_else(|| MessageError::MissingField("last_file_update".to_string()))?;
    Ok(LastFileUpdate {
        timestamp: coerce_timestamp(raw),
        raw: text,
    })
}
