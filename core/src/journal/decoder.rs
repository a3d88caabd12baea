use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::event::{EVENT_KINDS, EventKind, EventPayload, JournalEvent};

/// Maximum characters of a rejected line kept for log messages.
const EXCERPT_CHARS: usize = 120;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON ({source}): {excerpt}")]
    Syntax {
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("record is not a JSON object: {excerpt}")]
    NotAnObject { excerpt: String },
    #[error("record has neither timestamp nor event: {excerpt}")]
    MissingFields { excerpt: String },
    #[error("malformed {event} record ({source}): {excerpt}")]
    Payload {
        event: String,
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DecodeError {
    pub fn excerpt(&self) -> &str {
        match self {
            DecodeError::Syntax { excerpt, .. }
            | DecodeError::NotAnObject { excerpt }
            | DecodeError::MissingFields { excerpt }
            | DecodeError::Payload { excerpt, .. } => excerpt,
        }
    }
}

/// Truncate a raw line for logging without splitting a UTF-8 character.
pub fn excerpt(line: &str) -> String {
    let line = line.trim_end();
    match line.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}…", &line[..idx]),
        None => line.to_string(),
    }
}

/// Decode one journal line into a typed event.
///
/// Unknown `event` values decode to [`EventPayload::Unknown`] with their full
/// field bag. Only syntactically invalid lines, non-object records and
/// records lacking both `timestamp` and `event` fail.
pub fn decode(raw_line: &str) -> Result<JournalEvent, DecodeError> {
    let line = raw_line.trim_start_matches('\u{feff}').trim();

    let value: Value = serde_json::from_str(line).map_err(|source| DecodeError::Syntax {
        excerpt: excerpt(line),
        source,
    })?;
    let Value::Object(fields) = value else {
        return Err(DecodeError::NotAnObject {
            excerpt: excerpt(line),
        });
    };

    let name = fields
        .get("event")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let timestamp = fields
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    if name.is_none() && timestamp.is_none() {
        return Err(DecodeError::MissingFields {
            excerpt: excerpt(line),
        });
    }
    let timestamp = timestamp.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let Some(name) = name else {
        return Ok(JournalEvent {
            timestamp,
            payload: EventPayload::Unknown {
                event: String::new(),
                fields,
            },
        });
    };

    let payload = match EVENT_KINDS.get(name.as_str()).copied() {
        Some(kind) => decode_payload(kind, fields).map_err(|source| DecodeError::Payload {
            event: name,
            excerpt: excerpt(line),
            source,
        })?,
        None => EventPayload::Unknown {
            event: name,
            fields,
        },
    };

    Ok(JournalEvent { timestamp, payload })
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn typed<T: DeserializeOwned>(fields: Map<String, Value>) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(fields))
}

fn decode_payload(
    kind: EventKind,
    fields: Map<String, Value>,
) -> Result<EventPayload, serde_json::Error> {
    let payload = match kind {
        EventKind::FileHeader => EventPayload::FileHeader(typed(fields)?),
        EventKind::Commander => EventPayload::Commander(typed(fields)?),
        EventKind::LoadGame => EventPayload::LoadGame(typed(fields)?),
        EventKind::Location => EventPayload::Location(typed(fields)?),
        EventKind::FsdJump => EventPayload::FsdJump(typed(fields)?),
        EventKind::CarrierJump => EventPayload::CarrierJump(typed(fields)?),
        EventKind::Scan => EventPayload::Scan(typed(fields)?),
        EventKind::FssDiscoveryScan => EventPayload::FssDiscoveryScan(typed(fields)?),
        EventKind::FssSignalDiscovered => EventPayload::FssSignalDiscovered(typed(fields)?),
        EventKind::FssAllBodiesFound => EventPayload::FssAllBodiesFound(typed(fields)?),
        EventKind::Rank => EventPayload::Rank(typed(fields)?),
        EventKind::Progress => EventPayload::Progress(typed(fields)?),
        EventKind::Cargo => EventPayload::Cargo(typed(fields)?),
        EventKind::Materials => EventPayload::Materials(typed(fields)?),
        EventKind::Shutdown => EventPayload::Shutdown,
        EventKind::Unknown => EventPayload::Unknown {
            event: String::new(),
            fields,
        },
    };
    Ok(payload)
}
