//! Per-event validation and identifier assignment.

use uuid::Uuid;
use validator::Validate;

use crate::clock::SharedClock;
use crate::error::{Error, Result, ValidationErrorCode};
use crate::events::{parse_timestamp, RawEvent, ValidatedEvent};
use crate::limits::MAX_EVENT_NAME_LEN;

/// Generates a process-unique event ID.
pub fn generate_event_id() -> String {
    format!("evt_{}", Uuid::new_v4().simple())
}

/// Checks a raw event and stamps it for admission.
///
/// Pure per-event check: batch atomicity is the caller's concern.
#[derive(Clone)]
pub struct EventValidator {
    clock: SharedClock,
}

impl EventValidator {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// Validates `raw` for `tenant_id`, assigning `event_id` and `ingested_at`.
    pub fn validate(&self, raw: &RawEvent, tenant_id: &str) -> Result<ValidatedEvent> {
        if let Err(errors) = raw.validate() {
            let message = if raw.event_name.is_empty() {
                "Event name is required".to_string()
            } else if raw.event_name.chars().count() > MAX_EVENT_NAME_LEN {
                format!("Event name too long (max {} chars)", MAX_EVENT_NAME_LEN)
            } else {
                errors.to_string()
            };
            return Err(Error::validation_code(ValidationErrorCode::InvalidEvent, message));
        }

        let now = self.clock.now();
        let timestamp = match raw.timestamp.as_deref() {
            Some(value) => parse_timestamp(value).ok_or_else(|| {
                Error::validation_code(
                    ValidationErrorCode::InvalidEvent,
                    format!("Invalid timestamp: {}", value),
                )
            })?,
            None => now,
        };

        Ok(ValidatedEvent {
            event_id: generate_event_id(),
            tenant_id: tenant_id.to_string(),
            event_name: raw.event_name.clone(),
            user_id: raw.user_id.clone(),
            session_id: raw.session_id.clone(),
            timestamp,
            properties: raw.properties.clone(),
            ingested_at: now,
        })
    }
}
