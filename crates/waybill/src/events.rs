//! Session event log.
//!
//! The form session records every lookup and autofill decision into an
//! append-only log. Tests assert ordering guarantees against it, and a
//! session can export it as JSONL for offline inspection.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use waybill_types::{AddressRole, AddressType};

use crate::autofill::AutofillSource;
use crate::schedule::LookupKind;

/// Event types recorded by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Debounce window opened for a complete pincode
    LookupScheduled { role: AddressRole, pincode: String },
    /// A lookup left the debounce window and hit the gateway
    LookupStarted {
        role: AddressRole,
        kind: LookupKind,
        pincode: String,
    },
    /// Lookup settled successfully and its result was applied
    LookupSucceeded {
        role: AddressRole,
        kind: LookupKind,
        pincode: String,
    },
    /// Lookup failed; the error slot carries the message
    LookupFailed {
        role: AddressRole,
        kind: LookupKind,
        pincode: String,
        message: String,
    },
    /// Lookup settled after its pincode was superseded; result discarded
    LookupDropped {
        role: AddressRole,
        kind: LookupKind,
        pincode: String,
    },
    /// A batch of fields was written programmatically
    AutofillApplied {
        role: AddressRole,
        source: AutofillSource,
        fields: usize,
    },
    /// The role's address-type switch changed
    AddressTypeChanged {
        role: AddressRole,
        address_type: AddressType,
    },
    /// A locally registered area was appended and selected
    AreaAdded {
        role: AddressRole,
        id: String,
        name: String,
    },
    /// Session torn down; pending timers cancelled
    SessionClosed,
}

/// One recorded session event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// What happened
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Append-only event log for one form session.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SessionEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new event, stamped now.
    pub fn record(&mut self, kind: EventKind) {
        self.events.push(SessionEvent {
            timestamp: Utc::now(),
            kind,
        });
    }

    /// All recorded events, in order.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Events touching a specific role.
    pub fn events_for_role(&self, role: AddressRole) -> Vec<&SessionEvent> {
        self.events
            .iter()
            .filter(|e| match &e.kind {
                EventKind::LookupScheduled { role: r, .. }
                | EventKind::LookupStarted { role: r, .. }
                | EventKind::LookupSucceeded { role: r, .. }
                | EventKind::LookupFailed { role: r, .. }
                | EventKind::LookupDropped { role: r, .. }
                | EventKind::AutofillApplied { role: r, .. }
                | EventKind::AddressTypeChanged { role: r, .. }
                | EventKind::AreaAdded { role: r, .. } => *r == role,
                EventKind::SessionClosed => false,
            })
            .collect()
    }

    /// Write the log to a file in JSONL format, appending if it exists.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create events dir {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open events file {}", path.display()))?;

        let mut writer = std::io::BufWriter::new(file);
        for event in &self.events {
            let line = serde_json::to_string(event).context("failed to serialize event")?;
            writeln!(writer, "{}", line).context("failed to write event line")?;
        }
        writer.flush().context("failed to flush events file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_order() {
        let mut log = EventLog::new();
        log.record(EventKind::LookupScheduled {
            role: AddressRole::Sender,
            pincode: "400001".to_string(),
        });
        log.record(EventKind::SessionClosed);

        assert_eq!(log.events().len(), 2);
        assert!(matches!(log.events()[0].kind, EventKind::LookupScheduled { .. }));
        assert!(matches!(log.events()[1].kind, EventKind::SessionClosed));
    }

    #[test]
    fn events_for_role_filters() {
        let mut log = EventLog::new();
        log.record(EventKind::LookupScheduled {
            role: AddressRole::Sender,
            pincode: "400001".to_string(),
        });
        log.record(EventKind::AreaAdded {
            role: AddressRole::Receiver,
            id: "local-1".to_string(),
            name: "Andheri".to_string(),
        });
        log.record(EventKind::SessionClosed);

        assert_eq!(log.events_for_role(AddressRole::Sender).len(), 1);
        assert_eq!(log.events_for_role(AddressRole::Receiver).len(), 1);
        assert_eq!(log.events_for_role(AddressRole::Delivery).len(), 0);
    }

    #[test]
    fn event_serialization_tags_type() {
        let mut log = EventLog::new();
        log.record(EventKind::LookupFailed {
            role: AddressRole::Sender,
            kind: LookupKind::AreaList,
            pincode: "400001".to_string(),
            message: "Server error".to_string(),
        });

        let json = serde_json::to_string(&log.events()[0]).expect("serialize");
        assert!(json.contains("\"type\":\"lookup_failed\""));
        assert!(json.contains("\"kind\":\"area_list\""));
        assert!(json.contains("\"message\":\"Server error\""));
    }

    #[test]
    fn write_to_file_emits_one_line_per_event() {
        let td = tempfile::tempdir().expect("tempdir");
        let path = td.path().join("events.jsonl");

        let mut log = EventLog::new();
        log.record(EventKind::SessionClosed);
        log.record(EventKind::SessionClosed);
        log.write_to_file(&path).expect("write");

        let content = std::fs::read_to_string(&path).expect("read");
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: SessionEvent = serde_json::from_str(line).expect("parse");
            assert!(matches!(parsed.kind, EventKind::SessionClosed));
        }
    }
}
