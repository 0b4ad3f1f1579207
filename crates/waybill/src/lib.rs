//! # Waybill
//!
//! The booking-form engine behind a multi-step shipment-booking flow:
//! pincode-driven auto-completion of state/city/area, customer and
//! profile autofill, and ad-hoc area registration.
//!
//! ## Pipeline
//!
//! The core flow is **keystroke → debounce → lookup → apply**:
//!
//! 1. [`session::FormSession::on_pincode_change`] strips the input to
//!    digits, clears location fields while the pincode is incomplete, and
//!    arms the debounce window once it is exactly six digits.
//! 2. When the window settles, the session runs the pincode-detail and
//!    area-list lookups against the [`waybill_lookup::LocationDirectory`]
//!    it was given, off the caller's thread.
//! 3. Results are applied only while the session is open and the role's
//!    pincode still matches; stale or post-teardown responses are dropped.
//! 4. Programmatic batch writes (customer, profile, "same as pickup",
//!    cleared templates) go through [`autofill`], which suppresses
//!    transitional validation noise until a pass confirms the applied
//!    fields are clean.
//!
//! ## Key Types
//!
//! - `FormSession` — per-form facade owning cache, scheduler, and log
//! - `FormSurface` — seam to the field-rendering layer; `FormState` is
//!   the built-in in-memory implementation
//! - `FieldMap` — ordered batch of field assignments for one role
//! - `LocationCache` — per-role lookup results with loading/error slots
//! - `DebounceScheduler` — cancel-and-replace timer slots per
//!   `(role, lookup kind)`
//!
//! ## Modules
//!
//! - [`session`] — the `FormSession` facade and lookup application
//! - [`form`] — field keys/values, the `FormSurface` trait, `FormState`
//! - [`autofill`] — field maps and the suppression state machine
//! - [`cache`] — session-scoped per-role location cache
//! - [`schedule`] — debounced, cancellable lookup timers
//! - [`events`] — append-only session event log
//! - [`report`] — reporter seam for background failures

pub mod autofill;
pub mod cache;
pub mod events;
pub mod form;
pub mod report;
pub mod schedule;
pub mod session;

pub use autofill::{AutofillPhase, AutofillSource, FieldMap};
pub use cache::LocationCache;
pub use events::{EventKind, EventLog, SessionEvent};
pub use form::{FieldKey, FieldValue, FormState, FormSurface};
pub use report::{CollectingReporter, Reporter, StderrReporter};
pub use schedule::{DebounceScheduler, LookupKind, TaskKey};
pub use session::{FormSession, SessionOptions};
