//! Booking-form session.
//!
//! `FormSession` ties the engine together: it owns the form surface, the
//! per-role location cache, the debounce scheduler, and the event log, and
//! exposes the operations the booking steps call: pincode changes,
//! customer/profile autofill, the address-type switch, "same as pickup",
//! and ad-hoc area registration.
//!
//! Lookups run on background threads so the caller never blocks. A lookup
//! result is applied only while the session is open and the role's pincode
//! still matches the value the lookup was scheduled with; anything else is
//! dropped without touching shared state.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use waybill_auth::resolve_token;
use waybill_config::Config;
use waybill_lookup::{LocationDirectory, LookupClient};
use waybill_types::{
    AddressRole, AddressType, AreaOption, BillTo, Customer, LookupError, PincodeDetail,
    SelectOption, UserProfile, digits_only, is_complete_pincode,
};

use crate::autofill::{AutofillPhase, FieldMap, apply_field_map};
use crate::cache::LocationCache;
use crate::events::{EventKind, EventLog, SessionEvent};
use crate::form::{FieldKey, FieldValue, FormState, FormSurface};
use crate::report::{Reporter, StderrReporter};
use crate::schedule::{DebounceScheduler, LookupKind, TaskKey};

/// Runtime knobs for a form session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Debounce window between the last pincode keystroke and the lookups
    pub debounce_window: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(300),
        }
    }
}

impl SessionOptions {
    /// Derive options from a loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce_window: config.form().debounce_window,
        }
    }
}

#[derive(Debug, Default)]
struct RoleFlags {
    phase: AutofillPhase,
    address_type_settling: bool,
    selected_customer: Option<String>,
}

struct SessionInner {
    form: Box<dyn FormSurface>,
    cache: LocationCache,
    flags: BTreeMap<AddressRole, RoleFlags>,
    profile: UserProfile,
    events: EventLog,
    area_seq: u64,
    closed: bool,
}

impl SessionInner {
    fn pincode(&self, role: AddressRole) -> String {
        self.form.value(role, FieldKey::Pincode).as_text().to_string()
    }

    fn flags_mut(&mut self, role: AddressRole) -> &mut RoleFlags {
        self.flags.entry(role).or_default()
    }

    fn apply_map(&mut self, role: AddressRole, map: FieldMap) {
        let source = map.source;
        let fields = map.len();
        let flags = self.flags.entry(role).or_default();
        apply_field_map(self.form.as_mut(), &mut flags.phase, role, &map);
        flags.address_type_settling = false;
        self.events.record(EventKind::AutofillApplied {
            role,
            source,
            fields,
        });
    }
}

/// Shared handles the background lookup threads carry.
#[derive(Clone)]
struct SessionRuntime {
    inner: Arc<Mutex<SessionInner>>,
    scheduler: DebounceScheduler,
    directory: Arc<dyn LocationDirectory>,
    reporter: Arc<Mutex<dyn Reporter>>,
}

impl SessionRuntime {
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn warn(&self, message: &str) {
        self.reporter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .warn(message);
    }

    /// Run the settled debounce: detail lookup first, then the area
    /// lookup if its slot was not re-armed in the meantime. Each lookup's
    /// outcome is independent.
    fn run_lookups(&self, role: AddressRole, pincode: &str, area_key: TaskKey, area_generation: u64) {
        let token = {
            let mut inner = self.lock();
            if inner.closed || inner.pincode(role) != pincode {
                return;
            }
            match resolve_token(Some(&inner.profile)).token {
                Some(token) => {
                    inner.cache.begin_detail(role);
                    inner.events.record(EventKind::LookupStarted {
                        role,
                        kind: LookupKind::PincodeDetail,
                        pincode: pincode.to_string(),
                    });
                    token
                }
                None => {
                    let message = LookupError::MissingAuthToken.to_string();
                    inner.cache.fail_detail(role, message.clone());
                    inner.cache.fail_areas(role, message.clone());
                    for kind in [LookupKind::PincodeDetail, LookupKind::AreaList] {
                        inner.events.record(EventKind::LookupFailed {
                            role,
                            kind,
                            pincode: pincode.to_string(),
                            message: message.clone(),
                        });
                    }
                    drop(inner);
                    self.warn(&format!("pincode lookup skipped for {role}: {message}"));
                    return;
                }
            }
        };

        let detail_result = self.directory.pincode_detail(&token, pincode);
        self.apply_detail(role, pincode, detail_result);

        if !self.scheduler.is_current(area_key, area_generation) {
            return;
        }
        {
            let mut inner = self.lock();
            if inner.closed || inner.pincode(role) != pincode {
                return;
            }
            inner.cache.begin_areas(role);
            inner.events.record(EventKind::LookupStarted {
                role,
                kind: LookupKind::AreaList,
                pincode: pincode.to_string(),
            });
        }
        let area_result = self.directory.area_list(&token, pincode);
        self.apply_areas(role, pincode, area_result);
    }

    fn apply_detail(
        &self,
        role: AddressRole,
        pincode: &str,
        result: Result<PincodeDetail, LookupError>,
    ) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        if inner.pincode(role) != pincode {
            inner.cache.end_detail(role);
            inner.events.record(EventKind::LookupDropped {
                role,
                kind: LookupKind::PincodeDetail,
                pincode: pincode.to_string(),
            });
            return;
        }

        match result {
            Ok(detail) => {
                inner
                    .form
                    .set_value(role, FieldKey::State, select_from(&detail.state_id, &detail.state_name));
                inner
                    .form
                    .set_value(role, FieldKey::City, select_from(&detail.city_id, &detail.city_name));
                inner
                    .form
                    .set_value(role, FieldKey::Area, select_from(&detail.area_id, &detail.area_name));
                for field in [FieldKey::State, FieldKey::City, FieldKey::Area] {
                    inner.form.clear_error(role, field);
                }
                inner.cache.store_detail(role, detail);
                inner.events.record(EventKind::LookupSucceeded {
                    role,
                    kind: LookupKind::PincodeDetail,
                    pincode: pincode.to_string(),
                });
            }
            Err(err) => {
                let message = err.to_string();
                inner.cache.fail_detail(role, message.clone());
                inner.events.record(EventKind::LookupFailed {
                    role,
                    kind: LookupKind::PincodeDetail,
                    pincode: pincode.to_string(),
                    message: message.clone(),
                });
                drop(inner);
                self.warn(&format!("pincode detail lookup failed for {role}: {message}"));
            }
        }
    }

    fn apply_areas(
        &self,
        role: AddressRole,
        pincode: &str,
        result: Result<Vec<AreaOption>, LookupError>,
    ) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        if inner.pincode(role) != pincode {
            inner.cache.end_areas(role);
            inner.events.record(EventKind::LookupDropped {
                role,
                kind: LookupKind::AreaList,
                pincode: pincode.to_string(),
            });
            return;
        }

        match result {
            Ok(areas) => {
                inner.cache.store_areas(role, areas);
                // The option set changed; the prior selection may no
                // longer be valid.
                inner.form.set_value(role, FieldKey::Area, FieldValue::Select(None));
                inner.form.clear_error(role, FieldKey::Area);
                inner.events.record(EventKind::LookupSucceeded {
                    role,
                    kind: LookupKind::AreaList,
                    pincode: pincode.to_string(),
                });
            }
            Err(err) => {
                let message = err.to_string();
                inner.cache.fail_areas(role, message.clone());
                inner.events.record(EventKind::LookupFailed {
                    role,
                    kind: LookupKind::AreaList,
                    pincode: pincode.to_string(),
                    message: message.clone(),
                });
                drop(inner);
                self.warn(&format!("area lookup failed for {role}: {message}"));
            }
        }
    }
}

fn select_from(id: &str, name: &str) -> FieldValue {
    if name.trim().is_empty() {
        FieldValue::Select(None)
    } else if id.trim().is_empty() {
        FieldValue::Select(Some(SelectOption::labeled(name)))
    } else {
        FieldValue::Select(Some(SelectOption::new(id, name)))
    }
}

/// One booking-form session.
///
/// Created when the form opens and closed when it unmounts; closing (or
/// dropping) cancels every pending timer and makes late lookup results
/// inert.
pub struct FormSession {
    runtime: SessionRuntime,
    debounce_window: Duration,
}

impl FormSession {
    /// Create a session over the built-in in-memory form surface.
    pub fn new(
        directory: Arc<dyn LocationDirectory>,
        profile: UserProfile,
        options: SessionOptions,
    ) -> Self {
        Self::with_form_surface(Box::new(FormState::new()), directory, profile, options)
    }

    /// Create a session over a custom form surface.
    pub fn with_form_surface(
        form: Box<dyn FormSurface>,
        directory: Arc<dyn LocationDirectory>,
        profile: UserProfile,
        options: SessionOptions,
    ) -> Self {
        Self {
            runtime: SessionRuntime {
                inner: Arc::new(Mutex::new(SessionInner {
                    form,
                    cache: LocationCache::new(),
                    flags: BTreeMap::new(),
                    profile,
                    events: EventLog::new(),
                    area_seq: 0,
                    closed: false,
                })),
                scheduler: DebounceScheduler::new(),
                directory,
                reporter: Arc::new(Mutex::new(StderrReporter)),
            },
            debounce_window: options.debounce_window,
        }
    }

    /// Create a session wired to the configured lookup gateway.
    pub fn from_config(config: &Config, profile: UserProfile) -> Self {
        let client = LookupClient::new(&config.gateway().base_url)
            .with_timeout(config.gateway().timeout);
        Self::new(Arc::new(client), profile, SessionOptions::from_config(config))
    }

    /// Replace the reporter background failures are routed through.
    pub fn with_reporter(mut self, reporter: Arc<Mutex<dyn Reporter>>) -> Self {
        self.runtime.reporter = reporter;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.runtime.lock()
    }

    /// Handle a keystroke in a role's pincode input.
    ///
    /// Non-digits are stripped before storing. An incomplete pincode
    /// synchronously clears the role's state/city/area and cancels any
    /// pending lookups; a complete one (re)arms the debounce window with
    /// the latest value.
    pub fn on_pincode_change(&self, role: AddressRole, raw_input: &str) {
        let digits = digits_only(raw_input);
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner
            .form
            .set_value(role, FieldKey::Pincode, FieldValue::Text(digits.clone()));
        inner.form.mark_touched(role, FieldKey::Pincode);

        if !is_complete_pincode(&digits) {
            for field in [FieldKey::State, FieldKey::City, FieldKey::Area] {
                inner.form.set_value(role, field, FieldValue::Select(None));
            }
            drop(inner);
            self.runtime
                .scheduler
                .cancel(TaskKey::new(role, LookupKind::PincodeDetail));
            self.runtime
                .scheduler
                .cancel(TaskKey::new(role, LookupKind::AreaList));
            return;
        }

        inner.events.record(EventKind::LookupScheduled {
            role,
            pincode: digits.clone(),
        });
        drop(inner);

        let area_key = TaskKey::new(role, LookupKind::AreaList);
        let area_generation = self.runtime.scheduler.reserve(area_key);
        let runtime = self.runtime.clone();
        self.runtime.scheduler.schedule(
            TaskKey::new(role, LookupKind::PincodeDetail),
            self.debounce_window,
            move || {
                runtime.run_lookups(role, &digits, area_key, area_generation);
            },
        );
    }

    /// Autofill a role from a directory customer.
    pub fn select_customer(&self, role: AddressRole, customer: &Customer) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        if role == AddressRole::Receiver && inner.form.same_as_pickup() {
            inner.form.set_same_as_pickup(false);
        }
        inner.flags_mut(role).selected_customer = Some(customer.id.clone());
        inner.apply_map(role, FieldMap::from_customer(customer));
    }

    /// Autofill the sender from the logged-in profile.
    pub fn use_own_profile(&self) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        let profile = inner.profile.clone();
        inner.flags_mut(AddressRole::Sender).selected_customer = Some(profile.id.clone());
        inner.apply_map(AddressRole::Sender, FieldMap::from_profile(&profile));
    }

    /// Clear a role's customer selection back to the empty template.
    pub fn clear_customer(&self, role: AddressRole) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner.flags_mut(role).selected_customer = None;
        inner.apply_map(role, FieldMap::cleared());
    }

    /// Switch a role between a fresh address and an existing record.
    ///
    /// Changing the switch clears the role's field errors immediately and
    /// holds the role's suppression up until the next confirming
    /// validation pass.
    pub fn set_address_type(&self, role: AddressRole, address_type: AddressType) {
        let mut inner = self.lock();
        if inner.closed || inner.form.address_type(role) == address_type {
            return;
        }
        inner.form.set_address_type(role, address_type);
        for field in FieldKey::ALL {
            inner.form.clear_error(role, field);
        }
        inner.flags_mut(role).address_type_settling = true;
        inner.events.record(EventKind::AddressTypeChanged { role, address_type });

        if role == AddressRole::Receiver
            && address_type == AddressType::Existing
            && inner.form.same_as_pickup()
        {
            inner.form.set_same_as_pickup(false);
        }

        match address_type {
            AddressType::New => {
                inner.flags_mut(role).selected_customer = None;
                inner.apply_map(role, FieldMap::cleared());
            }
            AddressType::Existing => {
                if role == AddressRole::Sender
                    && inner.flags_mut(role).selected_customer.is_none()
                {
                    let profile = inner.profile.clone();
                    inner.flags_mut(role).selected_customer = Some(profile.id.clone());
                    inner.apply_map(role, FieldMap::from_profile(&profile));
                }
            }
        }
    }

    /// Toggle "receiver same as pickup".
    ///
    /// On: every sender field is copied into its receiver counterpart,
    /// the receiver's address type is forced to `new`, and its customer
    /// selection is cleared. Off: the receiver goes back to the empty
    /// template.
    pub fn set_same_as_pickup(&self, on: bool) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner.form.set_same_as_pickup(on);
        inner.form.set_address_type(AddressRole::Receiver, AddressType::New);
        inner.flags_mut(AddressRole::Receiver).selected_customer = None;
        if on {
            let map = FieldMap::copy_of_sender(inner.form.as_ref());
            inner.apply_map(AddressRole::Receiver, map);
        } else {
            inner.apply_map(AddressRole::Receiver, FieldMap::cleared());
        }
    }

    /// Toggle the separate delivery address. Switching it off clears the
    /// delivery role entirely.
    pub fn set_different_delivery_address(&self, on: bool) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner.form.set_different_delivery_address(on);
        if !on {
            inner.cache.clear_role(AddressRole::Delivery);
            inner.apply_map(AddressRole::Delivery, FieldMap::cleared());
            drop(inner);
            self.runtime
                .scheduler
                .cancel(TaskKey::new(AddressRole::Delivery, LookupKind::PincodeDetail));
            self.runtime
                .scheduler
                .cancel(TaskKey::new(AddressRole::Delivery, LookupKind::AreaList));
        }
    }

    /// Set which party is billed.
    pub fn set_bill_to(&self, bill_to: BillTo) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner.form.set_bill_to(bill_to);
    }

    /// Register an ad-hoc area for the role and select it.
    ///
    /// The id comes from a per-session monotonic counter. Either the area
    /// is appended and selected, or nothing changes and the error is
    /// returned for inline display.
    pub fn add_area(&self, role: AddressRole, name: &str) -> Result<AreaOption, LookupError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(LookupError::LocalValidation(
                "area name must not be empty".to_string(),
            ));
        }

        let mut inner = self.lock();
        if inner.closed {
            return Err(LookupError::LocalValidation(
                "the booking form is no longer open".to_string(),
            ));
        }
        inner.area_seq += 1;
        let id = format!("local-{}", inner.area_seq);
        let area = AreaOption {
            id: id.clone(),
            name: trimmed.to_string(),
            city_id: inner
                .cache
                .detail(role)
                .map(|d| d.city_id.clone())
                .unwrap_or_default(),
            pincode: inner.pincode(role),
        };
        inner.cache.push_area(role, area.clone());
        inner.form.set_value(
            role,
            FieldKey::Area,
            FieldValue::Select(Some(SelectOption::new(&id, trimmed))),
        );
        inner.form.mark_touched(role, FieldKey::Area);
        inner.form.clear_error(role, FieldKey::Area);
        inner.events.record(EventKind::AreaAdded {
            role,
            id,
            name: trimmed.to_string(),
        });
        Ok(area)
    }

    /// Whether the surface should currently hide the role's errors.
    pub fn suppressing_errors(&self, role: AddressRole) -> bool {
        let inner = self.lock();
        inner
            .flags
            .get(&role)
            .map(|f| f.phase != AutofillPhase::Idle || f.address_type_settling)
            .unwrap_or(false)
    }

    /// Run the role's validation rules. A confirming pass also releases
    /// the address-type suppression hold.
    pub fn validate(&self, role: AddressRole) -> Vec<FieldKey> {
        let mut inner = self.lock();
        let failing = inner.form.validate_role(role);
        inner.flags_mut(role).address_type_settling = false;
        failing
    }

    /// Current value of a role field.
    pub fn value(&self, role: AddressRole, field: FieldKey) -> FieldValue {
        self.lock().form.value(role, field)
    }

    /// Text content of a role field.
    pub fn text(&self, role: AddressRole, field: FieldKey) -> String {
        self.value(role, field).as_text().to_string()
    }

    /// Selected option of a role select field.
    pub fn selection(&self, role: AddressRole, field: FieldKey) -> Option<SelectOption> {
        self.value(role, field).as_selection().cloned()
    }

    /// Current validation error on a role field.
    pub fn field_error(&self, role: AddressRole, field: FieldKey) -> Option<String> {
        self.lock().form.error(role, field)
    }

    pub fn address_type(&self, role: AddressRole) -> AddressType {
        self.lock().form.address_type(role)
    }

    pub fn same_as_pickup(&self) -> bool {
        self.lock().form.same_as_pickup()
    }

    pub fn different_delivery_address(&self) -> bool {
        self.lock().form.different_delivery_address()
    }

    pub fn bill_to(&self) -> BillTo {
        self.lock().form.bill_to()
    }

    /// Id of the role's selected customer, if any.
    pub fn selected_customer(&self, role: AddressRole) -> Option<String> {
        self.lock()
            .flags
            .get(&role)
            .and_then(|f| f.selected_customer.clone())
    }

    /// Most recently resolved detail for the role.
    pub fn detail(&self, role: AddressRole) -> Option<PincodeDetail> {
        self.lock().cache.detail(role).cloned()
    }

    /// Current area options for the role.
    pub fn areas(&self, role: AddressRole) -> Vec<AreaOption> {
        self.lock().cache.areas(role).to_vec()
    }

    pub fn detail_loading(&self, role: AddressRole) -> bool {
        self.lock().cache.detail_loading(role)
    }

    pub fn areas_loading(&self, role: AddressRole) -> bool {
        self.lock().cache.areas_loading(role)
    }

    pub fn detail_error(&self, role: AddressRole) -> Option<String> {
        self.lock().cache.detail_error(role).map(str::to_string)
    }

    pub fn area_error(&self, role: AddressRole) -> Option<String> {
        self.lock().cache.area_error(role).map(str::to_string)
    }

    /// Everything the session has recorded so far.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.lock().events.events().to_vec()
    }

    /// Export the session's event log as JSONL.
    pub fn export_events(&self, path: &Path) -> Result<()> {
        self.lock().events.write_to_file(path)
    }

    /// Tear the session down: cancel every pending timer and make late
    /// lookup results inert.
    pub fn close(&self) {
        self.runtime.scheduler.cancel_all();
        let mut inner = self.lock();
        if !inner.closed {
            inner.closed = true;
            inner.events.record(EventKind::SessionClosed);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        self.close();
    }
}
