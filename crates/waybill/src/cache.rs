//! Session-scoped location cache.
//!
//! Holds the most recently resolved pincode detail and area list for each
//! address role, with independent loading and error slots per lookup. The
//! cache lives and dies with the form session, and roles never share a
//! slot, so one role's in-flight lookup cannot clobber another's banner.

use std::collections::BTreeMap;

use waybill_types::{AddressRole, AreaOption, PincodeDetail};

#[derive(Debug, Default, Clone)]
struct RoleSlot {
    detail: Option<PincodeDetail>,
    areas: Vec<AreaOption>,
    detail_loading: bool,
    areas_loading: bool,
    detail_error: Option<String>,
    area_error: Option<String>,
}

/// Per-role cache of lookup results and their loading/error state.
#[derive(Debug, Default)]
pub struct LocationCache {
    slots: BTreeMap<AddressRole, RoleSlot>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, role: AddressRole) -> &mut RoleSlot {
        self.slots.entry(role).or_default()
    }

    fn slot(&self, role: AddressRole) -> Option<&RoleSlot> {
        self.slots.get(&role)
    }

    /// Mark the detail lookup in flight and clear its previous error.
    pub fn begin_detail(&mut self, role: AddressRole) {
        let slot = self.slot_mut(role);
        slot.detail_loading = true;
        slot.detail_error = None;
    }

    /// Replace the cached detail wholesale after a successful lookup.
    pub fn store_detail(&mut self, role: AddressRole, detail: PincodeDetail) {
        let slot = self.slot_mut(role);
        slot.detail = Some(detail);
        slot.detail_loading = false;
        slot.detail_error = None;
    }

    /// Record a detail lookup failure. The cached detail is cleared to
    /// absent; resolved form fields are left to the caller.
    pub fn fail_detail(&mut self, role: AddressRole, message: impl Into<String>) {
        let slot = self.slot_mut(role);
        slot.detail = None;
        slot.detail_loading = false;
        slot.detail_error = Some(message.into());
    }

    /// Stop the detail spinner without touching the cached value. Used
    /// when a settled response turns out to be stale.
    pub fn end_detail(&mut self, role: AddressRole) {
        self.slot_mut(role).detail_loading = false;
    }

    /// Mark the area lookup in flight and clear its previous error.
    pub fn begin_areas(&mut self, role: AddressRole) {
        let slot = self.slot_mut(role);
        slot.areas_loading = true;
        slot.area_error = None;
    }

    /// Replace the role's area-option set after a successful lookup.
    pub fn store_areas(&mut self, role: AddressRole, areas: Vec<AreaOption>) {
        let slot = self.slot_mut(role);
        slot.areas = areas;
        slot.areas_loading = false;
        slot.area_error = None;
    }

    /// Record an area lookup failure: the option set empties and the
    /// error slot carries the gateway message.
    pub fn fail_areas(&mut self, role: AddressRole, message: impl Into<String>) {
        let slot = self.slot_mut(role);
        slot.areas.clear();
        slot.areas_loading = false;
        slot.area_error = Some(message.into());
    }

    /// Stop the area spinner without touching the cached set.
    pub fn end_areas(&mut self, role: AddressRole) {
        self.slot_mut(role).areas_loading = false;
    }

    /// Append a locally registered area option. No de-duplication against
    /// server-provided entries.
    pub fn push_area(&mut self, role: AddressRole, area: AreaOption) {
        self.slot_mut(role).areas.push(area);
    }

    /// Drop everything cached for the role.
    pub fn clear_role(&mut self, role: AddressRole) {
        self.slots.remove(&role);
    }

    pub fn detail(&self, role: AddressRole) -> Option<&PincodeDetail> {
        self.slot(role).and_then(|s| s.detail.as_ref())
    }

    pub fn areas(&self, role: AddressRole) -> &[AreaOption] {
        self.slot(role).map(|s| s.areas.as_slice()).unwrap_or(&[])
    }

    pub fn detail_loading(&self, role: AddressRole) -> bool {
        self.slot(role).is_some_and(|s| s.detail_loading)
    }

    pub fn areas_loading(&self, role: AddressRole) -> bool {
        self.slot(role).is_some_and(|s| s.areas_loading)
    }

    pub fn detail_error(&self, role: AddressRole) -> Option<&str> {
        self.slot(role).and_then(|s| s.detail_error.as_deref())
    }

    pub fn area_error(&self, role: AddressRole) -> Option<&str> {
        self.slot(role).and_then(|s| s.area_error.as_deref())
    }
}
