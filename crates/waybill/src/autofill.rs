//! Batch autofill of role fields.
//!
//! Every programmatic write of address fields (picking a customer, using
//! the logged-in profile, copying the sender into the receiver, clearing
//! a role back to its empty template) goes through one ordered field map
//! and one application algorithm, so validation noise is suppressed the
//! same way for every trigger.

use serde::{Deserialize, Serialize};
use waybill_types::{AddressRole, Customer, SelectOption, UserProfile};

use crate::form::{FieldKey, FieldValue, FormSurface};

/// Suppression state for one role's programmatic updates.
///
/// `Idle → Autofilling → SettlingValidation → Idle`. Validation errors on
/// the role are hidden whenever the phase is not `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutofillPhase {
    /// No programmatic update in progress
    #[default]
    Idle,
    /// Field values are being written and marked touched
    Autofilling,
    /// Waiting for a validation pass to confirm the batch is error-free
    SettlingValidation,
}

/// Where an autofill batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutofillSource {
    /// A customer record chosen from the directory
    Customer,
    /// The logged-in user's own profile
    Profile,
    /// Receiver copying the sender's fields
    SameAsSender,
    /// The all-empty template
    ClearedTemplate,
}

/// Clear-and-revalidate rounds before settling gives up on a field.
pub const SETTLE_ROUNDS: usize = 2;

/// Ordered set of field→value assignments for one role.
#[derive(Debug, Clone)]
pub struct FieldMap {
    pub source: AutofillSource,
    entries: Vec<(FieldKey, FieldValue)>,
}

impl FieldMap {
    /// Map a directory customer's attributes onto the role's fields.
    pub fn from_customer(customer: &Customer) -> Self {
        let mut entries = address_entries(
            &customer.company_name,
            &customer.gst_no,
            &customer.address1,
            &customer.address2,
            &customer.mobile_no,
            &customer.email,
            &customer.pincode,
            &customer.state_name,
            &customer.city_name,
            &customer.area_name,
        );
        entries.push((FieldKey::CustomerId, FieldValue::Text(customer.id.clone())));
        Self {
            source: AutofillSource::Customer,
            entries,
        }
    }

    /// Map the logged-in profile's attributes onto the role's fields.
    pub fn from_profile(profile: &UserProfile) -> Self {
        let mut entries = address_entries(
            &profile.company_name,
            &profile.gst_no,
            &profile.address1,
            &profile.address2,
            &profile.mobile_no,
            &profile.email,
            &profile.pincode,
            &profile.state_name,
            &profile.city_name,
            &profile.area_name,
        );
        entries.push((FieldKey::CustomerId, FieldValue::Text(profile.id.clone())));
        Self {
            source: AutofillSource::Profile,
            entries,
        }
    }

    /// The all-empty template: every field reset to its empty value,
    /// including the customer reference.
    pub fn cleared() -> Self {
        let entries = FieldKey::ALL
            .iter()
            .map(|&field| (field, FieldValue::empty_for(field)))
            .collect();
        Self {
            source: AutofillSource::ClearedTemplate,
            entries,
        }
    }

    /// Copy every sender field into its receiver counterpart, except the
    /// customer reference, which is cleared.
    pub fn copy_of_sender(form: &dyn FormSurface) -> Self {
        let entries = FieldKey::ALL
            .iter()
            .map(|&field| {
                let value = if field == FieldKey::CustomerId {
                    FieldValue::Text(String::new())
                } else {
                    form.value(AddressRole::Sender, field)
                };
                (field, value)
            })
            .collect();
        Self {
            source: AutofillSource::SameAsSender,
            entries,
        }
    }

    /// Fields this map writes, in application order.
    pub fn keys(&self) -> Vec<FieldKey> {
        self.entries.iter().map(|(field, _)| *field).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn address_entries(
    company_name: &str,
    gst_no: &str,
    address1: &str,
    address2: &str,
    mobile_no: &str,
    email: &str,
    pincode: &str,
    state_name: &str,
    city_name: &str,
    area_name: &str,
) -> Vec<(FieldKey, FieldValue)> {
    vec![
        (
            FieldKey::CompanyName,
            FieldValue::Text(company_name.to_string()),
        ),
        (FieldKey::GstNo, FieldValue::Text(gst_no.to_string())),
        (FieldKey::Address1, FieldValue::Text(address1.to_string())),
        (FieldKey::Address2, FieldValue::Text(address2.to_string())),
        (FieldKey::MobileNo, FieldValue::Text(mobile_no.to_string())),
        (FieldKey::Email, FieldValue::Text(email.to_string())),
        (FieldKey::Pincode, FieldValue::Text(pincode.to_string())),
        (
            FieldKey::State,
            FieldValue::Select(SelectOption::labeled_opt(state_name)),
        ),
        (
            FieldKey::City,
            FieldValue::Select(SelectOption::labeled_opt(city_name)),
        ),
        (
            FieldKey::Area,
            FieldValue::Select(SelectOption::labeled_opt(area_name)),
        ),
    ]
}

/// Apply a field map to one role.
///
/// The ordering is part of the contract: all writes land before any error
/// is cleared, and settling runs only after every clear.
pub fn apply_field_map(
    form: &mut dyn FormSurface,
    phase: &mut AutofillPhase,
    role: AddressRole,
    map: &FieldMap,
) {
    *phase = AutofillPhase::Autofilling;

    for (field, value) in &map.entries {
        form.set_value(role, *field, value.clone());
        form.mark_touched(role, *field);
    }
    for (field, _) in &map.entries {
        form.clear_error(role, *field);
    }

    *phase = AutofillPhase::SettlingValidation;
    settle_validation(form, role, &map.keys());
    *phase = AutofillPhase::Idle;
}

/// Clear errors a validation pass re-introduces on the applied fields,
/// bounded at `SETTLE_ROUNDS` rounds.
fn settle_validation(form: &mut dyn FormSurface, role: AddressRole, applied: &[FieldKey]) {
    for _ in 0..SETTLE_ROUNDS {
        let failing = form.validate_role(role);
        let residual: Vec<FieldKey> = failing
            .into_iter()
            .filter(|field| applied.contains(field))
            .collect();
        if residual.is_empty() {
            return;
        }
        for field in residual {
            form.clear_error(role, field);
        }
    }
}
