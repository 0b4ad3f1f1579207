//! Form field model and the surface seam.
//!
//! The engine drives a `FormSurface`: the field-rendering layer that owns
//! values, touched marks, and validation errors. `FormState` is the
//! built-in in-memory implementation used by the session and by tests;
//! embedders with their own rendering layer implement the trait instead.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use waybill_types::{
    AddressRole, AddressType, BillTo, SelectOption, is_complete_pincode,
};

/// Named fields each address role owns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    CompanyName,
    Pincode,
    State,
    City,
    Area,
    GstNo,
    Address1,
    Address2,
    MobileNo,
    Email,
    CustomerId,
}

impl FieldKey {
    /// All role fields, in form order.
    pub const ALL: [FieldKey; 11] = [
        FieldKey::CompanyName,
        FieldKey::Pincode,
        FieldKey::State,
        FieldKey::City,
        FieldKey::Area,
        FieldKey::GstNo,
        FieldKey::Address1,
        FieldKey::Address2,
        FieldKey::MobileNo,
        FieldKey::Email,
        FieldKey::CustomerId,
    ];

    /// Fields rendered as selects rather than text inputs.
    pub fn is_select(&self) -> bool {
        matches!(self, FieldKey::State | FieldKey::City | FieldKey::Area)
    }

    /// Stable lowercase name for keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::CompanyName => "company_name",
            FieldKey::Pincode => "pincode",
            FieldKey::State => "state",
            FieldKey::City => "city",
            FieldKey::Area => "area",
            FieldKey::GstNo => "gst_no",
            FieldKey::Address1 => "address1",
            FieldKey::Address2 => "address2",
            FieldKey::MobileNo => "mobile_no",
            FieldKey::Email => "email",
            FieldKey::CustomerId => "customer_id",
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value held by one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free-text input
    Text(String),
    /// Select control: a chosen option or nothing
    Select(Option<SelectOption>),
}

impl FieldValue {
    /// The empty value appropriate for the field's control type.
    pub fn empty_for(key: FieldKey) -> Self {
        if key.is_select() {
            FieldValue::Select(None)
        } else {
            FieldValue::Text(String::new())
        }
    }

    /// Text content, empty for selects.
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Text(text) => text,
            FieldValue::Select(_) => "",
        }
    }

    /// Selected option, if this is a select carrying one.
    pub fn as_selection(&self) -> Option<&SelectOption> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::Select(selection) => selection.as_ref(),
        }
    }
}

/// The field-rendering layer the engine drives.
///
/// Owns values, touched marks, per-field validation errors, the per-role
/// address-type switch, and the cross-cutting booking flags.
pub trait FormSurface: Send {
    /// Current value of a field; empty if never written.
    fn value(&self, role: AddressRole, field: FieldKey) -> FieldValue;

    fn set_value(&mut self, role: AddressRole, field: FieldKey, value: FieldValue);

    fn mark_touched(&mut self, role: AddressRole, field: FieldKey);

    fn is_touched(&self, role: AddressRole, field: FieldKey) -> bool;

    fn error(&self, role: AddressRole, field: FieldKey) -> Option<String>;

    fn set_error(&mut self, role: AddressRole, field: FieldKey, message: &str);

    fn clear_error(&mut self, role: AddressRole, field: FieldKey);

    fn address_type(&self, role: AddressRole) -> AddressType;

    fn set_address_type(&mut self, role: AddressRole, address_type: AddressType);

    fn same_as_pickup(&self) -> bool;

    fn set_same_as_pickup(&mut self, on: bool);

    fn different_delivery_address(&self) -> bool;

    fn set_different_delivery_address(&mut self, on: bool);

    fn bill_to(&self) -> BillTo;

    fn set_bill_to(&mut self, bill_to: BillTo);

    /// Run the role's validation rules, updating error slots, and return
    /// the fields that now carry errors.
    fn validate_role(&mut self, role: AddressRole) -> Vec<FieldKey>;
}

/// In-memory `FormSurface` implementation.
#[derive(Debug, Default)]
pub struct FormState {
    values: BTreeMap<(AddressRole, FieldKey), FieldValue>,
    touched: BTreeSet<(AddressRole, FieldKey)>,
    errors: BTreeMap<(AddressRole, FieldKey), String>,
    address_types: BTreeMap<AddressRole, AddressType>,
    same_as_pickup: bool,
    different_delivery_address: bool,
    bill_to: BillTo,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text content of a field, empty if unset or a select.
    pub fn text(&self, role: AddressRole, field: FieldKey) -> String {
        self.value(role, field).as_text().to_string()
    }

    /// Selected option of a select field.
    pub fn selection(&self, role: AddressRole, field: FieldKey) -> Option<SelectOption> {
        self.value(role, field).as_selection().cloned()
    }

    fn rule_error(&self, role: AddressRole, field: FieldKey) -> Option<&'static str> {
        match field {
            FieldKey::Address1 => {
                if self.text(role, field).is_empty() {
                    Some("address line 1 is required")
                } else {
                    None
                }
            }
            FieldKey::Pincode => {
                let pincode = self.text(role, field);
                if pincode.is_empty() {
                    Some("pincode is required")
                } else if !is_complete_pincode(&pincode) {
                    Some("pincode must be 6 digits")
                } else {
                    None
                }
            }
            FieldKey::MobileNo => {
                let mobile = self.text(role, field);
                if !mobile.is_empty()
                    && (mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()))
                {
                    Some("mobile number must be 10 digits")
                } else {
                    None
                }
            }
            FieldKey::Email => {
                let email = self.text(role, field);
                if !email.is_empty() && !email.contains('@') {
                    Some("invalid email address")
                } else {
                    None
                }
            }
            FieldKey::GstNo => {
                let gst = self.text(role, field);
                if !gst.is_empty() && gst.len() != 15 {
                    Some("GST number must be 15 characters")
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl FormSurface for FormState {
    fn value(&self, role: AddressRole, field: FieldKey) -> FieldValue {
        self.values
            .get(&(role, field))
            .cloned()
            .unwrap_or_else(|| FieldValue::empty_for(field))
    }

    fn set_value(&mut self, role: AddressRole, field: FieldKey, value: FieldValue) {
        self.values.insert((role, field), value);
    }

    fn mark_touched(&mut self, role: AddressRole, field: FieldKey) {
        self.touched.insert((role, field));
    }

    fn is_touched(&self, role: AddressRole, field: FieldKey) -> bool {
        self.touched.contains(&(role, field))
    }

    fn error(&self, role: AddressRole, field: FieldKey) -> Option<String> {
        self.errors.get(&(role, field)).cloned()
    }

    fn set_error(&mut self, role: AddressRole, field: FieldKey, message: &str) {
        self.errors.insert((role, field), message.to_string());
    }

    fn clear_error(&mut self, role: AddressRole, field: FieldKey) {
        self.errors.remove(&(role, field));
    }

    fn address_type(&self, role: AddressRole) -> AddressType {
        self.address_types.get(&role).copied().unwrap_or_default()
    }

    fn set_address_type(&mut self, role: AddressRole, address_type: AddressType) {
        self.address_types.insert(role, address_type);
    }

    fn same_as_pickup(&self) -> bool {
        self.same_as_pickup
    }

    fn set_same_as_pickup(&mut self, on: bool) {
        self.same_as_pickup = on;
    }

    fn different_delivery_address(&self) -> bool {
        self.different_delivery_address
    }

    fn set_different_delivery_address(&mut self, on: bool) {
        self.different_delivery_address = on;
    }

    fn bill_to(&self) -> BillTo {
        self.bill_to
    }

    fn set_bill_to(&mut self, bill_to: BillTo) {
        self.bill_to = bill_to;
    }

    fn validate_role(&mut self, role: AddressRole) -> Vec<FieldKey> {
        let mut failing = Vec::new();
        for field in FieldKey::ALL {
            match self.rule_error(role, field) {
                Some(message) => {
                    self.set_error(role, field, message);
                    failing.push(field);
                }
                None => {
                    self.clear_error(role, field);
                }
            }
        }
        failing
    }
}
