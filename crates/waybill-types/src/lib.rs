//! Core domain types for waybill.
//!
//! This crate provides the fundamental types used across the waybill
//! ecosystem for address capture, pincode resolution, and lookup error
//! handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a well-formed pincode.
pub const PINCODE_LEN: usize = 6;

/// Address contexts captured by the booking form.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AddressRole {
    /// Pickup / consignor address
    Sender,
    /// Drop / consignee address
    Receiver,
    /// Alternate delivery address
    Delivery,
}

impl AddressRole {
    /// All roles, in form order.
    pub const ALL: [AddressRole; 3] = [
        AddressRole::Sender,
        AddressRole::Receiver,
        AddressRole::Delivery,
    ];

    /// Stable lowercase name for keys and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressRole::Sender => "sender",
            AddressRole::Receiver => "receiver",
            AddressRole::Delivery => "delivery",
        }
    }
}

impl std::fmt::Display for AddressRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a role captures a fresh address or reuses a directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    /// Address is typed in from scratch
    #[default]
    New,
    /// Address comes from an existing customer record
    Existing,
}

/// Which party the shipment is billed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillTo {
    /// Bill the sender
    #[default]
    Sender,
    /// Bill the receiver
    Receiver,
}

/// Id/label pair backing a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Stable value submitted with the form
    pub value: String,
    /// Text shown in the dropdown
    pub label: String,
}

impl SelectOption {
    /// Create an option from a value and a display label.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option for a bare name with no separate id, as customer records
    /// carry only location names.
    pub fn labeled(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            value: name.clone(),
            label: name,
        }
    }

    /// `labeled`, but empty input maps to no selection.
    pub fn labeled_opt(name: &str) -> Option<Self> {
        if name.trim().is_empty() {
            None
        } else {
            Some(Self::labeled(name))
        }
    }
}

/// Resolved location for a 6-digit postal code.
///
/// Produced by the lookup gateway; replaced wholesale on each successful
/// lookup and cleared to absent on lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PincodeDetail {
    pub area_id: String,
    pub area_name: String,
    pub city_id: String,
    pub city_name: String,
    pub state_id: String,
    pub state_name: String,
    pub country_id: String,
    pub country_name: String,
}

/// One selectable area for a pincode.
///
/// Either returned by the area-list lookup or synthesized locally when the
/// user adds an area by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaOption {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub city_id: String,
    #[serde(default)]
    pub pincode: String,
}

/// Customer record from the directory. Read-only from the workflow's
/// perspective.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub state_name: String,
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub area_name: String,
    #[serde(default)]
    pub gst_no: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub mobile_no: String,
    #[serde(default)]
    pub email: String,
}

/// Logged-in user profile, session-scoped. Carries the bearer token the
/// lookup gateway requires.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub state_name: String,
    #[serde(default)]
    pub city_name: String,
    #[serde(default)]
    pub area_name: String,
    #[serde(default)]
    pub gst_no: String,
    #[serde(default)]
    pub address1: String,
    #[serde(default)]
    pub address2: String,
    #[serde(default)]
    pub mobile_no: String,
    #[serde(default)]
    pub email: String,
    /// Gateway bearer token, if the session holds one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Failure kinds for gateway lookups and local workflow checks.
///
/// Every variant is recoverable: failures populate an error slot for
/// display and the user retries by re-triggering input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No bearer token available; the request is never sent
    #[error("no API token available for this session")]
    MissingAuthToken,
    /// Gateway answered with a non-2xx status and no usable message
    #[error("lookup request failed with status {0}")]
    Http(u16),
    /// Gateway or transport rejected the request with a message
    #[error("{0}")]
    Rejected(String),
    /// Input rejected before any network or state mutation
    #[error("{0}")]
    LocalValidation(String),
}

/// Strip everything except ASCII digits from raw pincode input.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// True when `pincode` is exactly six ASCII digits.
pub fn is_complete_pincode(pincode: &str) -> bool {
    pincode.len() == PINCODE_LEN && pincode.chars().all(|c| c.is_ascii_digit())
}
