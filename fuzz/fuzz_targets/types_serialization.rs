#![no_main]

use libfuzzer_sys::fuzz_target;
use waybill_types::{AreaOption, Customer, PincodeDetail};

fuzz_target!(|data: &[u8]| {
    // Try to parse as JSON and verify serialization roundtrips
    if let Ok(json_str) = std::str::from_utf8(data) {
        if let Ok(customer) = serde_json::from_str::<Customer>(json_str) {
            if let Ok(roundtripped) = serde_json::to_string(&customer) {
                if let Ok(parsed) = serde_json::from_str::<Customer>(&roundtripped) {
                    assert_eq!(customer, parsed);
                }
            }
        }

        if let Ok(area) = serde_json::from_str::<AreaOption>(json_str) {
            if let Ok(roundtripped) = serde_json::to_string(&area) {
                if let Ok(parsed) = serde_json::from_str::<AreaOption>(&roundtripped) {
                    assert_eq!(area, parsed);
                }
            }
        }

        if let Ok(detail) = serde_json::from_str::<PincodeDetail>(json_str) {
            if let Ok(roundtripped) = serde_json::to_string(&detail) {
                if let Ok(parsed) = serde_json::from_str::<PincodeDetail>(&roundtripped) {
                    assert_eq!(detail, parsed);
                }
            }
        }
    }
});
