#![no_main]

use libfuzzer_sys::fuzz_target;
use waybill::autofill::{AutofillPhase, FieldMap, apply_field_map};
use waybill::{FieldKey, FormState, FormSurface};
use waybill_types::{AddressRole, Customer};

fuzz_target!(|data: &[u8]| {
    if let Ok(json_str) = std::str::from_utf8(data) {
        if let Ok(customer) = serde_json::from_str::<Customer>(json_str) {
            let mut form = FormState::new();
            let mut phase = AutofillPhase::Idle;
            let map = FieldMap::from_customer(&customer);

            apply_field_map(&mut form, &mut phase, AddressRole::Sender, &map);

            // Settling must leave the batch error-free and the phase idle,
            // whatever the customer record carried.
            assert_eq!(phase, AutofillPhase::Idle);
            for field in FieldKey::ALL {
                assert!(form.error(AddressRole::Sender, field).is_none());
            }
        }
    }
});
