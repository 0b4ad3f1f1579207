#![no_main]

use libfuzzer_sys::fuzz_target;
use waybill_types::{PINCODE_LEN, digits_only, is_complete_pincode};

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let digits = digits_only(raw);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(digits_only(&digits), digits);
        if is_complete_pincode(&digits) {
            assert_eq!(digits.len(), PINCODE_LEN);
        }
    }
});
