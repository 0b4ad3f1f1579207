#![no_main]

use libfuzzer_sys::fuzz_target;
use waybill_auth::{WAYBILL_API_TOKEN_ENV, resolve_token};
use waybill_types::UserProfile;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = std::str::from_utf8(data) {
        // NUL bytes cannot be stored in environment values.
        if value.contains('\0') {
            return;
        }
        temp_env::with_var(WAYBILL_API_TOKEN_ENV, Some(value), || {
            let profile = UserProfile {
                id: "u1".to_string(),
                token: Some("profile-token".to_string()),
                ..Default::default()
            };
            let _ = resolve_token(Some(&profile));
            let _ = resolve_token(None);
        });
    }
});
