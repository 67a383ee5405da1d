#![no_main]

use libfuzzer_sys::fuzz_target;
use macaroon::Macaroon;

fuzz_target!(|data: &[u8]| {
    if let Ok(token) = Macaroon::from_msgpack(data) {
        // Anything that decodes must re-encode to the same macaroon
        let json = token.to_json().unwrap();
        assert_eq!(Macaroon::from_json(&json).unwrap(), token);
        let _ = token.to_base64();
        let _ = token.to_hex();
    }

    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(token) = Macaroon::from_json(s) {
            let _ = token.to_msgpack();
        }
        let _ = Macaroon::from_base64(s);
        let _ = Macaroon::from_hex(s);
    }
});
