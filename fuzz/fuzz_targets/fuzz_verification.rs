#![no_main]

use libfuzzer_sys::fuzz_target;
use macaroon::checker::AcceptAllChecker;
use macaroon::{DischargeMap, Macaroon, discharges_by_id};

fuzz_target!(|data: &[u8]| {
    if data.len() < 10 {
        return;
    }

    let split_point = data.len() / 2;
    let root_key = &data[..split_point];
    let identifier = String::from_utf8_lossy(&data[split_point..]);

    let mut token = Macaroon::new(root_key, identifier.to_string(), "");
    for chunk in data.chunks(data.len() / 4) {
        token.add_first_party_caveat(String::from_utf8_lossy(chunk));
    }

    let checker = AcceptAllChecker;
    assert!(token.verify(root_key, &checker, &DischargeMap::new()).is_ok());

    let caveat_id = token
        .add_third_party_caveat(root_key, "fuzz", "http://example.com")
        .unwrap();
    assert!(token.verify(root_key, &checker, &DischargeMap::new()).is_err());

    // A discharge minted with the wrong key must never verify
    let forged = Macaroon::new(root_key, caveat_id.as_str(), "");
    let discharges = discharges_by_id([token.bind_discharge(&forged)]);
    assert!(token.verify(root_key, &checker, &discharges).is_err());

    // Arbitrary discharge documents must never panic the verifier
    if let Ok(untrusted) = Macaroon::from_msgpack(data) {
        let discharges = discharges_by_id([untrusted]);
        let _ = token.verify(root_key, &checker, &discharges);
    }
});
