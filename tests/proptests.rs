use macaroon::checker::AcceptAllChecker;
use macaroon::{DischargeMap, Macaroon, MacaroonError, decrypt_third_party_caveat_id, discharges_by_id};
use proptest::prelude::*;

// Configuration for crypto library: run many more cases than default (100)
// For security-critical code, we want extensive coverage
fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 10000,
        ..ProptestConfig::default()
    }
}

// Third-party caveats encrypt twice per caveat, so fewer cases.
fn third_party_config() -> ProptestConfig {
    ProptestConfig {
        cases: 500,
        ..ProptestConfig::default()
    }
}

const TP_SECRET: &[u8] = b"third-party secret";

/// A caveat to add: `Ok(condition)` for first-party, `Err(condition)` for third-party
fn caveat_strategy() -> impl Strategy<Value = Result<String, String>> {
    prop_oneof![
        3 => "[a-z]{1,8} [<>=] [a-z0-9-]{1,16}".prop_map(Ok::<String, String>),
        1 => "[a-z-]{1,16}".prop_map(Err::<String, String>),
    ]
}

fn build(root_key: &[u8], id: &str, caveats: &[Result<String, String>]) -> Macaroon {
    let mut m = Macaroon::new(root_key, id, "https://svc.example.com");
    for caveat in caveats {
        match caveat {
            Ok(condition) => m.add_first_party_caveat(condition.as_str()),
            Err(condition) => {
                m.add_third_party_caveat(TP_SECRET, condition.as_str(), "https://tp.example.com")
                    .unwrap();
            }
        }
    }
    m
}

/// Plays the third party for every third-party caveat and binds the discharges
fn discharge_all(m: &Macaroon) -> DischargeMap {
    let discharges = m
        .caveats()
        .iter()
        .filter(|c| c.is_third_party())
        .map(|c| {
            let payload = decrypt_third_party_caveat_id(TP_SECRET, &c.caveat_id).unwrap();
            m.bind_discharge(&Macaroon::new(&payload.root_key, c.caveat_id.as_str(), ""))
        });
    discharges_by_id(discharges)
}

/// Property: Minting with the same inputs should always produce the same signature
#[test]
fn prop_signature_deterministic() {
    let config = proptest_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..128),
        id in any::<String>(),
        location in any::<String>()
    )| {
        let m1 = Macaroon::new(&root_key, id.as_str(), location.as_str());
        let m2 = Macaroon::new(&root_key, id.as_str(), location.as_str());

        prop_assert_eq!(m1, m2);
    });
}

/// Property: Swapping two distinct first-party caveats changes the signature
#[test]
fn prop_caveat_order_matters() {
    let config = proptest_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..128),
        id in "[a-z0-9-]{1,32}",
        caveat1 in any::<String>(),
        caveat2 in any::<String>()
    )| {
        prop_assume!(caveat1 != caveat2);

        let mut m1 = Macaroon::new(&root_key, id.as_str(), "");
        m1.add_first_party_caveat(caveat1.as_str());
        m1.add_first_party_caveat(caveat2.as_str());

        let mut m2 = Macaroon::new(&root_key, id.as_str(), "");
        m2.add_first_party_caveat(caveat2.as_str());
        m2.add_first_party_caveat(caveat1.as_str());

        prop_assert_ne!(m1.signature(), m2.signature());
    });
}

/// Property: A macaroon with only first-party caveats verifies under an accepting checker
#[test]
fn prop_verify_first_party_caveats() {
    let config = proptest_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..128),
        id in any::<String>(),
        caveats in prop::collection::vec(any::<String>(), 0..10)
    )| {
        let mut m = Macaroon::new(&root_key, id.as_str(), "");
        for caveat in caveats {
            m.add_first_party_caveat(caveat);
        }

        prop_assert!(m.verify(&root_key, &AcceptAllChecker, &DischargeMap::new()).is_ok());
    });
}

/// Property: Verification fails with a signature mismatch under a different root key
#[test]
fn prop_verify_wrong_key() {
    let config = proptest_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..128),
        wrong_key in prop::collection::vec(any::<u8>(), 1..128),
        id in any::<String>(),
        caveats in prop::collection::vec(any::<String>(), 0..5)
    )| {
        prop_assume!(root_key != wrong_key);

        let mut m = Macaroon::new(&root_key, id.as_str(), "");
        for caveat in caveats {
            m.add_first_party_caveat(caveat);
        }

        prop_assert_eq!(
            m.verify(&wrong_key, &AcceptAllChecker, &DischargeMap::new()),
            Err(MacaroonError::SignatureMismatch)
        );
    });
}

/// Property: Flipping any bit of the signature fails verification
#[test]
fn prop_tampered_signature_fails() {
    let config = proptest_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..128),
        id in any::<String>(),
        bit_position in 0usize..256, // 32 bytes * 8 bits
    )| {
        let m = Macaroon::new(&root_key, id.as_str(), "");

        let mut doc = m.to_doc();
        let mut signature = hex::decode(&doc.signature).unwrap();
        signature[bit_position / 8] ^= 1 << (bit_position % 8);
        doc.signature = hex::encode(signature);
        let tampered = Macaroon::try_from(doc).unwrap();

        prop_assert_eq!(
            tampered.verify(&root_key, &AcceptAllChecker, &DischargeMap::new()),
            Err(MacaroonError::SignatureMismatch)
        );
    });
}

/// Property: A fully discharged macaroon with mixed caveats verifies
#[test]
fn prop_verify_with_discharges() {
    let config = third_party_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..64),
        id in "[a-z0-9-]{1,32}",
        caveats in prop::collection::vec(caveat_strategy(), 0..6)
    )| {
        let m = build(&root_key, &id, &caveats);
        let discharges = discharge_all(&m);

        prop_assert!(m.verify(&root_key, &AcceptAllChecker, &discharges).is_ok());
    });
}

/// Property: Dropping any one discharge fails with DischargeNotFound
#[test]
fn prop_missing_discharge() {
    let config = third_party_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..64),
        caveats in prop::collection::vec(caveat_strategy(), 1..6),
        pick in any::<prop::sample::Index>()
    )| {
        let m = build(&root_key, "root", &caveats);
        let mut discharges = discharge_all(&m);
        prop_assume!(!discharges.is_empty());

        let ids: Vec<String> = discharges.keys().cloned().collect();
        let missing = ids[pick.index(ids.len())].clone();
        discharges.remove(&missing);

        let result = m.verify(&root_key, &AcceptAllChecker, &discharges);
        prop_assert!(
            matches!(result, Err(MacaroonError::DischargeNotFound { .. })),
            "unexpected result {:?}", result
        );
    });
}

/// Property: Flipping a byte of any caveat's cid or vid in the serialized form fails
/// with a signature mismatch
#[test]
fn prop_tampered_caveat_fails() {
    let config = third_party_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..64),
        caveats in prop::collection::vec(caveat_strategy(), 1..6),
        which in any::<prop::sample::Index>(),
        offset in any::<prop::sample::Index>(),
        tamper_vid in any::<bool>()
    )| {
        let m = build(&root_key, "root", &caveats);
        let discharges = discharge_all(&m);

        let mut doc = m.to_doc();
        let caveat = &mut doc.caveats[which.index(caveats.len())];
        if tamper_vid && !caveat.vid.is_empty() {
            let mut vid = hex::decode(&caveat.vid).unwrap();
            let i = offset.index(vid.len());
            vid[i] ^= 0x01;
            caveat.vid = hex::encode(vid);
        } else {
            // Conditions and base64 caveat ids are ASCII, so this stays valid UTF-8.
            let mut cid = caveat.cid.clone().into_bytes();
            let i = offset.index(cid.len());
            cid[i] ^= 0x01;
            caveat.cid = String::from_utf8(cid).unwrap();
        }
        let tampered = Macaroon::try_from(doc).unwrap();

        prop_assert_eq!(
            tampered.verify(&root_key, &AcceptAllChecker, &discharges),
            Err(MacaroonError::SignatureMismatch)
        );
    });
}

/// Property: JSON serialization reproduces every field, including third-party caveats
#[test]
fn prop_json_roundtrip() {
    let config = third_party_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..64),
        id in any::<String>(),
        location in any::<String>(),
        caveats in prop::collection::vec(caveat_strategy(), 0..5)
    )| {
        let mut original = build(&root_key, &id, &caveats);
        original = Macaroon::try_from({
            let mut doc = original.to_doc();
            doc.location = location;
            doc
        }).unwrap();

        let json = original.to_json().unwrap();
        let deserialized = Macaroon::from_json(&json).unwrap();

        prop_assert_eq!(deserialized.location(), original.location());
        prop_assert_eq!(deserialized.id(), original.id());
        prop_assert_eq!(deserialized.signature(), original.signature());
        prop_assert_eq!(deserialized.caveats(), original.caveats());
    });
}

/// Property: Base64 serialization roundtrip should preserve the macaroon
#[test]
fn prop_base64_roundtrip() {
    let config = third_party_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..64),
        id in any::<String>(),
        caveats in prop::collection::vec(caveat_strategy(), 0..5)
    )| {
        let original = build(&root_key, &id, &caveats);

        let b64 = original.to_base64().unwrap();
        prop_assert_eq!(Macaroon::from_base64(&b64).unwrap(), original);
    });
}

/// Property: Binding to an equal signature is the identity, and binding is deterministic
#[test]
fn prop_bind_properties() {
    let config = proptest_config();
    proptest!(config, |(
        root_key in prop::collection::vec(any::<u8>(), 1..128),
        id in any::<String>(),
        other_id in any::<String>()
    )| {
        let mut m = Macaroon::new(&root_key, id.as_str(), "");
        let sig = *m.signature();
        m.bind(&sig);
        prop_assert_eq!(*m.signature(), sig);

        let primary = Macaroon::new(&root_key, other_id.as_str(), "");
        let discharge = Macaroon::new(b"discharge-key", id.as_str(), "");
        prop_assert_eq!(primary.bind_discharge(&discharge), primary.bind_discharge(&discharge));
    });
}
