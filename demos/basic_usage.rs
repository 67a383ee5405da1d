use color_eyre::Result;
use macaroon::checker::ContextChecker;
use macaroon::{DischargeMap, Macaroon};

fn main() -> Result<()> {
    color_eyre::install()?;

    println!("=== Macaroon Basic Usage ===\n");

    let root_key = b"this is a super secret key";
    let mut m = Macaroon::new(root_key, "user-session-12345", "https://api.example.com");
    println!("1. Minted macaroon {:?} for {}", m.id(), m.location());

    m.add_first_party_caveat("account = alice");
    m.add_first_party_caveat("action = read");
    m.add_first_party_caveat("time < 2030-01-01");

    println!("\n2. Added caveats:");
    for (i, caveat) in m.caveats().iter().enumerate() {
        println!("   {}. {}", i + 1, caveat.caveat_id);
    }

    let json = m.to_json_pretty()?;
    println!("\n3. Serialized:\n{json}");

    let received = Macaroon::from_json(&json)?;
    let discharges = DischargeMap::new();

    let reader = ContextChecker::empty()
        .with("account", "alice")
        .with("action", "read")
        .with("time", "2026-10-18");
    println!("\n4. Reading as alice: {:?}", received.verify(root_key, &reader, &discharges));

    let writer = reader.clone().with("action", "write");
    println!("5. Writing as alice: {:?}", received.verify(root_key, &writer, &discharges));

    println!(
        "6. Wrong root key:   {:?}",
        received.verify(b"not the key", &reader, &discharges)
    );

    Ok(())
}
