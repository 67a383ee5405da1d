use color_eyre::Result;
use color_eyre::eyre::eyre;
use macaroon::checker::ContextChecker;
use macaroon::discharge::{CaveatSpec, Discharger, RootKeyMinter, SecretDecoder};
use macaroon::{DischargeMap, Macaroon, MacaroonError, discharges_by_id};

const SERVICE_KEY: &[u8] = b"service_root_secret";
const AUTH_SECRET: &[u8] = b"shared_secret_with_auth_service";
const AUTH_LOCATION: &str = "https://auth.service.com";

fn check_auth_condition(condition: &str) -> macaroon::Result<Vec<CaveatSpec>> {
    match condition {
        "user = alice" => Ok(vec![CaveatSpec::first_party("auth_level >= 5")]),
        other => Err(MacaroonError::CaveatNotSatisfied(other.to_string())),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    println!("=== Third-Party Caveats and Discharge Macaroons ===\n");

    // The service requires the auth service to vouch for the user.
    let mut primary = Macaroon::new(SERVICE_KEY, "session-12345", "https://api.service.com");
    primary.add_first_party_caveat("resource = /api/documents");
    let caveat_id = primary.add_third_party_caveat(AUTH_SECRET, "user = alice", AUTH_LOCATION)?;
    println!("1. Primary macaroon has {} caveats", primary.caveat_count());

    let checker = ContextChecker::empty()
        .with("resource", "/api/documents")
        .with("auth_level", "7");

    println!("\n2. Verifying without a discharge...");
    match primary.verify(SERVICE_KEY, &checker, &DischargeMap::new()) {
        Ok(()) => return Err(eyre!("verified without a discharge")),
        Err(e) => println!("   correctly failed: {e}"),
    }

    println!("\n3. Client asks {AUTH_LOCATION} to discharge the caveat...");
    let auth_service = Discharger::new(
        SecretDecoder::new(AUTH_SECRET),
        check_auth_condition,
        RootKeyMinter::new(AUTH_LOCATION),
    );
    let discharge = auth_service.discharge(&caveat_id)?;
    println!(
        "   discharge carries {} caveat(s): {}",
        discharge.caveat_count(),
        discharge.caveats()[0].caveat_id
    );

    println!("\n4. Client binds the discharge to the primary macaroon");
    let request = primary.prepare_for_request([discharge.clone()]);
    let discharges = discharges_by_id(request[1..].iter().cloned());

    println!("\n5. Verifying with the bound discharge...");
    request[0].verify(SERVICE_KEY, &checker, &discharges)?;
    println!("   verified");

    println!("\n6. Verifying with the unbound discharge...");
    match primary.verify(SERVICE_KEY, &checker, &discharges_by_id([discharge])) {
        Ok(()) => return Err(eyre!("verified with an unbound discharge")),
        Err(e) => println!("   correctly failed: {e}"),
    }

    Ok(())
}
