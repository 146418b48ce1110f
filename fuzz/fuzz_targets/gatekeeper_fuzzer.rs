//! Fuzz target for the [`Gatekeeper`] pipeline
//!
//! Prevent command execution without a valid MAC and a fresh counter
//!
//! # Strategy
//!
//! - Arbitrary field values: absent, blank, non-numeric, overflowing, padded
//! - Re-signing: optionally replace the MAC with a correct one for whatever
//!   the fields parse to, so the accept path is reached
//! - Policy: random waivers, so degraded deployments are covered
//!
//! # Invariants
//!
//! - Accepted ONLY if the MAC verifies over the canonical fields
//! - Accepted ONLY with a counter above the stored one (when checked)
//! - Accepted counter is recorded; rejected requests leave the store untouched
//! - Accepted command is always whitelisted
//! - NEVER panic on any input

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use warden_core::{
    AuthPolicy, CommandRegistry, CredentialStore, DeviceCredential, Gatekeeper,
    MemoryCredentialStore, validate,
};
use warden_harness::{SIM_EPOCH, SimEnv};
use warden_proto::{Checks, Field, RawRequest};

const KEY: &[u8] = b"fuzz-shared-key";
const LAST_COUNTER: u64 = 5;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    fields: [Option<FuzzValue>; 6],
    resign: bool,
    waived: u8,
}

#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Raw(String),
    Number(u64),
    Near { field_offset: i16 },
    Known(u8),
}

impl FuzzValue {
    fn render(&self, field: Field) -> String {
        match self {
            Self::Raw(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Near { field_offset } => {
                let base = match field {
                    Field::Timestamp => SIM_EPOCH,
                    Field::Counter => LAST_COUNTER,
                    _ => 42,
                };
                base.saturating_add_signed(i64::from(*field_offset)).to_string()
            },
            Self::Known(i) => {
                const NAMES: [&str; 8] = [
                    "checkPulse",
                    "closeSite",
                    "openSite",
                    "clearCache",
                    "debugOn",
                    "debugOff",
                    "lockDown",
                    " checkPulse ",
                ];
                NAMES[usize::from(*i) % NAMES.len()].to_string()
            },
        }
    }
}

fn store() -> MemoryCredentialStore {
    MemoryCredentialStore::with_devices([
        DeviceCredential::new(42, KEY).with_last_counter(LAST_COUNTER),
        DeviceCredential::new(7, KEY).with_authorized(false),
        DeviceCredential { client_id: 9, shared_key: None, authorized: true, last_counter: 0 },
    ])
}

fuzz_target!(|input: FuzzInput| {
    let waived = Checks::from_bits_truncate(input.waived);
    let policy = AuthPolicy::default().waive(waived);
    let env = SimEnv::with_seed(0);
    let gatekeeper = Gatekeeper::new(env, policy);
    let store = store();

    let mut raw = RawRequest::default();
    for (field, value) in Field::ALL.into_iter().zip(&input.fields) {
        if let Some(value) = value {
            raw.set(field, value.render(field));
        }
    }

    if input.resign {
        if let Ok(request) = validate(&raw, policy.checks, &CommandRegistry::builtin()) {
            if let Ok(mac) = warden_crypto::sign_fields(KEY, &request.canonical()) {
                raw.set(Field::Mac, mac);
            }
        }
    }

    let before = store.snapshot().unwrap_or_default();
    let result = gatekeeper.process(&raw, &store);
    let after = store.snapshot().unwrap_or_default();

    match result {
        Ok(dispatch) => {
            let request = validate(&raw, policy.checks, &CommandRegistry::builtin())
                .expect("accepted request must validate");
            assert_eq!(dispatch.client_id, 42, "only device 42 can pass");
            assert!(CommandRegistry::builtin().contains(&dispatch.command));

            let verified =
                warden_crypto::verify_fields(KEY, &request.canonical(), &request.mac)
                    .unwrap_or(false);
            assert!(verified, "accepted without a valid MAC: {raw:?}");

            if let Some(counter) = request.counter {
                assert!(counter > LAST_COUNTER);
                let stored = store.get(42).ok().flatten().map(|d| d.last_counter);
                assert_eq!(stored, Some(counter), "accepted counter not recorded");
            } else {
                assert!(!policy.checks.contains(Checks::COUNTER));
                assert_eq!(before, after);
            }
        },
        Err(_) => assert_eq!(before, after, "rejected request changed the store"),
    }
});
