//! Warden Core
//!
//! Sans-IO authentication and dispatch for remote admin commands. The
//! [`Gatekeeper`] takes a [`RawRequest`](warden_proto::RawRequest), runs it
//! through five independent gates and returns the [`SiteAction`]s the command
//! asks for. The caller owns every side effect: applying configuration writes,
//! clearing caches, rendering the reply.
//!
//! # Gates
//!
//! | Gate          | Rejects with                                      |
//! |---------------|---------------------------------------------------|
//! | Format        | `MissingParameter`, `InvalidFormat`, `UnknownCommand` |
//! | Timestamp     | `BadTimestamp`                                    |
//! | Authorization | `UnauthorizedClient`                              |
//! | Counter       | `ReplayedCounter`                                 |
//! | MAC           | `NoSharedKey`, `MacMismatch`                      |
//!
//! A command executes only if all five hold. Timestamp and counter may be
//! waived per deployment through [`AuthPolicy`]; the MAC never can.
//!
//! # Invariants
//!
//! - Whitelist: only names in the [`CommandRegistry`] ever reach a handler
//! - Monotonic counters: a device's `last_counter` only grows, and only after
//!   its MAC verified
//! - Fail closed: any error, including a storage failure, rejects

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod credentials;
pub mod dispatcher;
pub mod env;
pub mod error;
pub mod gatekeeper;
pub mod guard;
pub mod outcome;
pub mod policy;
pub mod site;
pub mod validator;
pub mod verifier;

pub use command::{Builtin, CommandHandler, CommandRegistry, LOCKDOWN_SETTINGS, RegistryError};
pub use credentials::{
    CredentialStore, DeviceCredential, MemoryCredentialStore, SharedKey, StoreError,
};
pub use dispatcher::{Authenticated, Dispatch, dispatch};
pub use env::Environment;
pub use error::AuthError;
pub use gatekeeper::Gatekeeper;
pub use guard::ReplayGuard;
pub use outcome::{Gate, GateStatus, ValidationOutcome};
pub use policy::{AuthPolicy, DEFAULT_TOLERANCE, MAX_TOLERANCE};
pub use site::{
    CacheInvalidator, CacheTarget, ConfigKey, ConfigStore, ConfigValue, GenerationCache, LogLevel,
    MemoryConfigStore, SiteAction, SiteError,
};
pub use validator::{Request, validate};
pub use verifier::verify_mac;
