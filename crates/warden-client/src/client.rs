//! Request signer.
//!
//! The `Client` owns a device's identity and counter and turns command names
//! into signed [`RawRequest`]s. It performs no I/O: the caller posts the
//! encoded form and feeds the reply back through [`parse_reply`].

use warden_core::{Environment, SharedKey, command::is_command_name};
use warden_proto::{CanonicalFields, Checks, ERROR_PREFIX, PULSE_BODY, RawRequest};

use crate::error::ClientError;

/// Random bytes per nonce. Hex-encoded, so the nonce is twice as long.
pub const NONCE_BYTES: usize = 16;

/// Device identity.
///
/// The shared key is provisioned out of band and never leaves the device.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    /// Identifier the server knows this device by.
    pub client_id: u64,
    /// Key shared with the server.
    pub shared_key: SharedKey,
}

impl DeviceIdentity {
    /// Create a device identity.
    pub fn new(client_id: u64, shared_key: impl Into<SharedKey>) -> Self {
        Self { client_id, shared_key: shared_key.into() }
    }
}

/// Successful server reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// `checkPulse` answered `OK`.
    Pulse,
    /// Command executed.
    Done,
}

/// Request signer for one device.
///
/// # Type Parameters
///
/// - `E`: Environment implementation for time/randomness
pub struct Client<E: Environment> {
    identity: DeviceIdentity,
    /// Last counter value used in a signed request.
    counter: u64,
    /// Fields the server expects besides `client_id`, `command` and `mac`.
    checks: Checks,
    env: E,
}

impl<E: Environment> Client<E> {
    /// Client that starts counting after `last_counter`.
    pub fn new(env: E, identity: DeviceIdentity, last_counter: u64) -> Self {
        Self { identity, counter: last_counter, checks: Checks::all(), env }
    }

    /// Omit the fields a deployment waives.
    ///
    /// Use this only for devices that cannot produce them; the server accepts
    /// the omission only if its own policy waives the same checks.
    #[must_use]
    pub fn with_checks(mut self, checks: Checks) -> Self {
        self.checks = checks;
        self
    }

    /// Device identifier.
    pub fn client_id(&self) -> u64 {
        self.identity.client_id
    }

    /// Last counter value used.
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Skip ahead to at least `last_counter`, e.g. after restoring from
    /// persisted state. Never moves the counter backwards.
    pub fn resync(&mut self, last_counter: u64) {
        self.counter = self.counter.max(last_counter);
    }

    /// Sign `command` as a fresh request.
    ///
    /// Each call consumes one counter value, whether or not the request is
    /// ever sent.
    ///
    /// # Errors
    ///
    /// - `ClientError::InvalidCommand` if `command` is not a plausible name
    /// - `ClientError::CounterExhausted` if the counter cannot advance
    /// - `ClientError::Crypto` if signing fails
    pub fn sign(&mut self, command: &str) -> Result<RawRequest, ClientError> {
        if !is_command_name(command) {
            return Err(ClientError::InvalidCommand { name: command.to_string() });
        }

        let counter = if self.checks.contains(Checks::COUNTER) {
            Some(self.counter.checked_add(1).ok_or(ClientError::CounterExhausted)?)
        } else {
            None
        };
        let timestamp = self.checks.contains(Checks::TIMESTAMP).then(|| self.env.unix_now());
        let nonce = self.checks.contains(Checks::NONCE).then(|| self.nonce());

        let fields = CanonicalFields {
            client_id: self.identity.client_id,
            command,
            counter,
            timestamp,
            nonce: nonce.as_deref(),
        };
        let mac = warden_crypto::sign_fields(self.identity.shared_key.as_bytes(), &fields)?;

        if let Some(counter) = counter {
            self.counter = counter;
        }

        Ok(RawRequest {
            client_id: Some(self.identity.client_id.to_string()),
            command: Some(command.to_string()),
            counter: counter.map(|c| c.to_string()),
            timestamp: timestamp.map(|t| t.to_string()),
            nonce,
            mac: Some(mac),
        })
    }

    fn nonce(&self) -> String {
        let mut bytes = [0u8; NONCE_BYTES];
        self.env.random_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Encode `request` as an `application/x-www-form-urlencoded` body.
pub fn encode_form(request: &RawRequest) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(request.to_pairs())
        .finish()
}

/// Interpret a server reply.
///
/// # Errors
///
/// - `ClientError::Rejected` for an `Error: ` line
/// - `ClientError::UnexpectedReply` for anything else that is not a 200
pub fn parse_reply(status: u16, body: &str) -> Result<Reply, ClientError> {
    let line = body.trim_end();

    if let Some(message) = line.strip_prefix(ERROR_PREFIX) {
        return Err(ClientError::Rejected { status, message: message.to_string() });
    }

    match (status, line) {
        (200, PULSE_BODY) => Ok(Reply::Pulse),
        (200, "") => Ok(Reply::Done),
        _ => Err(ClientError::UnexpectedReply { status, body: body.to_string() }),
    }
}
