use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine as _;
use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::SigningKey;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Result, SyncError};

pub const DEFAULT_SSH_PORT: u16 = 2222;
pub const SSH_ROUTE_SCHEME: &str = "diego-ssh";
pub const KEY_BITS: usize = 1024;

/// Key material for one side of an SSH connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key_pem: String,
    pub authorized_key: String,
    pub fingerprint: String,
}

/// Source of fresh key pairs. Calls may block on the entropy source.
pub trait KeyFactory: Send + Sync {
    fn new_key_pair(&self, bits: usize) -> Result<KeyPair>;
}

/// Generates Ed25519 keys from the OS random source.
///
/// Ed25519 keys have a fixed size, so the requested bit count is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519KeyFactory;

impl KeyFactory for Ed25519KeyFactory {
    fn new_key_pair(&self, _bits: usize) -> Result<KeyPair> {
        let signing_key = SigningKey::generate(&mut rand::rngs::OsRng);
        let private_key_pem = signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| SyncError::KeyGeneration(e.to_string()))?
            .to_string();

        let blob = public_key_blob(signing_key.verifying_key().as_bytes());
        Ok(KeyPair {
            private_key_pem,
            authorized_key: format!("ssh-ed25519 {}", STANDARD.encode(&blob)),
            fingerprint: format!("SHA256:{}", STANDARD_NO_PAD.encode(Sha256::digest(&blob))),
        })
    }
}

/// SSH wire encoding of an ed25519 public key: two length-prefixed strings.
fn public_key_blob(public_key: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(51);
    for field in [b"ssh-ed25519".as_slice(), public_key] {
        blob.extend_from_slice(&(field.len() as u32).to_be_bytes());
        blob.extend_from_slice(field);
    }
    blob
}

/// Routing payload that tells an ssh proxy how to reach the sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SshRoute {
    pub container_port: u16,
    pub private_key: String,
    pub host_fingerprint: String,
}

/// Keys for the ssh daemon sidecar of one instance group.
#[derive(Debug, Clone)]
pub struct SshSidecar {
    host_key: KeyPair,
    user_key: KeyPair,
}

impl SshSidecar {
    /// Generate the host key, then the user key. Either failure aborts.
    pub fn provision(key_factory: &dyn KeyFactory) -> Result<Self> {
        let host_key = key_factory.new_key_pair(KEY_BITS).inspect_err(|e| {
            tracing::error!(error = %e, "generating_host_key_failed");
        })?;
        let user_key = key_factory.new_key_pair(KEY_BITS).inspect_err(|e| {
            tracing::error!(error = %e, "generating_user_key_failed");
        })?;
        Ok(Self { host_key, user_key })
    }

    /// Daemon flags as separate arguments, for running the binary directly.
    pub fn daemon_args(&self) -> Vec<String> {
        vec![
            format!("-address=0.0.0.0:{DEFAULT_SSH_PORT}"),
            format!("-hostKey={}", self.host_key.private_key_pem),
            format!("-authorizedKey={}", self.user_key.authorized_key),
            "-inheritDaemonEnv".to_string(),
            "-logLevel=fatal".to_string(),
        ]
    }

    /// The daemon invocation as one shell command, for running it through a launcher.
    pub fn daemon_command(&self, daemon_path: &str) -> String {
        format!(
            "{daemon_path} -address=0.0.0.0:{DEFAULT_SSH_PORT} -hostKey='{}' -authorizedKey='{}' -inheritDaemonEnv -logLevel=fatal",
            self.host_key.private_key_pem, self.user_key.authorized_key,
        )
    }

    pub fn route(&self) -> SshRoute {
        SshRoute {
            container_port: DEFAULT_SSH_PORT,
            private_key: self.user_key.private_key_pem.clone(),
            host_fingerprint: self.host_key.fingerprint.clone(),
        }
    }
}
