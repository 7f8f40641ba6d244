//! Signing: authorization messages, signer recovery and the trusted authority
//!
//! Every balance-changing call carries an [`Authorization`]: a nonce plus an
//! attestation signature from the trusted authority over the canonical message
//!
//! ```text
//! lowercase(table) || lowercase(participant) || amount || [profit] || actionTag || nonce
//! ```
//!
//! concatenated with no delimiters. Addresses are `0x`-prefixed lowercase hex,
//! numbers are base-10. The profit field is present only for host checkouts.
//!
//! Amount and profit run together, so a host checkout message does not pin
//! down the split: `(15, 0)` and `(1, 50)` both encode as `150`, and one
//! signature authorizes either. The authority must not sign a host checkout
//! whose digits also read as a split it would refuse.
//!
//! The message is framed as `"\x19TableGame Signed Message:\n" || len || message`
//! and hashed with SHA-256 before signing. Signatures are Ed25519; an
//! attestation carries the signer's public key next to the signature, so a
//! verifier can recover the signing identity (the trailing 20 bytes of
//! `SHA-256(public_key)`) and compare it to the table's trusted authority.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use table_types::ids::Address;
use table_types::numeric::{decimal_string, Amount};

use crate::errors::SignatureError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Framing prefix applied before hashing a message.
pub const SIGNED_MESSAGE_PREFIX: &str = "\x19TableGame Signed Message:\n";

/// Ed25519 public key length.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 signature length.
pub const SIGNATURE_LEN: usize = 64;

/// Encoded attestation length: public key followed by signature.
pub const ATTESTATION_LEN: usize = PUBLIC_KEY_LEN + SIGNATURE_LEN;

// ---------------------------------------------------------------------------
// Actions and requests
// ---------------------------------------------------------------------------

/// The four authorizable actions. The tag is part of the signed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    JoinAsHost,
    JoinAsPlayer,
    CheckoutAsHost,
    CheckoutAsPlayer,
}

impl Action {
    /// Literal tag embedded in the signed message.
    pub fn tag(&self) -> &'static str {
        match self {
            Action::JoinAsHost => "joinTableWithDepositAsHost",
            Action::JoinAsPlayer => "joinTableWithDepositAsPlayer",
            Action::CheckoutAsHost => "checkOutWithSettlementAsHost",
            Action::CheckoutAsPlayer => "checkOutWithSettlementAsPlayer",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Everything an authorization is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub table: Address,
    pub participant: Address,
    pub amount: Amount,
    /// Only meaningful for [`Action::CheckoutAsHost`]
    pub profit: Option<Amount>,
    pub action: Action,
    pub nonce: u64,
}

impl AuthorizationRequest {
    pub fn join_as_host(table: Address, host: Address, amount: Amount, nonce: u64) -> Self {
        Self::without_profit(table, host, amount, Action::JoinAsHost, nonce)
    }

    pub fn join_as_player(table: Address, player: Address, amount: Amount, nonce: u64) -> Self {
        Self::without_profit(table, player, amount, Action::JoinAsPlayer, nonce)
    }

    pub fn checkout_as_player(
        table: Address,
        player: Address,
        amount: Amount,
        nonce: u64,
    ) -> Self {
        Self::without_profit(table, player, amount, Action::CheckoutAsPlayer, nonce)
    }

    pub fn checkout_as_host(
        table: Address,
        host: Address,
        amount: Amount,
        profit: Amount,
        nonce: u64,
    ) -> Self {
        Self {
            table,
            participant: host,
            amount,
            profit: Some(profit),
            action: Action::CheckoutAsHost,
            nonce,
        }
    }

    fn without_profit(
        table: Address,
        participant: Address,
        amount: Amount,
        action: Action,
        nonce: u64,
    ) -> Self {
        Self {
            table,
            participant,
            amount,
            profit: None,
            action,
            nonce,
        }
    }

    /// The canonical message text the authority signs.
    pub fn message(&self) -> String {
        let mut message = String::with_capacity(2 * 42 + 64);
        message.push_str(&self.table.to_lowercase_hex());
        message.push_str(&self.participant.to_lowercase_hex());
        message.push_str(&decimal_string(self.amount));
        if self.action == Action::CheckoutAsHost {
            message.push_str(&decimal_string(self.profit.unwrap_or(0)));
        }
        message.push_str(self.action.tag());
        message.push_str(&self.nonce.to_string());
        message
    }

    /// Digest of the framed canonical message.
    pub fn digest(&self) -> [u8; 32] {
        message_digest(self.message().as_bytes())
    }
}

/// SHA-256 over the length-prefixed, framed message.
pub fn message_digest(message: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SIGNED_MESSAGE_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Identity behind an Ed25519 verifying key.
pub fn address_of(key: &VerifyingKey) -> Address {
    let digest: [u8; 32] = Sha256::digest(key.as_bytes()).into();
    Address::from_digest(&digest)
}

// ---------------------------------------------------------------------------
// Attestation signature
// ---------------------------------------------------------------------------

/// `public_key(32) || signature(64)`, rendered as `0x`-prefixed hex.
#[derive(Clone, PartialEq, Eq)]
pub struct AttestationSignature([u8; ATTESTATION_LEN]);

impl AttestationSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        let raw: [u8; ATTESTATION_LEN] =
            bytes.try_into().map_err(|_| SignatureError::Malformed {
                reason: format!("expected {ATTESTATION_LEN} bytes, got {}", bytes.len()),
            })?;
        Ok(Self(raw))
    }

    fn from_parts(key: &VerifyingKey, signature: &Signature) -> Self {
        let mut raw = [0u8; ATTESTATION_LEN];
        raw[..PUBLIC_KEY_LEN].copy_from_slice(key.as_bytes());
        raw[PUBLIC_KEY_LEN..].copy_from_slice(&signature.to_bytes());
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; ATTESTATION_LEN] {
        &self.0
    }

    fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        let mut key = [0u8; PUBLIC_KEY_LEN];
        key.copy_from_slice(&self.0[..PUBLIC_KEY_LEN]);
        key
    }

    fn signature_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut sig = [0u8; SIGNATURE_LEN];
        sig.copy_from_slice(&self.0[PUBLIC_KEY_LEN..]);
        sig
    }
}

impl FromStr for AttestationSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| SignatureError::Malformed {
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for AttestationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AttestationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttestationSignature({self})")
    }
}

impl Serialize for AttestationSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AttestationSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Detached authorization token carried by every mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    /// Nonce the authority signed; must equal the participant's current nonce
    pub nonce: u64,
    pub signature: AttestationSignature,
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Recovers the identity that signed a message.
pub trait SignatureVerifier: Send + Sync {
    fn recover_signer(
        &self,
        message: &[u8],
        signature: &AttestationSignature,
    ) -> Result<Address, SignatureError>;
}

/// Default verifier for Ed25519 attestations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn recover_signer(
        &self,
        message: &[u8],
        signature: &AttestationSignature,
    ) -> Result<Address, SignatureError> {
        let key = VerifyingKey::from_bytes(&signature.public_key_bytes())
            .map_err(|_| SignatureError::InvalidPublicKey)?;
        let sig = Signature::from_bytes(&signature.signature_bytes());

        key.verify(&message_digest(message), &sig)
            .map_err(|_| SignatureError::VerificationFailed)?;

        Ok(address_of(&key))
    }
}

// ---------------------------------------------------------------------------
// Trusted authority
// ---------------------------------------------------------------------------

/// The off-ledger scorekeeper's signing key.
///
/// Used out of band to produce authorizations; the engine only ever sees the
/// resulting [`Authorization`] and the authority's [`Address`].
pub struct Authority {
    signing_key: SigningKey,
}

impl Authority {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Identity tables must be configured with as `trusted_authority`.
    pub fn address(&self) -> Address {
        address_of(&self.signing_key.verifying_key())
    }

    /// Sign an arbitrary message under the framing above.
    pub fn sign_message(&self, message: &[u8]) -> AttestationSignature {
        let signature = self.signing_key.sign(&message_digest(message));
        AttestationSignature::from_parts(&self.signing_key.verifying_key(), &signature)
    }

    /// Produce the authorization for `request`.
    pub fn authorize(&self, request: &AuthorizationRequest) -> Authorization {
        Authorization {
            nonce: request.nonce,
            signature: self.sign_message(request.message().as_bytes()),
        }
    }
}

impl fmt::Debug for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authority")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
