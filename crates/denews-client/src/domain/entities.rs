//! # Core Domain Entities
//!
//! Client-side views of the ledger-owned and session-local records.
//!
//! ## Clusters
//!
//! - **Ledger records**: [`Article`], [`RoleAssignment`] (read-only here,
//!   except article creation)
//! - **Session**: [`Session`] (client-local, ephemeral, never persisted)
//! - **Write surface**: [`ArticleDraft`], [`PendingTx`], [`TxReceipt`],
//!   [`PublishReceipt`]

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ClientError;

/// A blockchain account address: `0x` followed by 40 hex digits.
///
/// Wallet providers report addresses in mixed case; parsing normalizes to
/// lowercase so equality and set membership are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The all-zero address, used as a placeholder in default configs.
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(40)))
    }

    /// The normalized (lowercase) string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened `0xabcd…ef12` form for display.
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let hex_part = lower
            .strip_prefix("0x")
            .ok_or_else(|| ClientError::InvalidInput(format!("address missing 0x prefix: {s}")))?;
        if hex_part.len() != 40 || !hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ClientError::InvalidInput(format!(
                "address is not 40 hex digits: {s}"
            )));
        }
        Ok(Self(lower))
    }
}

impl TryFrom<String> for Address {
    type Error = ClientError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A content-derived address assigned by the storage network on upload.
///
/// Identical content always yields the same hash; the client never assumes
/// a hash can be rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// The raw hash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ClientError::InvalidInput("empty content hash".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for ContentHash {
    type Error = ClientError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-article visibility flag, set at creation and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    /// Readable by anyone.
    Public,
    /// Hidden from the reader-facing listing.
    Restricted,
}

impl AccessLevel {
    /// Decode the ledger's integer encoding (0 = Public, 1 = Restricted).
    pub fn from_u8(value: u8) -> Result<Self, ClientError> {
        match value {
            0 => Ok(Self::Public),
            1 => Ok(Self::Restricted),
            other => Err(ClientError::InvalidInput(format!(
                "unknown access level: {other}"
            ))),
        }
    }

    /// The ledger's integer encoding.
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Public => 0,
            Self::Restricted => 1,
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => f.write_str("Public"),
            Self::Restricted => f.write_str("Restricted"),
        }
    }
}

/// A published article's ledger record. All fields are ledger-assigned or
/// author-supplied at creation and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Ledger-assigned id, unique and dense from 0.
    pub id: u64,
    /// Author-supplied title.
    pub title: String,
    /// Identity of the publishing wallet.
    pub author: Address,
    /// Storage-network reference to the article body.
    pub content_hash: ContentHash,
    /// Creation time, seconds since epoch, ledger-assigned.
    pub timestamp: u64,
    /// Visibility flag.
    pub access: AccessLevel,
}

/// The client-local wallet session: created on connect, mutated only by the
/// wallet session adapter, cleared on disconnect. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    /// The connected wallet address, or `None` if disconnected.
    pub active_identity: Option<Address>,
    /// The connected chain identifier, as reported by the provider.
    pub network_id: Option<String>,
}

impl Session {
    /// The never-connected state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether a wallet account is currently connected.
    pub fn is_connected(&self) -> bool {
        self.active_identity.is_some()
    }
}

/// Ledger-reported authorization state, read-only from this client.
///
/// Admin capability and author capability are independent: the admin is not
/// required to appear in the authors set, and membership in the authors set
/// is what grants publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// The single fixed admin identity.
    pub admin: Address,
    /// Identities permitted to publish.
    pub authors: HashSet<Address>,
}

impl RoleAssignment {
    /// Whether `identity` may publish. Admin status alone does not grant
    /// this; only authors-set membership does.
    pub fn can_publish(&self, identity: &Address) -> bool {
        self.authors.contains(identity)
    }
}

/// Author input for a publish operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    /// Article title; must be non-empty.
    pub title: String,
    /// Article body, uploaded to the content store; must be non-empty.
    pub content: String,
    /// Visibility flag.
    pub access: AccessLevel,
}

/// A submitted but not yet confirmed ledger write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTx {
    /// The transaction hash reported at submission time.
    pub tx_hash: String,
}

/// Confirmation result for a ledger write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Hash of the confirmed transaction.
    pub tx_hash: String,
    /// The newly assigned article id, for publish transactions.
    pub article_id: Option<u64>,
}

/// Outcome of a successful publish: the article is on the ledger and its
/// body is addressable on the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Ledger-assigned article id.
    pub article_id: u64,
    /// Where the body lives on the content store.
    pub content_hash: ContentHash,
    /// The confirming transaction.
    pub tx_hash: String,
}
