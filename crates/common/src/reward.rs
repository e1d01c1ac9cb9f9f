//! Reward payloads returned by the validation backend
//!
//! The backend omits fields freely, so every field is optional on the wire.
//! Points and balances default to zero whether missing or `null`: a valid
//! proof that earns nothing is a legitimate outcome, not an error.

use serde::{Deserialize, Deserializer, Serialize};

/// Points a wallet must accumulate per reward token
pub const POINTS_PER_TOKEN: u64 = 100;

/// Response of `POST /api/validate`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Points credited for this proof
    #[serde(default, deserialize_with = "null_as_zero")]
    pub points_awarded: u64,

    /// Wallet's point total after crediting this proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_points: Option<u64>,

    /// Backend-assigned identifier of the accepted submission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,

    /// SHA-256 of the submitted image, hex-encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_hash: Option<String>,

    /// Packaging score of the scanned product in the product catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packaging_score: Option<i64>,
}

/// Response of `GET /wallet/{pubkey}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Reward tokens held by the wallet
    #[serde(default, deserialize_with = "null_as_zero")]
    pub reward_balance: u64,

    /// Accumulated recycling points
    #[serde(default, deserialize_with = "null_as_zero")]
    pub points: u64,
}

impl WalletBalance {
    /// Points still needed before the next reward token is minted
    pub fn points_to_next_reward(&self) -> u64 {
        POINTS_PER_TOKEN - self.points % POINTS_PER_TOKEN
    }
}

/// Explicit `null` counts the same as a missing field
fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}
