use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::error::PbaasError;

/// Consensus branch id of the Overwinter upgrade.
pub const OVERWINTER_BRANCH_ID: u32 = 0x5BA8_1B19;

/// Consensus branch id of the Sapling upgrade.
pub const SAPLING_BRANCH_ID: u32 = 0x76B8_09BB;

static VERUS: LazyLock<Arc<NetworkParams>> =
    LazyLock::new(|| Arc::new(NetworkParams::pbaas_defaults("verus")));

static VERUSTEST: LazyLock<Arc<NetworkParams>> =
    LazyLock::new(|| Arc::new(NetworkParams::pbaas_defaults("verustest")));

/// BIP-32 extended key version bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bip32Versions {
    pub public: u32,
    pub private: u32,
}

/// Immutable parameters of a PBaaS network.
///
/// Transactions hold these behind an `Arc` and only ever read them. The
/// branch-id table maps a transaction version to the consensus branch id
/// mixed into the Overwinter/Sapling signature digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkParams {
    pub name: String,
    pub message_prefix: String,
    pub pub_key_hash: u8,
    pub script_hash: u8,
    pub wif: u8,
    #[serde(rename = "verusID")]
    pub verus_id: u8,
    pub bip32: Bip32Versions,
    pub consensus_branch_id: BTreeMap<u32, u32>,
}

impl NetworkParams {
    /// Verus mainnet parameters.
    pub fn verus() -> Arc<Self> {
        Arc::clone(&VERUS)
    }

    /// Verus testnet parameters.
    pub fn verustest() -> Arc<Self> {
        Arc::clone(&VERUSTEST)
    }

    /// Load network parameters from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, PbaasError> {
        serde_json::from_str(json).map_err(|e| PbaasError::InvalidConfig(e.to_string()))
    }

    /// Serialize these parameters to JSON.
    pub fn to_json(&self) -> Result<String, PbaasError> {
        serde_json::to_string_pretty(self).map_err(|e| PbaasError::InvalidConfig(e.to_string()))
    }

    /// Consensus branch id for a transaction version, if the network defines one.
    pub fn branch_id(&self, version: u32) -> Option<u32> {
        self.consensus_branch_id.get(&version).copied()
    }

    fn pbaas_defaults(name: &str) -> Self {
        let consensus_branch_id = BTreeMap::from([
            (1, 0),
            (2, 0),
            (3, OVERWINTER_BRANCH_ID),
            (4, SAPLING_BRANCH_ID),
        ]);

        NetworkParams {
            name: name.to_string(),
            message_prefix: "\x15Verus signed data:\n".to_string(),
            pub_key_hash: 0x3C,
            script_hash: 0x55,
            wif: 0xBC,
            verus_id: 0x66,
            bip32: Bip32Versions {
                public: 0x0488_B21E,  // xpub
                private: 0x0488_ADE4, // xprv
            },
            consensus_branch_id,
        }
    }
}

impl std::fmt::Display for NetworkParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
