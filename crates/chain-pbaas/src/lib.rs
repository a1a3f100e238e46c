//! Transparent transaction support for Verus PBaaS chains.
//!
//! Decodes and encodes Zcash-derived transactions (legacy, Overwinter and
//! Sapling formats, transparent components only) and computes both the
//! legacy Bitcoin signature hash and the Overwinter/Sapling BLAKE2b digest.
//! Network parameters are explicit, immutable values passed at construction
//! and decode time.

pub mod buffer;
pub mod error;
pub mod feature;
pub mod hash;
pub mod network;
pub mod script;
pub mod sighash;
pub mod transaction;
pub mod varint;

pub use error::PbaasError;
pub use network::NetworkParams;
pub use transaction::{Transaction, TxInput, TxOutput};
