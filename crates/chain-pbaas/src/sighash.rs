//! Signature hashes.
//!
//! Two digests are supported:
//!
//! - [`Transaction::hash_for_signature`]: the pre-segwit Bitcoin algorithm,
//!   double SHA-256 over a modified copy of the transaction.
//! - [`Transaction::hash_for_zcash_signature`]: the Overwinter/Sapling
//!   digest (ZIP-143/ZIP-243), personalized BLAKE2b-256 keyed by the
//!   consensus branch id. Shielded components are always empty, so their
//!   sub-hashes are zero.

use tracing::trace;

use crate::buffer::BufferWriter;
use crate::error::PbaasError;
use crate::hash::{blake2b_256_personal, hash256, PERSONALIZATION_LEN};
use crate::script;
use crate::transaction::{Transaction, TxInput, TxOutput};

pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_NONE: u32 = 0x02;
pub const SIGHASH_SINGLE: u32 = 0x03;
pub const SIGHASH_FORKID: u32 = 0x40;
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// Bits of the hash type selecting ALL, NONE or SINGLE.
pub const SIGHASH_BASE_MASK: u32 = 0x1F;

pub const ZERO_HASH: [u8; 32] = [0; 32];

/// Returned by the legacy digest for out-of-range inputs or SINGLE without
/// a matching output: 31 zero bytes then 0x01.
pub const ONE_HASH: [u8; 32] = {
    let mut hash = [0u8; 32];
    hash[31] = 1;
    hash
};

/// Input index that omits the per-input section of the Zcash digest.
pub const NO_INPUT_INDEX: u32 = 0xFFFF_FFFF;

const PREVOUTS_PERSONALIZATION: &[u8; PERSONALIZATION_LEN] = b"ZcashPrevoutHash";
const SEQUENCE_PERSONALIZATION: &[u8; PERSONALIZATION_LEN] = b"ZcashSequencHash";
const OUTPUTS_PERSONALIZATION: &[u8; PERSONALIZATION_LEN] = b"ZcashOutputsHash";
const SIGHASH_PERSONALIZATION_PREFIX: &[u8; 12] = b"ZcashSigHash";

impl Transaction {
    /// Legacy signature hash of input `in_index` spending `prev_out_script`.
    ///
    /// OP_CODESEPARATORs are removed from `prev_out_script` before it is
    /// placed in the signed input. An out-of-range input, or SINGLE with no
    /// output at `in_index`, yields [`ONE_HASH`] rather than an error.
    pub fn hash_for_signature(
        &self,
        in_index: u32,
        prev_out_script: &[u8],
        hash_type: u32,
    ) -> Result<[u8; 32], PbaasError> {
        trace!(in_index, hash_type, "legacy signature hash");

        let in_index = in_index as usize;
        if in_index >= self.inputs.len() {
            return Ok(ONE_HASH);
        }

        let our_script = script::strip_code_separators(prev_out_script)?;
        let mut tx_tmp = self.clone();

        match hash_type & SIGHASH_BASE_MASK {
            SIGHASH_NONE => {
                tx_tmp.outputs.clear();
                zero_other_sequences(&mut tx_tmp.inputs, in_index);
            }
            SIGHASH_SINGLE => {
                if in_index >= self.outputs.len() {
                    return Ok(ONE_HASH);
                }
                tx_tmp.outputs.truncate(in_index + 1);
                for output in &mut tx_tmp.outputs[..in_index] {
                    *output = TxOutput::BLANK;
                }
                zero_other_sequences(&mut tx_tmp.inputs, in_index);
            }
            _ => {}
        }

        if hash_type & SIGHASH_ANYONECANPAY != 0 {
            let mut input = tx_tmp.inputs.swap_remove(in_index);
            input.script = our_script;
            tx_tmp.inputs = vec![input];
        } else {
            for input in &mut tx_tmp.inputs {
                input.script.clear();
            }
            tx_tmp.inputs[in_index].script = our_script;
        }

        let mut writer = BufferWriter::with_capacity(tx_tmp.byte_length() + 4);
        tx_tmp.write_to(&mut writer);
        writer.write_u32(hash_type);
        Ok(hash256(writer.as_slice()))
    }

    /// Overwinter/Sapling signature hash.
    ///
    /// `prev_out_script` is committed as given. Pass [`NO_INPUT_INDEX`] as
    /// `in_index` to hash the transaction without any input-specific data.
    pub fn hash_for_zcash_signature(
        &self,
        in_index: u32,
        prev_out_script: &[u8],
        value: u64,
        hash_type: u32,
    ) -> Result<[u8; 32], PbaasError> {
        trace!(in_index, hash_type, value, "zcash signature hash");

        let input = if in_index == NO_INPUT_INDEX {
            None
        } else {
            let index = in_index as usize;
            let input = self
                .inputs
                .get(index)
                .ok_or(PbaasError::InputIndexOutOfRange {
                    index,
                    count: self.inputs.len(),
                })?;
            Some(input)
        };

        if !self.is_overwinter_compatible() {
            return Err(PbaasError::UnsupportedDigestVersion(self.version));
        }
        let branch_id = self
            .consensus_branch_id()
            .ok_or(PbaasError::UnsupportedVersion(self.version))?;

        let anyone_can_pay = hash_type & SIGHASH_ANYONECANPAY != 0;
        let base = hash_type & SIGHASH_BASE_MASK;

        let hash_prevouts = if anyone_can_pay {
            ZERO_HASH
        } else {
            self.prevouts_hash()
        };

        let hash_sequence =
            if anyone_can_pay || base == SIGHASH_SINGLE || base == SIGHASH_NONE {
                ZERO_HASH
            } else {
                self.sequence_hash()
            };

        let hash_outputs = if base != SIGHASH_SINGLE && base != SIGHASH_NONE {
            outputs_hash(&self.outputs)
        } else if base == SIGHASH_SINGLE && (in_index as usize) < self.outputs.len() {
            outputs_hash(&self.outputs[in_index as usize..=in_index as usize])
        } else {
            ZERO_HASH
        };

        let mut writer = BufferWriter::with_capacity(256);
        writer.write_u32(self.header());
        writer.write_u32(self.version_group_id);
        writer.write_slice(&hash_prevouts);
        writer.write_slice(&hash_sequence);
        writer.write_slice(&hash_outputs);
        writer.write_slice(&ZERO_HASH); // hashJoinSplits
        if self.is_sapling_compatible() {
            writer.write_slice(&ZERO_HASH); // hashShieldedSpends
            writer.write_slice(&ZERO_HASH); // hashShieldedOutputs
        }
        writer.write_u32(self.locktime);
        writer.write_u32(self.expiry_height);
        if self.is_sapling_compatible() {
            writer.write_u64(0); // valueBalance
        }
        writer.write_u32(hash_type);

        if let Some(input) = input {
            writer.write_slice(&input.hash);
            writer.write_u32(input.index);
            writer.write_var_slice(prev_out_script);
            writer.write_u64(value);
            writer.write_u32(input.sequence);
        }

        let mut personalization = [0u8; PERSONALIZATION_LEN];
        personalization[..12].copy_from_slice(SIGHASH_PERSONALIZATION_PREFIX);
        personalization[12..].copy_from_slice(&branch_id.to_le_bytes());

        Ok(blake2b_256_personal(&personalization, writer.as_slice()))
    }

    fn prevouts_hash(&self) -> [u8; 32] {
        let mut writer = BufferWriter::with_capacity(36 * self.inputs.len());
        for input in &self.inputs {
            writer.write_slice(&input.hash);
            writer.write_u32(input.index);
        }
        blake2b_256_personal(PREVOUTS_PERSONALIZATION, writer.as_slice())
    }

    fn sequence_hash(&self) -> [u8; 32] {
        let mut writer = BufferWriter::with_capacity(4 * self.inputs.len());
        for input in &self.inputs {
            writer.write_u32(input.sequence);
        }
        blake2b_256_personal(SEQUENCE_PERSONALIZATION, writer.as_slice())
    }
}

fn outputs_hash(outputs: &[TxOutput]) -> [u8; 32] {
    let mut writer = BufferWriter::new();
    for output in outputs {
        writer.write_u64(output.value);
        writer.write_var_slice(&output.script);
    }
    blake2b_256_personal(OUTPUTS_PERSONALIZATION, writer.as_slice())
}

fn zero_other_sequences(inputs: &mut [TxInput], keep: usize) {
    for (i, input) in inputs.iter_mut().enumerate() {
        if i != keep {
            input.sequence = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkParams;

    // ZIP-243 test vector 3.
    const SAPLING_TX_HEX: &str = "0400008085202f8901a8c685478265f4c14dada651969c45a65e1aeb8cd6791f2f5bb6a1d9952104d9010000006b483045022100a61e5d557568c2ddc1d9b03a7173c6ce7c996c4daecab007ac8f34bee01e6b9702204d38fdc0bcf2728a69fde78462a10fb45a9baa27873e6a5fc45fb5c76764202a01210365ffea3efa3908918a8b8627724af852fc9b86d7375b103ab0543cf418bcaa7ffeffffff02005a6202000000001976a9148132712c3ff19f3a151234616777420a6d7ef22688ac8b959800000000001976a9145453e4698f02a38abdaa521cd1ff2dee6fac187188ac29b0040048b004000000000000000000000000";
    const SAPLING_PREV_SCRIPT: &str = "76a914507173527b4c3318a2aecd793bf1cfed705950cf88ac";

    const OVERWINTER_TX_HEX: &str = "030000807082c40302000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f0700000000feffffffabababababababababababababababababababababababababababababababab0000000000ffffffff01a0860100000000001976a914c42e7ef92fdb603af844d064faad95db9bcdfd3d88ac11000000f401000000";

    fn sapling_tx() -> Transaction {
        Transaction::from_hex(SAPLING_TX_HEX, NetworkParams::verus()).unwrap()
    }

    fn zcash_digest(tx: &Transaction, in_index: u32, value: u64, hash_type: u32) -> String {
        let script = hex::decode(SAPLING_PREV_SCRIPT).unwrap();
        hex::encode(
            tx.hash_for_zcash_signature(in_index, &script, value, hash_type)
                .unwrap(),
        )
    }

    #[test]
    fn one_hash_layout() {
        assert_eq!(
            hex::encode(ONE_HASH),
            "0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn zip243_vector_sighash_all() {
        let tx = sapling_tx();
        assert_eq!(
            zcash_digest(&tx, 0, 50_000_000, SIGHASH_ALL),
            "f3148f80dfab5e573d5edfe7a850f5fd39234f80b5429d3a57edcc11e34c585b"
        );
    }

    #[test]
    fn sapling_digest_per_hash_type() {
        let tx = sapling_tx();
        let cases = [
            (SIGHASH_NONE, "2f0a186e474c4c2f768c2f55529523a1f3d09d182740cdf0d21bb6752028d70d"),
            (SIGHASH_SINGLE, "0b2eb07bf9bf193ac2ca24a4e6874db4f40dbc04364d25d1b278646708cd9325"),
            (
                SIGHASH_ALL | SIGHASH_ANYONECANPAY,
                "310c0c94e32f685d7656edf030bef15e443119cd0ea341dbe5bde9ffb342df67",
            ),
            (
                SIGHASH_NONE | SIGHASH_ANYONECANPAY,
                "5ccea8d6d22d2b81d16e05e8f04b226bf60326c025e9f8b4e32ce8736cb5a5ad",
            ),
            (
                SIGHASH_SINGLE | SIGHASH_ANYONECANPAY,
                "b1eb4b6da75563258c36706aa276f760b5c215910f681d467791d3b17ad20f2c",
            ),
        ];
        for (hash_type, expected) in cases {
            assert_eq!(
                zcash_digest(&tx, 0, 50_000_000, hash_type),
                expected,
                "hash type {hash_type:#x}"
            );
        }
    }

    #[test]
    fn sapling_digest_without_input() {
        let tx = sapling_tx();
        assert_eq!(
            zcash_digest(&tx, NO_INPUT_INDEX, 50_000_000, SIGHASH_ALL),
            "8ed8eeb818b9621e406a33f1844c56a4b44bb5c85c425a1bab1f07e2dc0851cb"
        );
        // SINGLE with no input has no matching output.
        assert_eq!(
            zcash_digest(&tx, NO_INPUT_INDEX, 50_000_000, SIGHASH_SINGLE),
            "4ea8bfffc4a0fa63bd70fff06080ffa806501117b3652d5d6fb1daba6cbd2844"
        );
    }

    #[test]
    fn zcash_digest_commits_script_verbatim() {
        let tx = sapling_tx();
        let mut script = vec![0x19];
        script.extend(hex::decode(SAPLING_PREV_SCRIPT).unwrap());
        let digest = tx
            .hash_for_zcash_signature(0, &script, 50_000_000, SIGHASH_ALL)
            .unwrap();
        assert_eq!(
            hex::encode(digest),
            "f27411aa9bd02879181c763a80bdb6f9ea9158f0de71757e7e12ed17760ebe3f"
        );
    }

    #[test]
    fn overwinter_digest_uses_overwinter_branch() {
        let tx = Transaction::from_hex(OVERWINTER_TX_HEX, NetworkParams::verus()).unwrap();
        let cases = [
            (0, SIGHASH_ALL, "c965fd2e69ead35c398933a2a0de2f5846c66352fbc1c44e9a7aabf8aff0fe05"),
            (1, SIGHASH_ALL, "e040d34b6ae4c4b2e365959256582ba597bffad057b80fbaccf362616db5a97f"),
            (0, SIGHASH_SINGLE, "5b2549923f998cb2f7d0a4e08a5de3cf5c53b28d6c7e39a9d1bbfa961b005523"),
            (1, SIGHASH_SINGLE, "765adea52b2044efc4d57c44f7203c294e4cf2b155ff7d48b735a3118edd44cb"),
            (
                0,
                SIGHASH_ALL | SIGHASH_ANYONECANPAY,
                "c804b4c4f62aba0c0456600c80b1e3705f6cd2d5b12c783141811ebfcaea17a6",
            ),
            (
                1,
                SIGHASH_ALL | SIGHASH_ANYONECANPAY,
                "7ea8af0c4878f7d794fda86bbb40c1065ebd4aa5016cff9d2d72d276651cbd11",
            ),
        ];
        for (in_index, hash_type, expected) in cases {
            assert_eq!(
                zcash_digest(&tx, in_index, 123_456, hash_type),
                expected,
                "input {in_index} hash type {hash_type:#x}"
            );
        }
    }

    #[test]
    fn zcash_digest_rejects_out_of_range_input() {
        let tx = sapling_tx();
        assert_eq!(
            tx.hash_for_zcash_signature(1, &[], 0, SIGHASH_ALL),
            Err(PbaasError::InputIndexOutOfRange { index: 1, count: 1 })
        );
    }

    #[test]
    fn zcash_digest_rejects_pre_overwinter_versions() {
        let mut tx = Transaction::new(NetworkParams::verus());
        tx.version = 2;
        tx.add_input(&[1u8; 32], 0, None, None).unwrap();
        assert_eq!(
            tx.hash_for_zcash_signature(0, &[], 0, SIGHASH_ALL),
            Err(PbaasError::UnsupportedDigestVersion(2))
        );
    }

    #[test]
    fn zcash_digest_needs_branch_id() {
        let mut tx = Transaction::new(NetworkParams::verus());
        tx.version = 5;
        tx.add_input(&[1u8; 32], 0, None, None).unwrap();
        assert_eq!(
            tx.hash_for_zcash_signature(0, &[], 0, SIGHASH_ALL),
            Err(PbaasError::UnsupportedVersion(5))
        );
    }

    #[test]
    fn legacy_digest_on_sapling_transaction() {
        let tx = sapling_tx();
        let script = hex::decode(SAPLING_PREV_SCRIPT).unwrap();
        assert_eq!(
            hex::encode(tx.hash_for_signature(0, &script, SIGHASH_ALL).unwrap()),
            "bc618df48789fe7c8f73f31eb30fcc13004f46a685de7cd81f71e58f5bf80754"
        );
    }

    #[test]
    fn legacy_digest_out_of_range_is_one() {
        let tx = sapling_tx();
        assert_eq!(tx.hash_for_signature(3, &[], SIGHASH_ALL).unwrap(), ONE_HASH);
    }

    #[test]
    fn legacy_single_without_output_is_one() {
        let mut tx = Transaction::new(NetworkParams::verus());
        tx.add_input(&[1u8; 32], 0, None, None).unwrap();
        tx.add_input(&[2u8; 32], 0, None, None).unwrap();
        tx.add_output(vec![0x51], 1);
        assert_eq!(tx.hash_for_signature(1, &[0x51], SIGHASH_SINGLE).unwrap(), ONE_HASH);
        assert_ne!(tx.hash_for_signature(0, &[0x51], SIGHASH_SINGLE).unwrap(), ONE_HASH);
    }

    #[test]
    fn legacy_digest_leaves_transaction_untouched() {
        let tx = Transaction::from_hex(OVERWINTER_TX_HEX, NetworkParams::verus()).unwrap();
        let before = tx.clone();
        for hash_type in [SIGHASH_ALL, SIGHASH_NONE, SIGHASH_SINGLE | SIGHASH_ANYONECANPAY] {
            tx.hash_for_signature(0, &[0x51], hash_type).unwrap();
        }
        assert_eq!(tx, before);
    }

    #[test]
    fn legacy_digest_rejects_truncated_script() {
        let tx = sapling_tx();
        assert!(matches!(
            tx.hash_for_signature(0, &[0x05, 0x01], SIGHASH_ALL),
            Err(PbaasError::InvalidScript(_))
        ));
    }
}
