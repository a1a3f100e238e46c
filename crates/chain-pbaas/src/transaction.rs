use std::sync::Arc;

use tracing::{debug, warn};

use crate::buffer::{var_slice_size, BufferReader, BufferWriter};
use crate::error::PbaasError;
use crate::feature;
use crate::hash::hash256;
use crate::network::NetworkParams;
use crate::varint;

/// Sequence number of an input that opts out of locktime and replacement.
pub const DEFAULT_SEQUENCE: u32 = 0xFFFF_FFFF;

/// Value balance of a Sapling transaction with no shielded components.
pub const VALUE_INT64_ZERO: [u8; 8] = [0; 8];

/// Output value used to blank outputs in SIGHASH_SINGLE digests.
pub const VALUE_UINT64_MAX: u64 = u64::MAX;

// hash(32) + index(4) + empty script(1) + sequence(4)
const MIN_INPUT_BYTES: usize = 41;
// value(8) + empty script(1)
const MIN_OUTPUT_BYTES: usize = 9;

/// A transparent input spending `index` of the transaction with id `hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Previous transaction hash, internal byte order.
    pub hash: [u8; 32],
    pub index: u32,
    pub script: Vec<u8>,
    pub sequence: u32,
    /// Always empty; Zcash-derived chains carry no segwit data.
    pub witness: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub script: Vec<u8>,
    pub value: u64,
}

impl TxOutput {
    /// Placeholder for outputs preceding the signed one in SIGHASH_SINGLE.
    pub const BLANK: TxOutput = TxOutput {
        script: Vec::new(),
        value: VALUE_UINT64_MAX,
    };
}

/// A transparent PBaaS transaction.
///
/// Header fields are public; inputs and outputs are appended through
/// [`Transaction::add_input`] and [`Transaction::add_output`] so the
/// 32-byte hash invariant always holds.
#[derive(Debug, PartialEq, Eq)]
pub struct Transaction {
    pub version: u32,
    pub locktime: u32,
    pub overwintered: bool,
    pub version_group_id: u32,
    pub expiry_height: u32,
    pub(crate) inputs: Vec<TxInput>,
    pub(crate) outputs: Vec<TxOutput>,
    network: Arc<NetworkParams>,
}

impl Transaction {
    /// An empty version 1 transaction bound to `network`.
    pub fn new(network: Arc<NetworkParams>) -> Self {
        Self {
            version: 1,
            locktime: 0,
            overwintered: false,
            version_group_id: 0,
            expiry_height: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
            network,
        }
    }

    pub fn network(&self) -> &Arc<NetworkParams> {
        &self.network
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    /// Consensus branch id for this transaction's version, if the network defines one.
    pub fn consensus_branch_id(&self) -> Option<u32> {
        self.network.branch_id(self.version)
    }

    /// The header word: version with the overwintered flag in the top bit.
    pub fn header(&self) -> u32 {
        feature::join_header(self.version, self.overwintered)
    }

    pub fn supports_join_splits(&self) -> bool {
        feature::supports_join_splits(self.version)
    }

    pub fn is_overwinter_compatible(&self) -> bool {
        feature::is_overwinter_compatible(self.version)
    }

    pub fn is_sapling_compatible(&self) -> bool {
        feature::is_sapling_compatible(self.version)
    }

    /// True for a hash of 32 zero bytes, the previous-output hash of a coinbase input.
    pub fn is_coinbase_hash(hash: &[u8]) -> bool {
        hash.len() == 32 && hash.iter().all(|&b| b == 0)
    }

    /// A coinbase transaction has exactly one input, spending the zero hash.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && Self::is_coinbase_hash(&self.inputs[0].hash)
    }

    /// Append an input and return its index.
    ///
    /// `sequence` defaults to [`DEFAULT_SEQUENCE`] and `script` to empty.
    pub fn add_input(
        &mut self,
        hash: &[u8],
        index: u32,
        sequence: Option<u32>,
        script: Option<Vec<u8>>,
    ) -> Result<usize, PbaasError> {
        let hash: [u8; 32] = hash
            .try_into()
            .map_err(|_| PbaasError::InvalidInputHash(hash.len()))?;

        self.inputs.push(TxInput {
            hash,
            index,
            script: script.unwrap_or_default(),
            sequence: sequence.unwrap_or(DEFAULT_SEQUENCE),
            witness: Vec::new(),
        });
        Ok(self.inputs.len() - 1)
    }

    /// Append an output and return its index.
    pub fn add_output(&mut self, script: Vec<u8>, value: u64) -> usize {
        self.outputs.push(TxOutput { script, value });
        self.outputs.len() - 1
    }

    /// Replace the script of input `index`, e.g. with a finished scriptSig.
    pub fn set_input_script(&mut self, index: usize, script: Vec<u8>) -> Result<(), PbaasError> {
        let count = self.inputs.len();
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(PbaasError::InputIndexOutOfRange { index, count })?;
        input.script = script;
        Ok(())
    }

    /// Exact serialized size in bytes.
    pub fn byte_length(&self) -> usize {
        let mut len = if self.is_overwinter_compatible() { 8 } else { 4 };

        len += varint::encoding_length(self.inputs.len() as u64);
        len += self
            .inputs
            .iter()
            .map(|input| 40 + var_slice_size(&input.script))
            .sum::<usize>();

        len += varint::encoding_length(self.outputs.len() as u64);
        len += self
            .outputs
            .iter()
            .map(|output| 8 + var_slice_size(&output.script))
            .sum::<usize>();

        // locktime
        len += 4;
        if self.is_overwinter_compatible() {
            len += 4;
        }
        if self.is_sapling_compatible() {
            len += 8 + 1 + 1;
        }
        if self.supports_join_splits() {
            len += 1;
        }
        len
    }

    /// Weight in segwit units. There is no witness discount, so this is
    /// always four times the byte length.
    pub fn weight(&self) -> usize {
        let base = self.byte_length();
        base * 3 + base
    }

    pub fn virtual_size(&self) -> usize {
        self.weight().div_ceil(4)
    }

    /// Append the wire encoding to `writer`.
    pub fn write_to(&self, writer: &mut BufferWriter) {
        if self.is_overwinter_compatible() {
            writer.write_u32(self.header());
            writer.write_u32(self.version_group_id);
        } else {
            writer.write_u32(self.version);
        }

        writer.write_var_int(self.inputs.len() as u64);
        for input in &self.inputs {
            writer.write_slice(&input.hash);
            writer.write_u32(input.index);
            writer.write_var_slice(&input.script);
            writer.write_u32(input.sequence);
        }

        writer.write_var_int(self.outputs.len() as u64);
        for output in &self.outputs {
            writer.write_u64(output.value);
            writer.write_var_slice(&output.script);
        }

        writer.write_u32(self.locktime);
        if self.is_overwinter_compatible() {
            writer.write_u32(self.expiry_height);
        }
        if self.is_sapling_compatible() {
            writer.write_slice(&VALUE_INT64_ZERO);
            writer.write_var_int(0); // shielded spends
            writer.write_var_int(0); // shielded outputs
        }
        if self.supports_join_splits() {
            writer.write_var_int(0);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BufferWriter::with_capacity(self.byte_length());
        self.write_to(&mut writer);
        writer.into_inner()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Serialize into `buf` starting at `offset`, returning the written region.
    pub fn write_into<'a>(&self, buf: &'a mut [u8], offset: usize) -> Result<&'a [u8], PbaasError> {
        let bytes = self.to_bytes();
        let end = match offset.checked_add(bytes.len()) {
            Some(end) if end <= buf.len() => end,
            _ => {
                return Err(PbaasError::BufferTooSmall {
                    needed: bytes.len(),
                    available: buf.len().saturating_sub(offset),
                })
            }
        };
        let region = &mut buf[offset..end];
        region.copy_from_slice(&bytes);
        Ok(region)
    }

    /// Double SHA-256 of the serialization, internal byte order.
    pub fn get_hash(&self) -> [u8; 32] {
        hash256(&self.to_bytes())
    }

    /// Transaction id: the hash byte-reversed, as hex.
    pub fn get_id(&self) -> String {
        let mut hash = self.get_hash();
        hash.reverse();
        hex::encode(hash)
    }

    /// Decode a transaction. With `strict`, bytes left over after the
    /// transaction are an error.
    pub fn decode(
        bytes: &[u8],
        network: Arc<NetworkParams>,
        strict: bool,
    ) -> Result<Self, PbaasError> {
        let mut reader = BufferReader::new(bytes);
        let tx = Self::read_from(&mut reader, network)?;

        if !reader.is_exhausted() {
            if strict {
                warn!(
                    consumed = reader.offset(),
                    total = bytes.len(),
                    "transaction has trailing data"
                );
                return Err(PbaasError::TrailingData {
                    consumed: reader.offset(),
                    total: bytes.len(),
                });
            }
            debug!(
                trailing = reader.remaining(),
                "ignoring trailing data after transaction"
            );
        }
        Ok(tx)
    }

    /// Strict decode.
    pub fn from_bytes(bytes: &[u8], network: Arc<NetworkParams>) -> Result<Self, PbaasError> {
        Self::decode(bytes, network, true)
    }

    /// Strict decode of a hex string.
    pub fn from_hex(hex_str: &str, network: Arc<NetworkParams>) -> Result<Self, PbaasError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes, network)
    }

    /// Read one transaction at the reader's position, leaving the cursor
    /// just past it. Used to walk several transactions packed in one buffer.
    pub fn read_from(
        reader: &mut BufferReader<'_>,
        network: Arc<NetworkParams>,
    ) -> Result<Self, PbaasError> {
        let (overwintered, version) = feature::split_header(reader.read_u32()?);
        if overwintered && network.branch_id(version).is_none() {
            warn!(version, network = %network, "unsupported overwintered version");
            return Err(PbaasError::UnsupportedVersion(version));
        }

        let mut tx = Transaction::new(network);
        tx.version = version;
        tx.overwintered = overwintered;

        if tx.is_overwinter_compatible() {
            tx.version_group_id = reader.read_u32()?;
        }

        let input_count = reader.read_var_int()?;
        tx.inputs = Vec::with_capacity(bounded_capacity(
            input_count,
            reader.remaining(),
            MIN_INPUT_BYTES,
        ));
        for _ in 0..input_count {
            let hash = reader.read_array()?;
            let index = reader.read_u32()?;
            let script = reader.read_var_slice()?.to_vec();
            let sequence = reader.read_u32()?;
            tx.inputs.push(TxInput {
                hash,
                index,
                script,
                sequence,
                witness: Vec::new(),
            });
        }

        let output_count = reader.read_var_int()?;
        tx.outputs = Vec::with_capacity(bounded_capacity(
            output_count,
            reader.remaining(),
            MIN_OUTPUT_BYTES,
        ));
        for _ in 0..output_count {
            let value = reader.read_u64()?;
            let script = reader.read_var_slice()?.to_vec();
            tx.outputs.push(TxOutput { script, value });
        }

        tx.locktime = reader.read_u32()?;

        if tx.is_overwinter_compatible() {
            tx.expiry_height = reader.read_u32()?;
        }

        if tx.is_sapling_compatible() {
            let value_balance: [u8; 8] = reader.read_array()?;
            if value_balance != VALUE_INT64_ZERO {
                return Err(PbaasError::UnsupportedShieldedFeature("valueBalance"));
            }
            if reader.read_var_int()? != 0 {
                return Err(PbaasError::UnsupportedShieldedFeature("shielded spends"));
            }
            if reader.read_var_int()? != 0 {
                return Err(PbaasError::UnsupportedShieldedFeature("shielded outputs"));
            }
        }

        if tx.supports_join_splits() && reader.read_var_int()? != 0 {
            return Err(PbaasError::UnsupportedShieldedFeature("joinSplits"));
        }

        debug!(
            version = tx.version,
            overwintered = tx.overwintered,
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            "decoded transaction"
        );
        Ok(tx)
    }
}

/// Copies version, locktime, inputs and outputs. The overwinter fields are
/// only carried over when the version has them on the wire.
impl Clone for Transaction {
    fn clone(&self) -> Self {
        let mut tx = Transaction::new(Arc::clone(&self.network));
        tx.version = self.version;
        tx.locktime = self.locktime;

        if self.is_overwinter_compatible() {
            tx.overwintered = self.overwintered;
            tx.version_group_id = self.version_group_id;
            tx.expiry_height = self.expiry_height;
        }

        tx.inputs = self.inputs.clone();
        tx.outputs = self.outputs.clone();
        tx
    }
}

/// Preallocation for `count` items, capped by what the remaining bytes could hold.
fn bounded_capacity(count: u64, remaining: usize, min_item_bytes: usize) -> usize {
    usize::try_from(count)
        .unwrap_or(usize::MAX)
        .min(remaining / min_item_bytes)
}
