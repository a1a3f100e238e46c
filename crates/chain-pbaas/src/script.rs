//! Script compile/decompile.
//!
//! This is not an interpreter. Scripts are split into opcodes and data
//! pushes so that individual opcodes (OP_CODESEPARATOR) can be removed before
//! signature hashing, and so that scripts can be written and read as ASM.

use crate::buffer::BufferReader;
use crate::error::PbaasError;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4C;
pub const OP_PUSHDATA2: u8 = 0x4D;
pub const OP_PUSHDATA4: u8 = 0x4E;
pub const OP_1NEGATE: u8 = 0x4F;
pub const OP_1: u8 = 0x51;
pub const OP_CODESEPARATOR: u8 = 0xAB;

/// Canonical opcode names. Used in both directions.
const OPCODES: &[(&str, u8)] = &[
    ("OP_0", 0x00),
    ("OP_PUSHDATA1", 0x4C),
    ("OP_PUSHDATA2", 0x4D),
    ("OP_PUSHDATA4", 0x4E),
    ("OP_1NEGATE", 0x4F),
    ("OP_RESERVED", 0x50),
    ("OP_1", 0x51),
    ("OP_2", 0x52),
    ("OP_3", 0x53),
    ("OP_4", 0x54),
    ("OP_5", 0x55),
    ("OP_6", 0x56),
    ("OP_7", 0x57),
    ("OP_8", 0x58),
    ("OP_9", 0x59),
    ("OP_10", 0x5A),
    ("OP_11", 0x5B),
    ("OP_12", 0x5C),
    ("OP_13", 0x5D),
    ("OP_14", 0x5E),
    ("OP_15", 0x5F),
    ("OP_16", 0x60),
    ("OP_NOP", 0x61),
    ("OP_VER", 0x62),
    ("OP_IF", 0x63),
    ("OP_NOTIF", 0x64),
    ("OP_VERIF", 0x65),
    ("OP_VERNOTIF", 0x66),
    ("OP_ELSE", 0x67),
    ("OP_ENDIF", 0x68),
    ("OP_VERIFY", 0x69),
    ("OP_RETURN", 0x6A),
    ("OP_TOALTSTACK", 0x6B),
    ("OP_FROMALTSTACK", 0x6C),
    ("OP_2DROP", 0x6D),
    ("OP_2DUP", 0x6E),
    ("OP_3DUP", 0x6F),
    ("OP_2OVER", 0x70),
    ("OP_2ROT", 0x71),
    ("OP_2SWAP", 0x72),
    ("OP_IFDUP", 0x73),
    ("OP_DEPTH", 0x74),
    ("OP_DROP", 0x75),
    ("OP_DUP", 0x76),
    ("OP_NIP", 0x77),
    ("OP_OVER", 0x78),
    ("OP_PICK", 0x79),
    ("OP_ROLL", 0x7A),
    ("OP_ROT", 0x7B),
    ("OP_SWAP", 0x7C),
    ("OP_TUCK", 0x7D),
    ("OP_CAT", 0x7E),
    ("OP_SUBSTR", 0x7F),
    ("OP_LEFT", 0x80),
    ("OP_RIGHT", 0x81),
    ("OP_SIZE", 0x82),
    ("OP_INVERT", 0x83),
    ("OP_AND", 0x84),
    ("OP_OR", 0x85),
    ("OP_XOR", 0x86),
    ("OP_EQUAL", 0x87),
    ("OP_EQUALVERIFY", 0x88),
    ("OP_RESERVED1", 0x89),
    ("OP_RESERVED2", 0x8A),
    ("OP_1ADD", 0x8B),
    ("OP_1SUB", 0x8C),
    ("OP_2MUL", 0x8D),
    ("OP_2DIV", 0x8E),
    ("OP_NEGATE", 0x8F),
    ("OP_ABS", 0x90),
    ("OP_NOT", 0x91),
    ("OP_0NOTEQUAL", 0x92),
    ("OP_ADD", 0x93),
    ("OP_SUB", 0x94),
    ("OP_MUL", 0x95),
    ("OP_DIV", 0x96),
    ("OP_MOD", 0x97),
    ("OP_LSHIFT", 0x98),
    ("OP_RSHIFT", 0x99),
    ("OP_BOOLAND", 0x9A),
    ("OP_BOOLOR", 0x9B),
    ("OP_NUMEQUAL", 0x9C),
    ("OP_NUMEQUALVERIFY", 0x9D),
    ("OP_NUMNOTEQUAL", 0x9E),
    ("OP_LESSTHAN", 0x9F),
    ("OP_GREATERTHAN", 0xA0),
    ("OP_LESSTHANOREQUAL", 0xA1),
    ("OP_GREATERTHANOREQUAL", 0xA2),
    ("OP_MIN", 0xA3),
    ("OP_MAX", 0xA4),
    ("OP_WITHIN", 0xA5),
    ("OP_RIPEMD160", 0xA6),
    ("OP_SHA1", 0xA7),
    ("OP_SHA256", 0xA8),
    ("OP_HASH160", 0xA9),
    ("OP_HASH256", 0xAA),
    ("OP_CODESEPARATOR", 0xAB),
    ("OP_CHECKSIG", 0xAC),
    ("OP_CHECKSIGVERIFY", 0xAD),
    ("OP_CHECKMULTISIG", 0xAE),
    ("OP_CHECKMULTISIGVERIFY", 0xAF),
    ("OP_NOP1", 0xB0),
    ("OP_CHECKLOCKTIMEVERIFY", 0xB1),
    ("OP_CHECKSEQUENCEVERIFY", 0xB2),
    ("OP_NOP4", 0xB3),
    ("OP_NOP5", 0xB4),
    ("OP_NOP6", 0xB5),
    ("OP_NOP7", 0xB6),
    ("OP_NOP8", 0xB7),
    ("OP_NOP9", 0xB8),
    ("OP_NOP10", 0xB9),
    ("OP_CHECKCRYPTOCONDITION", 0xCC),
    ("OP_CHECKCRYPTOCONDITIONVERIFY", 0xCD),
    ("OP_PUBKEYHASH", 0xFD),
    ("OP_PUBKEY", 0xFE),
    ("OP_INVALIDOPCODE", 0xFF),
];

/// Alternative names accepted when parsing ASM.
const ALIASES: &[(&str, u8)] = &[
    ("OP_FALSE", 0x00),
    ("OP_TRUE", 0x51),
    ("OP_NOP2", 0xB1),
    ("OP_NOP3", 0xB2),
];

/// One element of a decompiled script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Op(u8),
    PushBytes(Vec<u8>),
}

/// Look up an opcode by name, including aliases such as `OP_TRUE`.
pub fn opcode_from_name(name: &str) -> Option<u8> {
    OPCODES
        .iter()
        .chain(ALIASES)
        .find(|(n, _)| *n == name)
        .map(|&(_, op)| op)
}

/// Canonical name of an opcode.
pub fn opcode_name(op: u8) -> Option<&'static str> {
    OPCODES.iter().find(|&&(_, o)| o == op).map(|&(n, _)| n)
}

/// The single opcode equivalent to pushing `data`, if there is one.
fn as_minimal_op(data: &[u8]) -> Option<u8> {
    match data {
        [] => Some(OP_0),
        [n @ 1..=16] => Some(OP_1 + *n - 1),
        [0x81] => Some(OP_1NEGATE),
        _ => None,
    }
}

/// Split a script into opcodes and data pushes.
///
/// Pushes that have a one-opcode equivalent (empty, 1..=16, -1) come back as
/// that opcode, so `compile(decompile(s))` re-encodes pushes minimally.
pub fn decompile(script: &[u8]) -> Result<Vec<Instruction>, PbaasError> {
    read_instructions(script)
        .map_err(|e| PbaasError::InvalidScript(format!("truncated push data: {e}")))
}

fn read_instructions(script: &[u8]) -> Result<Vec<Instruction>, PbaasError> {
    let mut reader = BufferReader::new(script);
    let mut instructions = Vec::new();

    while !reader.is_exhausted() {
        let op = reader.read_u8()?;
        if op == OP_0 || op > OP_PUSHDATA4 {
            instructions.push(Instruction::Op(op));
            continue;
        }

        let len = match op {
            OP_PUSHDATA1 => usize::from(reader.read_u8()?),
            OP_PUSHDATA2 => usize::from(reader.read_u16()?),
            OP_PUSHDATA4 => reader.read_u32()? as usize,
            n => usize::from(n),
        };
        let data = reader.read_slice(len)?;

        instructions.push(match as_minimal_op(data) {
            Some(op) => Instruction::Op(op),
            None => Instruction::PushBytes(data.to_vec()),
        });
    }

    Ok(instructions)
}

/// Serialize instructions back into script bytes.
pub fn compile(instructions: &[Instruction]) -> Vec<u8> {
    let mut script = Vec::new();

    for instruction in instructions {
        match instruction {
            Instruction::Op(op) => script.push(*op),
            Instruction::PushBytes(data) => {
                if data.len() == 1 {
                    if let Some(op) = as_minimal_op(data) {
                        script.push(op);
                        continue;
                    }
                }
                push_data_prefix(&mut script, data.len());
                script.extend_from_slice(data);
            }
        }
    }

    script
}

fn push_data_prefix(script: &mut Vec<u8>, len: usize) {
    if len < usize::from(OP_PUSHDATA1) {
        script.push(len as u8);
    } else if len <= 0xFF {
        script.push(OP_PUSHDATA1);
        script.push(len as u8);
    } else if len <= 0xFFFF {
        script.push(OP_PUSHDATA2);
        script.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        script.push(OP_PUSHDATA4);
        script.extend_from_slice(&(len as u32).to_le_bytes());
    }
}

/// Remove every OP_CODESEPARATOR from a script.
pub fn strip_code_separators(script: &[u8]) -> Result<Vec<u8>, PbaasError> {
    let instructions: Vec<Instruction> = decompile(script)?
        .into_iter()
        .filter(|i| *i != Instruction::Op(OP_CODESEPARATOR))
        .collect();
    Ok(compile(&instructions))
}

/// Render a script as space-separated ASM.
///
/// Opcodes without a name render as `OP_UNKNOWN`, which `from_asm` rejects.
pub fn to_asm(script: &[u8]) -> Result<String, PbaasError> {
    let words: Vec<String> = decompile(script)?
        .iter()
        .map(|instruction| match instruction {
            Instruction::Op(op) => opcode_name(*op).unwrap_or("OP_UNKNOWN").to_string(),
            Instruction::PushBytes(data) => hex::encode(data),
        })
        .collect();
    Ok(words.join(" "))
}

/// Parse space-separated ASM (opcode names and hex pushes) into script bytes.
pub fn from_asm(asm: &str) -> Result<Vec<u8>, PbaasError> {
    let instructions = asm
        .split_whitespace()
        .map(|word| match opcode_from_name(word) {
            Some(op) => Ok(Instruction::Op(op)),
            None => hex::decode(word)
                .map(Instruction::PushBytes)
                .map_err(|e| PbaasError::InvalidScript(format!("bad ASM word {word:?}: {e}"))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(compile(&instructions))
}
