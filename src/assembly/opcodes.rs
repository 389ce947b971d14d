//! CIL opcode byte constants (ECMA-335).
//!
//! Raw byte values for the opcodes the patch engine inspects or emits. Single-byte
//! opcodes are named after their mnemonic (e.g. [`CALL`] = `0x28`). Two-byte opcodes
//! that use the `0xFE` prefix store their second byte with an `FE_` prefix; the shared
//! first byte is [`FE_PREFIX`].
//!
//! The full per-opcode stack/flow classification lives in
//! [`crate::assembly::instruction::op_spec`]; this module only names the bytes that
//! other code refers to directly.
#![allow(missing_docs)]

// Misc
pub const NOP: u8 = 0x00;

// Load/store local/argument (short form)
pub const LDARG_S: u8 = 0x0E;
pub const STARG_S: u8 = 0x10;
pub const LDLOC_S: u8 = 0x11;
pub const STLOC_S: u8 = 0x13;

// Constant loaders
pub const LDNULL: u8 = 0x14;
pub const LDC_I4: u8 = 0x20;

// Stack manipulation
pub const DUP: u8 = 0x25;
pub const POP: u8 = 0x26;

// Call / return
pub const JMP: u8 = 0x27;
pub const CALL: u8 = 0x28;
pub const CALLI: u8 = 0x29;
pub const RET: u8 = 0x2A;

// Branches (short and long form)
pub const BR_S: u8 = 0x2B;
pub const BRFALSE_S: u8 = 0x2C;
pub const BRTRUE_S: u8 = 0x2D;
pub const BR: u8 = 0x38;
pub const BRFALSE: u8 = 0x39;
pub const BRTRUE: u8 = 0x3A;

// Switch
pub const SWITCH: u8 = 0x45;

// Object model
pub const CALLVIRT: u8 = 0x6F;
pub const LDSTR: u8 = 0x72;
pub const NEWOBJ: u8 = 0x73;
pub const THROW: u8 = 0x7A;
pub const LDFLD: u8 = 0x7B;
pub const STFLD: u8 = 0x7D;
pub const LDSFLD: u8 = 0x7E;
pub const STSFLD: u8 = 0x80;

// Exception handling
pub const ENDFINALLY: u8 = 0xDC;
pub const LEAVE: u8 = 0xDD;
pub const LEAVE_S: u8 = 0xDE;

// Two-byte opcodes (second byte after 0xFE)
pub const FE_PREFIX: u8 = 0xFE;
pub const FE_CEQ: u8 = 0x01;
pub const FE_LDLOC: u8 = 0x0C;
pub const FE_STLOC: u8 = 0x0E;
pub const FE_ENDFILTER: u8 = 0x11;
pub const FE_RETHROW: u8 = 0x1A;
