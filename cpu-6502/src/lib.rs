//! Instruction-level model of the MOS 6502 as found in the Apple II:
//! register snapshots, a decoder over the documented opcode set, the
//! canonical text formatter, and the Apple II ROM symbol table.

pub mod decode;
pub mod format;
pub mod regs;
pub mod symbols;

pub use decode::{
    decode_inst, decode_opcode, inst_is_branch, inst_writes_mem_normal, AddrMode, Inst, InstKind,
    Opcode,
};
pub use format::{format_inst, format_inst_with_symbols, FormattedInst};
pub use regs::{Regs, ThreeBytes};
pub use symbols::find_apple2_symbol;
