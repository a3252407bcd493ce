use crate::regs::ThreeBytes;

/// Instruction kinds of the documented 6502 set. `Invalid` covers every
/// opcode byte with no documented meaning.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InstKind {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    Invalid,
}

impl InstKind {
    /// Upper-case assembler mnemonic.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Adc => "ADC",
            Self::And => "AND",
            Self::Asl => "ASL",
            Self::Bcc => "BCC",
            Self::Bcs => "BCS",
            Self::Beq => "BEQ",
            Self::Bit => "BIT",
            Self::Bmi => "BMI",
            Self::Bne => "BNE",
            Self::Bpl => "BPL",
            Self::Brk => "BRK",
            Self::Bvc => "BVC",
            Self::Bvs => "BVS",
            Self::Clc => "CLC",
            Self::Cld => "CLD",
            Self::Cli => "CLI",
            Self::Clv => "CLV",
            Self::Cmp => "CMP",
            Self::Cpx => "CPX",
            Self::Cpy => "CPY",
            Self::Dec => "DEC",
            Self::Dex => "DEX",
            Self::Dey => "DEY",
            Self::Eor => "EOR",
            Self::Inc => "INC",
            Self::Inx => "INX",
            Self::Iny => "INY",
            Self::Jmp => "JMP",
            Self::Jsr => "JSR",
            Self::Lda => "LDA",
            Self::Ldx => "LDX",
            Self::Ldy => "LDY",
            Self::Lsr => "LSR",
            Self::Nop => "NOP",
            Self::Ora => "ORA",
            Self::Pha => "PHA",
            Self::Php => "PHP",
            Self::Pla => "PLA",
            Self::Plp => "PLP",
            Self::Rol => "ROL",
            Self::Ror => "ROR",
            Self::Rti => "RTI",
            Self::Rts => "RTS",
            Self::Sbc => "SBC",
            Self::Sec => "SEC",
            Self::Sed => "SED",
            Self::Sei => "SEI",
            Self::Sta => "STA",
            Self::Stx => "STX",
            Self::Sty => "STY",
            Self::Tax => "TAX",
            Self::Tay => "TAY",
            Self::Tsx => "TSX",
            Self::Txa => "TXA",
            Self::Txs => "TXS",
            Self::Tya => "TYA",
            Self::Invalid => "???",
        }
    }
}

/// Addressing modes. `None` is the mode of invalid opcodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AddrMode {
    Imp,
    Acc,
    Imm,
    Zpg,
    ZpgX,
    ZpgY,
    Rel,
    Abs,
    AbsX,
    AbsY,
    Ind,
    IndX,
    IndY,
    None,
}

impl AddrMode {
    /// Total instruction length in bytes for this mode. Invalid opcodes
    /// occupy a single byte.
    pub const fn inst_size(&self) -> u8 {
        match self {
            Self::Imp | Self::Acc | Self::None => 1,
            Self::Imm | Self::Zpg | Self::ZpgX | Self::ZpgY | Self::Rel | Self::IndX
            | Self::IndY => 2,
            Self::Abs | Self::AbsX | Self::AbsY | Self::Ind => 3,
        }
    }
}

/// Decoded opcode byte: kind and addressing mode only.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Opcode {
    pub kind: InstKind,
    pub mode: AddrMode,
}

/// Fully decoded instruction. For `Rel` the operand is the resolved branch
/// target, not the raw displacement.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Inst {
    pub kind: InstKind,
    pub mode: AddrMode,
    pub size: u8,
    pub operand: u16,
}

const fn op(kind: InstKind, mode: AddrMode) -> Opcode {
    Opcode { kind, mode }
}

const fn build_opcode_table() -> [Opcode; 256] {
    use AddrMode::*;
    use InstKind::*;

    let mut t = [op(Invalid, None); 256];

    t[0x69] = op(Adc, Imm);
    t[0x65] = op(Adc, Zpg);
    t[0x75] = op(Adc, ZpgX);
    t[0x6D] = op(Adc, Abs);
    t[0x7D] = op(Adc, AbsX);
    t[0x79] = op(Adc, AbsY);
    t[0x61] = op(Adc, IndX);
    t[0x71] = op(Adc, IndY);

    t[0x29] = op(And, Imm);
    t[0x25] = op(And, Zpg);
    t[0x35] = op(And, ZpgX);
    t[0x2D] = op(And, Abs);
    t[0x3D] = op(And, AbsX);
    t[0x39] = op(And, AbsY);
    t[0x21] = op(And, IndX);
    t[0x31] = op(And, IndY);

    t[0x0A] = op(Asl, Acc);
    t[0x06] = op(Asl, Zpg);
    t[0x16] = op(Asl, ZpgX);
    t[0x0E] = op(Asl, Abs);
    t[0x1E] = op(Asl, AbsX);

    t[0x90] = op(Bcc, Rel);
    t[0xB0] = op(Bcs, Rel);
    t[0xF0] = op(Beq, Rel);
    t[0x30] = op(Bmi, Rel);
    t[0xD0] = op(Bne, Rel);
    t[0x10] = op(Bpl, Rel);
    t[0x50] = op(Bvc, Rel);
    t[0x70] = op(Bvs, Rel);

    t[0x24] = op(Bit, Zpg);
    t[0x2C] = op(Bit, Abs);

    t[0x00] = op(Brk, Imp);

    t[0x18] = op(Clc, Imp);
    t[0xD8] = op(Cld, Imp);
    t[0x58] = op(Cli, Imp);
    t[0xB8] = op(Clv, Imp);

    t[0xC9] = op(Cmp, Imm);
    t[0xC5] = op(Cmp, Zpg);
    t[0xD5] = op(Cmp, ZpgX);
    t[0xCD] = op(Cmp, Abs);
    t[0xDD] = op(Cmp, AbsX);
    t[0xD9] = op(Cmp, AbsY);
    t[0xC1] = op(Cmp, IndX);
    t[0xD1] = op(Cmp, IndY);

    t[0xE0] = op(Cpx, Imm);
    t[0xE4] = op(Cpx, Zpg);
    t[0xEC] = op(Cpx, Abs);

    t[0xC0] = op(Cpy, Imm);
    t[0xC4] = op(Cpy, Zpg);
    t[0xCC] = op(Cpy, Abs);

    t[0xC6] = op(Dec, Zpg);
    t[0xD6] = op(Dec, ZpgX);
    t[0xCE] = op(Dec, Abs);
    t[0xDE] = op(Dec, AbsX);

    t[0xCA] = op(Dex, Imp);
    t[0x88] = op(Dey, Imp);

    t[0x49] = op(Eor, Imm);
    t[0x45] = op(Eor, Zpg);
    t[0x55] = op(Eor, ZpgX);
    t[0x4D] = op(Eor, Abs);
    t[0x5D] = op(Eor, AbsX);
    t[0x59] = op(Eor, AbsY);
    t[0x41] = op(Eor, IndX);
    t[0x51] = op(Eor, IndY);

    t[0xE6] = op(Inc, Zpg);
    t[0xF6] = op(Inc, ZpgX);
    t[0xEE] = op(Inc, Abs);
    t[0xFE] = op(Inc, AbsX);

    t[0xE8] = op(Inx, Imp);
    t[0xC8] = op(Iny, Imp);

    t[0x4C] = op(Jmp, Abs);
    t[0x6C] = op(Jmp, Ind);
    t[0x20] = op(Jsr, Abs);

    t[0xA9] = op(Lda, Imm);
    t[0xA5] = op(Lda, Zpg);
    t[0xB5] = op(Lda, ZpgX);
    t[0xAD] = op(Lda, Abs);
    t[0xBD] = op(Lda, AbsX);
    t[0xB9] = op(Lda, AbsY);
    t[0xA1] = op(Lda, IndX);
    t[0xB1] = op(Lda, IndY);

    t[0xA2] = op(Ldx, Imm);
    t[0xA6] = op(Ldx, Zpg);
    t[0xB6] = op(Ldx, ZpgY);
    t[0xAE] = op(Ldx, Abs);
    t[0xBE] = op(Ldx, AbsY);

    t[0xA0] = op(Ldy, Imm);
    t[0xA4] = op(Ldy, Zpg);
    t[0xB4] = op(Ldy, ZpgX);
    t[0xAC] = op(Ldy, Abs);
    t[0xBC] = op(Ldy, AbsX);

    t[0x4A] = op(Lsr, Acc);
    t[0x46] = op(Lsr, Zpg);
    t[0x56] = op(Lsr, ZpgX);
    t[0x4E] = op(Lsr, Abs);
    t[0x5E] = op(Lsr, AbsX);

    t[0xEA] = op(Nop, Imp);

    t[0x09] = op(Ora, Imm);
    t[0x05] = op(Ora, Zpg);
    t[0x15] = op(Ora, ZpgX);
    t[0x0D] = op(Ora, Abs);
    t[0x1D] = op(Ora, AbsX);
    t[0x19] = op(Ora, AbsY);
    t[0x01] = op(Ora, IndX);
    t[0x11] = op(Ora, IndY);

    t[0x48] = op(Pha, Imp);
    t[0x08] = op(Php, Imp);
    t[0x68] = op(Pla, Imp);
    t[0x28] = op(Plp, Imp);

    t[0x2A] = op(Rol, Acc);
    t[0x26] = op(Rol, Zpg);
    t[0x36] = op(Rol, ZpgX);
    t[0x2E] = op(Rol, Abs);
    t[0x3E] = op(Rol, AbsX);

    t[0x6A] = op(Ror, Acc);
    t[0x66] = op(Ror, Zpg);
    t[0x76] = op(Ror, ZpgX);
    t[0x6E] = op(Ror, Abs);
    t[0x7E] = op(Ror, AbsX);

    t[0x40] = op(Rti, Imp);
    t[0x60] = op(Rts, Imp);

    t[0xE9] = op(Sbc, Imm);
    t[0xE5] = op(Sbc, Zpg);
    t[0xF5] = op(Sbc, ZpgX);
    t[0xED] = op(Sbc, Abs);
    t[0xFD] = op(Sbc, AbsX);
    t[0xF9] = op(Sbc, AbsY);
    t[0xE1] = op(Sbc, IndX);
    t[0xF1] = op(Sbc, IndY);

    t[0x38] = op(Sec, Imp);
    t[0xF8] = op(Sed, Imp);
    t[0x78] = op(Sei, Imp);

    t[0x85] = op(Sta, Zpg);
    t[0x95] = op(Sta, ZpgX);
    t[0x8D] = op(Sta, Abs);
    t[0x9D] = op(Sta, AbsX);
    t[0x99] = op(Sta, AbsY);
    t[0x81] = op(Sta, IndX);
    t[0x91] = op(Sta, IndY);

    t[0x86] = op(Stx, Zpg);
    t[0x96] = op(Stx, ZpgY);
    t[0x8E] = op(Stx, Abs);

    t[0x84] = op(Sty, Zpg);
    t[0x94] = op(Sty, ZpgX);
    t[0x8C] = op(Sty, Abs);

    t[0xAA] = op(Tax, Imp);
    t[0xA8] = op(Tay, Imp);
    t[0xBA] = op(Tsx, Imp);
    t[0x8A] = op(Txa, Imp);
    t[0x9A] = op(Txs, Imp);
    t[0x98] = op(Tya, Imp);

    t
}

static OPCODES: [Opcode; 256] = build_opcode_table();

/// Classifies a single opcode byte without touching the operand bytes.
#[inline]
pub fn decode_opcode(byte: u8) -> Opcode {
    OPCODES[byte as usize]
}

/// Decodes the instruction at `pc` from its raw bytes.
///
/// The operand is the little-endian literal for two- and three-byte
/// instructions, except for relative branches where it is the resolved
/// target address (mod 2^16).
pub fn decode_inst(pc: u16, bytes: ThreeBytes) -> Inst {
    let opc = decode_opcode(bytes.0[0]);
    let size = opc.mode.inst_size();
    let operand = match opc.mode {
        AddrMode::Rel => pc
            .wrapping_add(2)
            .wrapping_add(bytes.0[1] as i8 as u16),
        _ => match size {
            2 => bytes.0[1] as u16,
            3 => u16::from_le_bytes([bytes.0[1], bytes.0[2]]),
            _ => 0,
        },
    };
    Inst {
        kind: opc.kind,
        mode: opc.mode,
        size,
        operand,
    }
}

/// True for instructions that can transfer control to their operand:
/// the eight conditional branches, `JMP` and `JSR`.
pub fn inst_is_branch(kind: InstKind, mode: AddrMode) -> bool {
    matches!(kind, InstKind::Jmp | InstKind::Jsr) || mode == AddrMode::Rel
}

/// True for instructions that store to their effective address in the
/// ordinary way: the store group and the read-modify-write group operating
/// on memory. Stack pushes and interrupt pushes are not "normal" writes.
pub fn inst_writes_mem_normal(kind: InstKind, mode: AddrMode) -> bool {
    let writes = matches!(
        kind,
        InstKind::Sta
            | InstKind::Stx
            | InstKind::Sty
            | InstKind::Asl
            | InstKind::Lsr
            | InstKind::Rol
            | InstKind::Ror
            | InstKind::Inc
            | InstKind::Dec
    );
    writes && !matches!(mode, AddrMode::Acc | AddrMode::Imp | AddrMode::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_opcode_count() {
        let documented = OPCODES
            .iter()
            .filter(|o| o.kind != InstKind::Invalid)
            .count();
        assert_eq!(documented, 151);
    }

    #[test]
    fn decode_spot_checks() {
        assert_eq!(decode_opcode(0xA9), op(InstKind::Lda, AddrMode::Imm));
        assert_eq!(decode_opcode(0x8D), op(InstKind::Sta, AddrMode::Abs));
        assert_eq!(decode_opcode(0x6C), op(InstKind::Jmp, AddrMode::Ind));
        assert_eq!(decode_opcode(0x96), op(InstKind::Stx, AddrMode::ZpgY));
        assert_eq!(decode_opcode(0x02), op(InstKind::Invalid, AddrMode::None));
    }

    #[test]
    fn decode_inst_sizes_and_operands() {
        let i = decode_inst(0x1000, ThreeBytes([0xA9, 0x42, 0xFF]));
        assert_eq!((i.kind, i.size, i.operand), (InstKind::Lda, 2, 0x42));

        let i = decode_inst(0x1000, ThreeBytes([0x4C, 0x34, 0x12]));
        assert_eq!((i.kind, i.size, i.operand), (InstKind::Jmp, 3, 0x1234));

        let i = decode_inst(0x1000, ThreeBytes([0xEA, 0x00, 0x00]));
        assert_eq!((i.kind, i.size, i.operand), (InstKind::Nop, 1, 0));
    }

    #[test]
    fn relative_operand_is_resolved_target() {
        // BNE -2 at 0x2000 branches to 0x2000.
        let i = decode_inst(0x2000, ThreeBytes([0xD0, 0xFE, 0x00]));
        assert_eq!(i.operand, 0x2000);
        // BEQ +5 at 0x2000 branches to 0x2007.
        let i = decode_inst(0x2000, ThreeBytes([0xF0, 0x05, 0x00]));
        assert_eq!(i.operand, 0x2007);
        // Wraps around the top of the address space.
        let i = decode_inst(0xFFFE, ThreeBytes([0xD0, 0x10, 0x00]));
        assert_eq!(i.operand, 0x0010);
    }

    #[test]
    fn branch_predicate() {
        assert!(inst_is_branch(InstKind::Bne, AddrMode::Rel));
        assert!(inst_is_branch(InstKind::Jmp, AddrMode::Abs));
        assert!(inst_is_branch(InstKind::Jmp, AddrMode::Ind));
        assert!(inst_is_branch(InstKind::Jsr, AddrMode::Abs));
        assert!(!inst_is_branch(InstKind::Rts, AddrMode::Imp));
        assert!(!inst_is_branch(InstKind::Lda, AddrMode::Abs));
    }

    #[test]
    fn write_predicate() {
        assert!(inst_writes_mem_normal(InstKind::Sta, AddrMode::Abs));
        assert!(inst_writes_mem_normal(InstKind::Inc, AddrMode::Zpg));
        assert!(!inst_writes_mem_normal(InstKind::Asl, AddrMode::Acc));
        assert!(!inst_writes_mem_normal(InstKind::Pha, AddrMode::Imp));
        assert!(!inst_writes_mem_normal(InstKind::Lda, AddrMode::Abs));
    }
}
