use crate::decode::{AddrMode, Inst};
use crate::regs::ThreeBytes;

/// Text pieces of a formatted instruction. Kept separate so callers control
/// column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedInst {
    pub bytes: String,
    pub inst: String,
    pub operand: String,
}

/// Formats an instruction with raw numeric operands.
pub fn format_inst(inst: Inst, bytes: ThreeBytes) -> FormattedInst {
    format_impl(inst, bytes, None)
}

/// Formats an instruction, substituting known symbol names for absolute and
/// relative operand addresses.
pub fn format_inst_with_symbols(
    inst: Inst,
    bytes: ThreeBytes,
    resolver: fn(u16) -> Option<&'static str>,
) -> FormattedInst {
    format_impl(inst, bytes, Some(resolver))
}

fn format_impl(
    inst: Inst,
    bytes: ThreeBytes,
    resolver: Option<fn(u16) -> Option<&'static str>>,
) -> FormattedInst {
    let mut dump = String::new();
    for i in 0..inst.size as usize {
        if i != 0 {
            dump.push(' ');
        }
        dump.push_str(&format!("{:02X}", bytes.0[i]));
    }

    // Absolute-class operands go through the resolver when one is supplied.
    let addr = |a: u16| -> String {
        resolver
            .and_then(|r| r(a))
            .map(str::to_owned)
            .unwrap_or_else(|| format!("${:04X}", a))
    };

    let operand = match inst.mode {
        AddrMode::Imp | AddrMode::None => String::new(),
        AddrMode::Acc => "A".to_owned(),
        AddrMode::Imm => format!("#${:02X}", bytes.0[1]),
        AddrMode::Zpg => format!("${:02X}", bytes.0[1]),
        AddrMode::ZpgX => format!("${:02X},X", bytes.0[1]),
        AddrMode::ZpgY => format!("${:02X},Y", bytes.0[1]),
        AddrMode::Rel | AddrMode::Abs => addr(inst.operand),
        AddrMode::AbsX => format!("{},X", addr(inst.operand)),
        AddrMode::AbsY => format!("{},Y", addr(inst.operand)),
        AddrMode::Ind => format!("(${:04X})", inst.operand),
        AddrMode::IndX => format!("(${:02X},X)", bytes.0[1]),
        AddrMode::IndY => format!("(${:02X}),Y", bytes.0[1]),
    };

    FormattedInst {
        bytes: dump,
        inst: inst.kind.mnemonic().to_owned(),
        operand,
    }
}
