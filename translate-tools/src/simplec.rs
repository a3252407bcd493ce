use std::io::{self, Write};

use hashbrown::HashMap;

use cpu_6502::{find_apple2_symbol, format_inst, inst_is_branch, AddrMode, Inst, InstKind};
use translate_ir::{post_order, BlockId, Forward, Function};

use crate::discover::{inst_at, peek3, Discovery};

/// A basic block of discovered code: the half-open address range
/// `[start, end)` of its instructions.
struct BlockInfo {
    start: u16,
    end: usize,
}

/// Emits a self-contained C99 translation of the discovered code.
///
/// Each basic block becomes a `case` of a `switch (pc)` dispatch loop over a
/// small fixed runtime (RAM array, register variables, flag variables and
/// stack helpers). Decimal mode and interrupts are not modeled; calls into
/// ROM become `rom_call` stubs.
pub fn emit_simple_c(out: &mut dyn Write, image: &[u8], disc: &Discovery) -> io::Result<()> {
    let (func, blocks, entry) = build_cfg(image, disc);

    emit_prelude(out, image, disc)?;

    writeln!(out, "void run(void) {{")?;
    writeln!(out, "    uint16_t pc = 0x{:04X};", disc.start)?;
    writeln!(out, "    for (;;) {{")?;
    writeln!(out, "        switch (pc) {{")?;

    // Reverse post-order keeps a block's translation close to the blocks
    // that jump to it.
    let mut order = post_order::<Forward>(&func, entry);
    order.reverse();
    for id in order {
        emit_block(out, image, disc, &blocks[id.0 as usize])?;
    }

    writeln!(out, "        default:")?;
    writeln!(
        out,
        "            fprintf(stderr, \"pc outside translated code: %04X\\n\", pc);"
    )?;
    writeln!(out, "            return;")?;
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    writeln!(out, "int main(void) {{")?;
    writeln!(out, "    memcpy(ram + 0x{:04X}, image, sizeof image);", disc.start)?;
    writeln!(out, "    run();")?;
    writeln!(out, "    return 0;")?;
    writeln!(out, "}}")?;
    Ok(())
}

/// Splits the discovered instructions into basic blocks and wires the
/// control-flow edges.
fn build_cfg(image: &[u8], disc: &Discovery) -> (Function, Vec<BlockInfo>, Option<BlockId>) {
    let start = disc.start;

    // Block leaders: the load address, every in-image branch target, and
    // every instruction following a control transfer.
    let mut leaders = vec![start];
    leaders.extend(disc.branch_targets.iter().copied());
    let mut at = start as usize;
    while at < disc.end() {
        if !disc.starts.get(at) {
            at += 1;
            continue;
        }
        let inst = inst_at(start, image, at as u16);
        let next = at + inst.size as usize;
        if is_block_end(&inst) && next < disc.end() && disc.starts.get(next) {
            leaders.push(next as u16);
        }
        at = next;
    }
    leaders.sort_unstable();
    leaders.dedup();
    leaders.retain(|&l| disc.starts.get(l as usize));

    let mut func = Function::new();
    let mut blocks = Vec::new();
    let mut by_addr = HashMap::new();
    for (i, &leader) in leaders.iter().enumerate() {
        let id = func.add_block();
        let end = leaders
            .get(i + 1)
            .map(|&n| n as usize)
            .unwrap_or_else(|| block_end_from(image, disc, leader));
        blocks.push(BlockInfo { start: leader, end });
        by_addr.insert(leader, id);
    }

    for (i, block) in blocks.iter().enumerate() {
        let id = BlockId(i as u32);
        let Some(last) = last_inst(image, disc, block) else {
            continue;
        };
        let next = block.end as u16;

        if inst_is_branch(last.kind, last.mode) {
            if let Some(&target) = by_addr.get(&last.operand) {
                func.add_edge(id, target);
            }
            // Everything except an unconditional jump also falls through.
            if last.kind != InstKind::Jmp {
                if let Some(&fall) = by_addr.get(&next) {
                    func.add_edge(id, fall);
                }
            }
        } else if !is_block_end(&last) {
            if let Some(&fall) = by_addr.get(&next) {
                func.add_edge(id, fall);
            }
        }
    }

    let entry = by_addr.get(&start).copied();
    (func, blocks, entry)
}

/// True when no execution continues past the instruction.
fn is_block_end(inst: &Inst) -> bool {
    inst_is_branch(inst.kind, inst.mode)
        || matches!(
            inst.kind,
            InstKind::Rts | InstKind::Rti | InstKind::Brk
        )
}

fn last_inst(image: &[u8], disc: &Discovery, block: &BlockInfo) -> Option<Inst> {
    let mut at = block.start as usize;
    let mut last = None;
    while at < block.end && disc.starts.get(at) {
        let inst = inst_at(disc.start, image, at as u16);
        at += inst.size as usize;
        last = Some(inst);
    }
    last
}

fn block_end_from(image: &[u8], disc: &Discovery, leader: u16) -> usize {
    let mut at = leader as usize;
    while at < disc.end() && disc.starts.get(at) {
        let inst = inst_at(disc.start, image, at as u16);
        at += inst.size as usize;
        if is_block_end(&inst) {
            break;
        }
    }
    at
}

fn emit_prelude(out: &mut dyn Write, image: &[u8], disc: &Discovery) -> io::Result<()> {
    writeln!(out, "/* Translated from a DOS 3.3 binary loaded at 0x{:04X}. */", disc.start)?;
    writeln!(out, "#include <stdint.h>")?;
    writeln!(out, "#include <stdio.h>")?;
    writeln!(out, "#include <string.h>")?;
    writeln!(out)?;
    writeln!(out, "static uint8_t ram[0x10000];")?;
    writeln!(out, "static uint8_t a, x, y;")?;
    writeln!(out, "static uint8_t sp = 0xFF;")?;
    writeln!(out, "static uint8_t flag_n, flag_v, flag_z, flag_c;")?;
    writeln!(out)?;

    write!(out, "static const uint8_t image[] = {{")?;
    for (i, byte) in image.iter().enumerate() {
        if i % 12 == 0 {
            write!(out, "\n    ")?;
        }
        write!(out, "0x{:02X},", byte)?;
    }
    writeln!(out, "\n}};")?;
    writeln!(out)?;

    writeln!(out, "static uint8_t peek(uint16_t addr) {{ return ram[addr]; }}")?;
    writeln!(
        out,
        "static uint16_t peek16(uint16_t addr) {{ return ram[addr] | (ram[(uint16_t)(addr + 1)] << 8); }}"
    )?;
    writeln!(out, "static void poke(uint16_t addr, uint8_t v) {{ ram[addr] = v; }}")?;
    writeln!(out, "static void set_nz(uint8_t v) {{ flag_z = v == 0; flag_n = v >> 7; }}")?;
    writeln!(out, "static void push8(uint8_t v) {{ ram[0x100 + sp--] = v; }}")?;
    writeln!(out, "static uint8_t pull8(void) {{ return ram[0x100 + ++sp]; }}")?;
    writeln!(
        out,
        "static void push16(uint16_t v) {{ push8(v >> 8); push8(v & 0xFF); }}"
    )?;
    writeln!(
        out,
        "static uint16_t pull16(void) {{ uint16_t lo = pull8(); return lo | (pull8() << 8); }}"
    )?;
    writeln!(
        out,
        "static void rom_call(uint16_t addr) {{ (void)addr; /* ROM routine outside the image */ }}"
    )?;
    writeln!(out)?;
    Ok(())
}

fn emit_block(
    out: &mut dyn Write,
    image: &[u8],
    disc: &Discovery,
    block: &BlockInfo,
) -> io::Result<()> {
    writeln!(out, "        case 0x{:04X}:", block.start)?;

    let start = disc.start;
    let mut at = block.start as usize;
    while at < block.end && disc.starts.get(at) {
        let pc = at as u16;
        let inst = inst_at(start, image, pc);
        let bytes = peek3(start, image, pc);
        let fmt = format_inst(inst, bytes);
        let asm = if fmt.operand.is_empty() {
            fmt.inst.clone()
        } else {
            format!("{} {}", fmt.inst, fmt.operand)
        };

        for stmt in translate_inst(&inst, disc, pc) {
            writeln!(out, "            {} /* {:04X}: {} */", stmt, pc, asm)?;
        }
        at += inst.size as usize;
    }

    // The fall-through successor is dispatched explicitly: blocks are not
    // emitted in address order. Jumps, returns and in-image subroutine calls
    // already dispatched above.
    let needs_fallthrough = match last_inst(image, disc, block) {
        Some(last) if last.mode == AddrMode::Rel => true,
        Some(last) if last.kind == InstKind::Jsr => !disc.contains(last.operand),
        Some(last) if is_block_end(&last) => false,
        Some(_) => true,
        None => false,
    };
    if needs_fallthrough {
        writeln!(out, "            pc = 0x{:04X}; break;", block.end as u16)?;
    }
    Ok(())
}

/// C address expression for the instruction's effective address.
fn addr_expr(inst: &Inst) -> String {
    match inst.mode {
        AddrMode::Zpg => format!("0x{:02X}", inst.operand),
        AddrMode::ZpgX => format!("(uint8_t)(0x{:02X} + x)", inst.operand),
        AddrMode::ZpgY => format!("(uint8_t)(0x{:02X} + y)", inst.operand),
        AddrMode::Abs => format!("0x{:04X}", inst.operand),
        AddrMode::AbsX => format!("(uint16_t)(0x{:04X} + x)", inst.operand),
        AddrMode::AbsY => format!("(uint16_t)(0x{:04X} + y)", inst.operand),
        AddrMode::Ind => format!("peek16(0x{:04X})", inst.operand),
        AddrMode::IndX => format!("peek16((uint8_t)(0x{:02X} + x))", inst.operand),
        AddrMode::IndY => format!("(uint16_t)(peek16(0x{:02X}) + y)", inst.operand),
        _ => "0".to_owned(),
    }
}

/// C value expression for the instruction's operand.
fn value_expr(inst: &Inst) -> String {
    match inst.mode {
        AddrMode::Imm => format!("0x{:02X}", inst.operand),
        _ => format!("peek({})", addr_expr(inst)),
    }
}

fn branch_condition(kind: InstKind) -> &'static str {
    match kind {
        InstKind::Beq => "flag_z",
        InstKind::Bne => "!flag_z",
        InstKind::Bcs => "flag_c",
        InstKind::Bcc => "!flag_c",
        InstKind::Bmi => "flag_n",
        InstKind::Bpl => "!flag_n",
        InstKind::Bvs => "flag_v",
        InstKind::Bvc => "!flag_v",
        _ => unreachable!("not a conditional branch"),
    }
}

/// One or more C statements implementing the instruction.
fn translate_inst(inst: &Inst, disc: &Discovery, pc: u16) -> Vec<String> {
    use InstKind::*;

    let v = value_expr(inst);
    let ea = addr_expr(inst);

    let stmt = match inst.kind {
        Lda => format!("a = {v}; set_nz(a);"),
        Ldx => format!("x = {v}; set_nz(x);"),
        Ldy => format!("y = {v}; set_nz(y);"),
        Sta => format!("poke({ea}, a);"),
        Stx => format!("poke({ea}, x);"),
        Sty => format!("poke({ea}, y);"),

        Tax => "x = a; set_nz(x);".to_owned(),
        Tay => "y = a; set_nz(y);".to_owned(),
        Txa => "a = x; set_nz(a);".to_owned(),
        Tya => "a = y; set_nz(a);".to_owned(),
        Tsx => "x = sp; set_nz(x);".to_owned(),
        Txs => "sp = x;".to_owned(),

        Inx => "x++; set_nz(x);".to_owned(),
        Iny => "y++; set_nz(y);".to_owned(),
        Dex => "x--; set_nz(x);".to_owned(),
        Dey => "y--; set_nz(y);".to_owned(),
        Inc => format!("{{ uint8_t t = (uint8_t)(peek({ea}) + 1); poke({ea}, t); set_nz(t); }}"),
        Dec => format!("{{ uint8_t t = (uint8_t)(peek({ea}) - 1); poke({ea}, t); set_nz(t); }}"),

        Adc => format!(
            "{{ uint8_t m = {v}; uint16_t t = a + m + flag_c; \
             flag_v = (~(a ^ m) & (a ^ t) & 0x80) != 0; flag_c = t > 0xFF; \
             a = (uint8_t)t; set_nz(a); }}"
        ),
        Sbc => format!(
            "{{ uint8_t m = {v} ^ 0xFF; uint16_t t = a + m + flag_c; \
             flag_v = (~(a ^ m) & (a ^ t) & 0x80) != 0; flag_c = t > 0xFF; \
             a = (uint8_t)t; set_nz(a); }}"
        ),
        And => format!("a &= {v}; set_nz(a);"),
        Ora => format!("a |= {v}; set_nz(a);"),
        Eor => format!("a ^= {v}; set_nz(a);"),
        Cmp => format!("{{ uint8_t m = {v}; flag_c = a >= m; set_nz((uint8_t)(a - m)); }}"),
        Cpx => format!("{{ uint8_t m = {v}; flag_c = x >= m; set_nz((uint8_t)(x - m)); }}"),
        Cpy => format!("{{ uint8_t m = {v}; flag_c = y >= m; set_nz((uint8_t)(y - m)); }}"),
        Bit => format!(
            "{{ uint8_t m = {v}; flag_z = (a & m) == 0; flag_n = m >> 7; flag_v = (m >> 6) & 1; }}"
        ),

        Asl if inst.mode == AddrMode::Acc => "flag_c = a >> 7; a <<= 1; set_nz(a);".to_owned(),
        Asl => format!(
            "{{ uint8_t t = peek({ea}); flag_c = t >> 7; t <<= 1; poke({ea}, t); set_nz(t); }}"
        ),
        Lsr if inst.mode == AddrMode::Acc => "flag_c = a & 1; a >>= 1; set_nz(a);".to_owned(),
        Lsr => format!(
            "{{ uint8_t t = peek({ea}); flag_c = t & 1; t >>= 1; poke({ea}, t); set_nz(t); }}"
        ),
        Rol if inst.mode == AddrMode::Acc => {
            "{ uint8_t c = flag_c; flag_c = a >> 7; a = (uint8_t)(a << 1) | c; set_nz(a); }"
                .to_owned()
        }
        Rol => format!(
            "{{ uint8_t t = peek({ea}); uint8_t c = flag_c; flag_c = t >> 7; \
             t = (uint8_t)(t << 1) | c; poke({ea}, t); set_nz(t); }}"
        ),
        Ror if inst.mode == AddrMode::Acc => {
            "{ uint8_t c = flag_c; flag_c = a & 1; a = (a >> 1) | (c << 7); set_nz(a); }"
                .to_owned()
        }
        Ror => format!(
            "{{ uint8_t t = peek({ea}); uint8_t c = flag_c; flag_c = t & 1; \
             t = (t >> 1) | (c << 7); poke({ea}, t); set_nz(t); }}"
        ),

        Pha => "push8(a);".to_owned(),
        Pla => "a = pull8(); set_nz(a);".to_owned(),
        Php => "push8((flag_n << 7) | (flag_v << 6) | 0x30 | (flag_z << 1) | flag_c);".to_owned(),
        Plp => "{ uint8_t t = pull8(); flag_n = t >> 7; flag_v = (t >> 6) & 1; \
                flag_z = (t >> 1) & 1; flag_c = t & 1; }"
            .to_owned(),

        Clc => "flag_c = 0;".to_owned(),
        Sec => "flag_c = 1;".to_owned(),
        Clv => "flag_v = 0;".to_owned(),
        // Interrupt and decimal state are not part of the runtime model.
        Cli | Sei | Cld | Sed => format!("; /* {} */", inst.kind.mnemonic()),
        Nop => ";".to_owned(),

        Brk | Rti => "return;".to_owned(),
        Rts => "pc = (uint16_t)(pull16() + 1); break;".to_owned(),

        Jmp if inst.mode == AddrMode::Ind => {
            return vec![format!("pc = peek16(0x{:04X}); break;", inst.operand)];
        }
        Jmp => return vec![jump_stmt(inst.operand, disc)],
        Jsr => {
            let ret = pc.wrapping_add(3);
            if disc.contains(inst.operand) {
                return vec![format!(
                    "push16(0x{:04X}); pc = 0x{:04X}; break;",
                    ret.wrapping_sub(1),
                    inst.operand
                )];
            }
            return vec![rom_call_stmt(inst.operand)];
        }

        Bcc | Bcs | Beq | Bmi | Bne | Bpl | Bvc | Bvs => {
            let cond = branch_condition(inst.kind);
            if disc.contains(inst.operand) {
                return vec![format!(
                    "if ({cond}) {{ pc = 0x{:04X}; break; }}",
                    inst.operand
                )];
            }
            return vec![format!(
                "if ({cond}) {{ rom_call(0x{:04X}); return; }}",
                inst.operand
            )];
        }

        Invalid => "; /* invalid opcode */".to_owned(),
    };

    vec![stmt]
}

fn jump_stmt(target: u16, disc: &Discovery) -> String {
    if disc.contains(target) {
        format!("pc = 0x{:04X}; break;", target)
    } else {
        format!("{} return;", rom_call_stmt(target))
    }
}

fn rom_call_stmt(target: u16) -> String {
    match find_apple2_symbol(target) {
        Some(name) => format!("rom_call(0x{:04X}); /* {} */", target, name),
        None => format!("rom_call(0x{:04X});", target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::discover;

    fn emit(start: u16, image: &[u8]) -> String {
        let disc = discover(start, image);
        let mut out = Vec::new();
        emit_simple_c(&mut out, image, &disc).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn blocks_become_cases() {
        // 0800: LDA #$00 / STA $0300 / JSR $FDED / BNE $0802 / RTS
        let image = [0xA9, 0x00, 0x8D, 0x00, 0x03, 0x20, 0xED, 0xFD, 0xD0, 0xF8, 0x60];
        let text = emit(0x0800, &image);

        assert!(text.contains("case 0x0800:"), "{text}");
        assert!(text.contains("case 0x0802:"), "{text}");
        assert!(text.contains("rom_call(0xFDED); /* COUT */"), "{text}");
        assert!(text.contains("if (!flag_z) { pc = 0x0802; break; }"), "{text}");
        assert!(text.contains("pc = (uint16_t)(pull16() + 1); break;"), "{text}");
        assert!(text.contains("int main(void)"), "{text}");
    }

    #[test]
    fn loop_jump_dispatches_to_its_block() {
        // 0800: INX / JMP $0800
        let image = [0xE8, 0x4C, 0x00, 0x08];
        let text = emit(0x0800, &image);
        assert!(text.contains("pc = 0x0800; break;"), "{text}");
        assert!(text.contains("x++; set_nz(x);"), "{text}");
    }
}
