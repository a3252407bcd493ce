use std::io::{self, Write};

use cpu_6502::{find_apple2_symbol, format_inst_with_symbols, inst_is_branch, AddrMode};

use crate::discover::{inst_at, peek3, Discovery};

/// Prints the annotated assembly listing: discovered instructions with
/// labels for in-image branch targets, symbol names for ROM targets, and
/// `.byte` directives for everything unreachable.
pub fn print_listing(out: &mut dyn Write, image: &[u8], disc: &Discovery) -> io::Result<()> {
    let start = disc.start;
    let mut at = start as usize;

    while at < disc.end() {
        let pc = at as u16;

        if disc.starts.get(at) {
            if disc.branch_targets.contains(&pc) {
                writeln!(out, "L{:04X}:", pc)?;
            }

            let inst = inst_at(start, image, pc);
            let mut fmt = format_inst_with_symbols(inst, peek3(start, image, pc), find_apple2_symbol);
            // Branches to discovered code use the local label instead of a
            // bare address.
            if inst_is_branch(inst.kind, inst.mode)
                && inst.mode != AddrMode::Ind
                && disc.branch_targets.contains(&inst.operand)
            {
                fmt.operand = format!("L{:04X}", inst.operand);
            }

            if fmt.operand.is_empty() {
                writeln!(out, "    {:04X}: {:<8}  {}", pc, fmt.bytes, fmt.inst)?;
            } else {
                writeln!(out, "    {:04X}: {:<8}  {}  {}", pc, fmt.bytes, fmt.inst, fmt.operand)?;
            }
            at += inst.size as usize;
            continue;
        }

        // A data run: everything up to the next instruction start, eight
        // bytes to a line.
        let mut run_end = at;
        while run_end < disc.end() && !disc.starts.get(run_end) {
            run_end += 1;
        }
        for chunk_start in (at..run_end).step_by(8) {
            let chunk_end = (chunk_start + 8).min(run_end);
            let items: Vec<String> = (chunk_start..chunk_end)
                .map(|a| format!("${:02X}", image[a - start as usize]))
                .collect();
            writeln!(out, "    {:04X}: .byte {}", chunk_start as u16, items.join(","))?;
        }
        at = run_end;
    }

    Ok(())
}
