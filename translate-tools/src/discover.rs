use std::collections::BTreeSet;

use cpu_6502::{decode_inst, inst_is_branch, AddrMode, Inst, InstKind, ThreeBytes};
use exec_trace::BitSet;

/// Result of static code discovery over a loaded image.
pub struct Discovery {
    pub start: u16,
    /// Every byte belonging to a reachable instruction, operands included.
    pub code: BitSet,
    /// First bytes of reachable instructions.
    pub starts: BitSet,
    /// Branch targets inside the image, in ascending order.
    pub branch_targets: BTreeSet<u16>,
    image_len: usize,
}

impl Discovery {
    /// One past the last loaded address.
    pub fn end(&self) -> usize {
        self.start as usize + self.image_len
    }

    /// Whether `addr` lies inside the loaded image.
    pub fn contains(&self, addr: u16) -> bool {
        (addr as usize) >= self.start as usize && (addr as usize) < self.end()
    }
}

/// Reads up to three bytes at `pc` from the image, padding with zeros past
/// the end.
pub fn peek3(start: u16, image: &[u8], pc: u16) -> ThreeBytes {
    let mut b = [0u8; 3];
    for (i, slot) in b.iter_mut().enumerate() {
        let addr = pc as usize + i;
        if addr >= start as usize && addr - (start as usize) < image.len() {
            *slot = image[addr - start as usize];
        }
    }
    ThreeBytes(b)
}

/// Decodes the reachable instruction at `pc` from the image.
pub fn inst_at(start: u16, image: &[u8], pc: u16) -> Inst {
    decode_inst(pc, peek3(start, image, pc))
}

/// Recursive-traversal code discovery: follow fall-through and statically
/// known branch targets from the load address, classifying everything else
/// as data. `JMP (ind)` targets are unknowable here and terminate the path.
pub fn discover(start: u16, image: &[u8]) -> Discovery {
    let end = start as usize + image.len();
    let mut code = BitSet::for_address_space();
    let mut starts = BitSet::for_address_space();
    let mut branch_targets = BTreeSet::new();

    let mut worklist = vec![start];
    while let Some(pc) = worklist.pop() {
        let at = pc as usize;
        if at < start as usize || at >= end || code.get(at) {
            continue;
        }

        let inst = inst_at(start, image, pc);
        if inst.kind == InstKind::Invalid || at + inst.size as usize > end {
            continue;
        }
        starts.set(at, true);
        code.set_range(at, at + inst.size as usize, true);

        if inst_is_branch(inst.kind, inst.mode) && inst.mode != AddrMode::Ind {
            let target = inst.operand;
            if (target as usize) >= start as usize && (target as usize) < end {
                branch_targets.insert(target);
                worklist.push(target);
            }
        }

        let falls_through = !matches!(
            inst.kind,
            InstKind::Jmp | InstKind::Rts | InstKind::Rti | InstKind::Brk
        );
        if falls_through {
            worklist.push(pc.wrapping_add(inst.size as u16));
        }
    }

    log::debug!(
        "discovered {} code bytes of {}",
        count_set(&code, start as usize, end),
        image.len()
    );

    Discovery {
        start,
        code,
        starts,
        branch_targets,
        image_len: image.len(),
    }
}

fn count_set(bits: &BitSet, lo: usize, hi: usize) -> usize {
    let mut n = 0;
    let mut i = bits.find_set_bit(lo);
    while i < hi {
        n += 1;
        i = bits.find_set_bit(i + 1);
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_branches_and_stops_at_rts() {
        // 0800: LDA #$00 / BEQ $0805 / .byte $FF / RTS
        let image = [0xA9, 0x00, 0xF0, 0x01, 0xFF, 0x60];
        let d = discover(0x0800, &image);

        assert!(d.starts.get(0x0800));
        assert!(d.starts.get(0x0802));
        assert!(!d.code.get(0x0804), "skipped byte is data");
        assert!(d.starts.get(0x0805));
        assert_eq!(d.branch_targets.iter().copied().collect::<Vec<_>>(), vec![0x0805]);
    }

    #[test]
    fn rom_targets_are_not_recorded() {
        // 0800: JSR $FDED / RTS
        let image = [0x20, 0xED, 0xFD, 0x60];
        let d = discover(0x0800, &image);
        assert!(d.branch_targets.is_empty());
        assert!(d.starts.get(0x0803));
    }

    #[test]
    fn jmp_does_not_fall_through() {
        // 0800: JMP $0800 / .byte $EA
        let image = [0x4C, 0x00, 0x08, 0xEA];
        let d = discover(0x0800, &image);
        assert!(!d.code.get(0x0803));
    }
}
