use std::io::{self, Write};

use hashbrown::HashSet;
use tracing::debug;

use cpu_6502::{
    decode_inst, decode_opcode, find_apple2_symbol, format_inst, format_inst_with_symbols,
    inst_is_branch, inst_writes_mem_normal, AddrMode, InstKind, Regs,
};

use crate::bitset::BitSet;
use crate::ea::operand_ea;
use crate::emu::{ram_peek3, Emu, StopReason};
use crate::generation::Generation;
use crate::history::{History, InstRecord};
use crate::watch::WatchList;

const DEFAULT_MAX_HISTORY: usize = 256;

/// Per-instruction observer state: tracing configuration, the history ring,
/// the watch table, and the self-modifying-code generation tracker.
///
/// At most one of collection, basic-block tracing and straight tracing acts
/// on a given hook invocation; collection takes precedence over basic-block
/// tracing, which takes precedence over straight tracing.
pub struct DebugState {
    out: Box<dyn Write>,

    collect: bool,
    debug_bb: bool,
    buffering: bool,
    resolve_apple2_symbols: bool,
    limit: u64,
    icount: u64,

    /// Whether the previously observed instruction was a branch, making the
    /// current one a branch target.
    branch_target: bool,

    history: History,
    watches: WatchList,
    non_debug: Vec<(u16, u16)>,

    cur_mem_exec: BitSet,
    cur_mem_written: BitSet,
    prev_mem_written: BitSet,
    branch_targets: HashSet<u16>,
    generations: Vec<Generation>,
}

impl Default for DebugState {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugState {
    pub fn new() -> Self {
        Self {
            out: Box::new(io::stdout()),
            collect: false,
            debug_bb: false,
            buffering: false,
            resolve_apple2_symbols: false,
            limit: 0,
            icount: 0,
            branch_target: false,
            history: History::new(DEFAULT_MAX_HISTORY),
            watches: WatchList::new(),
            non_debug: Vec::new(),
            cur_mem_exec: BitSet::for_address_space(),
            cur_mem_written: BitSet::for_address_space(),
            prev_mem_written: BitSet::for_address_space(),
            branch_targets: HashSet::new(),
            generations: Vec::new(),
        }
    }

    /// Redirects trace output, which goes to stdout by default.
    pub fn set_output(&mut self, out: Box<dyn Write>) {
        self.out = out;
    }

    /// Returns all debugging to the zero state. Watches and history are
    /// dropped; non-debug regions are retained.
    pub fn reset(&mut self) {
        self.collect = false;
        self.debug_bb = false;
        self.set_buffering(false);
        self.limit = 0;
        self.icount = 0;
        self.branch_target = false;
        self.history.clear();
        self.watches.clear();
        self.cur_mem_exec.clear();
        self.cur_mem_written.clear();
        self.prev_mem_written.clear();
        self.reset_collected_data();
    }

    /// Turns data collection on or off. The off→on transition clears the
    /// tracking bitmaps and starts a fresh first generation from the current
    /// registers.
    pub fn set_collect<E: Emu + ?Sized>(&mut self, emu: &E, on: bool) {
        if on && !self.collect {
            self.cur_mem_written.clear();
            self.prev_mem_written.clear();
            self.cur_mem_exec.clear();
            self.generations.clear();
            self.generations.push(Generation::new(emu.regs()));
        }
        self.collect = on;
    }

    /// When set, only instructions that are branch targets are traced.
    pub fn set_debug_bb(&mut self, on: bool) {
        self.debug_bb = on;
    }

    /// When set, records are buffered in the history instead of printed. The
    /// on→off transition releases the history storage.
    pub fn set_buffering(&mut self, on: bool) {
        if !on && self.buffering {
            self.history.free();
        }
        self.buffering = on;
    }

    /// Maximum number of instructions to observe; 0 means unlimited.
    pub fn set_limit(&mut self, limit: u64) {
        self.limit = limit;
    }

    pub fn set_max_history(&mut self, max: usize) {
        self.history.set_max(max);
    }

    /// When set, printed PC labels and operands go through the Apple II ROM
    /// symbol table.
    pub fn set_resolve_apple2_symbols(&mut self, on: bool) {
        self.resolve_apple2_symbols = on;
    }

    /// Suppresses all debugging for PCs in `[from, to]`, typically ROM
    /// routine bodies. Ranges are scanned linearly and never merged.
    pub fn add_non_debug(&mut self, from: u16, to: u16) {
        self.non_debug.push((from, to));
    }

    pub fn add_watch(&mut self, name: impl Into<String>, addr: u16, size: u8) {
        self.watches.add(name, addr, size);
    }

    pub fn remove_watch(&mut self, name: &str) {
        self.watches.remove(name);
    }

    pub fn watches(&self) -> &WatchList {
        &self.watches
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn icount(&self) -> u64 {
        self.icount
    }

    pub fn generations(&self) -> &[Generation] {
        &self.generations
    }

    pub fn branch_targets(&self) -> &HashSet<u16> {
        &self.branch_targets
    }

    /// Drops everything collected so far. The next collect on-transition
    /// starts over with a fresh first generation.
    pub fn reset_collected_data(&mut self) {
        self.branch_targets.clear();
        self.generations.clear();
    }

    /// The per-instruction hook. Invoked by the interpreter with the PC of
    /// the instruction about to execute.
    pub fn on_instruction<E: Emu + ?Sized>(&mut self, emu: &E, pc: u16) -> StopReason {
        // Excluded areas are not debugged at all.
        for &(from, to) in &self.non_debug {
            if pc >= from && pc <= to {
                return StopReason::None;
            }
        }

        if self.collect {
            return self.collect_data(emu, pc);
        }

        if self.debug_bb {
            let was_branch_target = self.branch_target;
            let opc = decode_opcode(emu.ram_peek(pc));
            self.branch_target = inst_is_branch(opc.kind, opc.mode);
            // The previous instruction was not a branch, so this one is not
            // a branch target.
            if !was_branch_target {
                return StopReason::None;
            }
        }

        if self.limit != 0 && self.icount >= self.limit {
            return StopReason::StopRequested;
        }
        self.icount += 1;

        let rec = InstRecord {
            regs: emu.regs(),
            bytes: ram_peek3(emu, pc),
        };

        if self.buffering {
            self.history.push(rec);

            if decode_opcode(rec.bytes.opcode()).kind == InstKind::Invalid {
                writeln!(self.out, "*** INVALID OPCODE! Dumping history:").ok();
                self.print_history();
                return StopReason::StopRequested;
            }

            return StopReason::None;
        }

        let resolve = self.resolve_apple2_symbols;
        let out = self.out.as_mut();
        print_record(out, &rec, self.watches.is_empty(), resolve).ok();
        for watch in self.watches.iter() {
            let res: io::Result<()> = (|| {
                write!(out, " {}", watch.name)?;
                if watch.addr < 256 {
                    write!(out, "(${:02X})=", watch.addr)?;
                } else {
                    write!(out, "(${:04X})=", watch.addr)?;
                }
                if watch.size == 1 {
                    write!(out, "${:02X}", emu.ram_peek(watch.addr))
                } else {
                    write!(out, "${:04X}", emu.ram_peek16(watch.addr))
                }
            })();
            res.ok();
        }
        writeln!(out).ok();

        StopReason::None
    }

    /// Dumps the buffered history in chronological order.
    pub fn print_history(&mut self) {
        let resolve = self.resolve_apple2_symbols;
        let out = self.out.as_mut();
        for rec in self.history.iter() {
            print_record(out, rec, true, resolve).ok();
            writeln!(out).ok();
        }
    }

    /// The collection step: classify the instruction about to execute,
    /// rolling over to a new generation when it fetches from a location
    /// written in the current one.
    fn collect_data<E: Emu + ?Sized>(&mut self, emu: &E, pc: u16) -> StopReason {
        let bytes = ram_peek3(emu, pc);
        let inst = decode_inst(pc, bytes);
        let regs = emu.regs();
        let ea = operand_ea(emu, regs, inst.mode, inst.operand);

        let exec_end = (pc as usize + inst.size as usize).min(self.cur_mem_exec.len());
        if self.cur_mem_written.get(pc as usize) {
            // Executing an opcode modified within the current generation:
            // close it before recording anything about this instruction.
            self.new_generation(emu, regs);
            self.cur_mem_exec.set_range(pc as usize, exec_end, true);
        } else if self.prev_mem_written.get(pc as usize) {
            // Executing something written in the previous generation; record
            // the whole instruction.
            self.cur_mem_exec.set_range(pc as usize, exec_end, true);
        }

        if inst_is_branch(inst.kind, inst.mode) {
            self.branch_targets.insert(ea);
            if self.limit != 0 && self.icount >= self.limit {
                return StopReason::StopRequested;
            }
            self.icount += 1;
        } else if inst_writes_mem_normal(inst.kind, inst.mode) {
            self.cur_mem_written.set(ea as usize, true);
        }

        StopReason::None
    }

    /// Closes the current generation: snapshot the executed-while-modified
    /// ranges from main RAM into a new generation, then rotate the bitmaps.
    fn new_generation<E: Emu + ?Sized>(&mut self, emu: &E, regs: Regs) {
        let mut gen = Generation::new(regs);

        let ram = emu.main_ram();
        let exec = &self.cur_mem_exec;
        let mut from = exec.find_set_bit(0);
        while from != exec.len() {
            let to = exec.find_clear_bit(from + 1);
            gen.add_range(from as u16, &ram[from..to]);
            if to == exec.len() {
                break;
            }
            from = exec.find_set_bit(to + 1);
        }

        debug!(bytes = gen.data_len(), "saved bytes to previous generation");
        self.generations.push(gen);

        self.cur_mem_exec.clear();
        self.prev_mem_written.swap(&mut self.cur_mem_written);
        self.cur_mem_written.clear();
    }
}

/// Writes one trace record: PC, optional symbol label, registers, flags and
/// (optionally) the decoded instruction. No trailing newline.
fn print_record(
    out: &mut dyn Write,
    rec: &InstRecord,
    show_inst: bool,
    resolve: bool,
) -> io::Result<()> {
    let r = rec.regs;

    let label = if resolve {
        find_apple2_symbol(r.pc).unwrap_or("")
    } else {
        ""
    };
    write!(out, "{:04X}: {:<8}  ", r.pc, label)?;

    write!(out, "A={:02X} X={:02X} Y={:02X} SP={:02X} SR=", r.a, r.x, r.y, r.sp)?;
    // The bit-5 slot prints '.' even when set, for compatibility with
    // existing trace logs.
    const NAMES: &[u8; 8] = b"NV.BDIZC";
    for (i, &name) in NAMES.iter().enumerate() {
        let c = if r.status & (0x80 >> i) != 0 { name as char } else { '.' };
        write!(out, "{}", c)?;
    }

    if show_inst {
        // The PC again, for convenience.
        write!(out, " PC={:04X}  ", r.pc)?;
        let inst = decode_inst(r.pc, rec.bytes);
        let fmt = if resolve {
            format_inst_with_symbols(inst, rec.bytes, find_apple2_symbol)
        } else {
            format_inst(inst, rec.bytes)
        };
        write!(out, "  {:<8}    {}", fmt.bytes, fmt.inst)?;
        if !fmt.operand.is_empty() {
            write!(out, "  {}", fmt.operand)?;
            if inst.mode == AddrMode::Rel {
                write!(out, " ({})", rec.bytes.0[1] as i8)?;
            }
        }
    }

    Ok(())
}
