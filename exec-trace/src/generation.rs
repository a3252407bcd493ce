use cpu_6502::Regs;

/// A contiguous run of bytes captured from main RAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemRange {
    pub addr: u16,
    pub bytes: Vec<u8>,
}

/// A maximal interval of execution during which no instruction was fetched
/// from a location written within that same interval.
///
/// `regs` is the register file at the moment the generation started. `data`
/// holds the bytes that the *previous* generation executed out of locations
/// written during the generation before it; the very first generation has no
/// such data. Each generation owns its captures outright.
#[derive(Debug, Clone)]
pub struct Generation {
    pub regs: Regs,
    pub data: Vec<MemRange>,
}

impl Generation {
    pub fn new(regs: Regs) -> Self {
        Self {
            regs,
            data: Vec::new(),
        }
    }

    pub fn add_range(&mut self, addr: u16, bytes: &[u8]) {
        self.data.push(MemRange {
            addr,
            bytes: bytes.to_vec(),
        });
    }

    /// Total captured bytes across all ranges.
    pub fn data_len(&self) -> usize {
        self.data.iter().map(|r| r.bytes.len()).sum()
    }
}
