#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use cpu_6502::Regs;
use exec_trace::Emu;

/// Scripted interpreter stand-in: a flat 64 KiB RAM and a register file the
/// test mutates directly between hook calls.
pub struct TestEmu {
    pub ram: Box<[u8; 0x10000]>,
    pub regs: Regs,
}

impl TestEmu {
    pub fn new() -> Self {
        Self {
            ram: vec![0u8; 0x10000].into_boxed_slice().try_into().unwrap(),
            regs: Regs::default(),
        }
    }

    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        self.ram[addr as usize..addr as usize + bytes.len()].copy_from_slice(bytes);
    }

    /// Positions the PC at `addr`, as if the interpreter were about to fetch
    /// there.
    pub fn set_pc(&mut self, addr: u16) {
        self.regs.pc = addr;
    }
}

impl Emu for TestEmu {
    fn regs(&self) -> Regs {
        self.regs
    }

    fn ram_peek(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    fn main_ram(&self) -> &[u8; 0x10000] {
        &self.ram
    }
}

/// Cloneable writer capturing everything the tracer prints.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
