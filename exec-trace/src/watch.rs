/// A declared memory location whose value is printed with each traced
/// instruction. `size` is 1 or 2 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watch {
    pub name: String,
    pub addr: u16,
    pub size: u8,
}

/// Ordered watch table. Identity for deduplication is `(addr, size)`.
#[derive(Debug, Default)]
pub struct WatchList(Vec<Watch>);

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a watch, or renames the existing one at the same
    /// `(addr, size)`.
    pub fn add(&mut self, name: impl Into<String>, addr: u16, size: u8) {
        debug_assert!(size == 1 || size == 2);
        let name = name.into();
        match self.0.iter_mut().find(|w| w.addr == addr && w.size == size) {
            Some(w) => w.name = name,
            None => self.0.push(Watch { name, addr, size }),
        }
    }

    /// Removes the first watch with a matching name; silent if absent.
    pub fn remove(&mut self, name: &str) {
        if let Some(i) = self.0.iter().position(|w| w.name == name) {
            self.0.remove(i);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Watch> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
