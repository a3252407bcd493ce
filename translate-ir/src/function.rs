/// Stable identity of a basic block within its function.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

#[derive(Debug, Default)]
struct BasicBlock {
    succs: Vec<BlockId>,
    preds: Vec<BlockId>,
}

/// A function's control-flow graph. Blocks live in an arena owned by the
/// function; edges are kept in both directions so that forward and inverse
/// traversals are symmetric views.
#[derive(Debug, Default)]
pub struct Function {
    blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::default());
        id
    }

    /// Inserts an edge, ignoring exact duplicates.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        let succs = &mut self.blocks[from.0 as usize].succs;
        if succs.contains(&to) {
            return;
        }
        succs.push(to);
        self.blocks[to.0 as usize].preds.push(from);
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Block identities in creation order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len() as u32).map(BlockId)
    }

    pub fn successors(&self, bb: BlockId) -> &[BlockId] {
        &self.blocks[bb.0 as usize].succs
    }

    pub fn predecessors(&self, bb: BlockId) -> &[BlockId] {
        &self.blocks[bb.0 as usize].preds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_mirrored() {
        let mut f = Function::new();
        let a = f.add_block();
        let b = f.add_block();
        f.add_edge(a, b);
        assert_eq!(f.successors(a), &[b]);
        assert_eq!(f.predecessors(b), &[a]);
        assert!(f.predecessors(a).is_empty());
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut f = Function::new();
        let a = f.add_block();
        let b = f.add_block();
        f.add_edge(a, b);
        f.add_edge(a, b);
        assert_eq!(f.successors(a).len(), 1);
        assert_eq!(f.predecessors(b).len(), 1);
    }
}
