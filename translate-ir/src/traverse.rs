use hashbrown::HashSet;

use crate::function::{BlockId, Function};

/// Direction of a graph walk, chosen at compile time. `Forward` is the
/// identity view; `Inverse` swaps the edge roles so the same traversals run
/// over the reversed CFG.
pub trait GraphView {
    fn successors(func: &Function, bb: BlockId) -> &[BlockId];
    fn predecessors(func: &Function, bb: BlockId) -> &[BlockId];
}

pub struct Forward;

impl GraphView for Forward {
    fn successors(func: &Function, bb: BlockId) -> &[BlockId] {
        func.successors(bb)
    }
    fn predecessors(func: &Function, bb: BlockId) -> &[BlockId] {
        func.predecessors(bb)
    }
}

pub struct Inverse;

impl GraphView for Inverse {
    fn successors(func: &Function, bb: BlockId) -> &[BlockId] {
        func.predecessors(bb)
    }
    fn predecessors(func: &Function, bb: BlockId) -> &[BlockId] {
        func.successors(bb)
    }
}

/// DFS post-order over the chosen view: every block appears after all blocks
/// reachable from it.
///
/// Roots are discovered in three phases: the optional explicit entry, then
/// every block with no predecessors, then whatever is still unvisited —
/// blocks of unreachable loops. Every block of the function appears exactly
/// once.
pub fn post_order<V: GraphView>(func: &Function, entry: Option<BlockId>) -> Vec<BlockId> {
    let mut visited = HashSet::with_capacity(func.block_count());
    let mut order = Vec::with_capacity(func.block_count());

    if let Some(entry) = entry {
        visit_post::<V>(func, entry, &mut visited, &mut order);
    }
    for bb in func.block_ids() {
        if V::predecessors(func, bb).is_empty() {
            visit_post::<V>(func, bb, &mut visited, &mut order);
        }
    }
    for bb in func.block_ids() {
        visit_post::<V>(func, bb, &mut visited, &mut order);
    }

    debug_assert_eq!(order.len(), func.block_count(), "all blocks must be visited");
    order
}

fn visit_post<V: GraphView>(
    func: &Function,
    bb: BlockId,
    visited: &mut HashSet<BlockId>,
    order: &mut Vec<BlockId>,
) {
    if !visited.insert(bb) {
        return;
    }
    for &succ in V::successors(func, bb) {
        visit_post::<V>(func, succ, visited, order);
    }
    order.push(bb);
}

/// The entry points of a function: the roots of the DFS trees the post-order
/// walk would grow, in discovery order — the explicit entry first (if any),
/// then predecessorless blocks in block order, then one root per
/// otherwise-unreachable component.
pub fn entry_blocks<V: GraphView>(func: &Function, entry: Option<BlockId>) -> Vec<BlockId> {
    let mut visited = HashSet::with_capacity(func.block_count());
    let mut entries = Vec::new();

    if let Some(entry) = entry {
        visit_entry::<V>(func, entry, true, &mut visited, &mut entries);
    }
    for bb in func.block_ids() {
        if V::predecessors(func, bb).is_empty() {
            visit_entry::<V>(func, bb, true, &mut visited, &mut entries);
        }
    }
    for bb in func.block_ids() {
        visit_entry::<V>(func, bb, true, &mut visited, &mut entries);
    }

    entries
}

fn visit_entry<V: GraphView>(
    func: &Function,
    bb: BlockId,
    is_root: bool,
    visited: &mut HashSet<BlockId>,
    entries: &mut Vec<BlockId>,
) {
    if !visited.insert(bb) {
        return;
    }
    if is_root {
        entries.push(bb);
    }
    for &succ in V::successors(func, bb) {
        visit_entry::<V>(func, succ, false, visited, entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A→B, A→C, B→D, C→D, plus an isolated loop E↔F with no
    /// predecessorless entry.
    fn diamond_plus_loop() -> (Function, [BlockId; 6]) {
        let mut f = Function::new();
        let a = f.add_block();
        let b = f.add_block();
        let c = f.add_block();
        let d = f.add_block();
        let e = f.add_block();
        let g = f.add_block();
        f.add_edge(a, b);
        f.add_edge(a, c);
        f.add_edge(b, d);
        f.add_edge(c, d);
        f.add_edge(e, g);
        f.add_edge(g, e);
        (f, [a, b, c, d, e, g])
    }

    fn pos(order: &[BlockId], bb: BlockId) -> usize {
        order.iter().position(|&x| x == bb).unwrap()
    }

    #[test]
    fn post_order_shape() {
        let (f, [a, b, c, d, e, g]) = diamond_plus_loop();
        let order = post_order::<Forward>(&f, Some(a));

        assert_eq!(order.len(), f.block_count());
        assert!(pos(&order, d) < pos(&order, b));
        assert!(pos(&order, d) < pos(&order, c));
        assert!(pos(&order, b) < pos(&order, a));
        assert!(pos(&order, c) < pos(&order, a));
        // The unreachable loop trails the entry tree, in either order.
        assert!(pos(&order, e) > pos(&order, a));
        assert!(pos(&order, g) > pos(&order, a));
    }

    #[test]
    fn every_block_appears_exactly_once() {
        let (f, blocks) = diamond_plus_loop();
        for entry in [None, Some(blocks[0]), Some(blocks[3])] {
            let order = post_order::<Forward>(&f, entry);
            assert_eq!(order.len(), f.block_count());
            for bb in f.block_ids() {
                assert_eq!(order.iter().filter(|&&x| x == bb).count(), 1);
            }
        }
    }

    #[test]
    fn inverse_post_order_walks_predecessors() {
        let (f, [a, b, c, d, ..]) = diamond_plus_loop();
        let order = post_order::<Inverse>(&f, Some(d));

        // Over the inverse view, A is reachable from D and must precede it.
        assert!(pos(&order, a) < pos(&order, b));
        assert!(pos(&order, a) < pos(&order, c));
        assert!(pos(&order, b) < pos(&order, d));
        assert!(pos(&order, c) < pos(&order, d));
    }

    #[test]
    fn entry_blocks_report_roots_only() {
        let (f, [a, _, _, _, e, g]) = diamond_plus_loop();
        let entries = entry_blocks::<Forward>(&f, Some(a));

        // The explicit entry, then one root of the unreachable loop. B, C, D
        // are interior nodes and never appear.
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], a);
        assert!(entries[1] == e || entries[1] == g);
    }

    #[test]
    fn predecessorless_blocks_come_before_unreachable_components() {
        let mut f = Function::new();
        let a = f.add_block(); // predecessorless
        let b = f.add_block();
        let c = f.add_block(); // self-loop, unreachable
        f.add_edge(a, b);
        f.add_edge(c, c);

        let entries = entry_blocks::<Forward>(&f, None);
        assert_eq!(entries, vec![a, c]);
    }
}
