//! Trivial (block-local) dead code elimination.
//!
//! A definition is dead if the block overwrites it before any read, or if
//! nothing in the block reads it at all. Liveness across block boundaries is
//! not considered. Instructions without a destination are never candidates.

use bril_ir::block::BasicBlock;
use bril_ir::Code;
use std::collections::{HashMap, HashSet};

/// One front-to-back sweep. Returns a new block with the dead definitions
/// removed, preserving instruction order.
pub fn delete_dead_code(block: &BasicBlock) -> BasicBlock {
    // variable -> index of its most recent not-yet-read definition
    let mut pending: HashMap<&str, usize> = HashMap::new();
    let mut to_delete: HashSet<usize> = HashSet::new();

    for (i, code) in block.iter().enumerate() {
        if let Code::Instruction(instr) = code {
            // a read settles the pending definition
            for arg in instr.args() {
                pending.remove(arg.as_str());
            }
            if let Some(dest) = instr.dest() {
                // overwritten before any read: the earlier store is dead
                if let Some(previous) = pending.insert(dest, i) {
                    to_delete.insert(previous);
                }
            }
        }
    }

    // definitions never read before the block ends
    to_delete.extend(pending.into_values());

    block
        .iter()
        .enumerate()
        .filter(|(i, _)| !to_delete.contains(i))
        .map(|(_, code)| code.clone())
        .collect()
}

/// Sweep until nothing changes. Removing one dead instruction can strand the
/// definitions feeding it, so a single sweep is not enough for copy chains.
pub fn delete_dead_code_converge(block: &BasicBlock) -> BasicBlock {
    let mut previous = delete_dead_code(block);
    loop {
        let next = delete_dead_code(&previous);
        if next == previous {
            return previous;
        }
        previous = next;
    }
}
