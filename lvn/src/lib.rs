//! Local value numbering with fixpoint dead-code cleanup for Bril programs.
//!
//! Each basic block is processed independently: a fresh numbering rewrites
//! its instructions into canonical form, then dead definitions are swept out
//! until nothing changes. The function body is reassembled in original label
//! order.

pub mod error;
pub mod lvn;
pub mod tdce;

use bril_ir::block::{blocks_by_label, flatten_blocks, form_blocks};
use bril_ir::Function;
use tracing::debug;

pub use error::{LvnError, Result};

/// Optimize one function in place.
pub fn local_value_numbering(func: &mut Function) -> Result<()> {
    let instrs_before = func.instrs.len();
    let (mut block_by_label, labels) = blocks_by_label(form_blocks(&func.instrs));

    for block in block_by_label.values_mut() {
        lvn::lvn_block_pass(block)?;
        *block = tdce::delete_dead_code_converge(block);
    }

    func.instrs = flatten_blocks(&labels, &block_by_label);

    debug!(
        function = %func.name,
        blocks = labels.len(),
        instrs_before,
        instrs_after = func.instrs.len(),
        "local value numbering"
    );
    Ok(())
}
