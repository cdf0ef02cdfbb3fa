//! Basic-block formation and reassembly.
//!
//! A block starts at a label (the label stays as the block's first element)
//! or right after a terminator, and ends at the next terminator or label.

use crate::program::{Code, EffectOps, Instruction};
use std::collections::{HashMap, HashSet};

pub type BasicBlock = Vec<Code>;

fn is_terminator(instr: &Instruction) -> bool {
    matches!(
        instr,
        Instruction::Effect {
            op: EffectOps::Jump | EffectOps::Branch | EffectOps::Return,
            ..
        }
    )
}

/// Split a flat instruction list into basic blocks.
pub fn form_blocks(instructions: &[Code]) -> Vec<BasicBlock> {
    let mut blocks: Vec<BasicBlock> = vec![];
    let mut current_block = vec![];

    for code in instructions {
        match code {
            Code::Instruction(instr) => {
                current_block.push(code.clone());

                // A terminator finishes this block and starts a new one
                if is_terminator(instr) {
                    blocks.push(current_block);
                    current_block = vec![];
                }
            }
            Code::Label { .. } => {
                // End the current block
                if !current_block.is_empty() {
                    blocks.push(current_block);
                }

                // Start a new block with this label
                current_block = vec![code.clone()];
            }
        }
    }
    if !current_block.is_empty() {
        blocks.push(current_block);
    }

    blocks
}

/// Key each block by its leading label, making up a fresh `b{N}` name for
/// blocks that have none. Also returns the labels in original order so the
/// function can be reassembled afterwards. Synthetic labels are only map
/// keys; they never appear inside a block, so flattening does not invent
/// label markers.
pub fn blocks_by_label(blocks: Vec<BasicBlock>) -> (HashMap<String, BasicBlock>, Vec<String>) {
    // names claimed by real labels; synthetic names must steer around them
    // or an unlabeled block would silently shadow a labeled one
    let taken: HashSet<String> = blocks
        .iter()
        .filter_map(|block| match block.first() {
            Some(Code::Label { label }) => Some(label.clone()),
            _ => None,
        })
        .collect();

    let mut block_by_label = HashMap::new();
    let mut labels = vec![];

    let mut i = 1;

    for block in blocks {
        let label = match block.first() {
            Some(Code::Label { label }) => label.clone(),
            _ => loop {
                let name = format!("b{i}");
                i += 1;
                if !taken.contains(&name) {
                    break name;
                }
            },
        };
        labels.push(label.clone());
        block_by_label.insert(label, block);
    }

    (block_by_label, labels)
}

/// Concatenate per-label blocks back into a flat instruction list, in the
/// original label order. Every label must name a block; `blocks_by_label`
/// guarantees it, and a miss here means the two went out of sync.
pub fn flatten_blocks(labels: &[String], block_by_label: &HashMap<String, BasicBlock>) -> Vec<Code> {
    labels
        .iter()
        .map(|label| {
            block_by_label
                .get(label)
                .unwrap_or_else(|| panic!("label `{label}` has no block"))
        })
        .flat_map(|block| block.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_body(text: &str) -> Vec<Code> {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn splits_at_labels_and_terminators() {
        let instrs = parse_body(
            r#"[
                {"op": "const", "dest": "c", "type": "bool", "value": true},
                {"op": "br", "args": ["c"], "labels": ["then", "done"]},
                {"label": "then"},
                {"op": "const", "dest": "x", "type": "int", "value": 1},
                {"label": "done"},
                {"op": "ret"}
            ]"#,
        );

        let blocks = form_blocks(&instrs);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].len(), 2);
        assert!(matches!(blocks[1][0], Code::Label { .. }));
        assert!(matches!(blocks[2][0], Code::Label { .. }));
    }

    #[test]
    fn unlabeled_entry_gets_synthetic_name() {
        let instrs = parse_body(
            r#"[
                {"op": "const", "dest": "x", "type": "int", "value": 1},
                {"op": "jmp", "labels": ["loop"]},
                {"label": "loop"},
                {"op": "print", "args": ["x"]}
            ]"#,
        );

        let (block_by_label, labels) = blocks_by_label(form_blocks(&instrs));
        assert_eq!(labels, vec!["b1".to_string(), "loop".to_string()]);
        assert_eq!(block_by_label["b1"].len(), 2);
        assert_eq!(block_by_label["loop"].len(), 2);
    }

    #[test]
    fn synthetic_names_steer_around_real_labels() {
        let instrs = parse_body(
            r#"[
                {"op": "const", "dest": "x", "type": "int", "value": 1},
                {"op": "print", "args": ["x"]},
                {"op": "jmp", "labels": ["b1"]},
                {"label": "b1"},
                {"op": "ret"}
            ]"#,
        );

        let (block_by_label, labels) = blocks_by_label(form_blocks(&instrs));
        assert_eq!(labels, vec!["b2".to_string(), "b1".to_string()]);
        assert_eq!(block_by_label["b2"].len(), 3);
        assert_eq!(flatten_blocks(&labels, &block_by_label), instrs);
    }

    #[test]
    fn flatten_is_the_inverse_of_formation() {
        let instrs = parse_body(
            r#"[
                {"op": "const", "dest": "x", "type": "int", "value": 1},
                {"op": "br", "args": ["x"], "labels": ["a", "b"]},
                {"label": "a"},
                {"op": "jmp", "labels": ["b"]},
                {"label": "b"},
                {"op": "print", "args": ["x"]},
                {"op": "ret"}
            ]"#,
        );

        let (block_by_label, labels) = blocks_by_label(form_blocks(&instrs));
        assert_eq!(flatten_blocks(&labels, &block_by_label), instrs);
    }
}
