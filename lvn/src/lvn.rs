//! Local value numbering for one basic block.
//!
//! Each block gets a fresh numbering: a table of distinct values keyed by
//! small integers, an environment mapping variables to the number they
//! currently hold, and a reverse index from value to number. Recording an
//! instruction assigns its destination a number; reconstruction then rewrites
//! the instruction into canonical form, turning recomputations into copies,
//! replacing arguments with canonical variables, and folding constants.

use crate::error::{LvnError, Result};
use bril_ir::block::BasicBlock;
use bril_ir::{Code, ConstOps, Instruction, Literal, ValueOps};
use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
};

fn is_commutative(op: ValueOps) -> bool {
    matches!(op, ValueOps::Add | ValueOps::Mul)
}

/// Canonical identity of a computed result: a literal, or an opcode applied
/// to a group of value numbers. For commutative opcodes the group is kept
/// sorted, so operand order cannot split one value into two.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Constant(Literal),
    Op(ValueOps, Vec<usize>),
}

impl Hash for ValueExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ValueExpr::Constant(literal) => match literal {
                Literal::Int(i) => i.hash(state),
                Literal::Bool(b) => b.hash(state),
                Literal::Float(f) => f.to_bits().hash(state),
            },
            ValueExpr::Op(op, nums) => {
                op.hash(state);
                nums.hash(state);
            }
        }
    }
}

impl Eq for ValueExpr {}

fn value_key(op: ValueOps, nums: &[usize]) -> ValueExpr {
    let mut nums = nums.to_vec();
    if is_commutative(op) {
        nums.sort_unstable();
    }
    ValueExpr::Op(op, nums)
}

// Division rounds toward negative infinity; Rust's `/` truncates toward
// zero, so pull the quotient down when there is a remainder and the signs
// disagree. Zero divisors and i64::MIN / -1 abandon the fold.
fn floor_div(lhs: i64, rhs: i64) -> Option<i64> {
    if rhs == 0 {
        return None;
    }
    let quotient = lhs.checked_div(rhs)?;
    if lhs % rhs != 0 && (lhs < 0) != (rhs < 0) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

/// Per-block value numbering state.
pub struct Lvn {
    // variable name -> the value number it currently holds; last write wins
    environment: HashMap<String, usize>,
    // value number -> (value, canonical variable), one row per distinct value
    table: Vec<(ValueExpr, String)>,
    // value -> value number, the common-subexpression test
    number_of: HashMap<ValueExpr, usize>,
}

impl Lvn {
    pub fn new() -> Self {
        Lvn {
            environment: HashMap::new(),
            table: vec![],
            number_of: HashMap::new(),
        }
    }

    fn number_of_var(&self, var: &str) -> Result<usize> {
        self.environment
            .get(var)
            .copied()
            .ok_or_else(|| LvnError::UnboundVariable(var.to_string()))
    }

    fn arg_numbers(&self, args: &[String]) -> Result<Vec<usize>> {
        args.iter().map(|arg| self.number_of_var(arg)).collect()
    }

    /// The literal a variable currently holds, if its value is a constant.
    fn constant_of(&self, var: &str) -> Option<&Literal> {
        let num = self.environment.get(var).copied()?;
        match &self.table[num].0 {
            ValueExpr::Constant(literal) => Some(literal),
            ValueExpr::Op(..) => None,
        }
    }

    fn int_constant_of(&self, var: &str) -> Option<i64> {
        match self.constant_of(var) {
            Some(&Literal::Int(i)) => Some(i),
            _ => None,
        }
    }

    /// Assign the instruction's destination a value number: the existing
    /// number when the value has been computed before, the operand's own
    /// number for a pure copy, a freshly allocated one otherwise.
    pub fn record(&mut self, code: &Code) -> Result<()> {
        let Code::Instruction(instr) = code else {
            return Ok(());
        };
        let (dest, key) = match instr {
            Instruction::Constant { dest, value, .. } => {
                (dest.clone(), ValueExpr::Constant(value.clone()))
            }
            Instruction::Value { dest, op, args, .. } => {
                let nums = self.arg_numbers(args)?;
                (dest.clone(), value_key(*op, &nums))
            }
            // no destination: assume a side effect, not a tracked value
            Instruction::Effect { .. } => return Ok(()),
        };

        let copy_of = match &key {
            ValueExpr::Op(ValueOps::Id, nums) if nums.len() == 1 => Some(nums[0]),
            _ => None,
        };

        let number = match self.number_of.get(&key).copied() {
            Some(number) => number,
            None => match copy_of {
                // alias the destination to the source's number, no new row
                Some(number) => {
                    self.number_of.insert(key, number);
                    number
                }
                None => {
                    let number = self.table.len();
                    self.table.push((key.clone(), dest.clone()));
                    self.number_of.insert(key, number);
                    number
                }
            },
        };

        self.environment.insert(dest, number);
        Ok(())
    }

    /// Rewrite the instruction into canonical form in place: recomputations
    /// of a known value become copies of its canonical variable, arguments
    /// are replaced by canonical variables, and evaluable instructions whose
    /// operands are all constants are folded.
    pub fn reconstruct(&mut self, code: &mut Code) -> Result<()> {
        let Code::Instruction(instr) = code else {
            return Ok(());
        };
        match instr {
            // constants are already canonical
            Instruction::Constant { .. } => Ok(()),
            Instruction::Effect { args, .. } => {
                for arg in args.iter_mut() {
                    let num = self.number_of_var(arg)?;
                    *arg = self.table[num].1.clone();
                }
                Ok(())
            }
            Instruction::Value { .. } => self.reconstruct_value(instr),
        }
    }

    fn reconstruct_value(&mut self, instr: &mut Instruction) -> Result<()> {
        let folded = {
            let Instruction::Value {
                op,
                dest,
                op_type,
                args,
                ..
            } = instr
            else {
                return Ok(());
            };

            let nums = self.arg_numbers(args)?;
            let key = value_key(*op, &nums);

            // An instruction whose destination is also an argument recomputes
            // to a different key than the one recorded for it; the lookup
            // misses and the instruction keeps its own computation.
            let mut rewritten = false;
            if let Some(num) = self.number_of.get(&key).copied() {
                let canonical = self.table[num].1.clone();
                if canonical != *dest {
                    // known value with a different canonical home: reduce to
                    // a copy and let dead-code elimination take it from here
                    *op = ValueOps::Id;
                    *args = vec![canonical];
                    rewritten = true;
                }
            }
            if !rewritten {
                // copy propagation, in source argument order
                for (arg, &num) in args.iter_mut().zip(nums.iter()) {
                    *arg = self.table[num].1.clone();
                }
            }

            match self.fold(*op, args) {
                Some(literal) => {
                    let number = self.environment[dest.as_str()];
                    // forget the un-folded value so later recomputations of
                    // it do not alias this now-constant destination
                    self.number_of.remove(&key);
                    self.table[number].0 = ValueExpr::Constant(literal.clone());
                    Some(Instruction::Constant {
                        op: ConstOps::Const,
                        dest: dest.clone(),
                        const_type: *op_type,
                        value: literal,
                    })
                }
                None => None,
            }
        };

        if let Some(constant) = folded {
            *instr = constant;
        }
        Ok(())
    }

    /// Evaluate the instruction if every operand is a known constant.
    /// Division by zero and i64 overflow give up rather than fold.
    fn fold(&self, op: ValueOps, args: &[String]) -> Option<Literal> {
        match op {
            ValueOps::Id => match args {
                [arg] => self.constant_of(arg).cloned(),
                _ => None,
            },
            ValueOps::Add | ValueOps::Sub | ValueOps::Mul | ValueOps::Div => {
                let [lhs, rhs] = args else {
                    return None;
                };
                let lhs = self.int_constant_of(lhs)?;
                let rhs = self.int_constant_of(rhs)?;
                let result = match op {
                    ValueOps::Add => lhs.checked_add(rhs),
                    ValueOps::Sub => lhs.checked_sub(rhs),
                    ValueOps::Mul => lhs.checked_mul(rhs),
                    ValueOps::Div => floor_div(lhs, rhs),
                    _ => unreachable!(),
                }?;
                Some(Literal::Int(result))
            }
            _ => None,
        }
    }
}

impl Default for Lvn {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrite one block in place with a numbering scoped to that block alone.
pub fn lvn_block_pass(block: &mut BasicBlock) -> Result<()> {
    let mut lvn = Lvn::new();
    for code in block.iter_mut() {
        lvn.record(code)?;
        lvn.reconstruct(code)?;
    }
    Ok(())
}
