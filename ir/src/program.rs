//! The core-Bril program model.
//!
//! Mirrors the JSON wire format: a program is a list of functions, a function
//! body is a flat list of labels and instructions. The untagged enums lean on
//! field shape to tell the kinds apart, which is exactly how the wire format
//! distinguishes them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<Type>,
    pub instrs: Vec<Code>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: Type,
}

/// One element of a function body: a label marker or a real instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Code {
    Label { label: String },
    Instruction(Instruction),
}

/// A single instruction. Constants carry a literal, value instructions
/// produce a result into `dest`, effect instructions only have side effects.
/// `funcs` and `labels` are call/jump target metadata that optimization
/// passes carry through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instruction {
    Constant {
        op: ConstOps,
        dest: String,
        #[serde(rename = "type")]
        const_type: Type,
        value: Literal,
    },
    Value {
        op: ValueOps,
        dest: String,
        #[serde(rename = "type")]
        op_type: Type,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        funcs: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        labels: Vec<String>,
    },
    Effect {
        op: EffectOps,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        funcs: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        labels: Vec<String>,
    },
}

impl Instruction {
    /// The variable this instruction defines, if any.
    pub fn dest(&self) -> Option<&str> {
        match self {
            Instruction::Constant { dest, .. } | Instruction::Value { dest, .. } => Some(dest),
            Instruction::Effect { .. } => None,
        }
    }

    /// The variables this instruction reads.
    pub fn args(&self) -> &[String] {
        match self {
            Instruction::Constant { .. } => &[],
            Instruction::Value { args, .. } | Instruction::Effect { args, .. } => args,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstOps {
    Const,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueOps {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
    Not,
    And,
    Or,
    Id,
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectOps {
    #[serde(rename = "jmp")]
    Jump,
    #[serde(rename = "br")]
    Branch,
    Call,
    #[serde(rename = "ret")]
    Return,
    Print,
    Nop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Bool,
    Float,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Float(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_and_instruction_kinds_deserialize() {
        let body = r#"[
            {"label": "entry"},
            {"op": "const", "dest": "x", "type": "int", "value": 4},
            {"op": "add", "dest": "y", "type": "int", "args": ["x", "x"]},
            {"op": "br", "args": ["c"], "labels": ["then", "else"]},
            {"op": "print", "args": ["y"]}
        ]"#;
        let codes: Vec<Code> = serde_json::from_str(body).unwrap();

        assert_eq!(
            codes[0],
            Code::Label {
                label: "entry".to_string()
            }
        );
        assert!(matches!(
            codes[1],
            Code::Instruction(Instruction::Constant {
                value: Literal::Int(4),
                ..
            })
        ));
        assert!(matches!(
            codes[2],
            Code::Instruction(Instruction::Value {
                op: ValueOps::Add,
                ..
            })
        ));
        assert!(matches!(
            codes[3],
            Code::Instruction(Instruction::Effect {
                op: EffectOps::Branch,
                ..
            })
        ));
        assert!(matches!(
            codes[4],
            Code::Instruction(Instruction::Effect {
                op: EffectOps::Print,
                ..
            })
        ));
    }

    #[test]
    fn call_kind_depends_on_dest() {
        let with_dest: Code = serde_json::from_str(
            r#"{"op": "call", "dest": "r", "type": "int", "funcs": ["f"]}"#,
        )
        .unwrap();
        let without_dest: Code =
            serde_json::from_str(r#"{"op": "call", "funcs": ["f"]}"#).unwrap();

        assert!(matches!(
            with_dest,
            Code::Instruction(Instruction::Value {
                op: ValueOps::Call,
                ..
            })
        ));
        assert!(matches!(
            without_dest,
            Code::Instruction(Instruction::Effect {
                op: EffectOps::Call,
                ..
            })
        ));
    }

    #[test]
    fn program_round_trips() {
        let text = r#"{"functions": [{"name": "main", "instrs": [
            {"op": "const", "dest": "b", "type": "bool", "value": true},
            {"op": "jmp", "labels": ["end"]},
            {"label": "end"},
            {"op": "ret"}
        ]}]}"#;
        let program: Program = serde_json::from_str(text).unwrap();
        let emitted = serde_json::to_string(&program).unwrap();
        let reparsed: Program = serde_json::from_str(&emitted).unwrap();

        assert_eq!(program, reparsed);
    }
}
