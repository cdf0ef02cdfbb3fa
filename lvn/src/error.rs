use thiserror::Error;

/// Errors raised while numbering a block.
#[derive(Error, Debug)]
pub enum LvnError {
    /// An instruction reads a variable that no earlier instruction in the
    /// same block defines. The pass only resolves names through the current
    /// block's environment, so this input is rejected outright.
    #[error("variable `{0}` is read before any definition in its block")]
    UnboundVariable(String),
}

/// Result type for the pass.
pub type Result<T> = std::result::Result<T, LvnError>;
