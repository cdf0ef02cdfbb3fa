use std::io;

use anyhow::Context;
use bril_lvn::local_value_numbering;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut program =
        bril_ir::load_program(io::stdin().lock()).context("reading program from stdin")?;

    for function in &mut program.functions {
        let name = function.name.clone();
        local_value_numbering(function).with_context(|| format!("in function `{name}`"))?;
    }

    bril_ir::output_program(&program, io::stdout().lock()).context("writing program to stdout")
}
