use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use sablec_drv::compile_source;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let path = match (args.next(), args.next()) {
        (Some(path), None) => PathBuf::from(path),
        _ => bail!("usage: sablec <source-file>"),
    };

    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let unit = match compile_source(source) {
        Ok(unit) => unit,
        Err(err) => {
            for diagnostic in err.diagnostics() {
                eprintln!("{}", diagnostic);
            }
            return Err(err.into());
        }
    };

    for (module_name, module) in unit.modules() {
        for (name, ebb) in &module.functions {
            println!("{}.{}:", module_name, name);
            print!("{}", ebb.display(unit.type_ctx()));
        }
    }

    Ok(())
}
