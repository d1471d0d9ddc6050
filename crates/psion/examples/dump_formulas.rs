use psion::{Config, Session, decode_formula_list};
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};

// Usage: dump_formulas <file> [offset]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("missing input file"))?;
    let offset = match args.next() {
        Some(offset) => u64::from_str_radix(offset.trim_start_matches("0x"), 16)?,
        None => 0,
    };

    let mut reader = BufReader::new(File::open(&path)?);
    reader.seek(SeekFrom::Start(offset))?;

    let mut session = Session::new(Config::default());
    let formulas = decode_formula_list(&mut reader, &mut session)?;
    for (i, formula) in formulas.iter().enumerate() {
        eprintln!("{i}: {formula:#?}");
    }
    for warning in session.warnings() {
        eprintln!("warning at {:#x}: {}", warning.offset, warning.message);
    }

    Ok(())
}
