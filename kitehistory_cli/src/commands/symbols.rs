use anyhow::Result;
use clap::Args;
use kitehistory_lib::Instruments;

use crate::output::{print_instruments, OutputFormat};

#[derive(Args)]
pub struct SymbolsArgs {
    /// Only list symbols or names containing this text (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,
}

pub fn run(args: &SymbolsArgs, instruments: &Instruments, format: &OutputFormat) -> Result<()> {
    let mut listed = instruments.sorted();
    if let Some(search) = &args.search {
        let needle = search.trim().to_lowercase();
        listed.retain(|i| {
            i.symbol.to_lowercase().contains(&needle) || i.name.to_lowercase().contains(&needle)
        });
    }
    print_instruments(&listed, format)
}
