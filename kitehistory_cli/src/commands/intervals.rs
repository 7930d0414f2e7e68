use anyhow::Result;
use kitehistory_lib::FetchLimits;

use crate::output::{print_limits, OutputFormat};

pub fn run(limits: &FetchLimits, format: &OutputFormat) -> Result<()> {
    print_limits(limits.iter(), format)
}
