// Wait for an acquisition with a bounded timeout and report the counter.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tekscope_rs::{SampleWidth, TekScope};

#[derive(Parser)]
#[command(about = "Arm a single-sequence acquisition and wait for it")]
struct Args {
    /// usbtmc device file of the instrument
    #[arg(long, default_value = "/dev/usbtmc0")]
    device: PathBuf,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut scope = TekScope::open(&args.device, SampleWidth::Bits16)?;
    println!("Connected to {}", scope.idn());

    scope.set_single_acquisition()?;
    println!("Waiting up to {} s for the acquisition...", args.timeout_secs);
    scope.wait_for_acquisition_timeout(Duration::from_secs(args.timeout_secs))?;

    println!("Acquisition finished");
    println!("Acquisitions so far: {}", scope.acquisition_count()?);

    Ok(())
}
