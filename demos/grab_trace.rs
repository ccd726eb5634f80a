// Capture a single-sequence acquisition and print the head of the trace.

use clap::Parser;
use std::path::PathBuf;
use tekscope_rs::{Channel, SampleWidth, TekScope};

#[derive(Parser)]
#[command(about = "Grab one calibrated trace from the scope")]
struct Args {
    /// usbtmc device file of the instrument
    #[arg(long, default_value = "/dev/usbtmc0")]
    device: PathBuf,

    /// Transfer width: 8bit or 16bit
    #[arg(long, default_value = "16bit")]
    width: SampleWidth,

    /// Channel to fetch: CH1..CH4, REFA, REFB
    #[arg(long, default_value = "CH1")]
    channel: Channel,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut scope = TekScope::open(&args.device, args.width)?;
    println!("Connected to {}", scope.idn());

    println!("Arming a single-sequence acquisition...");
    scope.set_single_acquisition()?;
    scope.wait_for_acquisition()?;

    let volts = scope.get_trace(args.channel)?;
    let time = scope.time_axis()?;
    let unit = scope.calibration()?.y_unit.clone();

    println!("Captured {} samples from {}", volts.len(), args.channel);
    for (t, v) in time.iter().zip(volts.iter()).take(10) {
        println!("{t:>14.6e} s  {v:>12.6} {unit}");
    }

    Ok(())
}
