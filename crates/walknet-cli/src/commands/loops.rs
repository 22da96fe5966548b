//! `loop-estimate` and `loop` subcommands.

use anyhow::Result;
use clap::Args;
use walknet_lib::{Coordinate, LoopRequest, WalkEngine};

use crate::args::{parse_coordinate, PreferenceArgs};
use crate::output::{render_estimate_text, render_loop_text, to_json, OutputFormat};
use crate::terminal::ColorPalette;

#[derive(Args, Debug, Clone)]
pub struct LoopEstimateArgs {
    /// Start (and finish) coordinate as LAT,LON.
    #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    pub start: Coordinate,
    /// Coordinate the loop must pass through, as LAT,LON.
    #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    pub via: Coordinate,
}

#[derive(Args, Debug, Clone)]
pub struct LoopArgs {
    #[command(flatten)]
    pub points: LoopEstimateArgs,
    /// Desired loop length in kilometers.
    #[arg(long = "target-km")]
    pub target_km: f64,
    /// Accepted deviation from the target, in percent.
    #[arg(long)]
    pub tolerance: Option<f64>,
    #[command(flatten)]
    pub preferences: PreferenceArgs,
}

impl LoopArgs {
    pub fn to_request(&self) -> LoopRequest {
        LoopRequest {
            start: self.points.start,
            via: self.points.via,
            target_km: self.target_km,
            tolerance_percent: self.tolerance,
            preferences: self.preferences.to_preferences(),
        }
    }
}

pub fn handle_loop_estimate(
    engine: &WalkEngine,
    args: &LoopEstimateArgs,
    format: OutputFormat,
) -> Result<()> {
    let estimate = engine.estimate_loop(args.start, args.via)?;
    let rendered = match format {
        OutputFormat::Json => to_json(&estimate)?,
        OutputFormat::Text => render_estimate_text(&estimate, &ColorPalette::detect()),
    };
    print!("{rendered}");
    Ok(())
}

pub fn handle_loop(engine: &WalkEngine, args: &LoopArgs, format: OutputFormat) -> Result<()> {
    let route = engine.generate_loop(&args.to_request())?;
    let rendered = match format {
        OutputFormat::Json => to_json(&route)?,
        OutputFormat::Text => render_loop_text(&route, &ColorPalette::detect()),
    };
    print!("{rendered}");
    Ok(())
}
