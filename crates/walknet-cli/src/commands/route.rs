//! `route` subcommand: shortest walking path between two coordinates.

use anyhow::Result;
use clap::Args;
use tracing::debug;
use walknet_lib::{Coordinate, WalkEngine};

use crate::args::{parse_coordinate, PreferenceArgs};
use crate::output::{render_route_text, to_json, OutputFormat};
use crate::terminal::ColorPalette;

#[derive(Args, Debug, Clone)]
pub struct RouteArgs {
    /// Start coordinate as LAT,LON.
    #[arg(long = "from", value_parser = parse_coordinate, allow_hyphen_values = true)]
    pub from: Coordinate,
    /// Destination coordinate as LAT,LON.
    #[arg(long = "to", value_parser = parse_coordinate, allow_hyphen_values = true)]
    pub to: Coordinate,
    #[command(flatten)]
    pub preferences: PreferenceArgs,
}

pub fn handle_route(engine: &WalkEngine, args: &RouteArgs, format: OutputFormat) -> Result<()> {
    let preferences = args.preferences.to_preferences();
    debug!(?preferences, "routing between coordinates");

    let route = engine.shortest_path(args.from, args.to, &preferences)?;
    let rendered = match format {
        OutputFormat::Json => to_json(&route)?,
        OutputFormat::Text => render_route_text(&route, &ColorPalette::detect()),
    };
    print!("{rendered}");
    Ok(())
}
