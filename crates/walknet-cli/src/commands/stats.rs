//! `stats` subcommand: snapshot counts and district listings.

use anyhow::Result;
use clap::Args;
use walknet_lib::WalkEngine;

use crate::output::{render_district_text, render_stats_text, to_json, OutputFormat};
use crate::terminal::ColorPalette;

#[derive(Args, Debug, Clone, Default)]
pub struct StatsArgs {
    /// List the nodes of one district instead of the overall counts.
    #[arg(long)]
    pub district: Option<String>,
}

pub fn handle_stats(engine: &WalkEngine, args: &StatsArgs, format: OutputFormat) -> Result<()> {
    let rendered = match &args.district {
        Some(district) => {
            let nodes = engine.nodes_in_district(district)?;
            match format {
                OutputFormat::Json => to_json(&nodes)?,
                OutputFormat::Text => {
                    render_district_text(district, &nodes, &ColorPalette::detect())
                }
            }
        }
        None => {
            let stats = engine.stats()?;
            match format {
                OutputFormat::Json => to_json(&stats)?,
                OutputFormat::Text => render_stats_text(&stats, &ColorPalette::detect()),
            }
        }
    };
    print!("{rendered}");
    Ok(())
}
