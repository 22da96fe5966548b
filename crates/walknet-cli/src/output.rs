//! Output formatting for command results.
//!
//! Text renderers return a `String` so that commands decide where it goes and
//! tests can inspect it without capturing stdout.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde::Serialize;
use walknet_lib::{GraphStats, LoopEstimate, LoopRoute, Node, RouteResult};

use crate::terminal::{format_distance_m, format_duration, format_with_separators, ColorPalette};

/// Output rendering selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Pretty JSON followed by a newline.
pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    Ok(rendered)
}

pub fn render_stats_text(stats: &GraphStats, palette: &ColorPalette) -> String {
    let p = palette;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Nodes:     {}{}{}",
        p.white_bold,
        format_with_separators(stats.node_count as u64),
        p.reset
    );
    let _ = writeln!(
        out,
        "Edges:     {}{}{} {}(directed){}",
        p.white_bold,
        format_with_separators(stats.edge_count as u64),
        p.reset,
        p.gray,
        p.reset
    );
    if stats.districts.is_empty() {
        let _ = writeln!(out, "Districts: none");
    } else {
        let _ = writeln!(out, "Districts: {}", stats.districts.join(", "));
    }
    out
}

pub fn render_district_text(district: &str, nodes: &[Node], palette: &ColorPalette) -> String {
    let p = palette;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "District {}{district}{}: {} nodes",
        p.white_bold,
        p.reset,
        nodes.len()
    );
    for node in nodes {
        let _ = writeln!(
            out,
            "  {} {}({:.6}, {:.6}){}",
            node.id, p.gray, node.coordinate.lat, node.coordinate.lon, p.reset
        );
    }
    out
}

pub fn render_route_text(route: &RouteResult, palette: &ColorPalette) -> String {
    let p = palette;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Route {}{}{} -> {}{}{}: {}{}{}, about {}",
        p.tag_start,
        route.start_node,
        p.reset,
        p.tag_goal,
        route.end_node,
        p.reset,
        p.white_bold,
        format_distance_m(route.distance_meters),
        p.reset,
        format_duration(route.estimated_seconds)
    );
    let last = route.path.len().saturating_sub(1);
    for (index, point) in route.path.iter().enumerate() {
        let branch = if index == last { "└─" } else { "├─" };
        let _ = writeln!(
            out,
            "{}{branch}{} {} {}({:.6}, {:.6}){}",
            p.gray, p.reset, point.id, p.gray, point.lat, point.lon, p.reset
        );
    }
    out
}

pub fn render_estimate_text(estimate: &LoopEstimate, palette: &ColorPalette) -> String {
    let p = palette;
    let mut out = String::new();
    let status = if estimate.feasible {
        format!("{}feasible{}", p.green, p.reset)
    } else {
        format!("{}not feasible{}", p.yellow, p.reset)
    };
    let _ = writeln!(out, "Loop estimate: {status} ({})", estimate.message);
    if let Some(straight) = estimate.straight_km {
        let _ = writeln!(out, "  Straight distance:  {straight:.2} km");
    }
    if let Some(min_loop) = estimate.min_loop_km {
        let _ = writeln!(out, "  Minimal loop:       {min_loop:.2} km");
    }
    if let (Some(min), Some(max)) = (estimate.recommended_min_km, estimate.recommended_max_km) {
        let _ = writeln!(
            out,
            "  Recommended target: {}{min:.2} - {max:.2} km{}",
            p.white_bold, p.reset
        );
    }
    out
}

pub fn render_loop_text(route: &LoopRoute, palette: &ColorPalette) -> String {
    let p = palette;
    let mut out = String::new();
    let status_color = if route.within_tolerance {
        p.green
    } else {
        p.yellow
    };
    let _ = writeln!(
        out,
        "Loop {}{:.2} km{} (target {:.2} km, ±{:.0}%): {status_color}{}{}",
        p.white_bold,
        route.actual_km,
        p.reset,
        route.target_km,
        route.tolerance_percent,
        route.message,
        p.reset
    );
    let _ = writeln!(
        out,
        "  About {}, {} points, deviation factor {:.2}",
        format_duration(route.estimated_seconds),
        route.path.len(),
        route.deviation_factor
    );
    for segment in &route.segments {
        let _ = writeln!(
            out,
            "  {}{}{} -> {}{}{}  {:.2} km {}({} nodes){}",
            p.leg_tag(&segment.from),
            segment.from,
            p.reset,
            p.leg_tag(&segment.to),
            segment.to,
            p.reset,
            segment.distance_km,
            p.gray,
            segment.node_count,
            p.reset
        );
    }
    out
}
