//! Terminal styling and unit formatting.
//!
//! ANSI color handling for text output plus the distance/duration formatting
//! shared by every text renderer.

/// Raw ANSI sequences used by [`ColorPalette::colored`].
pub mod colors {
    /// Reset all styling.
    pub const RESET: &str = "\x1b[0m";

    // Leg badges (bold reverse video)
    /// Bold reverse green for the start point.
    pub const TAG_START: &str = "\x1b[1;7;32m";
    /// Bold reverse cyan for auxiliary waypoints.
    pub const TAG_WAYPOINT: &str = "\x1b[1;7;36m";
    /// Bold reverse magenta for the via point or destination.
    pub const TAG_GOAL: &str = "\x1b[1;7;35m";

    /// Bright bold white for headline figures.
    pub const WHITE_BOLD: &str = "\x1b[1;97m";
    /// Gray for secondary detail.
    pub const GRAY: &str = "\x1b[90m";
    /// Green for results within tolerance.
    pub const GREEN: &str = "\x1b[32m";
    /// Yellow for best-effort and infeasible results.
    pub const YELLOW: &str = "\x1b[33m";
}

/// Resolved color codes, either ANSI sequences or empty strings when color is
/// disabled.
#[derive(Debug, Clone, Copy)]
pub struct ColorPalette {
    pub reset: &'static str,
    pub tag_start: &'static str,
    pub tag_waypoint: &'static str,
    pub tag_goal: &'static str,
    pub white_bold: &'static str,
    pub gray: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
}

impl ColorPalette {
    #[must_use]
    pub const fn colored() -> Self {
        Self {
            reset: colors::RESET,
            tag_start: colors::TAG_START,
            tag_waypoint: colors::TAG_WAYPOINT,
            tag_goal: colors::TAG_GOAL,
            white_bold: colors::WHITE_BOLD,
            gray: colors::GRAY,
            green: colors::GREEN,
            yellow: colors::YELLOW,
        }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self {
            reset: "",
            tag_start: "",
            tag_waypoint: "",
            tag_goal: "",
            white_bold: "",
            gray: "",
            green: "",
            yellow: "",
        }
    }

    /// `colored()` when the terminal supports ANSI colors, otherwise `plain()`.
    #[must_use]
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    /// Badge color for a loop leg label.
    pub fn leg_tag(&self, label: &str) -> &'static str {
        match label {
            "start" => self.tag_start,
            "via" => self.tag_goal,
            _ => self.tag_waypoint,
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::detect()
    }
}

/// Whether stdout output should carry ANSI colors.
///
/// Respects `NO_COLOR` (https://no-color.org/) and `TERM=dumb`.
#[must_use]
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if let Ok(term) = std::env::var("TERM") {
        if term.eq_ignore_ascii_case("dumb") {
            return false;
        }
    }
    true
}

/// Format a number with thousand separators, e.g. `1,234,567`.
///
/// ```
/// # use walknet_cli::terminal::format_with_separators;
/// assert_eq!(format_with_separators(999), "999");
/// assert_eq!(format_with_separators(48213), "48,213");
/// ```
#[must_use]
pub fn format_with_separators(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Meters below one kilometer, kilometers with two decimals above.
#[must_use]
pub fn format_distance_m(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

/// Walking time as `1 h 05 min`, `12 min 30 s` or `45 s`.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours} h {minutes:02} min")
    } else if minutes > 0 {
        format!("{minutes} min {secs:02} s")
    } else {
        format!("{secs} s")
    }
}
