//! Hand-picked colorscales and a linear color ramp.

use crate::chart::trace::Colorscale;

/// Dark-to-bright scale for plain magnitudes.
pub fn normal() -> Colorscale {
    Colorscale::stops([
        (0.0, "#0d0887"),
        (0.25, "#7e03a8"),
        (0.5, "#cc4778"),
        (0.75, "#f89540"),
        (1.0, "#f0f921"),
    ])
}

/// Cyclic scale whose ends meet, for compass bearings.
pub fn circle() -> Colorscale {
    Colorscale::stops([
        (0.0, "#ff3f3f"),
        (0.25, "#ffff3f"),
        (0.5, "#3fff3f"),
        (0.75, "#3f3fff"),
        (1.0, "#ff3f3f"),
    ])
}

/// Diverging scale centered on zero change.
pub fn updown() -> Colorscale {
    Colorscale::stops([
        (0.0, "#3f7fff"),
        (0.5, "#f2f2f2"),
        (1.0, "#ff3f3f"),
    ])
}

/// Red at the low end, green at the high end.
pub fn red_green() -> Colorscale {
    Colorscale::stops([(0.0, "#ff3f3f"), (0.5, "#ffbe3f"), (1.0, "#3fff7f")])
}

/// Green at the low end, red at the high end.
pub fn green_red() -> Colorscale {
    Colorscale::stops([(0.0, "#3fff7f"), (0.5, "#ffbe3f"), (1.0, "#ff3f3f")])
}

pub fn oil() -> Colorscale {
    Colorscale::stops([(0.0, "#50bf37"), (0.5, "#2a7a1b"), (1.0, "#0f3d07")])
}

pub fn water() -> Colorscale {
    Colorscale::stops([(0.0, "#4286f4"), (0.5, "#1f4fa8"), (1.0, "#0b2257")])
}

pub fn steam() -> Colorscale {
    Colorscale::stops([(0.0, "#e2e539"), (0.5, "#e56f39"), (1.0, "#a8201a")])
}

pub fn gas() -> Colorscale {
    Colorscale::stops([(0.0, "#ef2626"), (0.5, "#a81a1a"), (1.0, "#570b0b")])
}

/// `n` colors spread evenly along the piecewise-linear ramp through `stops`.
///
/// `ramp(stops, n)[i]` is the ramp sampled at `i / n`, so the last stop is only
/// reached in the limit.
///
/// # Examples
///
/// ```
/// use dashframe::panels::palette::ramp;
///
/// let colors = ramp(&[[0, 0, 0], [255, 255, 255]], 2);
/// assert_eq!(colors, vec!["#000000", "#808080"]);
/// ```
pub fn ramp(stops: &[[u8; 3]], n: usize) -> Vec<String> {
    if stops.is_empty() || n == 0 {
        return Vec::new();
    }
    let segments = (stops.len() - 1) as f64;
    (0..n)
        .map(|i| {
            let position = i as f64 / n as f64 * segments;
            let lower = (position.floor() as usize).min(stops.len() - 1);
            let upper = (lower + 1).min(stops.len() - 1);
            let fraction = position - lower as f64;
            let channel = |c: usize| {
                let a = f64::from(stops[lower][c]);
                let b = f64::from(stops[upper][c]);
                (a + (b - a) * fraction).round() as u8
            };
            format!("#{:02x}{:02x}{:02x}", channel(0), channel(1), channel(2))
        })
        .collect()
}

/// Dark green to yellow, oldest month first.
pub const MONTH_RAMP: [[u8; 3]; 6] = [
    [24, 110, 45],
    [82, 138, 45],
    [108, 201, 46],
    [188, 245, 66],
    [245, 218, 66],
    [245, 200, 66],
];
