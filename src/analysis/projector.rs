//! Perspective projection: analysis records to a 2-D scatterplot.
//!
//! Each record with at least two perspective coordinates becomes a point
//! `(values[0], values[1])`. Coordinates are linearly scaled from the unit
//! domain into the inner area of a fixed canvas and coloured by sentiment on
//! a red-yellow-green diverging scale.

use serde::Serialize;

use crate::api::AnalysisRecord;

/// Label of the horizontal axis.
pub const X_AXIS_LABEL: &str = "Factual ↔ Emotional";
/// Label of the vertical axis.
pub const Y_AXIS_LABEL: &str = "Logical ↔ Intuitive";
/// Point radius in pixels.
pub const POINT_RADIUS: f64 = 5.0;
/// Ticks requested per axis.
pub const AXIS_TICKS: usize = 5;

/// One record projected onto its first two perspective dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerspectivePoint {
    pub x: f64,
    pub y: f64,
    pub message_id: String,
    pub sentiment: f64,
}

impl PerspectivePoint {
    /// Hover text: truncated message id and sentiment to two decimals.
    pub fn hover_text(&self) -> String {
        let short_id: String = self.message_id.chars().take(8).collect();
        format!("Message {}...\nSentiment: {:.2}", short_id, self.sentiment)
    }
}

/// What to do with coordinates outside [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoordinatePolicy {
    /// Plot as-is; points may land outside the frame.
    #[default]
    PassThrough,
    /// Pin each coordinate to the nearest edge of [0, 1].
    Clamp,
}

impl CoordinatePolicy {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            CoordinatePolicy::PassThrough => value,
            CoordinatePolicy::Clamp => value.clamp(0.0, 1.0),
        }
    }
}

impl std::fmt::Display for CoordinatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinatePolicy::PassThrough => write!(f, "pass-through"),
            CoordinatePolicy::Clamp => write!(f, "clamp"),
        }
    }
}

impl std::str::FromStr for CoordinatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pass-through" | "passthrough" | "pass_through" => Ok(CoordinatePolicy::PassThrough),
            "clamp" => Ok(CoordinatePolicy::Clamp),
            _ => Err(format!("Unknown coordinate policy: {}", s)),
        }
    }
}

/// Keep records with at least two coordinates and take the first two.
pub fn project_points(records: &[AnalysisRecord]) -> Vec<PerspectivePoint> {
    records
        .iter()
        .filter(|record| record.perspective_vector.values.len() >= 2)
        .map(|record| PerspectivePoint {
            x: record.perspective_vector.values[0],
            y: record.perspective_vector.values[1],
            message_id: record.message_id.clone(),
            sentiment: record.sentiment_score,
        })
        .collect()
}

/// Map sentiment from [-1, 1] onto [0, 1].
pub fn normalize_sentiment(sentiment: f64) -> f64 {
    (sentiment + 1.0) / 2.0
}

// ============================================================================
// Scales and layout
// ============================================================================

/// Continuous linear map from a domain interval to a range interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    /// Scale a value. Values outside the domain extrapolate linearly.
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    /// Roughly `count` evenly spaced round values covering the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        if count == 0 || !(hi > lo) {
            return vec![lo];
        }

        let step = nice_step((hi - lo) / count as f64);
        if step < 1.0 {
            // Divide by the inverse step so 0.2 * 3 comes out as 0.6
            let inverse = (1.0 / step).round();
            let start = (lo * inverse).ceil() as i64;
            let stop = (hi * inverse).floor() as i64;
            (start..=stop).map(|i| i as f64 / inverse).collect()
        } else {
            let start = (lo / step).ceil() as i64;
            let stop = (hi / step).floor() as i64;
            (start..=stop).map(|i| i as f64 * step).collect()
        }
    }
}

/// Round a raw step to 1, 2, 5 or 10 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

/// Canvas margins in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Canvas size and margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    pub width: f64,
    pub height: f64,
    pub margin: Margins,
}

impl CanvasLayout {
    /// 250×200 canvas with 10/10/30/30 margins.
    pub const PERSPECTIVE: CanvasLayout = CanvasLayout {
        width: 250.0,
        height: 200.0,
        margin: Margins {
            top: 10.0,
            right: 10.0,
            bottom: 30.0,
            left: 30.0,
        },
    };

    pub fn inner_width(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    pub fn inner_height(&self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }

    /// Unit domain to `[0, inner_width]`.
    pub fn x_scale(&self) -> LinearScale {
        LinearScale::new((0.0, 1.0), (0.0, self.inner_width()))
    }

    /// Unit domain to `[inner_height, 0]`; larger values plot higher.
    pub fn y_scale(&self) -> LinearScale {
        LinearScale::new((0.0, 1.0), (self.inner_height(), 0.0))
    }
}

impl Default for CanvasLayout {
    fn default() -> Self {
        Self::PERSPECTIVE
    }
}

// ============================================================================
// Colour
// ============================================================================

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The 11-class RdYlGn scheme, red to green.
const RD_YL_GN: [Rgb; 11] = [
    Rgb::new(0xa5, 0x00, 0x26),
    Rgb::new(0xd7, 0x30, 0x27),
    Rgb::new(0xf4, 0x6d, 0x43),
    Rgb::new(0xfd, 0xae, 0x61),
    Rgb::new(0xfe, 0xe0, 0x8b),
    Rgb::new(0xff, 0xff, 0xbf),
    Rgb::new(0xd9, 0xef, 0x8b),
    Rgb::new(0xa6, 0xd9, 0x6a),
    Rgb::new(0x66, 0xbd, 0x63),
    Rgb::new(0x1a, 0x98, 0x50),
    Rgb::new(0x00, 0x68, 0x37),
];

/// Uniform cubic B-spline through the scheme's stops.
///
/// `t` is clamped to [0, 1]; the curve passes exactly through the first and
/// last stops.
pub fn interpolate_rd_yl_gn(t: f64) -> Rgb {
    let channel = |pick: fn(&Rgb) -> u8| -> u8 {
        let values: Vec<f64> = RD_YL_GN.iter().map(|c| pick(c) as f64).collect();
        basis_spline(&values, t).round().clamp(0.0, 255.0) as u8
    };
    Rgb::new(channel(|c| c.r), channel(|c| c.g), channel(|c| c.b))
}

fn basis_spline(values: &[f64], t: f64) -> f64 {
    let n = values.len() - 1;
    let (t, i) = if t.is_nan() || t <= 0.0 {
        (0.0, 0)
    } else if t >= 1.0 {
        (1.0, n - 1)
    } else {
        (t, (t * n as f64).floor() as usize)
    };

    let v1 = values[i];
    let v2 = values[i + 1];
    let v0 = if i > 0 { values[i - 1] } else { 2.0 * v1 - v2 };
    let v3 = if i < n - 1 { values[i + 2] } else { 2.0 * v2 - v1 };

    let t1 = (t - i as f64 / n as f64) * n as f64;
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

/// Colour for a sentiment in [-1, 1]: red for negative, green for positive.
pub fn sentiment_color(sentiment: f64) -> Rgb {
    interpolate_rd_yl_gn(normalize_sentiment(sentiment))
}

// ============================================================================
// Plot model
// ============================================================================

/// A point placed on the canvas, in inner-area pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlottedPoint {
    pub point: PerspectivePoint,
    pub cx: f64,
    pub cy: f64,
    pub fill: Rgb,
}

/// Everything needed to draw the perspective scatterplot.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveMap {
    pub layout: CanvasLayout,
    pub points: Vec<PlottedPoint>,
}

impl PerspectiveMap {
    /// Build a fresh plot from the full record set.
    ///
    /// Returns `None` when no record has two coordinates; callers show a
    /// "no data" message instead of a canvas.
    pub fn build(records: &[AnalysisRecord], policy: CoordinatePolicy) -> Option<Self> {
        let layout = CanvasLayout::PERSPECTIVE;
        let x_scale = layout.x_scale();
        let y_scale = layout.y_scale();

        let points: Vec<PlottedPoint> = project_points(records)
            .into_iter()
            .map(|point| PlottedPoint {
                cx: x_scale.map(policy.apply(point.x)),
                cy: y_scale.map(policy.apply(point.y)),
                fill: sentiment_color(point.sentiment),
                point,
            })
            .collect();

        if points.is_empty() {
            None
        } else {
            Some(Self { layout, points })
        }
    }
}
