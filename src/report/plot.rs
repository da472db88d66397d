//! Normal density curves per group, drawn as PDF vector paths.

use lopdf::content::Operation;
use lopdf::Object;
use statrs::distribution::{Continuous, Normal};

/// Set2 qualitative palette.
pub const PALETTE: [[u8; 3]; 8] = [
    [102, 194, 165],
    [252, 141, 98],
    [141, 160, 203],
    [231, 138, 195],
    [166, 216, 84],
    [255, 217, 47],
    [229, 196, 148],
    [179, 179, 179],
];

/// Graphics state name for the translucent fill under each curve.
pub const FILL_STATE: &str = "GSFill";
pub const FILL_ALPHA: f64 = 0.2;

const SAMPLES: usize = 200;
const TICKS: usize = 5;

/// One normal density to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub label: String,
    pub mean: f64,
    pub std_dev: f64,
}

impl Curve {
    fn is_drawable(&self) -> bool {
        self.mean.is_finite() && self.std_dev.is_finite() && self.std_dev > 0.0
    }
}

/// Plotting area in page coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    /// Upper half of a page, leaving room for the title above and the legend below.
    pub fn for_page(width: f64, height: f64) -> Self {
        Frame {
            left: 90.0,
            bottom: height * 0.42,
            width: width - 150.0,
            height: height * 0.45,
        }
    }
}

/// Shared x-axis: four of the widest standard deviations beyond the extreme means.
pub fn x_range(curves: &[Curve]) -> Option<(f64, f64)> {
    let drawable: Vec<&Curve> = curves.iter().filter(|c| c.is_drawable()).collect();
    if drawable.is_empty() {
        return None;
    }
    let lo = drawable.iter().map(|c| c.mean).fold(f64::INFINITY, f64::min);
    let hi = drawable.iter().map(|c| c.mean).fold(f64::NEG_INFINITY, f64::max);
    let sd = drawable.iter().map(|c| c.std_dev).fold(0.0, f64::max);
    Some((lo - 4.0 * sd, hi + 4.0 * sd))
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn rgb(color: [u8; 3]) -> Vec<Object> {
    color.iter().map(|&c| real(c as f64 / 255.0)).collect()
}

fn text(ops: &mut Vec<Operation>, font: &str, size: f64, x: f64, y: f64, s: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), real(size)]));
    ops.push(Operation::new("Td", vec![real(x), real(y)]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(s)]));
    ops.push(Operation::new("ET", vec![]));
}

fn segment(ops: &mut Vec<Operation>, from: (f64, f64), to: (f64, f64)) {
    ops.push(Operation::new("m", vec![real(from.0), real(from.1)]));
    ops.push(Operation::new("l", vec![real(to.0), real(to.1)]));
    ops.push(Operation::new("S", vec![]));
}

fn ticks(lo: f64, hi: f64) -> Vec<f64> {
    (0..TICKS)
        .map(|i| lo + (hi - lo) * i as f64 / (TICKS - 1) as f64)
        .collect()
}

/// Content-stream operations for a page with one density per drawable curve.
///
/// Curves with a non-finite or zero standard deviation are left out of the drawing and listed
/// in the legend as such. `font` must name a monospaced font resource.
pub fn plot_operations(curves: &[Curve], page_width: f64, page_height: f64, font: &str) -> Vec<Operation> {
    let mut ops = Vec::new();
    let frame = Frame::for_page(page_width, page_height);
    let title = "Normal Distribution Comparison";
    let title_size = 14.0;
    // Courier advances 0.6 em per glyph
    let title_x = (page_width - title.len() as f64 * 0.6 * title_size) / 2.0;
    text(&mut ops, font, title_size, title_x, frame.bottom + frame.height + 30.0, title);

    let Some((x_min, x_max)) = x_range(curves) else {
        text(
            &mut ops,
            font,
            10.0,
            frame.left,
            frame.bottom + frame.height / 2.0,
            "No group has a finite, positive standard deviation to plot.",
        );
        return ops;
    };
    let y_max = curves
        .iter()
        .filter(|c| c.is_drawable())
        .map(|c| 1.0 / (c.std_dev * (2.0 * std::f64::consts::PI).sqrt()))
        .fold(0.0, f64::max)
        * 1.05;

    let px = |x: f64| frame.left + (x - x_min) / (x_max - x_min) * frame.width;
    let py = |y: f64| frame.bottom + y / y_max * frame.height;

    // Grid and tick labels
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new("w", vec![real(0.4)]));
    ops.push(Operation::new("RG", vec![real(0.85), real(0.85), real(0.85)]));
    for x in ticks(x_min, x_max) {
        segment(&mut ops, (px(x), frame.bottom), (px(x), frame.bottom + frame.height));
    }
    for y in ticks(0.0, y_max) {
        segment(&mut ops, (frame.left, py(y)), (frame.left + frame.width, py(y)));
    }
    ops.push(Operation::new("Q", vec![]));
    for x in ticks(x_min, x_max) {
        let label = format!("{:.2}", x);
        let offset = label.len() as f64 * 0.6 * 8.0 / 2.0;
        text(&mut ops, font, 8.0, px(x) - offset, frame.bottom - 12.0, &label);
    }
    for y in ticks(0.0, y_max) {
        let label = format!("{:.3}", y);
        let offset = label.len() as f64 * 0.6 * 8.0 + 4.0;
        text(&mut ops, font, 8.0, frame.left - offset, py(y) - 3.0, &label);
    }

    let drawable: Vec<(usize, &Curve)> = curves
        .iter()
        .filter(|c| c.is_drawable())
        .enumerate()
        .collect();
    for &(idx, curve) in &drawable {
        let Ok(normal) = Normal::new(curve.mean, curve.std_dev) else {
            continue;
        };
        let color = PALETTE[idx % PALETTE.len()];
        let points: Vec<(f64, f64)> = sample_points(x_min, x_max)
            .into_iter()
            .map(|x| (px(x), py(normal.pdf(x))))
            .collect();

        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("gs", vec![Object::Name(FILL_STATE.as_bytes().to_vec())]));
        ops.push(Operation::new("rg", rgb(color)));
        ops.push(Operation::new("m", vec![real(frame.left), real(frame.bottom)]));
        for &(x, y) in &points {
            ops.push(Operation::new("l", vec![real(x), real(y)]));
        }
        ops.push(Operation::new("l", vec![real(frame.left + frame.width), real(frame.bottom)]));
        ops.push(Operation::new("h", vec![]));
        ops.push(Operation::new("f", vec![]));
        ops.push(Operation::new("Q", vec![]));

        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("RG", rgb(color)));
        ops.push(Operation::new("w", vec![real(2.0)]));
        ops.push(Operation::new("m", vec![real(points[0].0), real(points[0].1)]));
        for &(x, y) in &points[1..] {
            ops.push(Operation::new("l", vec![real(x), real(y)]));
        }
        ops.push(Operation::new("S", vec![]));

        ops.push(Operation::new("w", vec![real(1.0)]));
        ops.push(Operation::new("d", vec![Object::Array(vec![real(4.0), real(3.0)]), real(0.0)]));
        segment(
            &mut ops,
            (px(curve.mean), frame.bottom),
            (px(curve.mean), frame.bottom + frame.height),
        );
        ops.push(Operation::new("Q", vec![]));
    }

    // Axes drawn last so they sit on top of the fills
    ops.push(Operation::new("w", vec![real(0.8)]));
    ops.push(Operation::new("RG", vec![real(0.0), real(0.0), real(0.0)]));
    ops.push(Operation::new(
        "re",
        vec![real(frame.left), real(frame.bottom), real(frame.width), real(frame.height)],
    ));
    ops.push(Operation::new("S", vec![]));
    text(&mut ops, font, 10.0, frame.left + frame.width / 2.0 - 3.0, frame.bottom - 28.0, "x");
    text(&mut ops, font, 10.0, frame.left - 60.0, frame.bottom + frame.height + 10.0, "Probability Density");

    let mut y = frame.bottom - 50.0;
    let mut drawn = drawable.iter();
    for curve in curves {
        let label = if curve.is_drawable() {
            let Some(&(idx, _)) = drawn.next() else {
                break;
            };
            let color = PALETTE[idx % PALETTE.len()];
            ops.push(Operation::new("q", vec![]));
            ops.push(Operation::new("RG", rgb(color)));
            ops.push(Operation::new("w", vec![real(2.5)]));
            segment(&mut ops, (frame.left, y + 3.0), (frame.left + 24.0, y + 3.0));
            ops.push(Operation::new("Q", vec![]));
            format!("{} (mean={:.4}, sd={:.4})", curve.label, curve.mean, curve.std_dev)
        } else {
            format!("{} (not plotted: sd={})", curve.label, curve.std_dev)
        };
        text(&mut ops, font, 9.0, frame.left + 32.0, y, &label);
        y -= 14.0;
    }

    ops
}

fn sample_points(lo: f64, hi: f64) -> Vec<f64> {
    (0..SAMPLES)
        .map(|i| lo + (hi - lo) * i as f64 / (SAMPLES - 1) as f64)
        .collect()
}
