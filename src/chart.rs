use crate::data_structures::{DistributionSlice, SentimentDistribution};
use std::f64::consts::PI;
use std::fmt::Write;

const SIZE: f64 = 360.0;
const CENTER: f64 = SIZE / 2.0;
const RADIUS: f64 = 130.0;
const START_ANGLE_DEG: f64 = 90.0;

/// Point on the circle for a math-convention angle (counter-clockwise, y up).
fn point_at(angle_rad: f64, radius: f64) -> (f64, f64) {
    (CENTER + radius * angle_rad.cos(), CENTER - radius * angle_rad.sin())
}

fn slice_path(start_rad: f64, sweep_rad: f64) -> String {
    let (x0, y0) = point_at(start_rad, RADIUS);
    let (x1, y1) = point_at(start_rad + sweep_rad, RADIUS);
    let large_arc = if sweep_rad > PI { 1 } else { 0 };
    // sweep-flag 0: counter-clockwise on screen
    format!(
        "M {cx:.2} {cy:.2} L {x0:.2} {y0:.2} A {r:.2} {r:.2} 0 {large_arc} 0 {x1:.2} {y1:.2} Z",
        cx = CENTER,
        cy = CENTER,
        r = RADIUS,
    )
}

/// Renders the label distribution as a standalone SVG pie chart.
///
/// Slices start at 12 o'clock and run counter-clockwise in the order given by
/// [`SentimentDistribution::slices`], each labelled with its percentage.
pub fn render_pie_chart(distribution: &SentimentDistribution) -> String {
    let slices = distribution.slices();
    let mut svg = String::new();

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="pie-chart" viewBox="0 0 {size} {height}" width="{size}" height="{height}" role="img" aria-label="Sentiment Distribution">"#,
        size = SIZE,
        height = SIZE + 40.0,
    );
    let _ = write!(
        svg,
        r#"<text x="{x}" y="24" text-anchor="middle" class="chart-title">Sentiment Distribution</text>"#,
        x = CENTER
    );
    svg.push_str(r#"<g transform="translate(0,30)">"#);

    if slices.is_empty() {
        let _ = write!(
            svg,
            r##"<circle cx="{c}" cy="{c}" r="{r}" fill="#ecf0f1"/>"##,
            c = CENTER,
            r = RADIUS
        );
    } else if slices.len() == 1 {
        let only = &slices[0];
        let _ = write!(
            svg,
            r#"<circle cx="{c}" cy="{c}" r="{r}" fill="{fill}"><title>{label}: {count}</title></circle>"#,
            c = CENTER,
            r = RADIUS,
            fill = only.label.color(),
            label = only.label,
            count = only.count,
        );
        push_labels(&mut svg, only, START_ANGLE_DEG.to_radians());
    } else {
        let mut start = START_ANGLE_DEG.to_radians();
        for slice in &slices {
            let sweep = slice.percentage / 100.0 * 2.0 * PI;
            let _ = write!(
                svg,
                r##"<path d="{d}" fill="{fill}" stroke="#ffffff" stroke-width="1"><title>{label}: {count}</title></path>"##,
                d = slice_path(start, sweep),
                fill = slice.label.color(),
                label = slice.label,
                count = slice.count,
            );
            push_labels(&mut svg, slice, start + sweep / 2.0);
            start += sweep;
        }
    }

    svg.push_str("</g></svg>");
    svg
}

fn push_labels(svg: &mut String, slice: &DistributionSlice, mid_rad: f64) {
    let (lx, ly) = point_at(mid_rad, RADIUS * 1.12);
    let (px, py) = point_at(mid_rad, RADIUS * 0.6);
    let anchor = if lx < CENTER - 1.0 {
        "end"
    } else if lx > CENTER + 1.0 {
        "start"
    } else {
        "middle"
    };

    let _ = write!(
        svg,
        r#"<text x="{lx:.2}" y="{ly:.2}" text-anchor="{anchor}" class="slice-label">{label}</text>"#,
        label = slice.label,
    );
    let _ = write!(
        svg,
        r#"<text x="{px:.2}" y="{py:.2}" text-anchor="middle" class="slice-pct">{pct:.1}%</text>"#,
        pct = slice.percentage,
    );
}
