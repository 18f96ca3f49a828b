//! Minimal SVG scatter plot with text labels.

use super::Projection;

const MARGIN: f64 = 40.0;

/// Render a projection as a labelled scatter plot.
pub fn render_svg(projection: &Projection, width: u32, height: u32) -> String {
    let (w, h) = (width as f64, height as f64);

    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in &projection.points {
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    let span_x = if max_x > min_x { max_x - min_x } else { 1.0 };
    let span_y = if max_y > min_y { max_y - min_y } else { 1.0 };

    let sx = |x: f64| MARGIN + (x - min_x) / span_x * (w - 2.0 * MARGIN);
    // SVG y grows downwards
    let sy = |y: f64| h - MARGIN - (y - min_y) / span_y * (h - 2.0 * MARGIN);

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    );
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    for p in &projection.points {
        let (cx, cy) = (sx(p.x), sy(p.y));
        svg.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"3\" fill=\"steelblue\"/>\n",
            cx, cy
        ));
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"10\" font-family=\"sans-serif\">{}</text>\n",
            cx + 5.0,
            cy - 2.0,
            escape(&p.label)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
