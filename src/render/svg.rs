use crate::analysis::{
    LinearScale, PerspectiveMap, AXIS_TICKS, POINT_RADIUS, X_AXIS_LABEL, Y_AXIS_LABEL,
};

const TICK_SIZE: f64 = 6.0;
const FONT_SIZE: &str = "10px";

/// Render the perspective scatterplot as a standalone SVG document.
///
/// The document is rebuilt from scratch on every call.
pub fn perspective_svg(map: &PerspectiveMap) -> String {
    let layout = map.layout;
    let inner_width = layout.inner_width();
    let inner_height = layout.inner_height();

    let mut circles = String::new();
    for plotted in &map.points {
        circles.push_str(&format!(
            r##"    <circle cx="{}" cy="{}" r="{}" fill="{}" stroke="#fff" stroke-width="1"><title>{}</title></circle>
"##,
            num(plotted.cx),
            num(plotted.cy),
            num(POINT_RADIUS),
            plotted.fill.to_hex(),
            escape_xml(&plotted.point.hover_text()),
        ));
    }

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">
  <g transform="translate({left},{top})">
{x_axis}{y_axis}{circles}    <text x="{x_label_x}" y="{x_label_y}" text-anchor="middle" font-size="{font}">{x_label}</text>
    <text x="{y_label_x}" y="{y_label_y}" transform="rotate(-90)" text-anchor="middle" font-size="{font}">{y_label}</text>
  </g>
</svg>
"##,
        width = num(layout.width),
        height = num(layout.height),
        left = num(layout.margin.left),
        top = num(layout.margin.top),
        x_axis = bottom_axis(&layout.x_scale(), inner_height),
        y_axis = left_axis(&layout.y_scale()),
        circles = circles,
        x_label_x = num(inner_width / 2.0),
        x_label_y = num(inner_height + layout.margin.bottom - 5.0),
        y_label_x = num(-inner_height / 2.0),
        y_label_y = num(-layout.margin.left + 10.0),
        font = FONT_SIZE,
        x_label = escape_xml(X_AXIS_LABEL),
        y_label = escape_xml(Y_AXIS_LABEL),
    )
}

fn bottom_axis(scale: &LinearScale, offset: f64) -> String {
    let (r0, r1) = scale.range();
    let mut out = format!(
        "    <g class=\"axis x-axis\" transform=\"translate(0,{})\">\n      <path d=\"M{},0H{}\" stroke=\"currentColor\" fill=\"none\"/>\n",
        num(offset),
        num(r0),
        num(r1)
    );
    for tick in scale.ticks(AXIS_TICKS) {
        out.push_str(&format!(
            "      <g class=\"tick\" transform=\"translate({},0)\"><line y2=\"{}\" stroke=\"currentColor\"/><text y=\"9\" dy=\"0.71em\" text-anchor=\"middle\" font-size=\"{}\">{:.1}</text></g>\n",
            num(scale.map(tick)),
            num(TICK_SIZE),
            FONT_SIZE,
            tick
        ));
    }
    out.push_str("    </g>\n");
    out
}

fn left_axis(scale: &LinearScale) -> String {
    let (r0, r1) = scale.range();
    let mut out = format!(
        "    <g class=\"axis y-axis\">\n      <path d=\"M0,{}V{}\" stroke=\"currentColor\" fill=\"none\"/>\n",
        num(r0),
        num(r1)
    );
    for tick in scale.ticks(AXIS_TICKS) {
        out.push_str(&format!(
            "      <g class=\"tick\" transform=\"translate(0,{})\"><line x2=\"-{}\" stroke=\"currentColor\"/><text x=\"-9\" dy=\"0.32em\" text-anchor=\"end\" font-size=\"{}\">{:.1}</text></g>\n",
            num(scale.map(tick)),
            num(TICK_SIZE),
            FONT_SIZE,
            tick
        ));
    }
    out.push_str("    </g>\n");
    out
}

/// Compact coordinate: at most three decimals, trailing zeros dropped.
fn num(value: f64) -> String {
    let formatted = format!("{:.3}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
