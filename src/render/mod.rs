//! Terminal and SVG output for insights and decision processes.

mod svg;
mod text;

pub use svg::perspective_svg;
pub use text::{
    bias_panel, decision_panel, document_panel, heading, perspective_panel, stage_line,
    NO_BIASES, NO_DECISION_PROCESS, NO_DOCUMENT, NO_PERSPECTIVE_DATA,
};
