//! Decision processes: stage transitions and the process document.

mod board;
mod document;
mod stages;

pub use board::DecisionBoard;
pub use document::DocumentEditor;
pub use stages::StageAction;
