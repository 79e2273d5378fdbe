use crate::analysis::{BiasTally, PerspectiveMap};
use crate::api::{DecisionDocument, DecisionProcess, DecisionStage};
use crate::decision::StageAction;

pub const NO_BIASES: &str = "No significant biases detected yet.";
pub const NO_PERSPECTIVE_DATA: &str = "No data available for visualization.";
pub const NO_DECISION_PROCESS: &str = "No decision process has been started for this discussion.";
pub const NO_DOCUMENT: &str = "No decision document has been created yet.";

const RULE: &str =
    "═══════════════════════════════════════════════════════════════════════════════\n\n";
const BAR_CELLS: usize = 20;

/// Section title followed by a double rule.
pub fn heading(title: &str) -> String {
    format!("\n{}\n{}", title, RULE)
}

/// Ranked biases with occurrence counts and proportional bars.
pub fn bias_panel(tallies: &[BiasTally]) -> String {
    let mut output = heading("Potential Biases");

    if tallies.is_empty() {
        output.push_str(NO_BIASES);
        output.push('\n');
        return output;
    }

    for tally in tallies {
        let filled = tally.bar_percent() * BAR_CELLS / 100;
        output.push_str(&format!(
            "  {:<32} {}\n  [{}{}] {}%\n",
            tally.display_name(),
            tally.occurrence_label(),
            "█".repeat(filled),
            "·".repeat(BAR_CELLS - filled),
            tally.bar_percent()
        ));
    }
    output
}

/// Text summary of the perspective map, or the empty-state line.
pub fn perspective_panel(map: Option<&PerspectiveMap>) -> String {
    let mut output = heading("Perspective Map");

    let Some(map) = map else {
        output.push_str(NO_PERSPECTIVE_DATA);
        output.push('\n');
        return output;
    };

    output.push_str(&format!("{} point(s) plotted\n\n", map.points.len()));
    for plotted in &map.points {
        let short_id: String = plotted.point.message_id.chars().take(8).collect();
        output.push_str(&format!(
            "  {:<10} x={:.2} y={:.2} sentiment={:+.2} {}\n",
            short_id,
            plotted.point.x,
            plotted.point.y,
            plotted.point.sentiment,
            plotted.fill.to_hex()
        ));
    }
    output.push_str("\nColors represent sentiment (red=negative, green=positive).\n");
    output
}

/// Process header and stages, each with its one available action.
pub fn decision_panel(process: Option<&DecisionProcess>, stages: &[DecisionStage]) -> String {
    let mut output = heading("Decision Process");

    let Some(process) = process else {
        output.push_str(NO_DECISION_PROCESS);
        output.push('\n');
        return output;
    };

    output.push_str(&format!("{}  [{}]\n", process.title, process.status.label()));
    output.push_str(&format!(
        "Started {}\n\n",
        process.started_at.format("%Y-%m-%d %H:%M")
    ));

    output.push_str("Process Stages\n");
    for stage in stages {
        output.push_str(&stage_line(stage));
    }
    output
}

/// `{n}. {name}  [status]  -> action`, then the description if any.
pub fn stage_line(stage: &DecisionStage) -> String {
    let action = StageAction::for_status(stage.status);
    let mut line = format!(
        "  {}. {}  [{}]  -> {}\n",
        stage.order_index + 1,
        stage.name,
        stage.status.label(),
        action.label()
    );
    if !stage.description.is_empty() {
        line.push_str(&format!("     {}\n", stage.description));
    }
    line
}

pub fn document_panel(document: Option<&DecisionDocument>) -> String {
    let mut output = heading("Decision Document");

    let Some(document) = document else {
        output.push_str(NO_DOCUMENT);
        output.push_str("\nUse `document save` to Create Document.\n");
        return output;
    };

    let updated = document
        .updated_at
        .or(document.created_at)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    output.push_str(&format!(
        "{}\nVersion {} | Last updated {}\n\n",
        document.title, document.version, updated
    ));
    for paragraph in document.content.split('\n') {
        output.push_str(paragraph);
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StageStatus;
    use chrono::Utc;

    fn stage(order_index: u32, name: &str, status: StageStatus) -> DecisionStage {
        DecisionStage {
            id: format!("s{}", order_index),
            process_id: "p1".to_string(),
            name: name.to_string(),
            description: String::new(),
            order_index,
            status,
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_bias_panel_empty() {
        assert!(bias_panel(&[]).contains(NO_BIASES));
    }

    #[test]
    fn test_bias_panel_bars() {
        let panel = bias_panel(&[BiasTally {
            name: "confirmation_bias".to_string(),
            count: 2,
        }]);
        assert!(panel.contains("confirmation bias"));
        assert!(panel.contains("2 occurrences"));
        assert!(panel.contains("40%"));
        assert_eq!(panel.matches('█').count(), 8);
    }

    #[test]
    fn test_perspective_panel_empty() {
        assert!(perspective_panel(None).contains(NO_PERSPECTIVE_DATA));
    }

    #[test]
    fn test_stage_heading_is_one_based() {
        let line = stage_line(&stage(0, "Ideation", StageStatus::Pending));
        assert!(line.starts_with("  1. Ideation  [Pending]  -> Start Stage"));

        let line = stage_line(&stage(2, "Review", StageStatus::Completed));
        assert!(line.contains("3. Review  [Completed]  -> Reopen Stage"));
    }

    #[test]
    fn test_decision_panel_without_process() {
        assert!(decision_panel(None, &[]).contains(NO_DECISION_PROCESS));
    }

    #[test]
    fn test_document_panel_shows_version() {
        let document = DecisionDocument {
            id: "d1".to_string(),
            process_id: "p1".to_string(),
            title: "Outcome".to_string(),
            content: "First line\nSecond line".to_string(),
            version: 2,
            created_at: Some(Utc::now()),
            updated_at: None,
        };
        let panel = document_panel(Some(&document));
        assert!(panel.contains("Version 2 |"));
        assert!(panel.contains("Second line"));

        assert!(document_panel(None).contains("Create Document"));
    }
}
