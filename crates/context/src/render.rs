//! Plain-text rendering of a [`ResearchAnswer`] for the CLI

use citewise_common::models::ResearchAnswer;
use std::fmt::Write;

/// Render the answer as titled sections
pub fn render_sections(answer: &ResearchAnswer) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "===== STRUCTURED RESEARCH ANSWER =====\n");
    let _ = writeln!(out, "Direct Answer\n{}\n", answer.answer);

    let _ = writeln!(out, "Key Points");
    for point in &answer.key_points {
        let _ = writeln!(out, "- {}", point);
    }

    let _ = writeln!(out, "\nEvidence");
    for (paper, text) in &answer.evidence {
        let _ = writeln!(out, "{}\n  {}", paper, text);
    }

    let _ = writeln!(out, "\nLimitations\n{}", answer.limitations);

    let _ = writeln!(out, "\nReferences");
    for reference in &answer.references {
        let _ = writeln!(out, "- {}", reference);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_present_in_order() {
        let mut answer = ResearchAnswer::insufficient_evidence();
        answer.key_points.push("point".into());
        answer.evidence.insert("a.pdf".into(), "shows x".into());
        answer.references.push("a.pdf".into());

        let text = render_sections(&answer);
        let order = ["Direct Answer", "Key Points", "Evidence", "Limitations", "References"];
        let positions: Vec<usize> = order.iter().map(|s| text.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("- point"));
        assert!(text.contains("a.pdf\n  shows x"));
    }
}
