use crate::models::{Decision, Suggestion};
use crate::text::{extract_title, is_actionable, normalize, similarity};

#[derive(Clone, Debug)]
pub struct Evaluation {
    pub title: String,
    pub similarity: f64,
    pub actionable: bool,
    pub decision: Decision,
}

/// Classifies one suggestion. The similarity check runs before actionability.
pub fn evaluate(suggestion: &Suggestion, threshold: f64) -> Evaluation {
    let title = extract_title(&suggestion.suggested_text);
    let similarity = similarity(&normalize(&suggestion.original), &normalize(&title));
    let actionable = is_actionable(&title);

    let decision = if similarity >= threshold {
        Decision::SkipSimilar
    } else if !actionable {
        Decision::SkipNotActionable
    } else {
        Decision::Insert
    };

    Evaluation {
        title,
        similarity,
        actionable,
        decision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(original: &str, suggested_text: &str) -> Suggestion {
        Suggestion {
            original: original.to_string(),
            suggested_text: suggested_text.to_string(),
        }
    }

    #[test]
    fn near_identical_title_is_skipped_before_actionability() {
        let eval = evaluate(&suggestion("Buy milk", "- [ ] Buy milk"), 0.85);
        assert!((eval.similarity - 1.0).abs() < 1e-9);
        assert!(!eval.actionable);
        assert_eq!(eval.decision, Decision::SkipSimilar);
        assert_eq!(eval.title, "Buy milk");
    }

    #[test]
    fn distinct_actionable_title_is_inserted() {
        let eval = evaluate(
            &suggestion("Team standup notes", "- [ ] Create retro action plan"),
            0.85,
        );
        assert!(eval.similarity < 0.85);
        assert!(eval.actionable);
        assert_eq!(eval.decision, Decision::Insert);
    }

    #[test]
    fn distinct_vague_title_is_not_actionable() {
        let eval = evaluate(
            &suggestion("Team standup notes", "- [ ] Vague thought about stuff"),
            0.85,
        );
        assert_eq!(eval.decision, Decision::SkipNotActionable);
    }

    #[test]
    fn threshold_is_inclusive_and_configurable() {
        let item = suggestion("Create retro plan", "- [ ] Create retro plans");
        let eval = evaluate(&item, 0.85);
        assert_eq!(eval.decision, Decision::SkipSimilar);

        let strict = evaluate(&item, 1.0);
        assert_eq!(strict.decision, Decision::Insert);

        let exact = evaluate(&suggestion("Create plan", "- [ ] Create plan"), 1.0);
        assert_eq!(exact.decision, Decision::SkipSimilar);
    }

    #[test]
    fn only_first_line_of_suggestion_is_the_title() {
        let eval = evaluate(
            &suggestion("Quarterly budget", "- [ ] Schedule budget review\n  - details"),
            0.85,
        );
        assert_eq!(eval.title, "Schedule budget review");
        assert_eq!(eval.decision, Decision::Insert);
    }
}
