//! Scoring against the shipped `config/review_data.yaml` rubric.

use reviewgate_core::Answers;
use reviewgate_quality::{load_rubric_str, ReviewEngine, Verdict};

const REVIEW_DATA: &str = include_str!("../../../config/review_data.yaml");

fn engine() -> ReviewEngine {
    ReviewEngine::new(load_rubric_str(REVIEW_DATA).expect("shipped rubric is valid"))
}

fn answers(scored: [f64; 5], excluded: [f64; 3]) -> Answers {
    let [qe2, qe3, qe4, qe5, qe6] = scored;
    let [qe1, qe7, qe8] = excluded;
    Answers::new()
        .with("QE1", qe1)
        .with("QE2", qe2)
        .with("QE3", qe3)
        .with("QE4", qe4)
        .with("QE5", qe5)
        .with("QE6", qe6)
        .with("QE7", qe7)
        .with("QE8", qe8)
}

#[test]
fn shipped_rubric_shape() {
    let engine = engine();
    let rubric = engine.rubric();
    assert_eq!(rubric.questions().len(), 8);
    assert_eq!(rubric.cutoff_score(), 6.5);
    let excluded: Vec<_> = rubric.excluding_questions().iter().map(|id| id.as_str()).collect();
    assert_eq!(excluded, vec!["QE1", "QE7", "QE8"]);
    assert_eq!(rubric.data_extraction_fields().len(), 16);
}

#[test]
fn non_excluded_maxima_fall_short_of_cutoff() {
    let engine = engine();
    let record = engine
        .review("paper.pdf", answers([2.0, 1.0, 1.0, 1.0, 1.0], [0.0, 0.0, 0.0]))
        .unwrap();

    assert_eq!(record.total_score(), 6.0);
    assert_eq!(record.max_possible_score(), 6.0);
    assert_eq!(record.verdict(), Verdict::Reject);
    assert!(!engine.rubric().cutoff_reachable());
}

#[test]
fn excluded_maxima_do_not_help() {
    let engine = engine();
    let record = engine
        .review("paper.pdf", answers([2.0, 1.0, 1.0, 1.0, 1.0], [1.0, 1.0, 1.0]))
        .unwrap();

    assert_eq!(record.total_score(), 6.0);
    assert_eq!(record.verdict(), Verdict::Reject);
    assert_eq!(record.answers().get("QE7"), Some(1.0));
}

#[test]
fn including_every_question_makes_cutoff_reachable() {
    let engine = engine();
    let rubric = engine.rubric().with_exclusions(Vec::<&str>::new()).unwrap();
    assert_eq!(rubric.max_possible_score(), 9.0);

    let all_in = ReviewEngine::new(rubric);
    let record = all_in
        .review("paper.pdf", answers([2.0, 1.0, 1.0, 0.5, 1.0], [0.5, 0.5, 0.0]))
        .unwrap();
    assert_eq!(record.total_score(), 6.5);
    assert_eq!(record.verdict(), Verdict::Accept);
}
