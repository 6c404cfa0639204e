//! Analysis prompt generation.

use std::fmt::Write;
use reviewgate_core::Rubric;

/// Build the analysis prompt sent along with a document.
///
/// Lists every question with its permitted scores, every extraction field,
/// the cutoff, and the answer layout the response parser expects.
pub fn analysis_prompt(rubric: &Rubric) -> String {
    let mut prompt = String::from("Hello, perform a systematic analysis. Parameters:\n");

    let _ = writeln!(prompt, "Quality Assessment Questions:");
    for question in rubric.questions() {
        let scores: Vec<String> = question
            .scores()
            .values()
            .iter()
            .map(|s| format!("{:?}", s))
            .collect();
        let _ = writeln!(
            prompt,
            "{} - {} (Scores: {})",
            question.id(),
            question.question(),
            scores.join(", ")
        );
    }

    let _ = writeln!(prompt, "Data Extraction Fields:");
    for field in rubric.data_extraction_fields() {
        let _ = writeln!(prompt, "{}: {}", field.key, field.description);
    }

    let _ = writeln!(prompt, "Cutoff Score: {}.", rubric.cutoff_score());
    let _ = writeln!(prompt, "Format your answers as instructed.");
    let _ = writeln!(prompt, "The quality assessment must be formatted like this:");

    let mut ids = rubric.questions().iter().map(|q| q.id().as_str());
    let first = ids.next().unwrap_or("QE1");
    let second = ids.next().unwrap_or(first);
    for id in [first, second] {
        let _ = writeln!(prompt, "{}: Brief description", id);
        let _ = writeln!(prompt, "{} Score: score", id);
        let _ = writeln!(prompt);
    }
    let _ = writeln!(prompt, "Answer every question, using only the scores listed for it.");
    let _ = writeln!(prompt);

    let _ = writeln!(prompt, "Then write the data extraction like this:");
    let _ = writeln!(prompt, "Data Extraction:");
    for field in rubric.data_extraction_fields().iter().take(3) {
        let _ = writeln!(prompt, "{}: value", field.key);
    }
    let _ = writeln!(prompt, "etc.");
    let _ = write!(
        prompt,
        "Write everything in different lines, without bullet points, and always using the format I am asking you. Thank you."
    );

    prompt
}
