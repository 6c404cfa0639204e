//! Tabular export of stored reviews.
//!
//! Two CSV sheets mirror the review spreadsheet layout: a quality assessment
//! sheet with one row per review, and a data extraction sheet with one row
//! per accepted review.

use std::io;
use std::path::{Path, PathBuf};
use reviewgate_core::Rubric;

use crate::model::StoredReview;
use crate::trait_::Result;

/// Paths written by [`SheetExporter::export_to_dir`].
#[derive(Debug, Clone)]
pub struct ExportedSheets {
    /// Quality assessment sheet
    pub quality_sheet: PathBuf,
    /// Rows written to the quality sheet
    pub quality_rows: usize,
    /// Data extraction sheet
    pub extraction_sheet: PathBuf,
    /// Rows written to the extraction sheet
    pub extraction_rows: usize,
}

/// Writes review sheets for one rubric.
pub struct SheetExporter<'a> {
    rubric: &'a Rubric,
}

impl<'a> SheetExporter<'a> {
    /// Create an exporter; column layout follows the rubric.
    pub fn new(rubric: &'a Rubric) -> Self {
        Self { rubric }
    }

    /// Header of the quality assessment sheet.
    pub fn quality_header(&self) -> Vec<String> {
        let mut header = vec!["DOCUMENT".to_string(), "TITLE".to_string()];
        for question in self.rubric.questions() {
            header.push(question.id().to_string());
            header.push(format!("{}_SCORE", question.id()));
        }
        header.extend(["TOTAL_SCORE", "MAX_POSSIBLE_SCORE", "VERDICT"].map(String::from));
        header
    }

    /// Header of the data extraction sheet.
    pub fn extraction_header(&self) -> Vec<String> {
        let mut header = vec!["DOCUMENT".to_string(), "TITLE".to_string()];
        header.extend(
            self.rubric
                .data_extraction_fields()
                .iter()
                .filter(|f| f.key != "TITLE")
                .map(|f| f.key.clone()),
        );
        header
    }

    /// Write the quality assessment sheet; returns the number of rows.
    ///
    /// Failed reviews are included with an `INDETERMINATE` verdict, empty
    /// totals and the error in place of the first question's description.
    pub fn write_quality_sheet<W: io::Write>(&self, reviews: &[StoredReview], writer: W) -> Result<usize> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.quality_header())?;

        for review in reviews {
            let mut row = vec![review.document_id.to_string(), review.display_title().to_string()];
            let record = review.outcome.record();

            for (index, question) in self.rubric.questions().iter().enumerate() {
                let note = match (record, review.outcome.error()) {
                    (None, Some(error)) if index == 0 => error.to_string(),
                    _ if self.rubric.is_excluded(question.id().as_str()) => "excluded".to_string(),
                    _ => String::new(),
                };
                row.push(note);
                row.push(
                    record
                        .and_then(|r| r.answers().get(question.id().as_str()))
                        .map(format_score)
                        .unwrap_or_default(),
                );
            }

            match record {
                Some(record) => {
                    row.push(format_score(record.total_score()));
                    row.push(format_score(record.max_possible_score()));
                }
                None => {
                    row.push(String::new());
                    row.push(String::new());
                }
            }
            row.push(review.verdict().to_string());
            csv.write_record(&row)?;
        }

        csv.flush()?;
        Ok(reviews.len())
    }

    /// Write the data extraction sheet for accepted reviews; returns the number of rows.
    pub fn write_extraction_sheet<W: io::Write>(&self, reviews: &[StoredReview], writer: W) -> Result<usize> {
        let mut csv = csv::Writer::from_writer(writer);
        let header = self.extraction_header();
        csv.write_record(&header)?;

        let mut rows = 0;
        for review in reviews.iter().filter(|r| r.outcome.is_accepted()) {
            let mut row = vec![review.document_id.to_string(), review.display_title().to_string()];
            for key in &header[2..] {
                row.push(review.extracted.get(key).cloned().unwrap_or_default());
            }
            csv.write_record(&row)?;
            rows += 1;
        }

        csv.flush()?;
        Ok(rows)
    }

    /// Write `qa_sheet.csv` and `de_sheet.csv` into `dir`.
    pub fn export_to_dir(&self, reviews: &[StoredReview], dir: impl AsRef<Path>) -> Result<ExportedSheets> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let quality_sheet = dir.join("qa_sheet.csv");
        let quality_rows = self.write_quality_sheet(reviews, std::fs::File::create(&quality_sheet)?)?;

        let extraction_sheet = dir.join("de_sheet.csv");
        let extraction_rows = self.write_extraction_sheet(reviews, std::fs::File::create(&extraction_sheet)?)?;

        tracing::info!(
            "Exported {} QA rows to {} and {} DE rows to {}",
            quality_rows,
            quality_sheet.display(),
            extraction_rows,
            extraction_sheet.display()
        );

        Ok(ExportedSheets {
            quality_sheet,
            quality_rows,
            extraction_sheet,
            extraction_rows,
        })
    }
}

/// Scores always show a decimal point ("1.0", "0.25").
fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
