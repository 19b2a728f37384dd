use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domains::report::types::SummaryStats;

/// Failures while building the output artifact. Always terminal for the
/// export task that hit them.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Csv(#[from] csv::Error),
}

/// Incremental artifact writer consumed by the export worker.
///
/// The worker writes the summary preamble once, then the header row (derived
/// from the first batch's field names), then appends data rows batch by
/// batch. `finalize` flushes everything to durable storage and yields the
/// artifact path; until it returns, the file must not be treated as
/// downloadable.
pub trait ArtifactWriter: Send {
    fn write_summary(&mut self, total: i64, stats: &SummaryStats) -> Result<(), WriterError>;

    fn write_header(&mut self, columns: &[&'static str]) -> Result<(), WriterError>;

    fn append_row(&mut self, fields: &[String]) -> Result<(), WriterError>;

    fn finalize(self: Box<Self>) -> Result<PathBuf, WriterError>;

    fn path(&self) -> &Path;
}

/// Streaming CSV artifact writer. Excel opens the result directly thanks to
/// the UTF-8 BOM; rows are flushed through a buffered file handle so the
/// full result set never lives in memory.
pub struct CsvArtifactWriter {
    wtr: csv::Writer<BufWriter<File>>,
    path: PathBuf,
}

impl CsvArtifactWriter {
    pub fn create(path: &Path) -> Result<Self, WriterError> {
        let mut file = File::create(path)?;
        // UTF-8 BOM for Excel compatibility
        file.write_all(b"\xEF\xBB\xBF")?;

        let wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(BufWriter::new(file));

        Ok(Self {
            wtr,
            path: path.to_path_buf(),
        })
    }

    fn write_labeled(&mut self, label: &str, value: i64) -> Result<(), WriterError> {
        self.wtr.write_record([label, &value.to_string()])?;
        Ok(())
    }
}

impl ArtifactWriter for CsvArtifactWriter {
    /// Summary block layout follows the dashboard's spreadsheet: overall
    /// totals, then the OK-by-grade and NG-by-cause breakdowns, then the raw
    /// data section.
    fn write_summary(&mut self, total: i64, stats: &SummaryStats) -> Result<(), WriterError> {
        self.wtr.write_record(["Overall Summary"])?;
        self.write_labeled("Total Cells", total)?;
        self.wtr.write_record(["OK Cells", &stats.pass.to_string()])?;
        self.wtr.write_record(["NG Cells", &stats.fail.to_string()])?;
        self.wtr.write_record::<[&str; 0], &str>([])?;

        self.wtr.write_record(["OK Cells by Grade"])?;
        let grades = &stats.pass_by_grade;
        for (label, count) in [
            ("Grade 1", grades.g1),
            ("Grade 2", grades.g2),
            ("Grade 3", grades.g3),
            ("Grade 4", grades.g4),
            ("Grade 5", grades.g5),
            ("Grade 6", grades.g6),
        ] {
            self.write_labeled(label, count)?;
        }
        self.wtr.write_record::<[&str; 0], &str>([])?;

        self.wtr.write_record(["NG Cells by Cause"])?;
        let causes = &stats.fail_by_cause;
        for (label, count) in [
            ("Barcode", causes.barcode),
            ("Voltage", causes.voltage),
            ("Resistance", causes.resistance),
            ("Voltage & Resistance", causes.voltage_and_resistance),
            ("Capacity", causes.capacity),
            ("Barley Paper", causes.barley_paper),
            ("Duplicate", causes.duplicate),
        ] {
            self.write_labeled(label, count)?;
        }
        self.wtr.write_record::<[&str; 0], &str>([])?;

        self.wtr.write_record(["Raw Data"])?;
        Ok(())
    }

    fn write_header(&mut self, columns: &[&'static str]) -> Result<(), WriterError> {
        self.wtr.write_record(columns)?;
        Ok(())
    }

    fn append_row(&mut self, fields: &[String]) -> Result<(), WriterError> {
        self.wtr.write_record(fields)?;
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Result<PathBuf, WriterError> {
        let CsvArtifactWriter { mut wtr, path } = *self;
        wtr.flush()?;
        let file = wtr
            .into_inner()
            .map_err(|e| WriterError::Io(std::io::Error::other(e.to_string())))?
            .into_inner()
            .map_err(|e| WriterError::Io(std::io::Error::other(e.to_string())))?;
        // fsync before the task is marked downloadable
        file.sync_all()?;
        Ok(path)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::report::types::SummaryStats;

    #[test]
    fn test_writer_emits_bom_summary_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer: Box<dyn ArtifactWriter> =
            Box::new(CsvArtifactWriter::create(&path).unwrap());
        let stats = SummaryStats {
            total: 2,
            pass: 1,
            fail: 1,
            ..Default::default()
        };
        writer.write_summary(2, &stats).unwrap();
        writer.write_header(&["a", "b"]).unwrap();
        writer
            .append_row(&["1".to_string(), "x".to_string()])
            .unwrap();
        writer
            .append_row(&["2".to_string(), "y".to_string()])
            .unwrap();
        let finalized = writer.finalize().unwrap();
        assert_eq!(finalized, path);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], b"\xEF\xBB\xBF");

        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.starts_with("Overall Summary"));
        let header_at = text.find("a,b\n").expect("header row present");
        let data = &text[header_at..];
        assert!(data.contains("1,x\n"));
        assert!(data.contains("2,y\n"));
    }
}
