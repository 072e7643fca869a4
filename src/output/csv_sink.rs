//! CSV record sink
//!
//! Appends to the products file across runs; the header row is written only
//! when the file is new or empty.

use crate::output::traits::{OutputError, OutputResult, RecordSink};
use crate::state::{ProductRecord, CSV_COLUMNS};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    written: u64,
}

impl CsvSink {
    /// Opens `path` for appending, creating parent directories as needed
    pub fn open(path: &Path) -> OutputResult<Self> {
        if path.is_dir() {
            return Err(OutputError::Write(format!(
                "{} is a directory",
                path.display()
            )));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(CSV_COLUMNS)?;
            writer.flush()?;
        }

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written by this sink (excluding any earlier runs)
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl RecordSink for CsvSink {
    fn write_record(&mut self, record: &ProductRecord) -> OutputResult<()> {
        self.writer.write_record(record.csv_row())?;
        // No resume support, so keep the file current in case the run is killed.
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
