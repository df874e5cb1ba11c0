use std::{fs, path::Path};

use csv::Writer;

use crate::probe::ClipInfo;

/// Tab separated table of probe results, appended to on every run.
#[derive(Debug)]
pub struct CsvOutput {
    pub writer: Writer<fs::File>,
}

impl CsvOutput {
    pub fn new(path: &Path) -> csv::Result<Self> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: csv::WriterBuilder::new().delimiter(b'\t').from_writer(file),
        })
    }

    pub fn write_header(&mut self) -> csv::Result<()> {
        self.writer
            .write_record(["path", "width", "height", "duration"])?;
        self.writer.flush()?;
        Ok(())
    }

    /// Failed probes are written as empty cells.
    pub fn write_clip(&mut self, clip: &ClipInfo) -> csv::Result<()> {
        let (width, height) = match clip.size {
            Some((w, h)) => (w.to_string(), h.to_string()),
            None => (String::new(), String::new()),
        };
        self.writer.write_record([
            clip.path.to_string_lossy().into_owned(),
            width,
            height,
            clip.duration.map(|d| d.to_string()).unwrap_or_default(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }
}
