//! CSV sink for portal events.
//!
//! Writes a fixed header followed by one CRLF-terminated row per event,
//! optionally gzip-compressed.

use crate::core::event::Event;
use crate::core::traits::EventWriter;
use csv::{Terminator, WriterBuilder};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Column names in output order.
pub const HEADER: [&str; 12] = [
    "UserID",
    "City",
    "Age",
    "DeviceID",
    "Service",
    "Time",
    "IP_Risk",
    "Location",
    "IsKnownDevice",
    "Risk_Score",
    "Risk_Level",
    "Action",
];

/// A byte sink that may need a trailer written before it is dropped.
pub trait FinishWrite: Write {
    fn finish(&mut self) -> io::Result<()> {
        self.flush()
    }
}

#[cfg(test)]
impl FinishWrite for Vec<u8> {}

/// Output file, plain or gzip-compressed.
pub enum OutputFile {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputFile::Plain(file) => file.write(buf),
            OutputFile::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputFile::Plain(file) => file.flush(),
            OutputFile::Gzip(encoder) => encoder.flush(),
        }
    }
}

impl FinishWrite for OutputFile {
    fn finish(&mut self) -> io::Result<()> {
        match self {
            OutputFile::Plain(file) => file.flush(),
            OutputFile::Gzip(encoder) => {
                encoder.try_finish()?;
                encoder.get_mut().flush()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CsvCompression {
    None,
    Gzip,
}

/// CSV writer over any byte sink.
pub struct CsvWriter<W: FinishWrite> {
    writer: Option<csv::Writer<W>>,
    closed: Option<W>,
    rows: u64,
}

impl CsvWriter<OutputFile> {
    /// Creates (or truncates) `path` and writes the header row.
    pub fn create(path: impl AsRef<Path>, compression: Option<&str>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = BufWriter::new(File::create(path)?);
        let sink = match parse_compression(compression)? {
            CsvCompression::None => OutputFile::Plain(file),
            CsvCompression::Gzip => OutputFile::Gzip(GzEncoder::new(file, Compression::default())),
        };
        Self::from_writer(sink)
    }
}

impl<W: FinishWrite> CsvWriter<W> {
    /// Wraps a sink and writes the header row.
    pub fn from_writer(sink: W) -> io::Result<Self> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::CRLF)
            .from_writer(sink);
        writer.write_record(HEADER)?;
        Ok(Self {
            writer: Some(writer),
            closed: None,
            rows: 0,
        })
    }

    /// Data rows written so far, excluding the header.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Closes the writer if needed and returns the underlying sink.
    #[cfg(test)]
    pub(crate) fn into_inner(mut self) -> io::Result<W> {
        self.close()?;
        self.closed
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "csv sink unavailable"))
    }

    fn active(&mut self) -> io::Result<&mut csv::Writer<W>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "csv writer already closed"))
    }
}

impl<W: FinishWrite> EventWriter for CsvWriter<W> {
    fn write_event(&mut self, event: &Event) -> io::Result<()> {
        self.active()?.serialize(event)?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        let mut sink = writer.into_inner().map_err(|err| err.into_error())?;
        sink.finish()?;
        self.closed = Some(sink);
        Ok(())
    }
}

fn parse_compression(value: Option<&str>) -> io::Result<CsvCompression> {
    let Some(value) = value else {
        return Ok(CsvCompression::None);
    };
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() || normalized == "none" {
        return Ok(CsvCompression::None);
    }
    match normalized.as_str() {
        "gzip" | "gz" => Ok(CsvCompression::Gzip),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported csv compression: {value}"),
        )),
    }
}
