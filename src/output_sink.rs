//! Persistence of accepted traces and integrals in the supported output
//! formats.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::acquisition_config::{AcquisitionConfig, OutputFormat};
use crate::trace::Trace;

/// File the counting mode writes its result to.
pub const COUNT_FILE_NAME: &str = "count.txt";

/// Writer for one run's output, opened once before the first trace and
/// finished once after the last.
pub struct OutputSink<W: Write> {
    format: OutputFormat,
    writer: Option<W>,
}

impl OutputSink<BufWriter<File>> {
    /// Opens `<stem>.bin` or `<stem>.txt` depending on the format. The
    /// just-check format opens nothing.
    pub fn create(format: OutputFormat, stem: &Path) -> io::Result<Self> {
        let writer = match output_path(format, stem) {
            Some(path) => {
                log::debug!("Opening output file {}", path.display());
                Some(BufWriter::new(File::create(path)?))
            }
            None => None,
        };
        Ok(Self { format, writer })
    }
}

impl OutputSink<io::Sink> {
    /// A sink for the just-check format, which never writes.
    pub fn just_check() -> Self {
        Self {
            format: OutputFormat::JustCheck,
            writer: None,
        }
    }
}

/// `<stem>.<ext>` for formats that write a file.
pub fn output_path(format: OutputFormat, stem: &Path) -> Option<PathBuf> {
    format.extension().map(|ext| {
        let mut name = stem.as_os_str().to_owned();
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    })
}

impl<W: Write> OutputSink<W> {
    pub fn new(format: OutputFormat, writer: W) -> Self {
        let writer = format.extension().map(|_| writer);
        Self { format, writer }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn write_header(&mut self, config: &AcquisitionConfig) -> io::Result<()> {
        let format = self.format;
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        match format {
            OutputFormat::BinarySingle => write_binary_header(writer, config),
            OutputFormat::AsciiSingle => write_ascii_header(writer, config),
            OutputFormat::AsciiIntegral => {
                write_ascii_header(writer, config)?;
                let rejection = config.rejection();
                writeln!(writer, "Rej. Param. <min>     {:.6}", rejection.ratio_min)?;
                writeln!(writer, "Rej. Param. <max>     {:.6}", rejection.ratio_max)?;
                writeln!(writer, "Rej. Param. <s>       {}", rejection.channel_start)?;
                writeln!(writer, "Rej. Param. <e>       {}", rejection.channel_end)
            }
            OutputFormat::JustCheck => Ok(()),
        }
    }

    /// Writes one full trace. Formats without per-trace samples ignore it.
    pub fn write_trace(&mut self, trace: &Trace) -> io::Result<()> {
        #[cfg(feature = "cpu-profiling")]
        let _span = tracy_client::span!("OutputSink::write_trace");

        let format = self.format;
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        match format {
            OutputFormat::BinarySingle => {
                for code in trace.raw() {
                    writer.write_all(&code.to_le_bytes())?;
                }
                Ok(())
            }
            OutputFormat::AsciiSingle => {
                let line = trace
                    .samples()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(writer, "{line}")
            }
            OutputFormat::AsciiIntegral | OutputFormat::JustCheck => Ok(()),
        }
    }

    /// Writes the integral of one accepted trace.
    pub fn write_integral(&mut self, integral: f64) -> io::Result<()> {
        match (self.format, self.writer.as_mut()) {
            (OutputFormat::AsciiIntegral, Some(writer)) => writeln!(writer, "{integral:.6}"),
            _ => Ok(()),
        }
    }

    /// Flushes and hands back the writer, if the format had one.
    pub fn finish(mut self) -> io::Result<Option<W>> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(self.writer)
    }
}

fn write_binary_header<W: Write>(writer: &mut W, config: &AcquisitionConfig) -> io::Result<()> {
    writer.write_all(&(config.decimation().factor() as i32).to_le_bytes())?;
    writer.write_all(&(config.trace_length() as i32).to_le_bytes())?;
    writer.write_all(&(config.pretrigger_length() as i32).to_le_bytes())?;
    writer.write_all(&config.trigger_voltage().to_le_bytes())?;
    writer.write_all(&(config.trigger_mode().register_value() as i32).to_le_bytes())
}

fn write_ascii_header<W: Write>(writer: &mut W, config: &AcquisitionConfig) -> io::Result<()> {
    writeln!(writer, "Decimation:           {}", config.decimation().factor())?;
    writeln!(writer, "Trace length:         {}", config.trace_length())?;
    writeln!(writer, "Pretrigger length:    {}", config.pretrigger_length())?;
    writeln!(writer, "Trigger Voltage:      {:.6}", config.trigger_voltage())?;
    writeln!(writer, "Trigger Value:        {}", config.trigger_threshold().code())?;
    writeln!(writer, "Triggering on:        {}", config.trigger_mode())
}

/// Writes the event count of a counting run as a bare integer.
pub fn write_count<W: Write>(writer: &mut W, count: u64) -> io::Result<()> {
    write!(writer, "{count}")?;
    writer.flush()
}

pub fn write_count_file(path: &Path, count: u64) -> io::Result<()> {
    let mut file = File::create(path)?;
    write_count(&mut file, count)
}
