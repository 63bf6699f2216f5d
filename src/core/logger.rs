use flexi_logger::{
    filter::{self, LogLineFilter},
    Age, Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};

/// Mutes the HTTP stack's own records, only this crate's handshake
/// trace is interesting here.
pub struct IgnoreHttpStack;

impl LogLineFilter for IgnoreHttpStack {
    fn write(
        &self,
        now: &mut flexi_logger::DeferredNow,
        record: &log::Record,
        log_line_writer: &dyn filter::LogLineWriter,
    ) -> std::io::Result<()> {
        let path = record.module_path().unwrap_or_default();

        if path.starts_with("reqwest") || path.starts_with("hyper") {
            return Ok(());
        }

        log_line_writer.write(now, record)
    }
}

pub fn init(level: &str, retention: usize) -> Result<LoggerHandle, flexi_logger::FlexiLoggerError> {
    Logger::try_with_str(level)?
        .log_to_file(FileSpec::default().directory("logs"))
        .duplicate_to_stdout(Duplicate::All)
        .rotate(
            Criterion::Age(Age::Day),
            Naming::Timestamps,
            Cleanup::KeepLogAndCompressedFiles(2, retention),
        )
        .filter(Box::new(IgnoreHttpStack))
        .write_mode(WriteMode::Async)
        .start()
}
