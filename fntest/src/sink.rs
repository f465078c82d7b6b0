//! Verbosity-gated report stream

use std::io::{self, Write};

use crate::config::Verbosity;

/// Report stream of a tester.
///
/// Each message is written and flushed immediately so progress output shows
/// up while a series runs. A failing writer never aborts a test: the error is
/// logged and the message dropped.
pub struct ReportSink<W: Write> {
    writer: W,
    verbosity: Verbosity,
    color: bool,
}

impl Default for ReportSink<io::Stdout> {
    fn default() -> Self {
        Self::new(io::stdout(), Verbosity::Normal)
    }
}

impl<W: Write> ReportSink<W> {
    /// Create a sink writing to `writer` with the given threshold
    pub fn new(writer: W, verbosity: Verbosity) -> Self {
        Self { writer, verbosity, color: false }
    }

    /// Current verbosity threshold
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.verbosity = verbosity;
    }

    /// Whether status tokens are styled
    pub fn color(&self) -> bool {
        self.color
    }

    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Whether a message of `level` would be written
    pub fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity.allows(level)
    }

    /// Write `text` if `level` passes the threshold
    pub fn emit(&mut self, text: &str, level: Verbosity) {
        if !self.enabled(level) || text.is_empty() {
            return;
        }

        if let Err(e) = self.writer.write_all(text.as_bytes()).and_then(|_| self.writer.flush()) {
            log::warn!("Dropping report output: {}", e);
        }
    }

    /// Swap the underlying stream, keeping the settings
    pub fn with_writer<W2: Write>(self, writer: W2) -> ReportSink<W2> {
        ReportSink { writer, verbosity: self.verbosity, color: self.color }
    }

    /// Borrow the underlying stream
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn written(sink: &ReportSink<Vec<u8>>) -> String {
        String::from_utf8_lossy(sink.get_ref()).into_owned()
    }

    #[test]
    fn test_emit_respects_threshold() {
        let mut sink = ReportSink::new(Vec::new(), Verbosity::Normal);
        sink.emit("normal\n", Verbosity::Normal);
        sink.emit("verbose\n", Verbosity::Verbose);
        assert_eq!(written(&sink), "normal\n");

        sink.set_verbosity(Verbosity::Verbose);
        sink.emit("verbose\n", Verbosity::Verbose);
        assert_eq!(written(&sink), "normal\nverbose\n");
    }

    #[test]
    fn test_silent_sink_writes_nothing() {
        let mut sink = ReportSink::new(Vec::new(), Verbosity::Silent);
        sink.emit("x", Verbosity::Normal);
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn test_write_failures_are_swallowed() {
        let mut sink = ReportSink::new(BrokenPipe, Verbosity::Verbose);
        sink.emit("lost\n", Verbosity::Normal);
        assert!(sink.enabled(Verbosity::Verbose));
    }

    #[test]
    fn test_with_writer_keeps_settings() {
        let mut sink = ReportSink::new(io::sink(), Verbosity::Verbose);
        sink.set_color(true);
        let sink = sink.with_writer(Vec::new());
        assert_eq!(sink.verbosity(), Verbosity::Verbose);
        assert!(sink.color());
    }
}
