// Licensed under the Apache-2.0 license

//! Shared logging abstraction for the driver crates.
//!
//! Hardware modules take a `Logger` generic so production builds can route
//! diagnostics to a UART (or drop them entirely) without coupling the
//! drivers to a particular output device.

use core::fmt;

/// Sink for driver diagnostics.
///
/// Implementations must be cheap when the message is discarded; the driver
/// logs from transfer setup/teardown paths, never from the hot interrupt
/// dispatch itself.
pub trait Logger {
    /// Verbose diagnostics (computed divisors, DMA fallbacks).
    fn debug(&mut self, args: fmt::Arguments<'_>);

    /// Unexpected failures worth surfacing on a console.
    fn error(&mut self, args: fmt::Arguments<'_>);
}

/// Logger that discards everything.
#[derive(Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _args: fmt::Arguments<'_>) {}
    fn error(&mut self, _args: fmt::Arguments<'_>) {}
}

/// Logger writing lines to any `embedded_io::Write` sink, typically a UART.
pub struct WriterLogger<W: embedded_io::Write> {
    writer: W,
}

impl<W: embedded_io::Write> WriterLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn release(self) -> W {
        self.writer
    }

    fn line(&mut self, prefix: &str, args: fmt::Arguments<'_>) {
        // A full sink is not actionable here; drop the message.
        let _ = self.writer.write_all(prefix.as_bytes());
        let _ = self.writer.write_fmt(args);
        let _ = self.writer.write_all(b"\r\n");
    }
}

impl<W: embedded_io::Write> Logger for WriterLogger<W> {
    fn debug(&mut self, args: fmt::Arguments<'_>) {
        self.line("dbg: ", args);
    }

    fn error(&mut self, args: fmt::Arguments<'_>) {
        self.line("err: ", args);
    }
}
