use serde_json::Value;
use std::io::{self, Write};

/// Pretty-printed JSON on stdout, newline-terminated so reports can be
/// concatenated into a stream.
pub fn print_json(value: &Value) {
    let mut out = io::stdout().lock();
    let written = serde_json::to_writer_pretty(&mut out, value)
        .map_err(io::Error::from)
        .and_then(|_| writeln!(out));
    if let Err(e) = written {
        tracing::error!(error = %e, "Failed to write JSON output");
    }
}
