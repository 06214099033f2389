use crate::types::{CheckContext, KvRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;
use tracing::warn;

/// Sink for evidence records.
pub trait Reporter {
    fn report(&self, context: &CheckContext, record: KvRecord);
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, context: &CheckContext, record: KvRecord) {
        (**self).report(context, record)
    }
}

#[derive(Serialize)]
struct ReportEvent<'a> {
    timestamp: DateTime<Utc>,
    rule_id: &'a str,
    data: &'a KvRecord,
}

/// Writes every record as one JSON object per line.
pub struct JsonLinesReporter<W: Write> {
    out: Mutex<W>,
}

impl JsonLinesReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        JsonLinesReporter::new(std::io::stdout())
    }
}

impl<W: Write> JsonLinesReporter<W> {
    pub fn new(out: W) -> Self {
        JsonLinesReporter {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write> Reporter for JsonLinesReporter<W> {
    fn report(&self, context: &CheckContext, record: KvRecord) {
        let event = ReportEvent {
            timestamp: Utc::now(),
            rule_id: &context.rule_id,
            data: &record,
        };
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(e) => {
                warn!("[{}] Failed to serialize report: {}", context.rule_id, e);
                return;
            }
        };

        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!("[{}] Failed to write report: {}", context.rule_id, e);
        }
    }
}
