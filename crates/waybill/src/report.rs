//! Progress and warning reporting.
//!
//! Background lookup threads cannot surface failures as return values, so
//! the session routes them through a `Reporter`. The default writes to
//! stderr; tests collect messages for assertions.

/// Sink for human-readable progress and warning messages.
pub trait Reporter: Send {
    /// Informational message
    fn info(&mut self, message: &str);

    /// Warning that does not stop the workflow
    fn warn(&mut self, message: &str);

    /// Error that was recovered locally
    fn error(&mut self, message: &str);
}

/// Reporter that writes to stderr.
#[derive(Debug, Default)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn info(&mut self, message: &str) {
        eprintln!("[info] {message}");
    }

    fn warn(&mut self, message: &str) {
        eprintln!("[warn] {message}");
    }

    fn error(&mut self, message: &str) {
        eprintln!("[error] {message}");
    }
}

/// Reporter that collects messages in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub infos: Vec<String>,
    pub warns: Vec<String>,
    pub errors: Vec<String>,
}

impl Reporter for CollectingReporter {
    fn info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }

    fn warn(&mut self, message: &str) {
        self.warns.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_reporter_records_messages() {
        let mut reporter = CollectingReporter::default();
        reporter.info("starting");
        reporter.warn("slow gateway");
        reporter.error("boom");

        assert_eq!(reporter.infos, vec!["starting".to_string()]);
        assert_eq!(reporter.warns, vec!["slow gateway".to_string()]);
        assert_eq!(reporter.errors, vec!["boom".to_string()]);
    }
}
