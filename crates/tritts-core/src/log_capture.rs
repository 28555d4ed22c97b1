use std::collections::VecDeque;
use std::fmt;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// A tracing layer that keeps the most recent formatted events in a bounded buffer.
///
/// Lines look like `[ERROR] tritts_engine::scheduler: segment failed segment=2`.
#[derive(Clone)]
pub struct LogCapture {
    buffer: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogCapture {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(VecDeque::new())),
            capacity,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.buffer
            .lock()
            .map(|buf| buf.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.lines().iter().filter(|line| line.contains(needle)).count()
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: String,
}

impl EventVisitor {
    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        let _ = write!(self.fields, " {name}={value}");
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{value}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let formatted = format!(
            "[{}] {}: {}{}",
            metadata.level(),
            metadata.target(),
            visitor.message,
            visitor.fields
        );

        if let Ok(mut buf) = self.buffer.lock() {
            if buf.len() >= self.capacity {
                buf.pop_front();
            }
            buf.push_back(formatted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[test]
    fn test_log_capture_collects_events() {
        let capture = LogCapture::new(100);
        let subscriber = Registry::default().with(capture.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("one");
            tracing::warn!("two");
            tracing::error!("three");
        });
        assert_eq!(capture.lines().len(), 3);
    }

    #[test]
    fn test_log_capture_drops_oldest_when_full() {
        let capture = LogCapture::new(2);
        let subscriber = Registry::default().with(capture.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("first");
            tracing::info!("second");
            tracing::info!("third");
        });
        let lines = capture.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("second"), "got: {}", lines[0]);
        assert!(lines[1].contains("third"), "got: {}", lines[1]);
    }

    #[test]
    fn test_log_capture_format_includes_fields() {
        let capture = LogCapture::new(10);
        let subscriber = Registry::default().with(capture.clone());
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "tritts", segment = 4, "segment failed");
        });
        assert_eq!(capture.lines(), vec!["[ERROR] tritts: segment failed segment=4"]);
        assert!(capture.contains("segment=4"));
        assert_eq!(capture.count_matching("[ERROR]"), 1);
    }
}
