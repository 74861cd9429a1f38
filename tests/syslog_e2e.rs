use std::io;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event as TraceEvent, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

use typebus::{
    Event, EventBus, Probe, Severity, SyslogConfig, SyslogForwarder, SyslogWriter, Syslogger,
};

struct TestEvent {
    severity: Severity,
    message: String,
}

impl TestEvent {
    fn new(severity: Severity, message: &str) -> Self {
        Self {
            severity,
            message: message.to_string(),
        }
    }
}

impl Syslogger for TestEvent {
    fn syslog(&self) -> (Severity, String) {
        (self.severity, self.message.clone())
    }
}

impl Event for TestEvent {
    fn conform(&self, probe: &mut Probe<'_>) {
        probe.offer::<dyn Syslogger>(self);
    }
}

#[derive(Clone, Default)]
struct FakeWriter {
    written: Arc<Mutex<Vec<(Severity, String)>>>,
    fail: bool,
}

impl SyslogWriter for FakeWriter {
    fn write(&self, severity: Severity, message: &str) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "daemon gone"));
        }
        self.written
            .lock()
            .unwrap()
            .push((severity, message.to_string()));
        Ok(())
    }
}

/// Records every log event as `(level, message)`.
#[derive(Clone, Default)]
struct Capture {
    records: Arc<Mutex<Vec<(Level, String)>>>,
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &TraceEvent<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.records
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

fn captured<F: FnOnce()>(f: F) -> Vec<(Level, String)> {
    let capture = Capture::default();
    let subscriber = Registry::default().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    let records = capture.records.lock().unwrap();
    records.clone()
}

#[test]
fn events_are_written_with_their_severity() {
    let writer = FakeWriter::default();
    let bus = EventBus::new();
    Arc::new(SyslogForwarder::new(writer.clone()))
        .install(&bus)
        .unwrap();

    let all = [
        Severity::Emergency,
        Severity::Alert,
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Notice,
        Severity::Info,
        Severity::Debug,
    ];
    for severity in all {
        bus.dispatch(&TestEvent::new(severity, &format!("{severity} message")))
            .unwrap();
    }

    let written = writer.written.lock().unwrap();
    assert_eq!(written.len(), all.len());
    for ((severity, message), expected) in written.iter().zip(all) {
        assert_eq!(*severity, expected);
        assert_eq!(*message, format!("{expected} message"));
    }
}

#[test]
fn write_errors_are_logged_not_returned() {
    let writer = FakeWriter {
        fail: true,
        ..FakeWriter::default()
    };
    let bus = EventBus::new();
    Arc::new(SyslogForwarder::new(writer)).install(&bus).unwrap();

    let records = captured(|| {
        bus.dispatch(&TestEvent::new(Severity::Info, "lost")).unwrap();
    });

    assert!(records
        .iter()
        .any(|(level, msg)| *level == Level::ERROR && msg.contains("can't write syslog event")));
}

#[test]
fn fallback_logs_at_mapped_level() {
    let bus = EventBus::new();
    Arc::new(SyslogForwarder::without_writer())
        .install(&bus)
        .unwrap();

    let cases = [
        (Severity::Emergency, Level::ERROR),
        (Severity::Alert, Level::ERROR),
        (Severity::Critical, Level::ERROR),
        (Severity::Error, Level::ERROR),
        (Severity::Warning, Level::WARN),
        (Severity::Notice, Level::INFO),
        (Severity::Info, Level::INFO),
        (Severity::Debug, Level::INFO),
    ];

    for (severity, level) in cases {
        let message = format!("fallback {severity}");
        let records = captured(|| {
            bus.dispatch(&TestEvent::new(severity, &message)).unwrap();
        });
        assert!(
            records.iter().any(|(l, m)| *l == level && *m == message),
            "{severity} not logged at {level}: {records:?}"
        );
    }
}

#[test]
fn unreachable_daemon_falls_back_to_logging() {
    let config = SyslogConfig {
        socket: std::env::temp_dir().join("typebus-no-such-daemon.sock"),
        ..SyslogConfig::default()
    };

    let mut forwarder = None;
    let records = captured(|| forwarder = Some(SyslogForwarder::from_config(&config)));

    assert!(!forwarder.unwrap().is_connected());
    assert!(records
        .iter()
        .any(|(level, msg)| *level == Level::ERROR && msg == "can't connect to syslog"));
}

#[test]
fn non_syslog_events_are_ignored() {
    struct Quiet;
    impl Event for Quiet {}

    let writer = FakeWriter::default();
    let bus = EventBus::new();
    Arc::new(SyslogForwarder::new(writer.clone()))
        .install(&bus)
        .unwrap();

    bus.dispatch(&Quiet).unwrap();
    assert!(writer.written.lock().unwrap().is_empty());
}
