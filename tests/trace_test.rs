//! Trace records emitted through the `log` facade

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::path::Path;
use std::sync::{Mutex, OnceLock};
use std::thread::{self, ThreadId};

use flint::{analyze_source, Config};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Logger that keeps every record along with the thread that logged it
struct Capture {
    records: Mutex<Vec<(ThreadId, Level, String)>>,
}

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records.lock().unwrap().push((
            thread::current().id(),
            record.level(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {}
}

fn capture() -> &'static Capture {
    static CAPTURE: OnceLock<&'static Capture> = OnceLock::new();
    CAPTURE.get_or_init(|| {
        let capture: &'static Capture = Box::leak(Box::new(Capture {
            records: Mutex::new(Vec::new()),
        }));
        log::set_logger(capture).unwrap();
        log::set_max_level(LevelFilter::Debug);
        capture
    })
}

/// Debug messages logged by the current thread while analyzing `text`
fn debug_records(text: &str, config: &Config) -> Vec<String> {
    let capture = capture();
    analyze_source(Path::new("main.f90"), text, config, None).unwrap();
    let id = thread::current().id();
    capture
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(thread, level, _)| *thread == id && *level == Level::Debug)
        .map(|(_, _, message)| message.clone())
        .collect()
}

const SOURCE: &str = "#define N 4\nmodule m\ninteger :: x(N)\nend module\n";

#[test]
fn test_trace_emits_debug_records() {
    let config = Config {
        trace: true,
        ..Config::default()
    };
    let records = debug_records(SOURCE, &config);

    assert!(records.iter().any(|r| r == "directive: #define N 4"), "{records:?}");
    assert!(records.iter().any(|r| r == "macro replacement: N at line 3"), "{records:?}");
    assert!(records.iter().any(|r| r.starts_with("module: module m")), "{records:?}");
    assert!(records.iter().any(|r| r.starts_with("declaration: integer :: x")), "{records:?}");
    assert!(records.iter().any(|r| r.starts_with("end: end module")), "{records:?}");
}

#[test]
fn test_trace_off_is_silent() {
    let records = debug_records(SOURCE, &Config::default());
    assert!(records.is_empty(), "{records:?}");
}
