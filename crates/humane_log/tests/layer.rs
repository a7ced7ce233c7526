#![cfg(feature = "layer")]

use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use humane_log::{Attr, Handler, HandlerConfig, HumaneLayer, Level, keys};
use tracing_subscriber::layer::SubscriberExt;

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Buffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().expect("buffer lock").clone()).expect("utf-8 output")
    }
}

fn config(level: Level) -> HandlerConfig {
    HandlerConfig {
        level,
        replace_attr: Some(Arc::new(|_: &[&str], attr: Attr| {
            if attr.key == keys::TIME {
                Attr::empty()
            } else {
                attr
            }
        })),
        ..HandlerConfig::default()
    }
}

fn capture(group_spans: bool, level: Level, f: impl FnOnce()) -> String {
    let buffer = Buffer::default();
    let layer =
        HumaneLayer::new(Handler::new(buffer.clone(), config(level))).with_span_groups(group_spans);
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    buffer.contents()
}

#[test]
fn events_become_lines() {
    let output = capture(false, Level::INFO, || {
        tracing::info!(user = "ada", attempts = 3, admin = false, "logged in");
    });
    assert_eq!(output, " INFO | logged in | user=ada attempts=3 admin=false\n");
}

#[test]
fn formatted_messages_and_missing_messages() {
    let output = capture(false, Level::INFO, || {
        let name = "world";
        tracing::warn!("hello, {name}");
        tracing::error!(target: "jobs", id = 7u64);
    });
    assert_eq!(output, " WARN | hello, world |\nERROR | jobs | id=7\n");
}

#[test]
fn events_below_the_handler_level_are_skipped() {
    let output = capture(false, Level::INFO, || {
        tracing::debug!("hidden");
        tracing::trace!("hidden");
        tracing::info!("shown");
    });
    assert_eq!(output, " INFO | shown |\n");

    let output = capture(false, Level::from(tracing::Level::TRACE), || {
        tracing::trace!("shown");
    });
    assert_eq!(output, "DEBUG-4 | shown |\n");
}

#[test]
fn span_fields_are_inherited_by_nested_events() {
    let output = capture(false, Level::INFO, || {
        let outer = tracing::info_span!("request", method = "GET");
        let _outer = outer.enter();
        let inner = tracing::info_span!("db", table = "users");
        let _inner = inner.enter();
        tracing::info!(rows = 2, "query");
    });
    assert_eq!(output, " INFO | query | method=GET table=users rows=2\n");
}

#[test]
fn span_groups_qualify_span_scoped_attributes() {
    let output = capture(true, Level::INFO, || {
        let span = tracing::info_span!("request", method = "GET");
        let _entered = span.enter();
        tracing::info!(status = 200, "done");
    });
    assert_eq!(output, " INFO | done | request.method=GET request.status=200\n");
}

#[test]
fn later_recorded_span_fields_are_appended() {
    let output = capture(false, Level::INFO, || {
        let span = tracing::info_span!("job", id = tracing::field::Empty);
        span.record("id", 42);
        let _entered = span.enter();
        tracing::info!("started");
    });
    assert_eq!(output, " INFO | started | id=42\n");
}

#[test]
fn error_fields_render_their_message() {
    let output = capture(false, Level::INFO, || {
        let error = io::Error::other("disk full");
        tracing::error!(error = &error as &(dyn std::error::Error + 'static), "write failed");
    });
    assert_eq!(output, "ERROR | write failed | error=\"disk full\"\n");
}
