//! Provides a [`tracing_subscriber::Layer`] ([`HumaneLayer`]) that formats `tracing` events through
//! a [`Handler`].

use std::sync::Arc;

use tracing::{Event, Subscriber, span::Id};
use tracing_subscriber::{
    Layer,
    layer::Context,
    registry::{LookupSpan, SpanRef},
};

use crate::{Handler, Level, LogEvent, Source, storage::FieldStorage};

/// A [`tracing_subscriber::Layer`] that writes events as human-friendly logfmt lines.
///
/// Every span gets its own handler, derived from its parent span's handler (or from the root
/// handler) with the span's fields, so events inside a span carry the fields of the whole span
/// scope. Fields recorded on a span later are appended the same way.
#[derive(Clone, Debug)]
pub struct HumaneLayer {
    root: Arc<Handler>,
    group_spans: bool,
}

/// The handler of a span, stored in the span's extensions.
struct SpanHandler(Arc<Handler>);

impl HumaneLayer {
    /// Creates a layer writing through `root`.
    pub fn new(root: Arc<Handler>) -> Self {
        Self {
            root,
            group_spans: false,
        }
    }

    /// If `true`, the fields of each span and everything logged inside it are grouped under the
    /// span's name.
    #[must_use]
    pub fn with_span_groups(mut self, group_spans: bool) -> Self {
        self.group_spans = group_spans;
        self
    }

    /// The handler events outside any span are written through.
    pub fn handler(&self) -> &Arc<Handler> {
        &self.root
    }

    fn span_handler<S>(span: &SpanRef<'_, S>) -> Option<Arc<Handler>>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let extensions = span.extensions();
        extensions
            .get::<SpanHandler>()
            .map(|handler| Arc::clone(&handler.0))
    }
}

impl<S> Layer<S> for HumaneLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &tracing::span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        #[allow(clippy::expect_used)]
        let span = ctx
            .span(id)
            .expect("span with specified id does not exist in `on_new_span()`");

        let parent = span
            .parent()
            .and_then(|parent| Self::span_handler(&parent))
            .unwrap_or_else(|| Arc::clone(&self.root));

        let mut storage = FieldStorage::for_span();
        attrs.record(&mut storage);

        let handler = if self.group_spans {
            parent.with_group(span.name())
        } else {
            parent
        };
        let handler = handler.with_attrs(storage.into_attrs());

        span.extensions_mut().insert(SpanHandler(handler));
    }

    fn on_record(&self, id: &Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
        #[allow(clippy::expect_used)]
        let span = ctx
            .span(id)
            .expect("span with specified id does not exist in `on_record()`");

        let mut storage = FieldStorage::for_span();
        values.record(&mut storage);

        let mut extensions = span.extensions_mut();
        if let Some(slot) = extensions.get_mut::<SpanHandler>() {
            slot.0 = slot.0.with_attrs(storage.into_attrs());
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Level::from(*metadata.level());

        let handler = ctx
            .event_span(event)
            .and_then(|span| Self::span_handler(&span))
            .unwrap_or_else(|| Arc::clone(&self.root));
        if !handler.enabled(level) {
            return;
        }

        let mut storage = FieldStorage::for_event();
        event.record(&mut storage);
        let (message, attrs) = storage.into_parts();

        // Fall back to the target if the event has no message.
        let message = message.unwrap_or_else(|| metadata.target().to_owned());
        let mut record = LogEvent::new(level, message).with_attrs(attrs);
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            record = record.with_source(Source::new(file, line));
        }

        let _ = handler.handle(&record);
    }
}
