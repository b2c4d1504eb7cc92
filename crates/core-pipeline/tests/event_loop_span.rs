mod common;

use common::*;
use core_events::{CommandEvent, Event};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::{LookupSpan, Registry};

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

#[derive(Clone, Debug)]
struct CapturedEvent {
    message: String,
    spans: Vec<String>,
}

#[derive(Default)]
struct MessageCollector {
    message: String,
}

impl Visit for MessageCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

impl<S> Layer<S> for Capture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        let mut collector = MessageCollector::default();
        event.record(&mut collector);
        let spans = ctx
            .event_scope(event)
            .map(|scope| scope.from_root().map(|s| s.name().to_string()).collect())
            .unwrap_or_default();
        self.events.lock().unwrap().push(CapturedEvent {
            message: collector.message,
            spans,
        });
    }
}

impl Capture {
    fn find(&self, message: &str) -> CapturedEvent {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.message == message)
            .cloned()
            .unwrap_or_else(|| panic!("missing `{message}` event"))
    }
}

#[tokio::test(start_paused = true)]
async fn event_loop_span_is_not_held_while_waiting() {
    let capture = Capture::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(capture.clone()));

    let mut h = harness(FakeCompiler::default(), MemoryStore::default(), false);
    h.drive(|tx| async move {
        edit(&tx, "= Title").await;
        sleep_ms(500).await;
        tracing::info!(target: "harness", "script_step");
        send(&tx, Event::Command(CommandEvent::Quit)).await;
    })
    .await;

    let handled = capture.find("compile_issued");
    assert!(
        handled.spans.iter().any(|s| s == "event_loop"),
        "events from the loop carry its span: {handled:?}"
    );
    let outside = capture.find("script_step");
    assert!(
        outside.spans.is_empty(),
        "unrelated work was attributed to the loop: {outside:?}"
    );
}
