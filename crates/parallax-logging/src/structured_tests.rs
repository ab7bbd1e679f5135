// ABOUTME: Tests that domain events are logged with structured fields
// ABOUTME: Uses tracing-mock to assert levels, messages, and field values

use tracing::Level;
use tracing_mock::{expect, subscriber};

#[test]
fn test_compile_outcome_fields() {
    let (subscriber, handle) = subscriber::mock()
        .event(
            expect::event().at_level(Level::INFO).with_fields(
                expect::field("generation")
                    .with_value(&3u64)
                    .and(expect::field("status").with_value(&"succeeded"))
                    .and(expect::msg("Compilation committed")),
            ),
        )
        .only()
        .run_with_handle();

    tracing::subscriber::with_default(subscriber, || {
        crate::info!(generation = 3u64, status = "succeeded", "Compilation committed");
    });

    handle.assert_finished();
}

#[test]
fn test_scroll_suppression_is_debug() {
    let (subscriber, handle) = subscriber::mock()
        .event(
            expect::event()
                .at_level(Level::DEBUG)
                .with_fields(expect::msg("Scroll suppressed")),
        )
        .only()
        .run_with_handle();

    tracing::subscriber::with_default(subscriber, || {
        crate::debug!(origin = "preview", "Scroll suppressed");
    });

    handle.assert_finished();
}

#[test]
fn test_render_failure_is_warning() {
    let (subscriber, handle) = subscriber::mock()
        .event(
            expect::event()
                .at_level(Level::WARN)
                .with_fields(expect::field("revision").with_value(&7u64)),
        )
        .only()
        .run_with_handle();

    tracing::subscriber::with_default(subscriber, || {
        crate::warn!(revision = 7u64, message = "boom", "Render failed");
    });

    handle.assert_finished();
}
