use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("irembo_chat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("irembo_chat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("irembo_chat.client.request_duration_seconds");

pub(crate) static STREAM_TOKENS: Counter = Counter::new("irembo_chat.stream.tokens");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("irembo_chat.stream.errors");
pub(crate) static STREAM_TTFT: Moments = Moments::new("irembo_chat.stream.ttft_seconds");

pub(crate) static SESSION_TURNS: Counter = Counter::new("irembo_chat.session.turns");
pub(crate) static SESSION_TURN_FAILURES: Counter =
    Counter::new("irembo_chat.session.turn_failures");
pub(crate) static SESSION_SENDS_REJECTED: Counter =
    Counter::new("irembo_chat.session.sends_rejected");
pub(crate) static SESSION_LANGUAGE_RESETS: Counter =
    Counter::new("irembo_chat.session.language_resets");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_TOKENS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_moments(&STREAM_TTFT);

    collector.register_counter(&SESSION_TURNS);
    collector.register_counter(&SESSION_TURN_FAILURES);
    collector.register_counter(&SESSION_SENDS_REJECTED);
    collector.register_counter(&SESSION_LANGUAGE_RESETS);
}
