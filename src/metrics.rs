use prometheus::{Counter, Encoder, Histogram, Registry, TextEncoder};
use lazy_static::lazy_static;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref API_REQUESTS: Counter = Counter::new(
        "api_requests_total",
        "Total number of price source requests"
    ).expect("valid counter definition");

    pub static ref API_ERRORS: Counter = Counter::new(
        "api_errors_total",
        "Total number of failed price source requests"
    ).expect("valid counter definition");

    pub static ref SWAPS: Counter = Counter::new(
        "swaps_total",
        "Total number of completed simulated swaps"
    ).expect("valid counter definition");

    pub static ref API_LATENCY: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "api_latency_seconds",
            "Price source request latency in seconds"
        ).buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0])
    ).expect("valid histogram definition");
}

pub fn init() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(API_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(API_ERRORS.clone()))?;
    REGISTRY.register(Box::new(SWAPS.clone()))?;
    REGISTRY.register(Box::new(API_LATENCY.clone()))?;
    Ok(())
}

/// Text exposition of everything registered in [`REGISTRY`].
pub fn render() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&REGISTRY.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
