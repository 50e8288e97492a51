use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{Mutex, OnceLock};

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Metrics
pub static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static HTTP_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static PARTNER_AUTHORIZATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static DISCLOSURE_CHECKS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static AUDIT_EVENTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Build and register every collector. Calling it again is a no-op.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;
    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;
    let authorizations = IntCounterVec::new(
        Opts::new(
            "partner_authorizations_total",
            "Partner credential checks by outcome",
        ),
        &["outcome"],
    )?;
    let checks = IntCounterVec::new(
        Opts::new("disclosure_checks_total", "Worker lookups by result"),
        &["found"],
    )?;
    let audit_events = IntCounterVec::new(
        Opts::new("audit_events_total", "Audit entries by delivery result"),
        &["result"],
    )?;

    registry.register(Box::new(requests_total.clone()))?;
    registry.register(Box::new(request_duration.clone()))?;
    registry.register(Box::new(authorizations.clone()))?;
    registry.register(Box::new(checks.clone()))?;
    registry.register(Box::new(audit_events.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = HTTP_REQUESTS_TOTAL.set(requests_total);
    let _ = HTTP_REQUEST_DURATION_SECONDS.set(request_duration);
    let _ = PARTNER_AUTHORIZATIONS_TOTAL.set(authorizations);
    let _ = DISCLOSURE_CHECKS_TOTAL.set(checks);
    let _ = AUDIT_EVENTS_TOTAL.set(audit_events);
    Ok(())
}

pub fn record_authorization(outcome: &str) {
    if let Some(counter) = PARTNER_AUTHORIZATIONS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

pub fn record_check(found: bool) {
    if let Some(counter) = DISCLOSURE_CHECKS_TOTAL.get() {
        counter
            .with_label_values(&[if found { "true" } else { "false" }])
            .inc();
    }
}

pub fn record_audit(result: &str) {
    if let Some(counter) = AUDIT_EVENTS_TOTAL.get() {
        counter.with_label_values(&[result]).inc();
    }
}

pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to convert metrics to UTF-8: {}", e);
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_counters_exported() {
        init_metrics().expect("metrics");
        init_metrics().expect("second init is a no-op");
        record_authorization("authorized");
        record_check(false);
        record_audit("persisted");

        let text = get_metrics();
        assert!(text.contains("partner_authorizations_total"));
        assert!(text.contains("disclosure_checks_total"));
        assert!(text.contains("audit_events_total"));
    }
}
