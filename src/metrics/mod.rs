//! Metrics module
//!
//! Prometheus counters for uploads and credential requests.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    // Upload metrics
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "r2_uploadr_uploads_total",
        "Total number of uploads",
        &["bucket", "status"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "r2_uploadr_upload_bytes_total",
        "Total bytes uploaded"
    ).unwrap();

    pub static ref UPLOAD_DURATION: HistogramVec = register_histogram_vec!(
        "r2_uploadr_upload_duration_seconds",
        "Upload duration in seconds",
        &["bucket"],
        vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]
    ).unwrap();

    // Auth metrics
    pub static ref AUTH_ATTEMPTS: CounterVec = register_counter_vec!(
        "r2_uploadr_auth_attempts_total",
        "Credential requests",
        &["status"]
    ).unwrap();

    // Error metrics
    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "r2_uploadr_errors_total",
        "Total errors",
        &["type"]
    ).unwrap();
}

/// Record a successful upload
pub fn record_upload_success(bucket: &str, bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&[bucket, "success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record a failed upload
pub fn record_upload_failure(bucket: &str) {
    UPLOADS_TOTAL.with_label_values(&[bucket, "failure"]).inc();
}

/// Record upload duration
pub fn record_upload_duration(bucket: &str, duration_secs: f64) {
    UPLOAD_DURATION
        .with_label_values(&[bucket])
        .observe(duration_secs);
}

/// Record a credential request, issued or fetched
pub fn record_auth_attempt(success: bool) {
    let status = if success { "success" } else { "failure" };
    AUTH_ATTEMPTS.with_label_values(&[status]).inc();
}

/// Record an error
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Encode every registered metric in the Prometheus text format
///
/// Returns the content type alongside the body.
pub fn render() -> Result<(String, Vec<u8>), prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok((encoder.format_type().to_string(), buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_upload_success() {
        record_upload_success("test-bucket", 1024);
        // Just verify it doesn't panic
    }

    #[test]
    fn test_record_auth_attempt() {
        record_auth_attempt(true);
        record_auth_attempt(false);
        // Just verify it doesn't panic
    }

    #[test]
    fn test_render_contains_upload_counter() {
        record_upload_failure("render-bucket");
        let (content_type, body) = render().unwrap();
        assert!(content_type.starts_with("text/plain"));
        let body = String::from_utf8(body).unwrap();
        assert!(body.contains("r2_uploadr_uploads_total"));
    }
}
