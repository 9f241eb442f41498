use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static CONTENT_SAVES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "site_content_saves_total",
        "Content documents written, by content type",
        &["content_type"]
    )
    .expect("register content_saves_total")
});

pub static BACKUPS_PRUNED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_content_backups_pruned_total",
        "Backup files removed by rotation"
    )
    .expect("register backups_pruned_total")
});

pub static BACKUP_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_content_backup_failures_total",
        "Backups that failed and were skipped"
    )
    .expect("register backup_failures_total")
});

pub static IMAGES_UPLOADED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_images_uploaded_total",
        "Images written to the uploads directory"
    )
    .expect("register images_uploaded_total")
});

pub static IMAGES_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_images_rejected_total",
        "Upload payloads rejected as malformed"
    )
    .expect("register images_rejected_total")
});

pub static IMAGES_DELETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "site_images_deleted_total",
        "Uploaded images removed"
    )
    .expect("register images_deleted_total")
});

pub static HTTP_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "site_http_failures_total",
        "API responses with an error status, by status code",
        &["status"]
    )
    .expect("register http_failures_total")
});

/// Render every registered metric in the Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}
