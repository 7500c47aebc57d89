// src/utils/log.rs

//! Server-style progress output for long-running captures.
//!
//! Everything is routed through the `log` facade so the CLI's logger decides
//! formatting and filtering.

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{border}");
    log::info!("  {title}");
    log::info!("{border}");
}

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("[STEP {step_num}/{total}] {message}");
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {message}");
}

/// Log a success message
pub fn success(message: &str) {
    log::info!("✓ {message}");
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {title}");
    for (key, value) in items {
        log::info!("    {key}: {value}");
    }
}

/// Log progress every `every` items and on the last one.
pub fn progress(label: &str, done: usize, total: usize, every: usize) {
    if done == total || (every > 0 && done % every == 0) {
        log::info!("{label}: {done}/{total}");
    }
}
