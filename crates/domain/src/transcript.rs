//! Console transcript of a call.
//!
//! The transcript is the plain-text log stored on a request after each
//! send: the request as it went out, then the response or the failure.

use crate::descriptor::ExecutionDescriptor;
use crate::request::build_url;
use crate::response::Response;

/// Renders the console log for one call.
///
/// `outcome` is the received response, or the failure message when no
/// response arrived.
#[must_use]
pub fn console_log(descriptor: &ExecutionDescriptor, outcome: Result<&Response, &str>) -> String {
    let url = build_url(&descriptor.url, &descriptor.params)
        .unwrap_or_else(|_| descriptor.url.clone());

    let mut log = String::from("=== REQUEST ===\n");
    log.push_str(&format!("{} {url}\n\n", descriptor.method));
    log.push_str("--- Request Headers ---\n");
    for (name, value) in &descriptor.headers {
        log.push_str(&format!("{name}: {value}\n"));
    }
    if let Some(body) = descriptor.body.as_deref().filter(|b| !b.trim().is_empty()) {
        log.push_str("\n--- Request Body ---\n");
        log.push_str(body);
        log.push('\n');
    }

    match outcome {
        Ok(response) => {
            log.push_str("\n=== RESPONSE ===\n");
            log.push_str(&format!("Status: {}\n\n", response.status));
            log.push_str("--- Response Headers ---\n");
            for (name, value) in &response.headers {
                log.push_str(&format!("{name}: {value}\n"));
            }
            log.push_str("\n--- Response Body ---\n");
            log.push_str(&response.body_text());
            log.push('\n');
        }
        Err(message) => {
            log.push_str("\n=== ERROR ===\n");
            log.push_str(message);
            log.push('\n');
        }
    }
    log
}
