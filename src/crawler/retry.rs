//! Failure classification and retry policy
//!
//! Every completed request passes through `RetryPolicy::guard` before any
//! handler sees it.
//!
//! | Condition | Action |
//! |-----------|--------|
//! | status < 400 | Invoke the handler |
//! | HTTP 404 | Not found: never retried |
//! | status >= 400 or network error, retries left | Resubmit after a fixed backoff |
//! | status >= 400 or network error, retries exhausted | Drop |

use crate::config::CrawlerConfig;
use crate::crawler::request::{Dispatch, Fetched, RequestDescriptor, ResponseDescriptor};
use crate::SounderError;
use std::time::Duration;

/// Classification of one completed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Handle,
    NotFound,
    Retry { attempt: u32 },
    Drop,
}

/// Result of running a handler behind the policy
#[derive(Debug)]
pub enum Guarded<T> {
    /// The handler ran and produced this value
    Handled(T),

    /// HTTP 404; the request is returned so the caller can pick a fallback
    NotFound(RequestDescriptor),

    /// Resubmit this (retry count already bumped)
    Retry(Dispatch),

    /// Retries exhausted; retry count has been cleared
    Dropped(RequestDescriptor),
}

/// Fixed-backoff retry policy wrapped around every handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Classifies a completion
    ///
    /// # Arguments
    ///
    /// * `status` - HTTP status, or `None` when the transport failed outright
    /// * `retry_times` - Resubmissions already made for this request
    pub fn classify(&self, status: Option<u16>, retry_times: u32) -> Disposition {
        match status {
            Some(code) if code < 400 => Disposition::Handle,
            Some(404) => Disposition::NotFound,
            _ if retry_times < self.max_retries => Disposition::Retry {
                attempt: retry_times + 1,
            },
            _ => Disposition::Drop,
        }
    }

    /// Runs `handler` only if the completion classifies as handleable
    pub fn guard<T, F>(
        &self,
        mut request: RequestDescriptor,
        outcome: Result<Fetched, SounderError>,
        handler: F,
    ) -> Guarded<T>
    where
        F: FnOnce(ResponseDescriptor) -> T,
    {
        let status = match &outcome {
            Ok(fetched) => Some(fetched.status),
            Err(e) => {
                tracing::warn!("Request to {} failed: {}", request.url, e);
                None
            }
        };

        match (self.classify(status, request.context.retry_times), outcome) {
            (Disposition::Handle, Ok(fetched)) => {
                Guarded::Handled(handler(ResponseDescriptor::new(request, fetched)))
            }
            (Disposition::NotFound, _) => {
                tracing::info!("Page not found: {}", request.url);
                Guarded::NotFound(request)
            }
            (Disposition::Retry { attempt }, _) => {
                tracing::debug!(
                    "Retrying {} (attempt {}/{}, status {:?})",
                    request.url,
                    attempt,
                    self.max_retries,
                    status
                );
                request.context.retry_times = attempt;
                request.bypass_dedup = true;
                Guarded::Retry(Dispatch::after(request, self.backoff))
            }
            _ => {
                tracing::info!(
                    "Dropped after {} retries. url: {}",
                    self.max_retries,
                    request.url
                );
                request.context.retry_times = 0;
                Guarded::Dropped(request)
            }
        }
    }
}
