//! Request and response descriptors exchanged with the transport

use crate::crawler::frontier::Frontier;
use crate::state::PendingProbe;
use std::time::Duration;

/// Which handler a response is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Site root fetched to trigger seeding from the local input list
    InputList,
    /// Sitemap discovery
    Sitemap,
    /// Site root fetched for category links (sitemap fallback)
    CategoryIndex,
    /// A category listing page with product links
    CategoryListing,
    /// A product detail page
    ProductPage,
    /// One cart-add attempt of a quantity probe
    CartProbe,
}

/// HTTP method implied by a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// State carried from a request to the handler of its response
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Record being probed, present on cart requests only
    pub item: Option<PendingProbe>,

    /// Resubmissions so far for this exact request
    pub retry_times: u32,

    /// The crawl branch this request drains when it finishes
    pub frontier: Frontier,
}

/// A unit of follow-up work
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub kind: RequestKind,
    pub url: String,

    /// Urlencoded form body; a non-empty form makes this a POST
    pub form: Vec<(String, String)>,

    pub referer: Option<String>,

    /// Skip the dispatch dedup filter (retries and cart probes)
    pub bypass_dedup: bool,

    pub context: RequestContext,
}

impl RequestDescriptor {
    /// A plain GET with a fresh, empty context
    pub fn get(kind: RequestKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            form: Vec::new(),
            referer: None,
            bypass_dedup: false,
            context: RequestContext::default(),
        }
    }

    /// A cart-add POST for the probe's current quantity
    pub fn cart_probe(cart_url: &str, form_key: &str, pending: PendingProbe) -> Self {
        let form = vec![
            ("product".to_string(), pending.record.product_cart_id.clone()),
            ("form_key".to_string(), form_key.to_string()),
            ("qty".to_string(), pending.probe.quantity.to_string()),
        ];

        Self {
            kind: RequestKind::CartProbe,
            url: cart_url.to_string(),
            form,
            referer: Some(pending.record.product_url.clone()),
            bypass_dedup: true,
            context: RequestContext {
                item: Some(pending),
                ..RequestContext::default()
            },
        }
    }

    pub fn bypassing_dedup(mut self) -> Self {
        self.bypass_dedup = true;
        self
    }

    pub fn method(&self) -> Method {
        if self.form.is_empty() {
            Method::Get
        } else {
            Method::Post
        }
    }

    /// Identity used by the dispatch dedup filter
    pub fn fingerprint(&self) -> String {
        let body = self
            .form
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        format!("{:?} {} {}", self.method(), self.url, body)
    }
}

/// What the transport hands back for a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub status: u16,
    pub url: String,
    pub body: String,
}

/// A completed response paired with the request that produced it
#[derive(Debug, Clone)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub url: String,
    pub body: String,
    pub request: RequestDescriptor,
}

impl ResponseDescriptor {
    pub fn new(request: RequestDescriptor, fetched: Fetched) -> Self {
        Self {
            status: fetched.status,
            url: fetched.url,
            body: fetched.body,
            request,
        }
    }

    pub fn context(&self) -> &RequestContext {
        &self.request.context
    }
}

/// A request ready for submission, optionally after a delay
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub request: RequestDescriptor,
    pub delay: Duration,
}

impl Dispatch {
    pub fn now(request: RequestDescriptor) -> Self {
        Self {
            request,
            delay: Duration::ZERO,
        }
    }

    pub fn after(request: RequestDescriptor, delay: Duration) -> Self {
        Self { request, delay }
    }
}
