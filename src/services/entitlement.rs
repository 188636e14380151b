//! Cached premium/free entitlement.
//!
//! The flag is fetched once and cached. A "paid" push flips it to `true`.
//! With `entitlement_revalidate_secs` set, a stale value is re-fetched on
//! the next read. Failures never propagate: the last known value is kept,
//! or `false` when nothing was ever fetched.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::types::errors::EntitlementError;

/// External payment/entitlement service, treated as an opaque boolean.
#[allow(async_fn_in_trait)]
pub trait EntitlementService {
    async fn fetch_paid(&self) -> Result<bool, EntitlementError>;
    async fn open_payment_page(&self) -> Result<(), EntitlementError>;
}

impl<T: EntitlementService> EntitlementService for Rc<T> {
    async fn fetch_paid(&self) -> Result<bool, EntitlementError> {
        (**self).fetch_paid().await
    }

    async fn open_payment_page(&self) -> Result<(), EntitlementError> {
        (**self).open_payment_page().await
    }
}

/// Entitlement cache in front of an [`EntitlementService`].
pub struct EntitlementCache<E> {
    service: E,
    cached: Cell<Option<bool>>,
    fetched_at: Cell<Option<Instant>>,
    revalidate_after: Option<Duration>,
    fetch_timeout: Duration,
}

impl<E: EntitlementService> EntitlementCache<E> {
    pub fn new(service: E, revalidate_after: Option<Duration>, fetch_timeout: Duration) -> Self {
        Self {
            service,
            cached: Cell::new(None),
            fetched_at: Cell::new(None),
            revalidate_after,
            fetch_timeout,
        }
    }

    pub fn service(&self) -> &E {
        &self.service
    }

    /// Last known value without touching the service.
    pub fn cached(&self) -> Option<bool> {
        self.cached.get()
    }

    /// Fetch from the service and cache the answer.
    pub async fn refresh(&self) -> bool {
        let result = match timeout(self.fetch_timeout, self.service.fetch_paid()).await {
            Ok(result) => result,
            Err(_) => Err(EntitlementError::Unavailable(format!(
                "no answer within {}ms",
                self.fetch_timeout.as_millis()
            ))),
        };
        match result {
            Ok(paid) => {
                self.cached.set(Some(paid));
                self.fetched_at.set(Some(Instant::now()));
                paid
            }
            Err(e) => {
                let fallback = self.cached.get().unwrap_or(false);
                warn!(error = %e, fallback, "entitlement lookup failed");
                fallback
            }
        }
    }

    /// Current entitlement, fetching only when nothing is cached or the
    /// cached value has outlived the revalidation interval.
    pub async fn is_premium(&self) -> bool {
        match (self.cached.get(), self.fetched_at.get()) {
            (Some(paid), Some(at)) if !self.is_stale(at) => paid,
            _ => self.refresh().await,
        }
    }

    /// Push notification from the payment flow.
    pub fn mark_paid(&self) {
        debug!("entitlement marked paid");
        self.cached.set(Some(true));
        self.fetched_at.set(Some(Instant::now()));
    }

    /// Open the external payment UI. Failure is logged and swallowed.
    pub async fn open_payment_page(&self) {
        if let Err(e) = self.service.open_payment_page().await {
            warn!(error = %e, "could not open payment page");
        }
    }

    fn is_stale(&self, fetched_at: Instant) -> bool {
        match self.revalidate_after {
            Some(max_age) => fetched_at.elapsed() >= max_age,
            None => false,
        }
    }
}
