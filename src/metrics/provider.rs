//! Traits and adapters for metric providers.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{MonitorError, Result};
use crate::metrics::{MetricCategory, MetricValue};

/// A source of one category of metrics.
///
/// Implementations must be idempotent and safe to call repeatedly; the
/// scheduler guarantees at most one outstanding `fetch` per registration.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Fetch the current value, or fail.
    async fn fetch(&self) -> Result<MetricValue>;
}

#[async_trait]
impl<P: MetricProvider + ?Sized> MetricProvider for Arc<P> {
    async fn fetch(&self) -> Result<MetricValue> {
        (**self).fetch().await
    }
}

/// Provider backed by an async closure.
///
/// ```rust
/// use battery_guardian::metrics::{FnProvider, MetricValue, TimeInfo};
/// use battery_guardian::MonitorError;
///
/// let provider = FnProvider::new(|| async {
///     Ok::<_, MonitorError>(MetricValue::Time(TimeInfo::default()))
/// });
/// # let _ = provider;
/// ```
pub struct FnProvider<F> {
    f: F,
}

impl<F> FnProvider<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> MetricProvider for FnProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<MetricValue>> + Send,
{
    async fn fetch(&self) -> Result<MetricValue> {
        (self.f)().await
    }
}

/// Wraps a provider so that a fetch running longer than `timeout` fails.
pub struct TimeoutProvider<P> {
    inner: P,
    category: MetricCategory,
    timeout: Duration,
}

impl<P: MetricProvider> TimeoutProvider<P> {
    pub fn new(inner: P, category: MetricCategory, timeout: Duration) -> Self {
        Self {
            inner,
            category,
            timeout,
        }
    }
}

#[async_trait]
impl<P: MetricProvider> MetricProvider for TimeoutProvider<P> {
    async fn fetch(&self) -> Result<MetricValue> {
        match tokio::time::timeout(self.timeout, self.inner.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(MonitorError::Timeout {
                category: self.category,
                after_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}
