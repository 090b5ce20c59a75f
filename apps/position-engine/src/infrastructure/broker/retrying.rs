//! Retrying gateway decorator.
//!
//! Wraps any `BrokerPort` with a per-call timeout and bounded exponential
//! backoff. What counts as retryable is decided per operation by
//! [`BrokerError::is_retryable`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{BrokerError, BrokerOperation, BrokerPort, Holding};
use crate::broker::BrokerRetryPolicy;
use crate::domain::orders::{OrderRequest, OrderStatusReport};
use crate::domain::shared::BrokerOrderId;
use crate::observability;

/// `BrokerPort` decorator adding timeouts and retry.
pub struct RetryingBroker {
    inner: Arc<dyn BrokerPort>,
    policy: BrokerRetryPolicy,
    call_timeout: Duration,
}

impl std::fmt::Debug for RetryingBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingBroker")
            .field("policy", &self.policy)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl RetryingBroker {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn BrokerPort>, policy: BrokerRetryPolicy, call_timeout: Duration) -> Self {
        Self {
            inner,
            policy,
            call_timeout,
        }
    }

    async fn call<T, F, Fut>(&self, operation: BrokerOperation, mut attempt: F) -> Result<T, BrokerError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, BrokerError>> + Send,
    {
        let mut backoff = self.policy.backoff();

        loop {
            let result = match tokio::time::timeout(self.call_timeout, attempt()).await {
                Ok(result) => result,
                Err(_) => Err(BrokerError::Timeout {
                    operation: operation.as_str().to_string(),
                }),
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !error.is_retryable(operation) {
                return Err(error);
            }

            let Some(delay) = backoff.next() else {
                tracing::warn!(
                    operation = operation.as_str(),
                    attempts = backoff.retries() + 1,
                    error = %error,
                    "Broker call failed, retries exhausted"
                );
                return Err(error);
            };

            tracing::debug!(
                operation = operation.as_str(),
                retry = backoff.retries(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Retrying broker call"
            );
            observability::record_broker_retry(operation.as_str());
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl BrokerPort for RetryingBroker {
    async fn place_order(&self, request: &OrderRequest) -> Result<BrokerOrderId, BrokerError> {
        self.call(BrokerOperation::PlaceOrder, || self.inner.place_order(request))
            .await
    }

    async fn cancel_order(&self, order_id: &BrokerOrderId) -> Result<(), BrokerError> {
        self.call(BrokerOperation::CancelOrder, || self.inner.cancel_order(order_id))
            .await
    }

    async fn order_status(
        &self,
        order_id: &BrokerOrderId,
    ) -> Result<OrderStatusReport, BrokerError> {
        self.call(BrokerOperation::OrderStatus, || self.inner.order_status(order_id))
            .await
    }

    async fn list_holdings(&self) -> Result<Vec<Holding>, BrokerError> {
        self.call(BrokerOperation::ListHoldings, || self.inner.list_holdings())
            .await
    }
}
