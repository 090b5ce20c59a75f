//! Upstox broker adapter implementing `BrokerPort`.

use async_trait::async_trait;

use crate::application::ports::{BrokerError, BrokerPort, Holding};
use crate::domain::orders::{OrderRequest, OrderStatusReport};
use crate::domain::shared::{BrokerOrderId, Symbol};

use super::api_types::{OrderDetails, OrderIdData, PlaceOrderBody, PositionEntry};
use super::config::UpstoxConfig;
use super::error::UpstoxError;
use super::http_client::UpstoxHttpClient;

/// Upstox broker adapter.
#[derive(Debug, Clone)]
pub struct UpstoxBrokerAdapter {
    client: UpstoxHttpClient,
    product: String,
    tag: Option<String>,
}

impl UpstoxBrokerAdapter {
    /// Create a new Upstox broker adapter.
    ///
    /// # Errors
    ///
    /// Returns error if the access token is missing.
    pub fn new(config: &UpstoxConfig) -> Result<Self, UpstoxError> {
        Ok(Self {
            client: UpstoxHttpClient::new(config)?,
            product: config.product.clone(),
            tag: config.tag.clone(),
        })
    }
}

#[async_trait]
impl BrokerPort for UpstoxBrokerAdapter {
    async fn place_order(&self, request: &OrderRequest) -> Result<BrokerOrderId, BrokerError> {
        let body = PlaceOrderBody::from_request(request, &self.product, self.tag.as_deref());

        tracing::info!(
            symbol = %request.symbol,
            side = %body.transaction_type,
            order_type = %body.order_type,
            qty = body.quantity,
            price = %body.price,
            trigger_price = %body.trigger_price,
            "Placing order with Upstox"
        );

        let data: OrderIdData = self
            .client
            .post("/v2/order/place", &body)
            .await
            .map_err(|e| match e {
                UpstoxError::Api { message, .. } => UpstoxError::OrderRejected(message),
                other => other,
            })?;

        Ok(BrokerOrderId::new(data.order_id))
    }

    async fn cancel_order(&self, order_id: &BrokerOrderId) -> Result<(), BrokerError> {
        tracing::info!(%order_id, "Cancelling Upstox order");
        let _: OrderIdData = self
            .client
            .delete("/v2/order/cancel", &[("order_id", order_id.as_str())])
            .await
            .map_err(|e| match e {
                UpstoxError::Api { status: 404, .. } => UpstoxError::OrderNotFound {
                    order_id: order_id.to_string(),
                },
                UpstoxError::Api { message, .. } => UpstoxError::OrderNotOpen {
                    order_id: order_id.to_string(),
                    message,
                },
                other => other,
            })?;
        Ok(())
    }

    async fn order_status(
        &self,
        order_id: &BrokerOrderId,
    ) -> Result<OrderStatusReport, BrokerError> {
        let details: OrderDetails = self
            .client
            .get("/v2/order/details", &[("order_id", order_id.as_str())])
            .await
            .map_err(|e| match e {
                UpstoxError::Api { status: 400 | 404, .. } => UpstoxError::OrderNotFound {
                    order_id: order_id.to_string(),
                },
                other => other,
            })?;

        tracing::debug!(%order_id, status = %details.status, filled = details.filled_quantity, "Upstox order status");
        Ok(details.to_report())
    }

    async fn list_holdings(&self) -> Result<Vec<Holding>, BrokerError> {
        let entries: Vec<PositionEntry> = self
            .client
            .get("/v2/portfolio/short-term-positions", &[])
            .await?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.quantity != 0)
            .map(|entry| Holding {
                symbol: Symbol::new(entry.trading_symbol),
                quantity: entry.quantity,
            })
            .collect())
    }
}
