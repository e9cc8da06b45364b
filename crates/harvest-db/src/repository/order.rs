//! # Order Repository
//!
//! Checkout persistence and status edits.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Lifecycle                                  │
//! │                                                                         │
//! │  1. CREATE            2. FULFIL                  3. TERMINAL            │
//! │  ──────────           ─────────                  ───────────            │
//! │  insert(NewOrder)     set_status(processing)     delivered / cancelled  │
//! │       │               set_status(shipped)              │                │
//! │       ▼                     │                          ▼                │
//! │  order_status: placed ──────┴────────────────► never changes again     │
//! │  payment_status: from checkout                                          │
//! │                                                                         │
//! │  set_status refuses to leave a terminal status in the same statement   │
//! │  that writes, mirroring OrderStatus::can_transition_to.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use harvest_core::{
    DeliveryDetails, GatewayPayment, Money, NewOrder, Order, OrderItem, OrderStatus,
    PaymentMethod, PaymentStatus,
};

macro_rules! select_orders {
    ($tail:literal) => {
        concat!(
            "SELECT id, order_id, customer_id, items, total_amount_paise, delivery_details, ",
            "payment_method, payment_status, order_status, gateway, created_at, updated_at ",
            "FROM orders ",
            $tail
        )
    };
}

/// Outcome of [`OrderRepository::set_status`].
#[derive(Debug, Clone)]
pub enum StatusChange {
    Updated(Order),
    /// The order had already reached a terminal status; this is it, untouched.
    Frozen(Order),
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    order_id: String,
    customer_id: String,
    items: String,
    total_amount_paise: i64,
    delivery_details: String,
    payment_method: String,
    payment_status: String,
    order_status: String,
    gateway: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let items: Vec<OrderItem> = serde_json::from_str(&row.items)
            .map_err(|e| DbError::invalid_data("orders.items", e))?;
        let delivery_details: DeliveryDetails = serde_json::from_str(&row.delivery_details)
            .map_err(|e| DbError::invalid_data("orders.delivery_details", e))?;
        let gateway: Option<GatewayPayment> = row
            .gateway
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| DbError::invalid_data("orders.gateway", e))?;

        let payment_method: PaymentMethod = row
            .payment_method
            .parse()
            .map_err(|e| DbError::invalid_data("orders.payment_method", e))?;
        let payment_status: PaymentStatus = row
            .payment_status
            .parse()
            .map_err(|e| DbError::invalid_data("orders.payment_status", e))?;
        let order_status: OrderStatus = row
            .order_status
            .parse()
            .map_err(|e| DbError::invalid_data("orders.order_status", e))?;

        Ok(Order {
            id: row.id,
            order_id: row.order_id,
            customer_id: row.customer_id,
            items,
            total_amount: Money::from_paise(row.total_amount_paise),
            delivery_details,
            payment_method,
            payment_status,
            order_status,
            gateway,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for order operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists a validated checkout as a `placed` order.
    ///
    /// ## Returns
    /// The stored order with its generated UUID and business order number.
    pub async fn insert(&self, new_order: NewOrder) -> DbResult<Order> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            order_id: generate_order_number(now),
            customer_id: new_order.customer_id,
            items: new_order.items,
            total_amount: new_order.total_amount,
            delivery_details: new_order.delivery_details,
            payment_method: new_order.payment_method,
            payment_status: new_order.payment_status,
            order_status: OrderStatus::Placed,
            gateway: new_order.gateway,
            created_at: now,
            updated_at: now,
        };

        debug!(
            id = %order.id,
            order_id = %order.order_id,
            customer_id = %order.customer_id,
            items = order.items.len(),
            "Inserting order"
        );

        let items = serde_json::to_string(&order.items)?;
        let delivery = serde_json::to_string(&order.delivery_details)?;
        let gateway = order.gateway.as_ref().map(serde_json::to_string).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_id, customer_id, items, total_amount_paise,
                delivery_details, payment_method, payment_status, order_status,
                gateway, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_id)
        .bind(&order.customer_id)
        .bind(items)
        .bind(order.total_amount.paise())
        .bind(delivery)
        .bind(order.payment_method.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.order_status.as_str())
        .bind(gateway)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    /// Looks an order up by UUID or by business order number.
    pub async fn get(&self, id_or_number: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(select_orders!(
            "WHERE id = ?1 OR order_id = ?1 LIMIT 1"
        ))
        .bind(id_or_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// A consumer's orders, newest first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(select_orders!(
            "WHERE customer_id = ?1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(customer_id = %customer_id, count = rows.len(), "Listed customer orders");
        rows.into_iter().map(Order::try_from).collect()
    }

    /// Moves an order to `status`, and sets the payment status when given.
    ///
    /// `id_or_number` is the UUID or the `ORD-...` number. The terminal
    /// check runs inside the UPDATE, so of two racing writers only one can
    /// leave `delivered` or `cancelled` behind.
    pub async fn set_status(
        &self,
        id_or_number: &str,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> DbResult<StatusChange> {
        debug!(order = %id_or_number, status = %status, "Updating order status");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                order_status = ?2,
                payment_status = COALESCE(?3, payment_status),
                updated_at = ?4
            WHERE (id = ?1 OR order_id = ?1)
              AND (order_status NOT IN (?5, ?6) OR order_status = ?2)
            "#,
        )
        .bind(id_or_number)
        .bind(status.as_str())
        .bind(payment_status.map(|p| p.as_str()))
        .bind(Utc::now())
        .bind(OrderStatus::Delivered.as_str())
        .bind(OrderStatus::Cancelled.as_str())
        .execute(&self.pool)
        .await?;

        let order = self
            .get(id_or_number)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id_or_number))?;

        if result.rows_affected() == 0 {
            // only a terminal status makes the guarded UPDATE skip an existing row
            debug_assert!(!order.order_status.can_transition_to(status));
            debug!(order_id = %order.order_id, current = %order.order_status, "Order is frozen");
            return Ok(StatusChange::Frozen(order));
        }

        Ok(StatusChange::Updated(order))
    }

    /// Counts orders (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Generates a business order number in format: ORD-YYYYMMDD-XXXXXXXX
///
/// ## Format
/// - YYYYMMDD: UTC date the order was placed
/// - XXXXXXXX: 8 uppercase hex characters from a random UUID
///
/// ## Example
/// `ORD-20261019-9F3A61C2`
pub fn generate_order_number(at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..8].to_ascii_uppercase();
    format!("ORD-{}-{}", at.format("%Y%m%d"), suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{DbConfig, DocumentStore};
    use crate::repository::fixtures;

    async fn repo() -> OrderRepository {
        DocumentStore::new(DbConfig::in_memory())
            .await
            .unwrap()
            .orders()
    }

    #[test]
    fn test_order_number_format() {
        let at = fixtures::at(0);
        let number = generate_order_number(at);

        assert!(number.starts_with("ORD-20261001-"));
        let suffix = &number["ORD-20261001-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_either_id() {
        let repo = repo().await;
        let order = repo.insert(fixtures::new_order("consumer-1")).await.unwrap();

        assert_eq!(order.order_status, OrderStatus::Placed);
        assert_eq!(order.items_total().paise(), 12000);

        let by_uuid = repo.get(&order.id).await.unwrap().unwrap();
        let by_number = repo.get(&order.order_id).await.unwrap().unwrap();
        assert_eq!(by_uuid, order);
        assert_eq!(by_number.id, order.id);

        assert!(repo.get("ORD-00000000-DEADBEEF").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_gateway_block_round_trips() {
        let repo = repo().await;
        let mut new_order = fixtures::new_order("consumer-1");
        new_order.payment_method = PaymentMethod::Razorpay;
        new_order.payment_status = PaymentStatus::Completed;
        new_order.gateway = Some(GatewayPayment {
            gateway_order_id: "order_1".to_string(),
            gateway_payment_id: "pay_1".to_string(),
            gateway_signature: "sig".to_string(),
        });

        let order = repo.insert(new_order).await.unwrap();
        let stored = repo.get(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.gateway.unwrap().gateway_payment_id, "pay_1");
        assert_eq!(stored.payment_status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_list_by_customer_newest_first() {
        let repo = repo().await;
        let first = repo.insert(fixtures::new_order("consumer-1")).await.unwrap();
        let second = repo.insert(fixtures::new_order("consumer-1")).await.unwrap();
        repo.insert(fixtures::new_order("consumer-2")).await.unwrap();

        let orders = repo.list_by_customer("consumer-1").await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, second.id);
        assert_eq!(orders[1].id, first.id);
    }

    fn updated(change: StatusChange) -> Order {
        match change {
            StatusChange::Updated(order) => order,
            StatusChange::Frozen(order) => panic!("unexpectedly frozen at {}", order.order_status),
        }
    }

    #[tokio::test]
    async fn test_set_status_keeps_payment_status_unless_given() {
        let repo = repo().await;
        let order = repo.insert(fixtures::new_order("consumer-1")).await.unwrap();

        let shipped = updated(
            repo.set_status(&order.id, OrderStatus::Shipped, None)
                .await
                .unwrap(),
        );
        assert_eq!(shipped.order_status, OrderStatus::Shipped);
        assert_eq!(shipped.payment_status, PaymentStatus::Pending);

        // by business number this time
        let delivered = updated(
            repo.set_status(&order.order_id, OrderStatus::Delivered, Some(PaymentStatus::Completed))
                .await
                .unwrap(),
        );
        assert_eq!(delivered.payment_status, PaymentStatus::Completed);

        assert!(repo
            .set_status("missing", OrderStatus::Shipped, None)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_terminal_order_is_left_untouched() {
        let repo = repo().await;
        let order = repo.insert(fixtures::new_order("consumer-1")).await.unwrap();

        updated(
            repo.set_status(&order.id, OrderStatus::Cancelled, None)
                .await
                .unwrap(),
        );

        match repo
            .set_status(&order.id, OrderStatus::Shipped, Some(PaymentStatus::Completed))
            .await
            .unwrap()
        {
            StatusChange::Frozen(current) => {
                assert_eq!(current.order_status, OrderStatus::Cancelled);
                assert_eq!(current.payment_status, PaymentStatus::Pending);
            }
            StatusChange::Updated(_) => panic!("cancelled order was reopened"),
        }

        // re-asserting the terminal status is still accepted
        let again = updated(
            repo.set_status(&order.id, OrderStatus::Cancelled, None)
                .await
                .unwrap(),
        );
        assert_eq!(again.order_status, OrderStatus::Cancelled);
    }
}
