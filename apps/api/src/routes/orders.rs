//! # Order Routes
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout Flow                                   │
//! │                                                                         │
//! │  Storefront                    Harvest API                  Razorpay    │
//! │  ──────────                    ───────────                  ────────    │
//! │  POST /create-razorpay-order ──► PaymentGateway ──────────► /v1/orders  │
//! │        ◄──── { orderId } ─────────────┘                                 │
//! │                                                                         │
//! │  (customer pays in the gateway widget)                                  │
//! │                                                                         │
//! │  POST /verify-payment ─────────► HMAC-SHA256(order|payment, secret)     │
//! │  POST /create ─────────────────► validate_checkout ──► orders table     │
//! │                                                                         │
//! │  Cash on delivery skips the first two steps.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `/create` does not re-check the signature; verification and order
//! creation are separate calls.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use harvest_core::signature::verify_payment_signature;
use harvest_core::validation::{
    validate_checkout, validate_payment_intent, validate_status_update, CheckoutRequest,
    PaymentIntentRequest, StatusUpdateRequest,
};
use harvest_core::{CoreError, Order, ValidationError};
use harvest_db::{DbError, StatusChange};

use crate::error::{ApiError, ApiResult, ResultExt};
use crate::gateway::generate_receipt;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create-razorpay-order", post(create_payment_intent))
        .route("/verify-payment", post(verify_payment))
        .route("/create", post(create))
        .route("/consumer/{consumer_id}", get(list_by_consumer))
        .route("/{order_id}", get(get_by_id))
        .route("/{order_id}/status", patch(update_status))
}

// =============================================================================
// Requests / Responses
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentCreated {
    pub success: bool,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SingleOrder {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub success: bool,
    pub orders: Vec<Order>,
}

// =============================================================================
// Handlers
// =============================================================================

async fn create_payment_intent(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PaymentIntentRequest>, JsonRejection>,
) -> ApiResult<Json<PaymentIntentCreated>> {
    let Json(request) = payload?;
    let intent = validate_payment_intent(request)?;
    let receipt = generate_receipt();

    let order = state
        .gateway
        .create_order(intent.amount, &intent.currency, &receipt)
        .await
        .on_failure("Error creating order")?;

    info!(
        gateway_order_id = %order.id,
        amount = intent.amount.paise(),
        receipt = %receipt,
        "Gateway order created"
    );

    Ok(Json(PaymentIntentCreated {
        success: true,
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
    }))
}

async fn verify_payment(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerifyPaymentRequest>, JsonRejection>,
) -> ApiResult<Json<Message>> {
    let Json(request) = payload?;

    let (Some(order_id), Some(payment_id), Some(signature)) = (
        request.razorpay_order_id.as_deref(),
        request.razorpay_payment_id.as_deref(),
        request.razorpay_signature.as_deref(),
    ) else {
        return Err(ValidationError::missing_fields(
            "Missing payment verification details",
            [
                ("razorpay_order_id", request.razorpay_order_id.is_none()),
                ("razorpay_payment_id", request.razorpay_payment_id.is_none()),
                ("razorpay_signature", request.razorpay_signature.is_none()),
            ],
        )
        .map(ApiError::from)
        .unwrap_or_else(|| ApiError::validation("Invalid payment signature")));
    };

    if !verify_payment_signature(
        order_id,
        payment_id,
        signature,
        &state.config.razorpay_key_secret,
    ) {
        warn!(gateway_order_id = %order_id, "Payment signature mismatch");
        return Err(ApiError::validation("Invalid payment signature"));
    }

    info!(gateway_order_id = %order_id, payment_id = %payment_id, "Payment verified");

    Ok(Json(Message {
        success: true,
        message: "Payment verified successfully",
    }))
}

async fn create(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SingleOrder>)> {
    let Json(request) = payload?;
    let new_order = validate_checkout(request)?;

    let order = state
        .documents
        .orders()
        .insert(new_order)
        .await
        .on_failure("Error creating order")?;

    info!(
        id = %order.id,
        order_id = %order.order_id,
        customer_id = %order.customer_id,
        total = order.total_amount.paise(),
        payment_method = %order.payment_method,
        "Order created"
    );

    let items_total = order.items_total();
    if items_total != order.total_amount {
        warn!(
            order_id = %order.order_id,
            total = order.total_amount.paise(),
            items_total = items_total.paise(),
            "Order total differs from its line items"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(SingleOrder {
            success: true,
            message: Some("Order created successfully"),
            order,
        }),
    ))
}

async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<SingleOrder>> {
    let order = state
        .documents
        .orders()
        .get(&order_id)
        .await
        .on_failure("Error fetching order")?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    Ok(Json(SingleOrder {
        success: true,
        message: None,
        order,
    }))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<String>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<SingleOrder>> {
    let Json(request) = payload?;
    let (status, payment_status) = validate_status_update(request)?;

    let change = state
        .documents
        .orders()
        .set_status(&order_id, status, payment_status)
        .await
        .map_err(|err| match err {
            DbError::NotFound { .. } => ApiError::from(CoreError::OrderNotFound(order_id.clone())),
            other => ApiError::from(other),
        })
        .on_failure("Error updating order status")?;

    let order = match change {
        StatusChange::Updated(order) => order,
        StatusChange::Frozen(current) => {
            return Err(CoreError::InvalidOrderTransition {
                order_id: current.order_id,
                from: current.order_status,
                to: status,
            }
            .into());
        }
    };

    info!(
        order_id = %order.order_id,
        status = %order.order_status,
        payment_status = %order.payment_status,
        "Order status updated"
    );

    Ok(Json(SingleOrder {
        success: true,
        message: Some("Order status updated successfully"),
        order,
    }))
}

async fn list_by_consumer(
    State(state): State<Arc<AppState>>,
    Path(consumer_id): Path<String>,
) -> ApiResult<Json<OrderList>> {
    let orders = state
        .documents
        .orders()
        .list_by_customer(&consumer_id)
        .await
        .on_failure("Error fetching orders")?;

    Ok(Json(OrderList {
        success: true,
        orders,
    }))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use harvest_core::signature::payment_signature;

    use crate::routes::testing::{self, FakeGateway, TestApp};

    fn checkout() -> Value {
        json!({
            "customer_id": "consumer-1",
            "items": [
                { "product_id": "p1", "name": "Tomato", "price": 4000, "quantity": 2, "farmer_id": "farmer-1" },
                { "product_id": "p2", "name": "Onion", "price": 3000, "quantity": 1 }
            ],
            "total_amount": 11000,
            "delivery_details": {
                "address": "12 MG Road, Pune",
                "mobile": "9800000000",
                "email": "ravi@example.com"
            },
            "payment_method": "cod"
        })
    }

    async fn place(app: &TestApp, body: Value) -> Value {
        let (status, body) = app.json("POST", "/api/orders/create", body).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["order"].clone()
    }

    #[tokio::test]
    async fn test_create_payment_intent_uses_gateway() {
        let app = testing::app().await;
        let (status, body) = app
            .json("POST", "/api/orders/create-razorpay-order", json!({ "amount": 11000 }))
            .await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["success"], true);
        assert_eq!(body["orderId"], "order_test_1");

        let calls = app.gateway.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (amount, currency, receipt) = &calls[0];
        assert_eq!(*amount, 11000);
        assert_eq!(currency, "INR");
        assert_eq!(receipt.len(), 20);
    }

    #[tokio::test]
    async fn test_create_payment_intent_failures() {
        let app = testing::app().await;
        let (status, _) = app
            .json("POST", "/api/orders/create-razorpay-order", json!({ "amount": -5 }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(app.gateway.calls.lock().unwrap().is_empty());

        let app = testing::app_with_gateway(FakeGateway {
            fail: true,
            ..Default::default()
        })
        .await;
        let (status, body) = app
            .json("POST", "/api/orders/create-razorpay-order", json!({ "amount": 500 }))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Error creating order");
    }

    #[tokio::test]
    async fn test_verify_payment_signature() {
        let app = testing::app().await;
        let secret = app.state.config.razorpay_key_secret.clone();
        let good = payment_signature("order_1", "pay_1", &secret).unwrap();

        let (status, body) = app
            .json(
                "POST",
                "/api/orders/verify-payment",
                json!({
                    "razorpay_order_id": "order_1",
                    "razorpay_payment_id": "pay_1",
                    "razorpay_signature": good
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Payment verified successfully");

        // signature for a different payment must not verify this one
        let other = payment_signature("order_1", "pay_2", &secret).unwrap();
        let (status, body) = app
            .json(
                "POST",
                "/api/orders/verify-payment",
                json!({
                    "razorpay_order_id": "order_1",
                    "razorpay_payment_id": "pay_1",
                    "razorpay_signature": other
                }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid payment signature");

        let (status, body) = app
            .json("POST", "/api/orders/verify-payment", json!({ "razorpay_order_id": "order_1" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["required"]["razorpay_signature"], true);
    }

    #[tokio::test]
    async fn test_create_order_and_fetch_by_either_id() {
        let app = testing::app().await;
        let order = place(&app, checkout()).await;

        assert_eq!(order["order_status"], "placed");
        assert_eq!(order["payment_status"], "pending");
        assert_eq!(order["payment_method"], "cash_on_delivery");
        assert!(order["order_id"].as_str().unwrap().starts_with("ORD-"));

        for key in ["_id", "order_id"] {
            let id = order[key].as_str().unwrap();
            let (status, body) = app.get(&format!("/api/orders/{id}")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["order"]["_id"], order["_id"]);
        }

        let (status, body) = app.get("/api/orders/ORD-19700101-00000000").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Order not found");
    }

    #[tokio::test]
    async fn test_create_order_validation_order() {
        let app = testing::app().await;

        let mut body = checkout();
        body["items"] = json!([]);
        body["total_amount"] = Value::Null;
        let (status, resp) = app.json("POST", "/api/orders/create", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Missing required fields");
        assert_eq!(resp["required"]["total_amount"], true);

        let mut body = checkout();
        body["items"] = json!([]);
        let (_, resp) = app.json("POST", "/api/orders/create", body).await;
        assert_eq!(resp["message"], "Items must be a non-empty array");

        let mut body = checkout();
        body["items"][1] = json!({ "product_id": "p2", "name": "Onion" });
        body["delivery_details"] = json!({ "address": "x" });
        let (_, resp) = app.json("POST", "/api/orders/create", body).await;
        assert_eq!(resp["message"], "Each item must have product_id, name, price, and quantity");
        assert_eq!(resp["invalidItem"]["name"], "Onion");

        let mut body = checkout();
        body["delivery_details"] = json!({ "address": "x" });
        body["payment_method"] = json!("barter");
        let (_, resp) = app.json("POST", "/api/orders/create", body).await;
        assert_eq!(resp["message"], "Missing delivery details");
        assert_eq!(resp["required"]["mobile"], true);
        assert_eq!(resp["required"]["address"], false);

        let mut body = checkout();
        body["payment_method"] = json!("barter");
        let (status, _) = app.json("POST", "/api/orders/create", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut body = checkout();
        body["payment_method"] = json!("razorpay");
        body["razorpay_order_id"] = json!("order_1");
        let (_, resp) = app.json("POST", "/api/orders/create", body).await;
        assert_eq!(resp["message"], "Missing Razorpay payment details");

        assert_eq!(app.state.documents.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_razorpay_order_keeps_gateway_details() {
        let app = testing::app().await;
        let mut body = checkout();
        let customer = body.as_object_mut().unwrap().remove("customer_id").unwrap();
        body["consumer_id"] = customer;
        body["payment_method"] = json!("razorpay");
        body["status"] = json!("completed");
        body["razorpay_order_id"] = json!("order_1");
        body["razorpay_payment_id"] = json!("pay_1");
        body["razorpay_signature"] = json!("sig");

        let order = place(&app, body).await;
        assert_eq!(order["customer_id"], "consumer-1");
        assert_eq!(order["payment_status"], "completed");
        assert_eq!(order["gateway"]["razorpay_payment_id"], "pay_1");
    }

    #[tokio::test]
    async fn test_status_updates_stop_at_terminal_states() {
        let app = testing::app().await;
        let order = place(&app, checkout()).await;
        let uri = format!("/api/orders/{}/status", order["_id"].as_str().unwrap());

        let (status, body) = app.json("PATCH", &uri, json!({ "status": "shipped" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Order status updated successfully");
        assert_eq!(body["order"]["order_status"], "shipped");

        let (status, body) = app
            .json("PATCH", &uri, json!({ "status": "delivered", "payment_status": "completed" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order"]["payment_status"], "completed");

        let (status, body) = app.json("PATCH", &uri, json!({ "status": "cancelled" })).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        let (status, _) = app.json("PATCH", &uri, json!({ "status": "teleported" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app.json("PATCH", &uri, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .json("PATCH", "/api/orders/missing/status", json!({ "status": "shipped" }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_status_updates_never_reopen_a_cancelled_order() {
        let app = testing::app().await;

        for _ in 0..50 {
            let order = place(&app, checkout()).await;
            let uri = format!("/api/orders/{}/status", order["_id"].as_str().unwrap());

            let ((cancel, _), (ship, _)) = tokio::join!(
                app.json("PATCH", &uri, json!({ "status": "cancelled" })),
                app.json("PATCH", &uri, json!({ "status": "shipped" })),
            );
            assert_eq!(cancel, StatusCode::OK);
            assert!(
                ship == StatusCode::OK || ship == StatusCode::CONFLICT,
                "unexpected {ship}"
            );

            let (_, body) = app.get(&format!("/api/orders/{}", order["_id"].as_str().unwrap())).await;
            assert_eq!(body["order"]["order_status"], "cancelled");
        }
    }

    #[tokio::test]
    async fn test_status_update_by_order_number_reports_current_state() {
        let app = testing::app().await;
        let order = place(&app, checkout()).await;
        let uri = format!("/api/orders/{}/status", order["order_id"].as_str().unwrap());

        let (status, _) = app.json("PATCH", &uri, json!({ "status": "cancelled" })).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.json("PATCH", &uri, json!({ "status": "processing" })).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].as_str().unwrap().contains("cancelled"), "{body}");
    }

    #[tokio::test]
    async fn test_list_by_consumer_newest_first() {
        let app = testing::app().await;
        let first = place(&app, checkout()).await;
        let second = place(&app, checkout()).await;

        let (status, body) = app.get("/api/orders/consumer/consumer-1").await;
        assert_eq!(status, StatusCode::OK);
        let orders = body["orders"].as_array().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0]["_id"], second["_id"]);
        assert_eq!(orders[1]["_id"], first["_id"]);

        let (_, body) = app.get("/api/orders/consumer/nobody").await;
        assert!(body["orders"].as_array().unwrap().is_empty());
    }
}
