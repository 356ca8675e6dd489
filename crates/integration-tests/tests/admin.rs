//! Admin dashboard and order management.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use shopease_client::{
    CheckoutCoordinator, CheckoutForm, CheckoutOutcome, CheckoutSettings, ClientError,
    LazyGateway, StorefrontApi,
};
use shopease_core::{OrderId, OrderStatus, OrderUser, PaymentMethod, ProductId, ShippingAddress};
use shopease_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, AutoGatewayLoader, CUSTOMER_EMAIL, CUSTOMER_PASSWORD, TestServer,
};

/// Place one paid gateway order and one unpaid cash-on-delivery order.
async fn place_orders(server: &TestServer) -> (OrderId, OrderId) {
    let store = server.signed_in(CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;
    let checkout = CheckoutCoordinator::new(
        store.clone(),
        LazyGateway::new(AutoGatewayLoader::confirming()),
        CheckoutSettings::default(),
    );
    let form = |payment_method| CheckoutForm {
        shipping_address: ShippingAddress {
            street: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "KA".to_string(),
            zip_code: "560001".to_string(),
            country: "India".to_string(),
        },
        payment_method,
    };

    let mut placed = Vec::new();
    for (product, payment_method) in [
        ("p1", PaymentMethod::Razorpay),
        ("p3", PaymentMethod::CashOnDelivery),
    ] {
        let product = store.api().get_product(&ProductId::new(product)).await.unwrap();
        store.cart().add(&product, 1).await.unwrap();
        let CheckoutOutcome::Completed { order_id } =
            checkout.checkout(form(payment_method)).await.unwrap()
        else {
            panic!("checkout did not complete");
        };
        placed.push(order_id);
    }

    let cod = placed.pop().unwrap();
    let paid = placed.pop().unwrap();
    (paid, cod)
}

#[tokio::test]
async fn test_stats_reflect_placed_orders() {
    let server = TestServer::spawn().await;
    place_orders(&server).await;
    let admin = server.signed_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let state = admin.admin().fetch_stats().await;

    assert!(state.error.is_none());
    let stats = state.data.stats;
    assert_eq!(stats.total_products, 4);
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.pending_orders, 1);
    assert_eq!(stats.processing_orders, 1);
    // 600 + 18% tax + 50 shipping
    assert_eq!(stats.total_revenue, Decimal::new(7580, 1));
}

#[tokio::test]
async fn test_admin_orders_include_customer_profile() {
    let server = TestServer::spawn().await;
    place_orders(&server).await;
    let admin = server.signed_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let state = admin.admin().fetch_orders().await;

    assert_eq!(state.data.orders.len(), 2);
    for order in &state.data.orders {
        let Some(OrderUser::Profile(owner)) = &order.user else {
            panic!("owner not populated on {}", order.id);
        };
        assert_eq!(owner.email, CUSTOMER_EMAIL);
    }
}

#[tokio::test]
async fn test_status_update_refetches_orders() {
    let server = TestServer::spawn().await;
    let (paid, _) = place_orders(&server).await;
    let admin = server.signed_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    admin.admin().fetch_orders().await;

    admin
        .admin()
        .update_status(&paid, OrderStatus::Shipped)
        .await
        .unwrap();

    let state = admin.admin().state().await;
    let order = state.data.orders.iter().find(|o| o.id == paid).unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
    assert_eq!(server.requests_to("/admin/orders").len(), 3);
}

#[tokio::test]
async fn test_failed_status_update_keeps_list() {
    let server = TestServer::spawn().await;
    place_orders(&server).await;
    let admin = server.signed_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    admin.admin().fetch_orders().await;

    let err = admin
        .admin()
        .update_status(&OrderId::new("o404"), OrderStatus::Delivered)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Order not found");
    let state = admin.admin().state().await;
    assert_eq!(state.error.as_deref(), Some("Order not found"));
    assert_eq!(state.data.orders.len(), 2);
    // No refetch after the failure
    assert_eq!(server.requests_to("/admin/orders").len(), 2);
}

#[tokio::test]
async fn test_customer_gets_server_forbidden_message() {
    let server = TestServer::spawn().await;
    let store = server.signed_in(CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await;

    let state = store.admin().fetch_stats().await;

    assert_eq!(state.error.as_deref(), Some("Not authorized as an admin"));

    let err = store
        .admin()
        .update_status(&OrderId::new("o1"), OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::ServerRejected(_)));
}
