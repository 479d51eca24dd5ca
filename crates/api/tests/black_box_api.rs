use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tillpoint_api::app::{build_app, AppState};
use tillpoint_auth::{JwtClaims, Role};
use tillpoint_core::{StoreId, UserId};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory backend, ephemeral port.
        let app = build_app(AppState::in_memory(JWT_SECRET, 4));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, token: &str, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(store_id: StoreId, role: Role) -> String {
    mint_jwt_for(UserId::new(), store_id, role)
}

fn mint_jwt_for(user_id: UserId, store_id: StoreId, role: Role) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        store_id,
        stores: vec![store_id],
        role,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn create_product(srv: &TestServer, token: &str, sku: &str, price: i64) -> String {
    let (status, body) = srv
        .post(
            token,
            "/products",
            json!({ "sku": sku, "name": sku, "price": price, "cost": 0, "stock": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "body={body}");
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn store_context_is_derived_from_token_and_header() {
    let srv = TestServer::spawn().await;
    let store = StoreId::new();

    let token = mint_jwt(store, Role::admin());
    let (status, body) = srv.get(&token, "/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store_id"].as_str().unwrap(), store.to_string());
    assert_eq!(body["role"], "admin");

    // Admins may switch stores; cashiers only within their own.
    let other = StoreId::new();
    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(&token)
        .header("X-Store-Id", other.to_string())
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["store_id"].as_str().unwrap(), other.to_string());

    let cashier = mint_jwt(store, Role::cashier());
    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(&cashier)
        .header("X-Store-Id", other.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_issues_a_token_for_the_users_store() {
    let srv = TestServer::spawn().await;
    let admin = mint_jwt(StoreId::new(), Role::admin());

    let (status, store) = srv.post(&admin, "/stores", json!({ "name": "Corner Shop" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let store_id = store["id"].as_str().unwrap().to_string();

    let (status, user) = srv
        .post(
            &admin,
            "/users",
            json!({
                "email": "Kasir@Example.com",
                "display_name": "Kasir",
                "password": "correct horse",
                "role": "cashier",
                "stores": [store_id],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "body={user}");
    assert!(user.get("password_hash").is_none());

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "kasir@example.com", "password": "wrong password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .json(&json!({ "email": "kasir@example.com", "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let login: Value = res.json().await.unwrap();
    let token = login["token"].as_str().unwrap();

    let (status, me) = srv.get(token, "/whoami").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["store_id"].as_str().unwrap(), store_id);
    assert_eq!(me["role"], "cashier");
}

#[tokio::test]
async fn cashier_cannot_write_catalog() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(StoreId::new(), Role::cashier());
    let (status, body) = srv
        .post(&token, "/products", json!({ "sku": "X", "name": "X", "price": 1 }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(StoreId::new(), Role::admin());
    let (status, body) = srv.get(&token, "/customers/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn shift_lifecycle_reconciles_cash() {
    let srv = TestServer::spawn().await;
    let store = StoreId::new();
    let admin = mint_jwt(store, Role::admin());
    let cashier = mint_jwt(store, Role::cashier());

    let (status, started) = srv.post(&cashier, "/shifts", json!({ "starting_cash": 100_000 })).await;
    assert_eq!(status, StatusCode::CREATED, "body={started}");
    assert_eq!(started["success"], true);
    assert_eq!(started["data"]["status"], "open");
    let shift_id = started["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = srv.post(&cashier, "/shifts", json!({ "starting_cash": 0 })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let a = create_product(&srv, &admin, "A", 50_000).await;
    let b = create_product(&srv, &admin, "B", 30_000).await;
    for product in [a, b] {
        let (status, sale) = srv
            .post(
                &cashier,
                "/sales",
                json!({
                    "lines": [{ "product_id": product, "quantity": 1 }],
                    "payment_method": "cash",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "body={sale}");
        assert_eq!(sale["shift_id"].as_str().unwrap(), shift_id);
    }

    let (status, summary) = srv.get(&cashier, &format!("/shifts/{shift_id}/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["data"]["expected_cash"], 180_000);
    assert_eq!(summary["data"]["sale_count"], 2);

    let (status, closed) = srv
        .post(&cashier, &format!("/shifts/{shift_id}/close"), json!({ "ending_cash": 175_000 }))
        .await;
    assert_eq!(status, StatusCode::OK, "body={closed}");
    assert_eq!(closed["data"]["status"], "closed");
    assert_eq!(closed["data"]["expected_cash"], 180_000);
    assert_eq!(closed["data"]["cash_difference"], -5_000);

    let (status, again) = srv
        .post(&cashier, &format!("/shifts/{shift_id}/close"), json!({ "ending_cash": 1 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(again["error"], "invalid_state");

    let (_, fetched) = srv.get(&cashier, &format!("/shifts/{shift_id}")).await;
    assert_eq!(fetched["data"]["ending_cash"], 175_000);

    let (_, current) = srv.get(&cashier, "/shifts/current").await;
    assert_eq!(current["success"], true);
    assert!(current["data"].is_null());
}

#[tokio::test]
async fn credit_sales_and_payments_drive_customer_debt() {
    let srv = TestServer::spawn().await;
    let store = StoreId::new();
    let admin = mint_jwt(store, Role::admin());

    let (status, customer) = srv
        .post(&admin, "/customers", json!({ "name": "Budi", "credit_limit": 10_000 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let customer_id = customer["id"].as_str().unwrap().to_string();

    let (_, empty) = srv.get(&admin, &format!("/customers/{customer_id}/debt?history=true")).await;
    assert_eq!(empty["data"]["current_debt"], 0);
    assert_eq!(empty["data"]["history"], json!([]));

    let product = create_product(&srv, &admin, "RICE", 15_000).await;
    let (status, _) = srv
        .post(
            &admin,
            "/sales",
            json!({
                "lines": [{ "product_id": product, "quantity": 1 }],
                "payment_method": "credit",
                "amount_paid": 3_000,
                "customer_id": customer_id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = srv
        .post(
            &admin,
            "/payments",
            json!({ "amount": 2_000, "category": "debt_payment", "customer_id": customer_id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, debt) = srv.get(&admin, &format!("/customers/{customer_id}/debt?history=true")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(debt["success"], true);
    assert_eq!(debt["data"]["total_sales"], 12_000);
    assert_eq!(debt["data"]["total_payments"], 2_000);
    assert_eq!(debt["data"]["current_debt"], 10_000);
    assert_eq!(debt["data"]["over_limit"], false);
    let history = debt["data"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["type"], "sale");
    assert_eq!(history[1]["type"], "payment");
    assert_eq!(history[1]["running_balance"], 10_000);

    let (_, debtors) = srv.get(&admin, "/customers/debtors").await;
    assert_eq!(debtors["data"].as_array().unwrap().len(), 1);

    let (status, risk) = srv.get(&admin, &format!("/analytics/debt-risk/{customer_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(risk["current_debt"], 10_000);
}

#[tokio::test]
async fn store_isolation_blocks_cross_store_reads() {
    let srv = TestServer::spawn().await;
    let token1 = mint_jwt(StoreId::new(), Role::manager());
    let token2 = mint_jwt(StoreId::new(), Role::manager());

    let (status, created) = srv.post(&token1, "/customers", json!({ "name": "Sari" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap();

    let (status, _) = srv.get(&token2, &format!("/customers/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, debt) = srv.get(&token2, &format!("/customers/{id}/debt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(debt["success"], false);
}

#[tokio::test]
async fn storefront_checkout_creates_pending_order() {
    let srv = TestServer::spawn().await;
    let store = StoreId::new();
    let manager = mint_jwt_for(UserId::new(), store, Role::manager());

    let (_, customer) = srv.post(&manager, "/customers", json!({ "name": "Ayu" })).await;
    let customer_id = customer["id"].as_str().unwrap().to_string();
    let product = create_product(&srv, &manager, "TEA", 2_500).await;

    let (status, cart) = srv
        .post(
            &manager,
            "/cart/items",
            json!({ "customer_id": customer_id, "product_id": product, "quantity": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body={cart}");
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);

    let (status, order) = srv
        .post(&manager, "/cart/checkout", json!({ "customer_id": customer_id }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["total"], 5_000);
    let order_id = order["id"].as_str().unwrap();

    let (status, body) = srv
        .post(&manager, &format!("/orders/{order_id}/status"), json!({ "status": "fulfilled" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_state");

    let (status, paid) = srv
        .post(&manager, &format!("/orders/{order_id}/status"), json!({ "status": "paid" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "paid");
}
