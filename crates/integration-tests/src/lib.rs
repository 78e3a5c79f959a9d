//! Integration tests for the Orchard client core.
//!
//! Tests run against [`MockBackend`], an in-process axum server speaking
//! the backend's REST dialect on an ephemeral port. The backend can be
//! flipped into failure mode (every request answers 500) to exercise the
//! cache-fallback path, and can require a bearer token to exercise the
//! unauthorized teardown.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p orchard-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use orchard_client::config::ClientConfig;
use orchard_client::state::ClientState;
use orchard_client::storage::MemoryStorage;

/// Shared state behind the mock backend.
pub struct BackendState {
    /// Seeded catalog, keyed by product ID.
    products: Mutex<BTreeMap<String, Value>>,
    /// Server cart: product ID to quantity.
    cart: Mutex<BTreeMap<String, u32>>,
    /// When set, every request answers 500.
    fail: AtomicBool,
    /// When set, requests must carry `Bearer <token>` or get 401.
    required_token: Mutex<Option<String>>,
    /// Artificial latency inside cart mutations, to widen the
    /// read-modify-write window for interleaving tests.
    mutation_delay: Mutex<Duration>,
}

impl BackendState {
    fn lock_products(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.products.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cart(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, u32>> {
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An in-process backend for one test.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
}

impl MockBackend {
    /// Start a backend on an ephemeral port, seeded with a small catalog.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound (test environment issue).
    #[allow(clippy::unwrap_used)]
    pub async fn start() -> Self {
        let mut products = BTreeMap::new();
        for product in seed_products() {
            let id = product["id"].as_str().unwrap().to_string();
            products.insert(id, product);
        }

        let state = Arc::new(BackendState {
            products: Mutex::new(products),
            cart: Mutex::new(BTreeMap::new()),
            fail: AtomicBool::new(false),
            required_token: Mutex::new(None),
            mutation_delay: Mutex::new(Duration::ZERO),
        });

        let app = Router::new()
            .route("/products", get(list_products))
            .route("/products/{id}", get(show_product))
            .route("/cart", get(show_cart).delete(clear_cart))
            .route("/cart/items", post(add_cart_item))
            .route(
                "/cart/items/{id}",
                put(set_cart_item).delete(remove_cart_item),
            )
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    /// Base URL clients should point at.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make every request fail with 500 (simulated outage).
    pub fn set_failing(&self, failing: bool) {
        self.state.fail.store(failing, Ordering::SeqCst);
    }

    /// Require a bearer token on every request.
    pub fn require_token(&self, token: &str) {
        *self
            .state
            .required_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    /// Widen the read-modify-write window inside cart mutations.
    pub fn set_mutation_delay(&self, delay: Duration) {
        *self
            .state
            .mutation_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Server-side quantity for one product.
    #[must_use]
    pub fn cart_quantity(&self, product_id: &str) -> u32 {
        self.state
            .lock_cart()
            .get(product_id)
            .copied()
            .unwrap_or(0)
    }
}

/// Build a client over in-memory storage against `backend`.
///
/// # Panics
///
/// Panics if the client cannot be constructed (test environment issue).
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn client_for(backend: &MockBackend) -> (ClientState, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let state = client_over(backend, Arc::clone(&storage));
    (state, storage)
}

/// Build a client over existing storage (simulated app restart).
///
/// # Panics
///
/// Panics if the client cannot be constructed (test environment issue).
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn client_over(backend: &MockBackend, storage: Arc<MemoryStorage>) -> ClientState {
    let config =
        ClientConfig::new(&backend.base_url(), std::path::PathBuf::from("unused")).unwrap();
    ClientState::with_storage(config, storage).unwrap()
}

// =============================================================================
// Handlers
// =============================================================================

fn gate(state: &BackendState, headers: &HeaderMap) -> Result<(), StatusCode> {
    if state.fail.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let required = state
        .required_token
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    if let Some(token) = required {
        let expected = format!("Bearer {token}");
        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected.as_str()) {
            return Err(StatusCode::UNAUTHORIZED);
        }
    }
    Ok(())
}

async fn list_products(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    gate(&state, &headers)?;

    let mut products: Vec<Value> = state.lock_products().values().cloned().collect();

    if let Some(category) = params.get("category") {
        products.retain(|product| product["category"].as_str() == Some(category));
    }
    if let Some(search) = params.get("search") {
        let needle = search.to_lowercase();
        products.retain(|product| {
            product["title"]
                .as_str()
                .is_some_and(|title| title.to_lowercase().contains(&needle))
        });
    }
    if let Some(limit) = params.get("limit").and_then(|value| value.parse().ok()) {
        products.truncate(limit);
    }

    Ok(Json(json!({ "products": products })))
}

async fn show_product(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    gate(&state, &headers)?;

    state
        .lock_products()
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

fn cart_view(state: &BackendState) -> Value {
    let cart = state.lock_cart().clone();
    let products = state.lock_products();
    let lines: Vec<Value> = cart
        .iter()
        .map(|(product_id, quantity)| {
            let product = products.get(product_id);
            json!({
                "product_id": product_id,
                "title": product
                    .and_then(|p| p["title"].as_str())
                    .unwrap_or(product_id),
                "quantity": quantity,
                "unit_price": product.map(|p| p["unit_price"].clone()).unwrap_or(Value::Null),
            })
        })
        .collect();
    json!({ "id": "cart-1", "lines": lines })
}

async fn show_cart(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    gate(&state, &headers)?;
    Ok(Json(cart_view(&state)))
}

async fn add_cart_item(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    gate(&state, &headers)?;

    let product_id = body["product_id"]
        .as_str()
        .ok_or(StatusCode::BAD_REQUEST)?
        .to_string();
    let quantity =
        u32::try_from(body["quantity"].as_u64().ok_or(StatusCode::BAD_REQUEST)?)
            .map_err(|_| StatusCode::BAD_REQUEST)?;

    // Deliberately non-atomic read-modify-write: the client's single-writer
    // queue is what keeps concurrent adds from losing updates
    let current = state.lock_cart().get(&product_id).copied().unwrap_or(0);
    let delay = *state
        .mutation_delay
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if delay > Duration::ZERO {
        tokio::time::sleep(delay).await;
    }
    state.lock_cart().insert(product_id, current + quantity);

    Ok(Json(json!({})))
}

async fn set_cart_item(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    gate(&state, &headers)?;

    let quantity =
        u32::try_from(body["quantity"].as_u64().ok_or(StatusCode::BAD_REQUEST)?)
            .map_err(|_| StatusCode::BAD_REQUEST)?;
    if quantity == 0 {
        state.lock_cart().remove(&id);
    } else {
        state.lock_cart().insert(id, quantity);
    }
    Ok(Json(json!({})))
}

async fn remove_cart_item(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    gate(&state, &headers)?;
    state.lock_cart().remove(&id);
    Ok(Json(json!({})))
}

async fn clear_cart(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    gate(&state, &headers)?;
    state.lock_cart().clear();
    Ok(Json(json!({})))
}

fn seed_products() -> Vec<Value> {
    vec![
        json!({
            "id": "p-mango",
            "title": "Alphonso Mango",
            "unit_price": {"amount": "120.00"},
            "category": "fruit",
        }),
        json!({
            "id": "p-banana",
            "title": "Robusta Banana",
            "unit_price": {"amount": "50.00"},
            "category": "fruit",
        }),
        json!({
            "id": "p-soap",
            "title": "Herbal Soap",
            "unit_price": {"amount": "35.00"},
            "category": "household",
        }),
    ]
}
