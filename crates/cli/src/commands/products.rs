//! Catalog browsing commands.

use orchard_client::state::ClientState;
use orchard_core::ProductSnapshot;
use thiserror::Error;

/// Errors that can occur browsing the catalog.
#[derive(Debug, Error)]
pub enum ProductsError {
    /// API request failed.
    #[error("API error: {0}")]
    Api(#[from] orchard_client::ApiError),

    /// Response payload did not match the expected shape.
    #[error("Unexpected payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// List products, optionally scoped to a category.
///
/// With `refresh`, the request is an explicit refresh: a network failure is
/// reported instead of being papered over with cached data.
#[allow(clippy::print_stdout)]
pub async fn list(
    state: &ClientState,
    limit: Option<u32>,
    category: Option<&str>,
    refresh: bool,
) -> Result<(), ProductsError> {
    let limit_value = limit.map(|l| l.to_string());
    let mut params: Vec<(&str, &str)> = Vec::new();
    if let Some(limit) = limit_value.as_deref() {
        params.push(("limit", limit));
    }
    if let Some(category) = category {
        params.push(("category", category));
    }

    let payload = if refresh {
        state.api().get_fresh("products", &params).await?
    } else {
        state.api().get("products", &params).await?
    };

    let products: Vec<ProductSnapshot> = serde_json::from_value(
        payload
            .get("products")
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new())),
    )?;

    if products.is_empty() {
        println!("No products found");
        return Ok(());
    }

    for product in &products {
        let price = product
            .unit_price
            .map_or_else(|| "-".to_string(), |price| price.display());
        println!(
            "{:<16} {:<32} [{}] {}",
            product.id, product.title, product.category, price
        );
    }
    Ok(())
}

/// Show one product.
#[allow(clippy::print_stdout)]
pub async fn show(state: &ClientState, id: &str) -> Result<(), ProductsError> {
    let payload = state.api().get(&format!("products/{id}"), &[]).await?;
    let product: ProductSnapshot = serde_json::from_value(payload)?;

    println!("ID:       {}", product.id);
    println!("Title:    {}", product.title);
    println!("Category: {}", product.category);
    match product.unit_price {
        Some(price) => println!("Price:    {}", price.display()),
        None => println!("Price:    (unpriced)"),
    }
    if let Some(image_url) = &product.image_url {
        println!("Image:    {image_url}");
    }
    Ok(())
}

/// Fetch one product for cart capture.
pub(crate) async fn fetch_snapshot(
    state: &ClientState,
    id: &str,
) -> Result<ProductSnapshot, ProductsError> {
    let payload = state.api().get(&format!("products/{id}"), &[]).await?;
    Ok(serde_json::from_value(payload)?)
}
