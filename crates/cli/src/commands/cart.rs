//! Cart commands.
//!
//! When a bearer token is stored, the cart enters authenticated mode first
//! (merging any guest lines into the server cart) so every command operates
//! against the server's canonical view.

use orchard_client::state::ClientState;
use orchard_core::ProductId;
use thiserror::Error;

use super::products::{self, ProductsError};

/// Errors that can occur running cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Cart store operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] orchard_client::CartError),

    /// Product lookup failed.
    #[error(transparent)]
    Products(#[from] ProductsError),
}

/// Enter authenticated mode when a credential is stored.
async fn adopt_session_mode(state: &ClientState) -> Result<(), CartCommandError> {
    if state.session().is_authenticated() && !state.cart().is_authenticated() {
        state.cart().sign_in().await?;
    }
    Ok(())
}

/// Show the current cart.
#[allow(clippy::print_stdout)]
pub async fn show(state: &ClientState) -> Result<(), CartCommandError> {
    adopt_session_mode(state).await?;
    // Authenticated carts show what the server last told us; offline this
    // degrades to the cached view
    state.cart().refresh().await?;

    let items = state.cart().items();
    if items.is_empty() {
        println!("Cart is empty");
        return Ok(());
    }

    for line in &items {
        println!("{}", super::format_line(line));
    }

    let summary = state.cart().summary();
    println!("---");
    println!("{} items, total {}", summary.count, summary.total);
    Ok(())
}

/// Add a product to the cart.
#[allow(clippy::print_stdout)]
pub async fn add(state: &ClientState, id: &str, quantity: u32) -> Result<(), CartCommandError> {
    adopt_session_mode(state).await?;

    let product = products::fetch_snapshot(state, id).await?;
    state.cart().add(&product, quantity).await?;

    let summary = state.cart().summary();
    println!(
        "Added {quantity} x {} ({} items in cart)",
        product.title, summary.count
    );
    Ok(())
}

/// Remove a product from the cart.
#[allow(clippy::print_stdout)]
pub async fn remove(state: &ClientState, id: &str) -> Result<(), CartCommandError> {
    adopt_session_mode(state).await?;

    state.cart().remove(&ProductId::new(id)).await?;
    println!("Removed {id} ({} items in cart)", state.cart().summary().count);
    Ok(())
}

/// Set the quantity for a product; 0 removes it.
#[allow(clippy::print_stdout)]
pub async fn set_quantity(
    state: &ClientState,
    id: &str,
    quantity: u32,
) -> Result<(), CartCommandError> {
    adopt_session_mode(state).await?;

    state
        .cart()
        .update_quantity(&ProductId::new(id), quantity)
        .await?;
    println!("{id} set to {quantity} ({} items in cart)", state.cart().summary().count);
    Ok(())
}

/// Empty the cart.
#[allow(clippy::print_stdout)]
pub async fn clear(state: &ClientState) -> Result<(), CartCommandError> {
    adopt_session_mode(state).await?;

    state.cart().clear().await?;
    println!("Cart cleared");
    Ok(())
}
