//! Catalog search and history commands.

use orchard_client::state::ClientState;
use orchard_core::ProductSnapshot;

use super::products::ProductsError;

/// Search the catalog, recording the term in history.
#[allow(clippy::print_stdout)]
pub async fn run(state: &ClientState, term: &str) -> Result<(), ProductsError> {
    state.history().record(term);

    let payload = state.api().get("products", &[("search", term)]).await?;
    let products: Vec<ProductSnapshot> = serde_json::from_value(
        payload
            .get("products")
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new())),
    )?;

    if products.is_empty() {
        println!("No results for \"{term}\"");
        return Ok(());
    }

    for product in &products {
        println!("{:<16} {}", product.id, product.title);
    }
    Ok(())
}

/// Show or clear the recorded search history.
#[allow(clippy::print_stdout)]
pub fn history(state: &ClientState, clear: bool) {
    if clear {
        state.history().clear();
        println!("History cleared");
        return;
    }

    let entries = state.history().entries();
    if entries.is_empty() {
        println!("No recorded searches");
        return;
    }

    for entry in &entries {
        println!("{}  {}", entry.recorded_at.format("%Y-%m-%d %H:%M"), entry.term);
    }
}
