//! Session commands.

use orchard_client::state::ClientState;
use thiserror::Error;

/// Errors that can occur managing the session.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credential write failed.
    #[error("Storage error: {0}")]
    Storage(#[from] orchard_client::StorageError),

    /// Guest cart merge failed.
    #[error("Cart error: {0}")]
    Cart(#[from] orchard_client::CartError),
}

/// Store a bearer token and merge the guest cart into the server cart.
#[allow(clippy::print_stdout)]
pub async fn signin(state: &ClientState, token: &str) -> Result<(), AuthError> {
    state.session().set_token(token)?;
    state.cart().sign_in().await?;

    let summary = state.cart().summary();
    println!("Signed in ({} items in server cart)", summary.count);
    Ok(())
}

/// Clear the stored bearer token and return the cart to guest mode.
#[allow(clippy::print_stdout)]
pub fn signout(state: &ClientState) -> Result<(), AuthError> {
    state.session().clear_token()?;
    state.cart().sign_out();
    println!("Signed out");
    Ok(())
}
