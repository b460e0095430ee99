//! The single refresh-and-retry policy shared by every remote call.

use std::future::Future;

use super::{RemoteError, RemoteResult};
use crate::auth::IdentityProvider;

/// Run `operation` with the current access token.
///
/// If it fails with `RemoteError::Unauthorized`, the identity provider is asked
/// for a fresh token and the operation runs exactly once more. A failed refresh
/// or a second rejection becomes `RemoteError::NotAuthenticated`.
pub async fn with_auth_retry<I, T, F, Fut>(identity: &I, mut operation: F) -> RemoteResult<T>
where
    I: IdentityProvider + ?Sized,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = RemoteResult<T>>,
{
    let token = identity.access_token().await?;
    match operation(token).await {
        Err(RemoteError::Unauthorized) => {}
        other => return other,
    }

    tracing::info!("Access token rejected, refreshing and retrying once");
    let token = identity.refresh_token().await.map_err(|error| {
        tracing::warn!("Token refresh failed: {}", error);
        RemoteError::NotAuthenticated
    })?;

    match operation(token).await {
        Err(RemoteError::Unauthorized) => {
            tracing::warn!("Refreshed access token was also rejected");
            Err(RemoteError::NotAuthenticated)
        }
        other => other,
    }
}
