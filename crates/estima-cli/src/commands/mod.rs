//! Command implementations.

pub mod check;
pub mod extract;
pub mod index;
pub mod normalize;
pub mod run;

pub use self::check::execute_check;
pub use self::extract::execute_extract;
pub use self::index::execute_index;
pub use self::normalize::execute_normalize;
pub use self::run::execute_run;

use crate::error::Result;
use estima_llm::{Provider, ProviderConfig};
use std::sync::Arc;

/// Construct the configured provider.
///
/// The HTTP clients are blocking, so they are built off the async workers.
pub(crate) async fn resolve_provider(config: &ProviderConfig) -> Result<Arc<Provider>> {
    let config = config.clone();
    let provider = tokio::task::spawn_blocking(move || Provider::from_config(&config)).await??;
    Ok(Arc::new(provider))
}
