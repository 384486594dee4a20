use alloy::providers::RootProvider;

/// The read-only HTTP provider the indexer polls with.
pub type FactoriProvider = RootProvider;

/// Create an HTTP provider from an RPC URL string.
pub fn create_provider(rpc_url: &str) -> eyre::Result<FactoriProvider> {
    let url = rpc_url.parse()?;
    Ok(RootProvider::new_http(url))
}
