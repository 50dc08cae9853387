//! Read memoization through the client: hits, misses, expiry and
//! invalidation.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use posh_sdk::contracts::AbiValue;
    use posh_sdk::{CachePolicy, ConfigUpdate, ManualClock, PoshClient, ProviderBinding};
    use primitive_types::U256;
    use std::sync::Arc;

    fn registered_stub() -> Arc<StubProvider> {
        Arc::new(StubProvider::new(vec![AbiValue::Bool(true)]))
    }

    #[tokio::test]
    async fn test_repeated_read_hits_cache() {
        let stub = registered_stub();
        let client = stub_client(config(true), &stub);

        assert!(client.identity().is_registered(WALLET).await.unwrap());
        assert!(client.identity().is_registered(WALLET).await.unwrap());

        assert_eq!(stub.reads(), 1);
        assert_eq!(client.cached_entries(), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_reads_every_time() {
        let stub = registered_stub();
        let client = stub_client(config(false), &stub);

        client.identity().is_registered(WALLET).await.unwrap();
        client.identity().is_registered(WALLET).await.unwrap();

        assert_eq!(stub.reads(), 2);
        assert_eq!(client.cached_entries(), 0);
    }

    #[tokio::test]
    async fn test_distinct_arguments_are_cached_separately() {
        let stub = registered_stub();
        let client = stub_client(config(true), &stub);

        client.identity().is_registered(WALLET).await.unwrap();
        client
            .identity()
            .is_registered("0x00000000000000000000000000000000000000bb")
            .await
            .unwrap();

        assert_eq!(stub.reads(), 2);
        assert_eq!(client.cached_entries(), 2);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let stub = registered_stub();
        let clock = ManualClock::new(0);
        let client = PoshClient::with_clock(
            config(true),
            ProviderBinding::Live(stub.clone()),
            Arc::new(clock.clone()),
        )
        .unwrap();

        client.identity().is_registered(WALLET).await.unwrap();
        clock.advance(59_999);
        client.identity().is_registered(WALLET).await.unwrap();
        assert_eq!(stub.reads(), 1);

        clock.advance(2);
        client.identity().is_registered(WALLET).await.unwrap();
        assert_eq!(stub.reads(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_reread() {
        let stub = Arc::new(StubProvider::new(vec![AbiValue::Uint(U256::from(420u64))]));
        let client = stub_client(config(true), &stub);

        assert_eq!(client.score().get_score(HUMAN).await.unwrap(), U256::from(420u64));
        client.clear_cache();
        assert_eq!(client.cached_entries(), 0);
        client.score().get_score(HUMAN).await.unwrap();

        assert_eq!(stub.reads(), 2);
    }

    #[tokio::test]
    async fn test_config_update_drops_cached_reads() {
        let stub = registered_stub();
        let client = stub_client(config(true), &stub);
        client.identity().is_registered(WALLET).await.unwrap();

        client
            .update_config(&ConfigUpdate {
                cache: Some(CachePolicy {
                    enabled: true,
                    ttl_ms: 5_000,
                    max_size: 4,
                }),
                ..ConfigUpdate::default()
            })
            .unwrap();

        assert_eq!(client.cached_entries(), 0);
        client.identity().is_registered(WALLET).await.unwrap();
        assert_eq!(stub.reads(), 2);
    }
}
