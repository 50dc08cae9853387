//! Live event delivery, cancellation and history queries.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use posh_sdk::contracts::{human_identity, proof_registry, AbiValue};
    use posh_sdk::{Address, EventFilter, HumanId, ImpactType, InMemoryProvider, ProofTier};
    use primitive_types::{H256, U256};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn registered(chain: &InMemoryProvider, identity: Address, human: H256) {
        let wallet: Address = WALLET.parse().unwrap();
        chain
            .emit_event(
                identity,
                human_identity::HUMAN_REGISTERED,
                &[
                    AbiValue::FixedBytes(human),
                    AbiValue::Address(wallet.0),
                    AbiValue::Uint(U256::from(1_700_000_000u64)),
                ],
            )
            .unwrap();
    }

    fn proof_registered(chain: &InMemoryProvider, registry: Address, human: H256, impact: u64) {
        chain
            .emit_event(
                registry,
                proof_registry::PROOF_REGISTERED,
                &[
                    AbiValue::FixedBytes(H256::from_low_u64_be(impact)),
                    AbiValue::FixedBytes(human),
                    AbiValue::Uint(U256::from(ImpactType::CarbonAvoidance.as_u8())),
                    AbiValue::Uint(U256::from(impact)),
                    AbiValue::Uint(U256::one()),
                ],
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let cfg = config(true);
        let identity = identity_address(&cfg);
        let chain = signed_chain();
        let client = chain_client(cfg, &chain);

        let received = Arc::new(AtomicUsize::new(0));
        let counter = received.clone();
        let subscription = client
            .events()
            .on_human_registered(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();

        registered(&chain, identity, H256::repeat_byte(1));
        registered(&chain, identity, H256::repeat_byte(2));
        subscription.unsubscribe();
        registered(&chain, identity, H256::repeat_byte(3));

        assert_eq!(received.load(Ordering::SeqCst), 2);
        assert!(!subscription.is_active());
        assert_eq!(chain.watcher_count(), 0);
    }

    #[tokio::test]
    async fn test_subscription_ignores_other_contracts() {
        let cfg = config(true);
        let registry = proof_registry_address(&cfg);
        let chain = signed_chain();
        let client = chain_client(cfg, &chain);

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = client
            .events()
            .on_proof_registered(move |event| sink.lock().push(event))
            .await
            .unwrap();

        let stranger: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        proof_registered(&chain, stranger, H256::repeat_byte(1), 5);
        proof_registered(&chain, registry, H256::repeat_byte(1), 7);
        subscription.unsubscribe();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].impact_value, U256::from(7u64));
        assert_eq!(seen[0].impact_type, ImpactType::CarbonAvoidance);
        assert_eq!(seen[0].tier, ProofTier::A);
    }

    #[tokio::test]
    async fn test_history_filters_by_human() {
        let cfg = config(true);
        let registry = proof_registry_address(&cfg);
        let chain = signed_chain();
        let client = chain_client(cfg, &chain);

        let human: HumanId = HUMAN.parse().unwrap();
        proof_registered(&chain, registry, human.0, 10);
        proof_registered(&chain, registry, H256::repeat_byte(9), 20);
        proof_registered(&chain, registry, human.0, 30);

        let mine = client.events().get_human_proof_events(HUMAN).await.unwrap();
        let values: Vec<U256> = mine.iter().map(|e| e.impact_value).collect();
        assert_eq!(values, vec![U256::from(10u64), U256::from(30u64)]);

        let all = client
            .events()
            .get_proof_registered_events(&EventFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_history_respects_block_range() {
        let cfg = config(true);
        let identity = identity_address(&cfg);
        let chain = signed_chain();
        let client = chain_client(cfg, &chain);

        // Blocks 2, 3 and 4.
        for byte in 1..=3 {
            registered(&chain, identity, H256::repeat_byte(byte));
        }

        let filter = EventFilter {
            from_block: Some(3),
            to_block: Some(3),
            human_id: None,
        };
        let events = client.events().get_human_registered_events(&filter).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].block_number, 3);
        assert_eq!(events[0].human_id.0, H256::repeat_byte(2));
    }
}
