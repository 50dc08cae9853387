//! # Event Manager
//!
//! Typed live subscriptions and historical queries over the PoSH contract
//! events.
//!
//! Every live subscription is gated on the SDK side as well: once
//! `unsubscribe` returns, the callback is never invoked again, even if the
//! provider still has a log in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::context::ClientContext;
use super::identity::parse_human_id;
use super::proof::small_uint;
use crate::config::ContractRole;
use crate::contracts::{human_identity, proof_registry, AbiEvent, AbiValue};
use crate::domain::{
    timestamp_from_secs, Address, EventFilter, HumanId, HumanRegisteredEvent, IdentityLinkedEvent,
    ImpactType, PoshError, ProofRegisteredEvent, ProofTier,
};
use crate::ports::{EventLog, LogQuery, Subscription};

/// Position of the indexed `humanId` among `topics[1..]`.
#[derive(Clone, Copy)]
struct HumanTopic(usize);

/// Event subscriptions and history.
#[derive(Clone)]
pub struct EventManager {
    context: Arc<ClientContext>,
}

impl EventManager {
    pub(crate) fn new(context: Arc<ClientContext>) -> Self {
        Self { context }
    }

    /// Watch `HumanRegistered`.
    pub async fn on_human_registered<C>(&self, callback: C) -> Result<Subscription, PoshError>
    where
        C: Fn(HumanRegisteredEvent) + Send + Sync + 'static,
    {
        self.subscribe(
            ContractRole::Identity,
            human_identity::HUMAN_REGISTERED,
            decode_human_registered,
            callback,
        )
        .await
    }

    /// Watch `ProofRegistered`.
    pub async fn on_proof_registered<C>(&self, callback: C) -> Result<Subscription, PoshError>
    where
        C: Fn(ProofRegisteredEvent) + Send + Sync + 'static,
    {
        self.subscribe(
            ContractRole::ProofRegistry,
            proof_registry::PROOF_REGISTERED,
            decode_proof_registered,
            callback,
        )
        .await
    }

    /// Watch `IdentityLinked`.
    pub async fn on_identity_linked<C>(&self, callback: C) -> Result<Subscription, PoshError>
    where
        C: Fn(IdentityLinkedEvent) + Send + Sync + 'static,
    {
        self.subscribe(
            ContractRole::Identity,
            human_identity::IDENTITY_LINKED,
            decode_identity_linked,
            callback,
        )
        .await
    }

    /// Past `HumanRegistered` events.
    pub async fn get_human_registered_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<HumanRegisteredEvent>, PoshError> {
        self.history(
            ContractRole::Identity,
            human_identity::HUMAN_REGISTERED,
            HumanTopic(0),
            filter,
            decode_human_registered,
        )
        .await
    }

    /// Past `ProofRegistered` events.
    pub async fn get_proof_registered_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<ProofRegisteredEvent>, PoshError> {
        self.history(
            ContractRole::ProofRegistry,
            proof_registry::PROOF_REGISTERED,
            HumanTopic(1),
            filter,
            decode_proof_registered,
        )
        .await
    }

    /// Past `IdentityLinked` events.
    pub async fn get_identity_linked_events(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<IdentityLinkedEvent>, PoshError> {
        self.history(
            ContractRole::Identity,
            human_identity::IDENTITY_LINKED,
            HumanTopic(0),
            filter,
            decode_identity_linked,
        )
        .await
    }

    /// Past events of `human_id` only. Convenience over the filtered form.
    pub async fn get_human_proof_events(
        &self,
        human_id: &str,
    ) -> Result<Vec<ProofRegisteredEvent>, PoshError> {
        let filter = EventFilter {
            human_id: Some(parse_human_id(human_id)?),
            ..EventFilter::default()
        };
        self.get_proof_registered_events(&filter).await
    }

    async fn subscribe<T, D, C>(
        &self,
        role: ContractRole,
        event: AbiEvent,
        decode: D,
        callback: C,
    ) -> Result<Subscription, PoshError>
    where
        T: 'static,
        D: Fn(&EventLog) -> Result<T, PoshError> + Send + Sync + 'static,
        C: Fn(T) + Send + Sync + 'static,
    {
        let query = LogQuery::new(self.context.contract_address(role)?, event);
        let gate = Arc::new(AtomicBool::new(true));

        let open = gate.clone();
        let inner = self
            .context
            .watch(
                role,
                &query,
                Arc::new(move |log: EventLog| {
                    if !open.load(Ordering::SeqCst) {
                        return;
                    }
                    match decode(&log) {
                        Ok(decoded) => callback(decoded),
                        Err(e) => tracing::warn!(event = event.name, error = %e, "Dropping undecodable log"),
                    }
                }),
            )
            .await?;

        tracing::debug!(event = event.name, subscription = %inner.id(), "Subscribed");
        Ok(Subscription::new(move || {
            gate.store(false, Ordering::SeqCst);
            inner.unsubscribe();
        }))
    }

    async fn history<T, D>(
        &self,
        role: ContractRole,
        event: AbiEvent,
        human_topic: HumanTopic,
        filter: &EventFilter,
        decode: D,
    ) -> Result<Vec<T>, PoshError>
    where
        D: Fn(&EventLog) -> Result<T, PoshError>,
    {
        let mut query = LogQuery::new(self.context.contract_address(role)?, event);
        query.from_block = filter.from_block;
        query.to_block = filter.to_block;
        if let Some(human_id) = filter.human_id {
            let mut topics = vec![None; human_topic.0 + 1];
            topics[human_topic.0] = Some(human_id.0);
            query.topics = topics;
        }

        let logs = self.context.logs(role, &query).await?;
        Ok(logs
            .into_iter()
            .filter_map(|log| match decode(&log) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(
                        event = event.name,
                        block_number = log.block_number,
                        error = %e,
                        "Skipping undecodable log"
                    );
                    None
                }
            })
            .collect())
    }
}

fn decode_values<const N: usize>(event: AbiEvent, log: &EventLog) -> Result<[AbiValue; N], PoshError> {
    event
        .decode_log(&log.topics, &log.data)?
        .try_into()
        .map_err(|v: Vec<AbiValue>| {
            PoshError::decode(event.name, format!("expected {} values, got {}", N, v.len()))
        })
}

fn decode_human_registered(log: &EventLog) -> Result<HumanRegisteredEvent, PoshError> {
    let [human_id, wallet, timestamp] = decode_values(human_identity::HUMAN_REGISTERED, log)?;
    Ok(HumanRegisteredEvent {
        human_id: HumanId(human_id.to_fixed_bytes("HumanRegistered.humanId")?),
        wallet: Address(wallet.to_address("HumanRegistered.wallet")?),
        timestamp: timestamp_from_secs(
            timestamp.to_uint("HumanRegistered.timestamp")?,
            "HumanRegistered.timestamp",
        )?,
        block_number: log.block_number,
        transaction_hash: log.transaction_hash,
    })
}

fn decode_proof_registered(log: &EventLog) -> Result<ProofRegisteredEvent, PoshError> {
    let [proof_id, human_id, impact_type, impact_value, tier] =
        decode_values(proof_registry::PROOF_REGISTERED, log)?;
    Ok(ProofRegisteredEvent {
        proof_id: proof_id.to_fixed_bytes("ProofRegistered.proofId")?,
        human_id: HumanId(human_id.to_fixed_bytes("ProofRegistered.humanId")?),
        impact_type: ImpactType::try_from(small_uint(&impact_type, "ProofRegistered.impactType")?)?,
        impact_value: impact_value.to_uint("ProofRegistered.impactValue")?,
        tier: ProofTier::try_from(small_uint(&tier, "ProofRegistered.tier")?)?,
        block_number: log.block_number,
        transaction_hash: log.transaction_hash,
    })
}

fn decode_identity_linked(log: &EventLog) -> Result<IdentityLinkedEvent, PoshError> {
    let [human_id, proof_hash, provider, timestamp] =
        decode_values(human_identity::IDENTITY_LINKED, log)?;
    Ok(IdentityLinkedEvent {
        human_id: HumanId(human_id.to_fixed_bytes("IdentityLinked.humanId")?),
        proof_hash: proof_hash.to_fixed_bytes("IdentityLinked.proofHash")?,
        provider: provider.to_text("IdentityLinked.provider")?,
        timestamp: timestamp_from_secs(
            timestamp.to_uint("IdentityLinked.timestamp")?,
            "IdentityLinked.timestamp",
        )?,
        block_number: log.block_number,
        transaction_hash: log.transaction_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryProvider, WalletBridgeProvider};
    use crate::application::context::ProviderBinding;
    use crate::config::PoshConfig;
    use crate::domain::codes;
    use crate::ports::{RpcTransport, TransportError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use primitive_types::{H256, U256};
    use serde_json::Value;

    fn setup() -> (EventManager, Arc<InMemoryProvider>, PoshConfig) {
        let config = PoshConfig::for_testing();
        let provider = Arc::new(InMemoryProvider::new(config.chain_id));
        let context = Arc::new(ClientContext::new(config.clone(), ProviderBinding::Live(provider.clone())));
        (EventManager::new(context), provider, config)
    }

    fn registered(human: u8) -> Vec<AbiValue> {
        vec![
            AbiValue::FixedBytes(H256::repeat_byte(human)),
            AbiValue::Address(Address::from([human; 20]).0),
            AbiValue::Uint(U256::from(1_700_000_000u64)),
        ]
    }

    fn proof_registered(proof: u8, human: u8) -> Vec<AbiValue> {
        vec![
            AbiValue::FixedBytes(H256::repeat_byte(proof)),
            AbiValue::FixedBytes(H256::repeat_byte(human)),
            AbiValue::Uint(U256::from(2u64)),
            AbiValue::Uint(U256::from(75u64)),
            AbiValue::Uint(U256::from(1u64)),
        ]
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let (manager, provider, config) = setup();
        let identity: Address = config.contracts.identity.parse().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let sub = manager
            .on_human_registered(move |event| sink.lock().push(event.human_id))
            .await
            .unwrap();

        provider.emit_event(identity, human_identity::HUMAN_REGISTERED, &registered(1)).unwrap();
        provider.emit_event(identity, human_identity::HUMAN_REGISTERED, &registered(2)).unwrap();
        sub.unsubscribe();
        sub.unsubscribe();
        provider.emit_event(identity, human_identity::HUMAN_REGISTERED, &registered(3)).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], HumanId::from([2u8; 32]));
        assert_eq!(provider.watcher_count(), 0);
    }

    fn truncated_registration(identity: Address, block_number: u64) -> EventLog {
        EventLog {
            address: identity,
            topics: vec![
                human_identity::HUMAN_REGISTERED.topic0(),
                H256::repeat_byte(9),
                H256::zero(),
            ],
            data: vec![0; 3],
            block_number,
            transaction_hash: H256::repeat_byte(0xee),
            log_index: 0,
        }
    }

    #[tokio::test]
    async fn test_history_skips_undecodable_logs() {
        let (manager, provider, config) = setup();
        let identity: Address = config.contracts.identity.parse().unwrap();
        provider.emit_event(identity, human_identity::HUMAN_REGISTERED, &registered(1)).unwrap();
        provider.emit(truncated_registration(identity, 50));

        let events = manager.get_human_registered_events(&EventFilter::default()).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].human_id, HumanId::from([1u8; 32]));
    }

    #[tokio::test]
    async fn test_live_delivery_survives_undecodable_log() {
        let (manager, provider, config) = setup();
        let identity: Address = config.contracts.identity.parse().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let sub = manager
            .on_human_registered(move |event| sink.lock().push(event.human_id))
            .await
            .unwrap();

        provider.emit(truncated_registration(identity, 50));
        provider.emit_event(identity, human_identity::HUMAN_REGISTERED, &registered(4)).unwrap();
        sub.unsubscribe();

        assert_eq!(*seen.lock(), vec![HumanId::from([4u8; 32])]);
    }

    #[tokio::test]
    async fn test_proof_history_filters_by_human() {
        let (manager, provider, config) = setup();
        let registry: Address = config.contracts.proof_registry.parse().unwrap();
        provider.emit_event(registry, proof_registry::PROOF_REGISTERED, &proof_registered(0xa1, 1)).unwrap();
        provider.emit_event(registry, proof_registry::PROOF_REGISTERED, &proof_registered(0xa2, 2)).unwrap();
        provider.emit_event(registry, proof_registry::PROOF_REGISTERED, &proof_registered(0xa3, 1)).unwrap();

        let all = manager.get_proof_registered_events(&EventFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let filter = EventFilter {
            human_id: Some(HumanId::from([1u8; 32])),
            ..EventFilter::default()
        };
        let mine = manager.get_proof_registered_events(&filter).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].impact_type, ImpactType::SustainableTransport);
        assert_eq!(mine[0].tier, ProofTier::A);

        let human = format!("0x{}", "02".repeat(32));
        assert_eq!(manager.get_human_proof_events(&human).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_history_block_range() {
        let (manager, provider, config) = setup();
        let identity: Address = config.contracts.identity.parse().unwrap();
        for human in 1..=3 {
            provider.emit_event(identity, human_identity::HUMAN_REGISTERED, &registered(human)).unwrap();
        }

        let filter = EventFilter {
            from_block: Some(3),
            to_block: Some(3),
            human_id: None,
        };
        let events = manager.get_human_registered_events(&filter).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].block_number, 3);
    }

    #[tokio::test]
    async fn test_identity_linked_decoding() {
        let (manager, provider, config) = setup();
        let identity: Address = config.contracts.identity.parse().unwrap();
        provider
            .emit_event(
                identity,
                human_identity::IDENTITY_LINKED,
                &[
                    AbiValue::FixedBytes(H256::repeat_byte(1)),
                    AbiValue::FixedBytes(H256::repeat_byte(9)),
                    AbiValue::String("worldcoin".to_string()),
                    AbiValue::Uint(U256::from(1_700_000_000u64)),
                ],
            )
            .unwrap();

        let events = manager.get_identity_linked_events(&EventFilter::default()).await.unwrap();
        assert_eq!(events[0].provider, "worldcoin");
        assert_eq!(events[0].proof_hash, H256::repeat_byte(9));
    }

    struct SilentWallet;

    #[async_trait]
    impl RpcTransport for SilentWallet {
        fn endpoint(&self) -> &str {
            "eip1193://test"
        }

        async fn request(&self, _method: &str, _params: Value) -> Result<Value, TransportError> {
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn test_wallet_bridge_cannot_watch() {
        let config = PoshConfig::for_testing();
        let provider = Arc::new(WalletBridgeProvider::new(Arc::new(SilentWallet), config.chain_id));
        let context = Arc::new(ClientContext::new(config, ProviderBinding::Live(provider)));
        let manager = EventManager::new(context);

        let err = manager.on_proof_registered(|_| {}).await.unwrap_err();
        assert_eq!(err.code(), codes::UNSUPPORTED_PROVIDER);
    }
}
