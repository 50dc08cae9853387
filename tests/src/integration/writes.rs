//! Transaction flow through the client: confirmation, reverts and signer
//! requirements.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use posh_sdk::contracts::{human_identity, AbiValue};
    use posh_sdk::domain::codes;
    use posh_sdk::{Address, HumanId, InMemoryProvider, PoshError, ScriptedLog, WriteOutcome};
    use primitive_types::{H256, U256};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reverted_write_fails_and_keeps_cache() {
        let stub = Arc::new(StubProvider::new(vec![AbiValue::Bool(false)]));
        let client = stub_client(config(true), &stub);
        client.identity().is_registered(WALLET).await.unwrap();
        assert_eq!(client.cached_entries(), 1);

        let err = client.identity().register().await.unwrap_err();

        match &err {
            PoshError::TransactionFailed { contract, function, .. } => {
                assert_eq!(contract, "HumanIdentity");
                assert_eq!(function, "register");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.code(), codes::TRANSACTION_FAILED);
        assert_eq!(stub.writes(), 1);
        assert_eq!(client.cached_entries(), 1);
    }

    #[tokio::test]
    async fn test_register_returns_human_id_and_invalidates_cache() {
        let cfg = config(true);
        let chain = signed_chain();
        let identity = identity_address(&cfg);
        let wallet: Address = WALLET.parse().unwrap();
        let human: HumanId = HUMAN.parse().unwrap();

        chain.set_read_any(identity, human_identity::IS_REGISTERED, vec![AbiValue::Bool(false)]);
        chain.set_write_outcome(
            human_identity::REGISTER,
            WriteOutcome::success(vec![ScriptedLog {
                address: identity,
                event: human_identity::HUMAN_REGISTERED,
                values: vec![
                    AbiValue::FixedBytes(human.0),
                    AbiValue::Address(wallet.0),
                    AbiValue::Uint(U256::from(1_700_000_000u64)),
                ],
            }]),
        );

        let client = chain_client(cfg, &chain);
        assert!(!client.identity().is_registered(WALLET).await.unwrap());
        assert_eq!(client.cached_entries(), 1);

        let result = client.identity().register().await.unwrap();

        assert_eq!(result.human_id, human);
        assert_ne!(result.tx_hash, H256::zero());
        assert_eq!(client.cached_entries(), 0);
        assert_eq!(chain.write_count(human_identity::REGISTER), 1);
    }

    #[tokio::test]
    async fn test_link_proof_validates_before_submitting() {
        let chain = signed_chain();
        let client = chain_client(config(true), &chain);

        let err = client
            .identity()
            .link_external_proof("0xabc", "worldcoin")
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::VALIDATION_ERROR);
        assert!(err.to_string().contains("proofHash"));

        let err = client.identity().link_external_proof(HUMAN, "").await.unwrap_err();
        assert!(err.to_string().contains("provider"));

        assert_eq!(chain.write_count(human_identity::LINK_EXTERNAL_PROOF), 0);
    }

    #[tokio::test]
    async fn test_link_proof_confirms() {
        let chain = signed_chain();
        let client = chain_client(config(true), &chain);

        let result = client
            .identity()
            .link_external_proof(HUMAN, "worldcoin")
            .await
            .unwrap();

        assert!(result.block_number > 1);
        assert_eq!(chain.write_count(human_identity::LINK_EXTERNAL_PROOF), 1);
    }

    #[tokio::test]
    async fn test_write_without_signer_requires_wallet() {
        let chain = Arc::new(InMemoryProvider::new(84532));
        let client = chain_client(config(true), &chain);

        let err = tokio_test::assert_err!(client.identity().register().await);
        assert_eq!(err.code(), codes::WALLET_REQUIRED);
    }

    #[tokio::test]
    async fn test_gas_estimates_are_not_cached() {
        let chain = signed_chain();
        chain.set_gas(human_identity::REGISTER, U256::from(150_000u64));
        let client = chain_client(config(true), &chain);

        let gas = client.identity().estimate_register_gas().await.unwrap();
        assert_eq!(gas, U256::from(150_000u64));
        assert_eq!(client.cached_entries(), 0);
    }
}
