//! Configuration loading, validation and provider binding.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use posh_sdk::domain::codes;
    use posh_sdk::{
        default_config, validate_config, CachePolicy, ConfigUpdate, ContractAddressesUpdate,
        PoshClient, PoshConfig, ProviderBinding, BASE_MAINNET_CHAIN_ID,
    };
    use proptest::prelude::*;
    use serde_json::json;

    fn sample(chain_id: &str, max_size: &str) -> String {
        format!(
            r#"{{
                "chainId": {chain_id},
                "contracts": {{
                    "identity": "0x0000000000000000000000000000000000000001",
                    "proofRegistry": "0x0000000000000000000000000000000000000002",
                    "badgeRegistry": "0x0000000000000000000000000000000000000003",
                    "scoreRegistry": "0x0000000000000000000000000000000000000004"
                }},
                "cache": {{ "enabled": true, "ttl": 1000, "maxSize": {max_size} }}
            }}"#
        )
    }

    #[test]
    fn test_valid_document_accepted() {
        let config = PoshConfig::from_json(&sample("84532", "10")).unwrap();
        assert_eq!(config.chain_id, 84532);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_serialized_config_loads_back() {
        let config = PoshConfig::for_testing();
        let raw = serde_json::to_string(&config).unwrap();
        assert_eq!(PoshConfig::from_json(&raw).unwrap(), config);

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["chainId"], json!(config.chain_id));
        assert_eq!(value["cache"]["maxSize"], json!(16));
        assert_eq!(value["retry"]["initialDelay"], json!(1));
        assert!(value.get("rpcUrl").is_none());
    }

    #[test]
    fn test_missing_contract_is_named() {
        let mut config = PoshConfig::for_testing();
        config.contracts.badge_registry.clear();

        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.code(), codes::VALIDATION_ERROR);
        assert!(err.to_string().contains("badgeRegistry"));
    }

    #[test]
    fn test_zero_chain_rejected() {
        let mut config = PoshConfig::for_testing();
        config.chain_id = 0;
        assert!(validate_config(&config).unwrap_err().to_string().contains("chainId"));
    }

    #[test]
    fn test_non_numeric_chain_rejected() {
        let err = PoshConfig::from_json(&sample("\"NaN\"", "10")).unwrap_err();
        assert_eq!(err.code(), codes::VALIDATION_ERROR);
    }

    #[test]
    fn test_zero_cache_size_rejected() {
        let err = PoshConfig::from_json(&sample("84532", "0")).unwrap_err();
        assert!(err.to_string().contains("maxSize"));
    }

    #[test]
    fn test_client_rejects_invalid_config_as_configuration_error() {
        let mut config = PoshConfig::for_testing();
        config.contracts.identity = "0x1234".to_string();

        let err = PoshClient::new(config, None).err().unwrap();
        assert_eq!(err.code(), codes::CONFIGURATION_ERROR);
    }

    #[test]
    fn test_failed_update_keeps_previous_config() {
        let client = PoshClient::new(PoshConfig::for_testing(), None).unwrap();
        let before = client.config();

        let err = client
            .update_config(&ConfigUpdate {
                contracts: Some(ContractAddressesUpdate {
                    score_registry: Some("not-an-address".to_string()),
                    ..ContractAddressesUpdate::default()
                }),
                ..ConfigUpdate::default()
            })
            .unwrap_err();

        assert_eq!(err.code(), codes::CONFIGURATION_ERROR);
        assert_eq!(client.config(), before);
    }

    #[test]
    fn test_update_merges_fields() {
        let client = PoshClient::new(PoshConfig::for_testing(), None).unwrap();
        client
            .update_config(&ConfigUpdate {
                rpc_url: Some("https://sepolia.base.org".to_string()),
                cache: Some(CachePolicy {
                    enabled: false,
                    ttl_ms: 1,
                    max_size: 1,
                }),
                ..ConfigUpdate::default()
            })
            .unwrap();

        let config = client.config();
        assert_eq!(config.rpc_url.as_deref(), Some("https://sepolia.base.org"));
        assert!(!config.caching_enabled());
        assert_eq!(config.chain_id, PoshConfig::for_testing().chain_id);
    }

    #[test]
    fn test_default_config_uses_chain_addresses() {
        let mainnet = default_config(BASE_MAINNET_CHAIN_ID);
        assert_eq!(mainnet.chain_id, BASE_MAINNET_CHAIN_ID);
        assert_ne!(mainnet.contracts, PoshConfig::default().contracts);
        assert!(validate_config(&mainnet).is_ok());
    }

    #[tokio::test]
    async fn test_unbound_client_requires_provider() {
        let client = PoshClient::new(config(true), None).unwrap();
        let err = client.identity().is_registered(WALLET).await.unwrap_err();
        assert_eq!(err.code(), codes::PROVIDER_REQUIRED);
    }

    #[tokio::test]
    async fn test_undeployed_deployment_reports_not_deployed() {
        let client = PoshClient::from_deployment("human0-base-sepolia", None).unwrap();
        assert!(matches!(client.binding(), ProviderBinding::NotDeployed));

        let err = client.score().get_score(HUMAN).await.unwrap_err();
        assert_eq!(err.code(), codes::NOT_DEPLOYED);
    }

    proptest! {
        #[test]
        fn prop_positive_chain_ids_accepted(chain_id in 1u64..=u64::MAX) {
            let mut config = PoshConfig::for_testing();
            config.chain_id = chain_id;
            prop_assert!(validate_config(&config).is_ok());
        }
    }
}
