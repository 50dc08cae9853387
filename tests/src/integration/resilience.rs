//! Retry behaviour of client reads against flaky providers.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use posh_sdk::contracts::{human_identity, AbiValue};
    use posh_sdk::domain::codes;
    use posh_sdk::{retry_with_callback, BackoffKind, PoshError, RetryOptions};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    fn registered_stub(failures: u32) -> Arc<StubProvider> {
        Arc::new(StubProvider::new(vec![AbiValue::Bool(true)]).failing(failures))
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_recovers_within_budget() {
        let stub = registered_stub(2);
        let client = stub_client(retrying_config(3, BackoffKind::Linear, 10), &stub);

        assert!(client.identity().is_registered(WALLET).await.unwrap());
        assert_eq!(stub.reads(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_gives_up_after_budget() {
        let stub = registered_stub(5);
        let client = stub_client(retrying_config(3, BackoffKind::Linear, 10), &stub);

        let err = client.identity().is_registered(WALLET).await.unwrap_err();
        assert_eq!(err.code(), codes::NETWORK_ERROR);
        assert_eq!(stub.reads(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_backoff_spacing() {
        let stub = registered_stub(3);
        let client = stub_client(retrying_config(4, BackoffKind::Exponential, 100), &stub);

        let start = Instant::now();
        client.identity().is_registered(WALLET).await.unwrap();
        let elapsed = start.elapsed();

        // 100 + 200 + 400
        assert!(elapsed >= Duration::from_millis(700), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(710), "elapsed {:?}", elapsed);
        assert_eq!(stub.reads(), 4);
    }

    #[tokio::test]
    async fn test_without_policy_reads_once() {
        let stub = registered_stub(1);
        let client = stub_client(config(false), &stub);

        tokio_test::assert_err!(client.identity().is_registered(WALLET).await);
        assert_eq!(stub.reads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_contract_errors_are_not_retried() {
        let cfg = retrying_config(5, BackoffKind::Linear, 10);
        let chain = signed_chain();
        chain.queue_read_failures([PoshError::contract(
            "HumanIdentity",
            "isRegistered",
            Some("paused".to_string()),
        )]);
        let client = chain_client(cfg, &chain);

        let err = client.identity().is_registered(WALLET).await.unwrap_err();
        assert_eq!(err.code(), codes::CONTRACT_ERROR);
        assert_eq!(chain.read_count(human_identity::IS_REGISTERED), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_count_matches_failures() {
        let options = RetryOptions {
            max_attempts: 4,
            backoff: BackoffKind::Linear,
            initial_delay: Duration::from_millis(5),
        };

        for failures in 0..4u32 {
            let calls = Arc::new(AtomicU32::new(0));
            let counter = calls.clone();
            let mut callbacks = 0;
            let result = retry_with_callback(
                move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    std::future::ready(if n < failures { Err("down") } else { Ok(n) })
                },
                &options,
                |_, _: &&str| callbacks += 1,
            )
            .await;

            assert_eq!(result, Ok(failures));
            assert_eq!(callbacks, failures);
        }

        let mut callbacks = 0;
        let result: Result<(), &str> =
            retry_with_callback(|| std::future::ready(Err("down")), &options, |_, _: &&str| {
                callbacks += 1
            })
            .await;
        assert_eq!(result, Err("down"));
        assert_eq!(callbacks, 3);
    }
}
