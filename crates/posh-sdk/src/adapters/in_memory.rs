//! # In-Memory Provider
//!
//! In-process chain simulation for tests and offline demos. Reads are
//! scripted per `(contract, function, args)`, writes mine instantly into a
//! scripted receipt, and emitted logs are kept as history and pushed to live
//! watchers.

use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::{H256, U256};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::{keccak256, AbiEvent, AbiFunction, AbiValue};
use crate::domain::{Address, NetworkFailure, PoshError, TxHash};
use crate::ports::{
    BlockchainProvider, ContractCall, EventCallback, EventLog, LogQuery, Subscription,
    TransactionReceipt, TransactionRequest, TxStatus,
};

const ADAPTER: &str = "InMemoryProvider";
const DEFAULT_GAS: u64 = 100_000;

type ReadKey = (Address, &'static str, Vec<AbiValue>);
type Watchers = Arc<Mutex<HashMap<Uuid, (LogQuery, EventCallback)>>>;

/// Log to emit when a scripted write is mined.
#[derive(Clone, Debug)]
pub struct ScriptedLog {
    /// Emitting contract.
    pub address: Address,
    /// Event descriptor.
    pub event: AbiEvent,
    /// Values in declaration order, indexed ones included.
    pub values: Vec<AbiValue>,
}

/// Outcome of a scripted write.
#[derive(Clone, Debug)]
pub struct WriteOutcome {
    /// Mined status.
    pub status: TxStatus,
    /// Logs emitted when the write succeeds.
    pub logs: Vec<ScriptedLog>,
}

impl WriteOutcome {
    /// Successful write emitting `logs`.
    pub fn success(logs: Vec<ScriptedLog>) -> Self {
        Self {
            status: TxStatus::Success,
            logs,
        }
    }

    /// Reverted write.
    pub fn reverted() -> Self {
        Self {
            status: TxStatus::Reverted,
            logs: Vec::new(),
        }
    }
}

#[derive(Default)]
struct ChainState {
    block_number: u64,
    tx_counter: u64,
    reads: HashMap<ReadKey, Result<Vec<AbiValue>, PoshError>>,
    reads_any_args: HashMap<(Address, &'static str), Result<Vec<AbiValue>, PoshError>>,
    queued_read_failures: VecDeque<PoshError>,
    write_outcomes: HashMap<&'static str, WriteOutcome>,
    write_failures: HashMap<&'static str, PoshError>,
    gas: HashMap<&'static str, U256>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    history: Vec<EventLog>,
    read_calls: HashMap<&'static str, usize>,
    write_calls: HashMap<&'static str, usize>,
}

/// In-process provider.
pub struct InMemoryProvider {
    chain_id: u64,
    signer: Mutex<Option<Address>>,
    state: Mutex<ChainState>,
    watchers: Watchers,
}

impl InMemoryProvider {
    /// Empty chain at block 1 with no signer.
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            signer: Mutex::new(None),
            state: Mutex::new(ChainState {
                block_number: 1,
                ..ChainState::default()
            }),
            watchers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Sign writes as `account`.
    pub fn with_signer(self, account: Address) -> Self {
        *self.signer.lock() = Some(account);
        self
    }

    // -------------------------------------------------------------------------
    // Scripting
    // -------------------------------------------------------------------------

    /// Answer `function(args)` on `address` with `outputs`.
    pub fn set_read(&self, address: Address, function: AbiFunction, args: Vec<AbiValue>, outputs: Vec<AbiValue>) {
        self.state
            .lock()
            .reads
            .insert((address, function.name, args), Ok(outputs));
    }

    /// Answer `function` on `address` with `outputs` whatever the arguments.
    pub fn set_read_any(&self, address: Address, function: AbiFunction, outputs: Vec<AbiValue>) {
        self.state
            .lock()
            .reads_any_args
            .insert((address, function.name), Ok(outputs));
    }

    /// Fail `function(args)` on `address` with `error`.
    pub fn set_read_error(&self, address: Address, function: AbiFunction, args: Vec<AbiValue>, error: PoshError) {
        self.state
            .lock()
            .reads
            .insert((address, function.name, args), Err(error));
    }

    /// Fail the next reads with `errors`, in order, before answering normally.
    pub fn queue_read_failures(&self, errors: impl IntoIterator<Item = PoshError>) {
        self.state.lock().queued_read_failures.extend(errors);
    }

    /// Mine writes of `function` with `outcome`. Unscripted writes succeed
    /// without logs.
    pub fn set_write_outcome(&self, function: AbiFunction, outcome: WriteOutcome) {
        self.state.lock().write_outcomes.insert(function.name, outcome);
    }

    /// Reject writes of `function` at submission.
    pub fn set_write_error(&self, function: AbiFunction, error: PoshError) {
        self.state.lock().write_failures.insert(function.name, error);
    }

    /// Gas reported for `function`.
    pub fn set_gas(&self, function: AbiFunction, gas: U256) {
        self.state.lock().gas.insert(function.name, gas);
    }

    /// Advance the chain head.
    pub fn mine_blocks(&self, count: u64) {
        self.state.lock().block_number += count;
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Reads of `function` so far.
    pub fn read_count(&self, function: AbiFunction) -> usize {
        self.state.lock().read_calls.get(function.name).copied().unwrap_or(0)
    }

    /// Reads of any function so far.
    pub fn total_reads(&self) -> usize {
        self.state.lock().read_calls.values().sum()
    }

    /// Submitted writes of `function` so far.
    pub fn write_count(&self, function: AbiFunction) -> usize {
        self.state.lock().write_calls.get(function.name).copied().unwrap_or(0)
    }

    /// Live watchers.
    pub fn watcher_count(&self) -> usize {
        self.watchers.lock().len()
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Mine a block carrying one log of `event` and deliver it to watchers.
    pub fn emit_event(&self, address: Address, event: AbiEvent, values: &[AbiValue]) -> Result<EventLog, PoshError> {
        let (topics, data) = event.encode_log(values)?;
        let log = {
            let mut state = self.state.lock();
            state.block_number += 1;
            state.tx_counter += 1;
            EventLog {
                address,
                topics,
                data,
                block_number: state.block_number,
                transaction_hash: tx_hash(state.tx_counter),
                log_index: 0,
            }
        };
        self.emit(log.clone());
        Ok(log)
    }

    /// Record `log` and deliver it to matching watchers.
    pub fn emit(&self, log: EventLog) {
        self.state.lock().history.push(log.clone());
        self.dispatch(&log);
    }

    fn dispatch(&self, log: &EventLog) {
        let targets: Vec<EventCallback> = self
            .watchers
            .lock()
            .values()
            .filter(|(query, _)| query.matches(log))
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in targets {
            callback(log.clone());
        }
    }
}

fn tx_hash(counter: u64) -> TxHash {
    H256(keccak256(&counter.to_be_bytes()))
}

#[async_trait]
impl BlockchainProvider for InMemoryProvider {
    fn name(&self) -> &'static str {
        ADAPTER
    }

    async fn read_contract(&self, call: &ContractCall) -> Result<Vec<AbiValue>, PoshError> {
        let mut state = self.state.lock();
        *state.read_calls.entry(call.function.name).or_insert(0) += 1;

        if let Some(err) = state.queued_read_failures.pop_front() {
            return Err(err);
        }

        let key = (call.address, call.function.name, call.args.clone());
        state
            .reads
            .get(&key)
            .or_else(|| state.reads_any_args.get(&(call.address, call.function.name)))
            .cloned()
            .unwrap_or_else(|| {
                Err(PoshError::contract(
                    call.address.to_string(),
                    call.function.name,
                    Some("no scripted response".to_string()),
                ))
            })
    }

    async fn write_contract(&self, request: &TransactionRequest) -> Result<TxHash, PoshError> {
        if self.signer.lock().is_none() {
            return Err(PoshError::WalletRequired {
                adapter: ADAPTER,
                operation: "write_contract",
            });
        }
        request.calldata()?;

        let name = request.function.name;
        let (receipt, emitted) = {
            let mut state = self.state.lock();
            *state.write_calls.entry(name).or_insert(0) += 1;
            if let Some(err) = state.write_failures.get(name) {
                return Err(err.clone());
            }

            let outcome = state
                .write_outcomes
                .get(name)
                .cloned()
                .unwrap_or_else(|| WriteOutcome::success(Vec::new()));

            state.block_number += 1;
            state.tx_counter += 1;
            let hash = tx_hash(state.tx_counter);
            let block_number = state.block_number;

            let mut logs = Vec::new();
            if outcome.status == TxStatus::Success {
                for (index, scripted) in outcome.logs.iter().enumerate() {
                    let (topics, data) = scripted.event.encode_log(&scripted.values)?;
                    logs.push(EventLog {
                        address: scripted.address,
                        topics,
                        data,
                        block_number,
                        transaction_hash: hash,
                        log_index: index as u64,
                    });
                }
            }
            state.history.extend(logs.iter().cloned());

            let receipt = TransactionReceipt {
                transaction_hash: hash,
                block_number,
                status: outcome.status,
                gas_used: state.gas.get(name).copied().unwrap_or_else(|| U256::from(DEFAULT_GAS)),
                logs: logs.clone(),
            };
            state.receipts.insert(hash, receipt.clone());
            (receipt, logs)
        };

        for log in &emitted {
            self.dispatch(log);
        }
        Ok(receipt.transaction_hash)
    }

    async fn wait_for_transaction(&self, tx_hash: &TxHash) -> Result<TransactionReceipt, PoshError> {
        self.state.lock().receipts.get(tx_hash).cloned().ok_or_else(|| {
            PoshError::network(
                format!("Unknown transaction {:?}", tx_hash),
                self.chain_id,
                "memory://",
                NetworkFailure::Timeout,
            )
        })
    }

    async fn estimate_gas(&self, request: &TransactionRequest) -> Result<U256, PoshError> {
        if self.signer.lock().is_none() {
            return Err(PoshError::WalletRequired {
                adapter: ADAPTER,
                operation: "estimate_gas",
            });
        }
        request.calldata()?;
        Ok(self
            .state
            .lock()
            .gas
            .get(request.function.name)
            .copied()
            .unwrap_or_else(|| U256::from(DEFAULT_GAS)))
    }

    async fn get_events(&self, query: &LogQuery) -> Result<Vec<EventLog>, PoshError> {
        Ok(self
            .state
            .lock()
            .history
            .iter()
            .filter(|log| query.matches(log))
            .cloned()
            .collect())
    }

    async fn watch_event(
        &self,
        query: &LogQuery,
        callback: EventCallback,
    ) -> Result<Subscription, PoshError> {
        let key = Uuid::new_v4();
        self.watchers.lock().insert(key, (query.clone(), callback));
        let watchers = self.watchers.clone();
        Ok(Subscription::new(move || {
            watchers.lock().remove(&key);
        }))
    }

    async fn get_block_number(&self) -> Result<u64, PoshError> {
        Ok(self.state.lock().block_number)
    }

    async fn get_chain_id(&self) -> Result<u64, PoshError> {
        Ok(self.chain_id)
    }
}
