use crate::config::Config;
use crate::contract::{ContractError, HabitContract, TxReceipt};
use crate::errors::{AppError, contract_status};
use crate::ledger::LedgerContract;
use crate::registry::{HabitRegistry, LocalHabitStore};
use crate::session::Session;
use crate::storage::StorageError;
use crate::transaction::{TransactionTracker, TxKind};
use chrono::Local;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub contract: Arc<dyn HabitContract>,
    pub registry: Arc<HabitRegistry>,
    pub session: Arc<Mutex<Session>>,
    pub transactions: Arc<Mutex<TransactionTracker>>,
}

impl AppState {
    /// Opens the ledger and local habit files named by `config`.
    pub async fn open(config: Config) -> Result<Self, StorageError> {
        let contract: Arc<dyn HabitContract> =
            Arc::new(LedgerContract::open(&config.data_path, config.check_in_fee_wei).await?);
        let local = LocalHabitStore::open(&config.habits_path).await;
        Ok(Self::new(config, contract, local))
    }

    pub fn new(config: Config, contract: Arc<dyn HabitContract>, local: LocalHabitStore) -> Self {
        let registry = HabitRegistry::new(
            config.registry,
            Arc::clone(&contract),
            local,
            config.read_timeout,
        );
        Self {
            session: Arc::new(Mutex::new(Session::new(Local::now().date_naive()))),
            transactions: Arc::new(Mutex::new(TransactionTracker::new())),
            registry: Arc::new(registry),
            contract,
            config: Arc::new(config),
        }
    }

    /// Runs one contract write through the transaction lifecycle.
    ///
    /// The write runs on its own task so the status settles even if the
    /// request that started it goes away.
    pub async fn submit_write<F, Fut>(&self, kind: TxKind, write: F) -> Result<TxReceipt, AppError>
    where
        F: FnOnce(Arc<dyn HabitContract>) -> Fut,
        Fut: Future<Output = Result<TxReceipt, ContractError>> + Send + 'static,
    {
        let ticket = self
            .transactions
            .lock()
            .await
            .begin(kind)
            .map_err(|busy| AppError::conflict(busy.to_string()))?;

        let pending = write(Arc::clone(&self.contract));
        let transactions = Arc::clone(&self.transactions);
        let limit = self.config.tx_timeout;
        let task = tokio::spawn(async move {
            let outcome = match timeout(limit, pending).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ContractError::Timeout),
            };
            let message = transactions.lock().await.finish(ticket, &outcome, Instant::now());
            (outcome, message)
        });

        let (outcome, message) = task.await.map_err(AppError::internal)?;
        match outcome {
            Ok(receipt) => {
                info!(kind = ?kind, tx_hash = %receipt.tx_hash, "transaction confirmed");
                Ok(receipt)
            }
            Err(err) => {
                warn!(kind = ?kind, "transaction failed: {err}");
                Err(AppError::new(contract_status(&err), message))
            }
        }
    }
}
