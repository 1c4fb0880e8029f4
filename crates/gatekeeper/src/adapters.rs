//! Ready-made collaborator implementations.

use crate::{
    Account, AccountDirectory, AuthPolicy, BiometricEvaluator, GateResult, LinkSource, SecretStore,
};
use agent_storage::SecretsManager;
use async_trait::async_trait;
use std::sync::Mutex;

impl SecretStore for SecretsManager {
    fn has_stored_secret(&self) -> GateResult<bool> {
        Ok(SecretsManager::has_stored_secret(self)?)
    }

    fn store_secret(&self, secret: &str) -> GateResult<()> {
        Ok(self.store_password(secret)?)
    }

    fn verify_secret(&self, secret: &str) -> GateResult<bool> {
        Ok(self.verify_password(secret)?)
    }
}

/// Evaluator for hosts without biometric hardware. Always forces the
/// password path.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBiometrics;

#[async_trait]
impl BiometricEvaluator for UnavailableBiometrics {
    fn can_evaluate(&self, _policy: AuthPolicy) -> bool {
        false
    }

    async fn evaluate(&self, _policy: AuthPolicy, _reason: &str) -> bool {
        false
    }

    fn invalidate(&self) {}
}

/// Account directory backed by an in-process list.
#[derive(Debug, Default)]
pub struct StaticAccountDirectory {
    accounts: Mutex<Vec<Account>>,
}

impl StaticAccountDirectory {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts),
        }
    }

    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(addresses.into_iter().map(Account::new).collect())
    }

    /// Add an imported account, ignoring duplicates by address.
    pub fn add(&self, account: Account) {
        let mut accounts = self.accounts.lock().unwrap();
        if !accounts.iter().any(|a| a.address == account.address) {
            accounts.push(account);
        }
    }
}

impl AccountDirectory for StaticAccountDirectory {
    fn list_accounts(&self) -> Vec<Account> {
        self.accounts.lock().unwrap().clone()
    }
}

/// In-memory clipboard stand-in.
#[derive(Debug, Default)]
pub struct MemoryLinkSource {
    text: Mutex<Option<String>>,
}

impl MemoryLinkSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.lock().unwrap() = Some(text.into());
    }
}

impl LinkSource for MemoryLinkSource {
    fn read_text(&self) -> Option<String> {
        self.text.lock().unwrap().clone()
    }

    fn clear(&self) {
        *self.text.lock().unwrap() = None;
    }
}
