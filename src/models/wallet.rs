use std::fmt;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for managed_wallets table.
///
/// The secret key never leaves this struct except through
/// [`ManagedWallet::secret_key`], which the gateway uses to sign. There is no
/// `Serialize` impl and `Debug` redacts the key.
#[derive(FromRow)]
pub struct ManagedWallet {
    pub id: Uuid,
    pub chain: String,
    pub address: String,
    #[sqlx(try_from = "String")]
    secret_key: SecretString,
    /// Native-token units committed per mirrored trade.
    pub fixed_exit_amount: Decimal,
    pub enabled: bool,
}

impl ManagedWallet {
    pub fn new(
        chain: impl Into<String>,
        address: impl Into<String>,
        secret_key: SecretString,
        fixed_exit_amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            chain: chain.into(),
            address: address.into(),
            secret_key,
            fixed_exit_amount,
            enabled: true,
        }
    }

    pub fn secret_key(&self) -> &SecretString {
        &self.secret_key
    }
}

impl Clone for ManagedWallet {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            chain: self.chain.clone(),
            address: self.address.clone(),
            secret_key: SecretString::from(self.secret_key.expose_secret().to_owned()),
            fixed_exit_amount: self.fixed_exit_amount,
            enabled: self.enabled,
        }
    }
}

impl fmt::Debug for ManagedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedWallet")
            .field("id", &self.id)
            .field("chain", &self.chain)
            .field("address", &self.address)
            .field("secret_key", &"[REDACTED]")
            .field("fixed_exit_amount", &self.fixed_exit_amount)
            .field("enabled", &self.enabled)
            .finish()
    }
}
