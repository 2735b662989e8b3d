//! Account domain model

use std::fmt;

use chrono::{DateTime, Utc};
use num_bigint::{BigInt, ParseBigIntError};
use serde::{Deserialize, Serialize};

use super::cpf;
use super::result::{AccountError, Result};

/// A checking account
///
/// `secret` is the plaintext credential of a creation request. It is accepted
/// when deserializing but never serialized, and only `secret_hash` and
/// `secret_salt` are ever persisted.
///
/// `balance_raw` is the persisted decimal text of the balance. It is not kept
/// in sync with `balance` automatically: use [`Account::convert_balance`] after
/// reading and [`Account::set_balance`] before writing.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    /// Assigned by the store on creation, 0 before that
    #[serde(skip_serializing_if = "is_unassigned")]
    pub id: i64,
    pub name: String,
    pub cpf: String,
    #[serde(skip_serializing)]
    pub secret: String,
    #[serde(skip)]
    pub secret_hash: String,
    #[serde(skip)]
    pub secret_salt: String,
    #[serde(skip)]
    pub balance_raw: String,
    /// Smallest currency unit
    #[serde(with = "balance_text")]
    pub balance: BigInt,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

fn is_unassigned(id: &i64) -> bool {
    *id == 0
}

impl Account {
    /// Create an unsaved account from a creation request
    pub fn new(name: impl Into<String>, cpf: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cpf: cpf.into(),
            secret: secret.into(),
            balance_raw: "0".to_string(),
            ..Self::default()
        }
    }

    /// Validate a creation request
    ///
    /// Checks run in a fixed order and the first failure wins: name, secret,
    /// cpf presence, then the cpf checksum. Normalizes `cpf` as a side effect.
    pub fn validate(&mut self) -> Result<()> {
        if self.name.is_empty() {
            return Err(AccountError::NameRequired);
        }

        if self.secret.is_empty() {
            return Err(AccountError::SecretRequired);
        }

        if self.cpf.is_empty() {
            return Err(AccountError::IdentifierRequired);
        }

        self.cpf_is_valid()
    }

    /// Normalize and checksum-validate the cpf
    pub fn cpf_is_valid(&mut self) -> Result<()> {
        cpf::validate(&mut self.cpf)
    }

    /// Parse `balance_raw` into `balance`
    ///
    /// On failure `balance` is left untouched.
    pub fn convert_balance(&mut self) -> std::result::Result<(), ParseBigIntError> {
        self.balance = self.balance_raw.parse()?;
        Ok(())
    }

    /// Set the balance and its persisted text together
    pub fn set_balance(&mut self, balance: BigInt) {
        self.balance_raw = balance.to_string();
        self.balance = balance;
    }

    /// Whether the store has assigned an id
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("cpf", &self.cpf)
            .field("secret", &"<redacted>")
            .field("balance_raw", &self.balance_raw)
            .field("balance", &self.balance)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Serialize the balance as decimal text so no precision is lost in JSON
mod balance_text {
    use num_bigint::BigInt;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_is_unsaved() {
        let account = Account::new("Maria", "123.456.789-09", "s3cret");
        assert_eq!(account.id, 0);
        assert!(!account.is_persisted());
        assert_eq!(account.balance, BigInt::from(0));
        assert_eq!(account.balance_raw, "0");
    }

    #[test]
    fn test_validate_normalizes_cpf() {
        let mut account = Account::new("Maria", "123.456.789-09", "s3cret");
        assert_eq!(account.validate(), Ok(()));
        assert_eq!(account.cpf, "12345678909");
    }

    #[test]
    fn test_validate_precedence() {
        let mut account = Account::new("", "", "");
        assert_eq!(account.validate(), Err(AccountError::NameRequired));

        account.name = "Maria".to_string();
        assert_eq!(account.validate(), Err(AccountError::SecretRequired));

        account.secret = "s3cret".to_string();
        assert_eq!(account.validate(), Err(AccountError::IdentifierRequired));

        account.cpf = "123".to_string();
        assert_eq!(account.validate(), Err(AccountError::IdentifierSizeInvalid));

        account.cpf = "12345678900".to_string();
        assert_eq!(account.validate(), Err(AccountError::IdentifierInvalid));
    }

    #[test]
    fn test_convert_balance() {
        let mut account = Account::default();
        account.balance_raw = "123456789012345678901234567890".to_string();
        account.convert_balance().unwrap();
        assert_eq!(account.balance.to_string(), "123456789012345678901234567890");

        account.balance_raw = "-42".to_string();
        account.convert_balance().unwrap();
        assert_eq!(account.balance, BigInt::from(-42));
    }

    #[test]
    fn test_convert_balance_failure_keeps_previous_value() {
        let mut account = Account::default();
        account.set_balance(BigInt::from(7));

        account.balance_raw = "12.50".to_string();
        assert!(account.convert_balance().is_err());
        assert_eq!(account.balance, BigInt::from(7));

        account.balance_raw = String::new();
        assert!(account.convert_balance().is_err());
        assert_eq!(account.balance, BigInt::from(7));
    }

    #[test]
    fn test_set_balance_updates_raw_text() {
        let mut account = Account::default();
        account.set_balance(BigInt::from(-15));
        assert_eq!(account.balance_raw, "-15");
    }

    #[test]
    fn test_json_never_exposes_secret_material() {
        let mut account = Account::new("Maria", "12345678909", "s3cret");
        account.id = 3;
        account.secret_hash = "hash".to_string();
        account.secret_salt = "salt".to_string();
        account.set_balance(BigInt::from(1500));

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["balance"], "1500");
        assert!(json.get("secret").is_none());
        assert!(json.get("secret_hash").is_none());
        assert!(json.get("secret_salt").is_none());
        assert!(json.get("balance_raw").is_none());
        assert!(json.get("updated_at").is_none());
        assert!(json.get("created_at").is_some());
    }

    #[test]
    fn test_json_omits_unassigned_id() {
        let json = serde_json::to_value(Account::new("Maria", "12345678909", "x")).unwrap();
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_creation_request_from_json() {
        let account: Account = serde_json::from_str(
            r#"{"name": "Maria", "cpf": "123.456.789-09", "secret": "s3cret"}"#,
        )
        .unwrap();
        assert_eq!(account.name, "Maria");
        assert_eq!(account.secret, "s3cret");
        assert_eq!(account.id, 0);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let account = Account::new("Maria", "12345678909", "s3cret");
        let debug = format!("{account:?}");
        assert!(!debug.contains("s3cret"));
    }
}
