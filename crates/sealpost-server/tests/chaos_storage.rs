//! Chaos tests for the account service.
//!
//! Wraps storage in `ChaoticStorage` and checks that injected failures never
//! leave an account half-written:
//! - A failed registration stores nothing
//! - A failed password change leaves the old password working
//! - A successful password change leaves only the new password working

use std::sync::OnceLock;

use proptest::prelude::*;
use sealpost_crypto::OsEntropy;
use sealpost_server::{
    AccountConfig, AccountService, AccountStorage, ChaoticStorage, MemoryStorage, ServerError,
    StorageError, storage::AccountRecord,
};

const OLD: &str = "old-pass";
const NEW: &str = "new-pass";

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
}

/// One registered account, generated once per test binary.
fn registered_record() -> &'static AccountRecord {
    static RECORD: OnceLock<AccountRecord> = OnceLock::new();
    RECORD.get_or_init(|| {
        let service =
            AccountService::new(MemoryStorage::new(), OsEntropy, AccountConfig::default());
        runtime().block_on(service.register("alice", OLD)).unwrap();
        service.storage().load_account("alice").unwrap().unwrap()
    })
}

fn seeded_storage() -> MemoryStorage {
    let storage = MemoryStorage::new();
    storage.create_account("alice", registered_record()).unwrap();
    storage
}

#[tokio::test]
async fn test_total_failure_registers_nothing() {
    let storage = ChaoticStorage::new(MemoryStorage::new(), 1.0);
    let service = AccountService::new(storage, OsEntropy, AccountConfig::default());

    let result = service.register("alice", OLD).await;

    assert!(matches!(result, Err(ServerError::Storage(StorageError::Io(_)))));
    assert_eq!(service.storage().inner().account_count(), 0);
}

#[test]
fn test_storage_failure_is_not_incorrect_credentials() {
    let storage = ChaoticStorage::new(seeded_storage(), 1.0);
    let service = AccountService::new(storage, OsEntropy, AccountConfig::default());

    let result = runtime().block_on(service.login("alice", OLD));

    assert!(matches!(result, Err(ServerError::Storage(_))));
}

#[test]
fn prop_password_change_is_all_or_nothing() {
    let rt = runtime();

    proptest!(ProptestConfig::with_cases(8), |(
        failure_rate in 0.0..1.0f64,
        seed in any::<u64>(),
    )| {
        let storage = seeded_storage();
        let chaotic = ChaoticStorage::with_seed(storage.clone(), failure_rate, seed);
        let chaos = AccountService::new(chaotic, OsEntropy, AccountConfig::default());
        let clean = AccountService::new(storage.clone(), OsEntropy, AccountConfig::default());

        let before = storage.load_account("alice").unwrap();
        let result = rt.block_on(chaos.change_password("alice", OLD, NEW));

        match result {
            Ok(()) => {
                prop_assert!(rt.block_on(clean.login("alice", NEW)).is_ok());
                prop_assert!(rt.block_on(clean.login("alice", OLD)).is_err());
            },
            Err(ServerError::Storage(StorageError::Io(_))) => {
                prop_assert_eq!(storage.load_account("alice").unwrap(), before);
                prop_assert!(rt.block_on(clean.login("alice", OLD)).is_ok());
            },
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    });
}

#[test]
fn test_chaotic_logins_never_return_wrong_identity() {
    let rt = runtime();
    let expected = registered_record().public_key.clone();

    let chaotic = ChaoticStorage::with_seed(seeded_storage(), 0.5, 7);
    let service = AccountService::new(chaotic, OsEntropy, AccountConfig::default());

    for _ in 0..6 {
        match rt.block_on(service.login("alice", OLD)) {
            Ok(grant) => assert_eq!(grant.identity().public_key().to_der(), expected.as_slice()),
            Err(err) => assert!(matches!(err, ServerError::Storage(_)), "{err}"),
        }
    }
    assert_eq!(service.storage().operation_count(), 6);
}
