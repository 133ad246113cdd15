//! Cleanse and prepare enhancement, driven end to end against the in-memory
//! collection driver.

#![allow(clippy::manual_async_fn)]

use std::future::Future;

use asupersync::runtime::RuntimeBuilder;
use serde_json::{Value, json};

use syncjoint::prelude::*;
use syncjoint_memory::MemoryCollection;

fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> std::result::Result<T, String> {
    match outcome {
        Outcome::Ok(v) => Ok(v),
        Outcome::Err(e) => Err(format!("unexpected error: {e}")),
        Outcome::Cancelled(r) => Err(format!("cancelled: {r:?}")),
        Outcome::Panicked(p) => Err(format!("panicked: {p:?}")),
    }
}

fn record(value: Value) -> Record {
    Record::try_from(value).expect("record literal")
}

fn config() -> JointConfig {
    JointConfig::new("Account", "Contact", "accountId", "account").parent_fields(["name"])
}

/// Uppercases the contact name; stands in for an engine-supplied cleanse.
struct UppercaseName;

impl CleanseTransform for UppercaseName {
    fn cleanse(
        &self,
        _cx: &Cx,
        mut record: Record,
    ) -> impl Future<Output = Outcome<Record, Error>> + Send {
        async move {
            let path = FieldPath::new("name");
            if let Some(Value::String(name)) = record.get(&path).cloned() {
                record.set(&path, name.to_uppercase());
            }
            Outcome::Ok(record)
        }
    }
}

/// Stamps the action onto the record; stands in for an engine-supplied
/// prepare.
struct StampAction;

impl PrepareTransform for StampAction {
    fn prepare(
        &self,
        _cx: &Cx,
        mut record: Record,
        action: Action,
    ) -> impl Future<Output = Outcome<Record, Error>> + Send {
        async move {
            record.set(&FieldPath::new("stamped"), format!("{action:?}"));
            Outcome::Ok(record)
        }
    }
}

#[test]
fn construction_never_mutates_the_collections() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");
        unwrap_outcome(
            accounts
                .insert(&cx, record(json!({"id": "P1", "extId": "EXT-1"})))
                .await,
        )
        .expect("seed account");

        let joint = Joint::new(
            config().related_list("contacts", ["name"]),
            accounts.clone(),
            contacts.clone(),
        )
        .expect("build joint");
        assert!(joint.maintains_related_list());

        let accounts_after = unwrap_outcome(accounts.records(&cx).await).expect("accounts");
        assert_eq!(accounts_after, vec![record(json!({"id": "P1", "extId": "EXT-1"}))]);
        let contacts_after = unwrap_outcome(contacts.records(&cx).await).expect("contacts");
        assert!(contacts_after.is_empty());
    });
}

#[test]
fn construction_fails_synchronously_on_bad_config() {
    let accounts = MemoryCollection::new("extId", "id");
    let contacts = MemoryCollection::new("extId", "id");

    let result = Joint::new(
        JointConfig::new("", "Contact", "accountId", "account"),
        accounts,
        contacts,
    );
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn cleanse_leaves_record_unchanged_without_foreign_key() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");
        unwrap_outcome(
            accounts
                .insert(&cx, record(json!({"id": "P1", "extId": null})))
                .await,
        )
        .expect("seed account");

        let joint = Joint::new(config(), accounts, contacts).expect("build joint");
        let cleanse = joint.cleanse_transform();

        let child = record(json!({"id": "C1", "accountId": null}));
        let cleansed = unwrap_outcome(cleanse.cleanse(&cx, child.clone()).await).expect("cleanse");
        assert_eq!(cleansed, child);
    });
}

#[test]
fn cleanse_embeds_parent_snapshot_by_foreign_key() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");
        unwrap_outcome(
            accounts
                .insert(
                    &cx,
                    record(json!({
                        "id": "P1",
                        "extId": "EXT-1",
                        "name": "Acme",
                        "region": "EU",
                    })),
                )
                .await,
        )
        .expect("seed account");

        let joint = Joint::new(config(), accounts, contacts).expect("build joint");
        let cleanse = joint.cleanse_transform();

        let child = record(json!({"id": "C1", "accountId": "EXT-1"}));
        let cleansed = unwrap_outcome(cleanse.cleanse(&cx, child).await).expect("cleanse");

        // Exactly the configured fields plus the parent's local key; no
        // region, no extId.
        assert_eq!(
            cleansed.get(&FieldPath::new("account")),
            Some(&json!({"id": "P1", "name": "Acme"}))
        );
    });
}

#[test]
fn cleanse_tolerates_missing_parent() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");

        let joint = Joint::new(config(), accounts, contacts).expect("build joint");
        let cleanse = joint.cleanse_transform();

        let child = record(json!({"id": "C1", "accountId": "EXT-MISSING"}));
        let cleansed = unwrap_outcome(cleanse.cleanse(&cx, child.clone()).await)
            .expect("soft miss must not fail");
        assert_eq!(cleansed, child);
    });
}

#[test]
fn cleanse_runs_wrapped_transform_first() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");
        unwrap_outcome(
            accounts
                .insert(
                    &cx,
                    record(json!({"id": "P1", "extId": "EXT-1", "name": "Acme"})),
                )
                .await,
        )
        .expect("seed account");

        let joint = Joint::new(config(), accounts, contacts).expect("build joint");
        let cleanse = joint.enhance_cleanse(UppercaseName);

        let child = record(json!({"id": "C1", "name": "jane", "accountId": "EXT-1"}));
        let cleansed = unwrap_outcome(cleanse.cleanse(&cx, child).await).expect("cleanse");

        assert_eq!(cleansed.get(&FieldPath::new("name")), Some(&json!("JANE")));
        assert_eq!(
            cleansed.get(&FieldPath::new("account")),
            Some(&json!({"id": "P1", "name": "Acme"}))
        );
    });
}

#[test]
fn prepare_passes_through_without_parent_reference() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");

        let joint = Joint::new(config(), accounts, contacts).expect("build joint");
        let prepare = joint.prepare_transform();

        let child = record(json!({"id": "C1"}));
        let prepared = unwrap_outcome(prepare.prepare(&cx, child.clone(), Action::Insert).await)
            .expect("prepare");
        assert_eq!(prepared, child);
    });
}

#[test]
fn prepare_fast_path_copies_embedded_external_key_without_lookup() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        // The store knows a *different* external key than the snapshot; the
        // fast path must trust the snapshot and never consult the store.
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");
        unwrap_outcome(
            accounts
                .insert(&cx, record(json!({"id": "P1", "extId": "EXT-CURRENT"})))
                .await,
        )
        .expect("seed account");

        let joint = Joint::new(config(), accounts, contacts).expect("build joint");
        let prepare = joint.prepare_transform();

        let child = record(json!({
            "id": "C1",
            "account": {"id": "P1", "extId": "EXT-EMBEDDED"},
        }));
        let prepared = unwrap_outcome(prepare.prepare(&cx, child, Action::Update).await)
            .expect("prepare");
        assert_eq!(
            prepared.get(&FieldPath::new("accountId")),
            Some(&json!("EXT-EMBEDDED"))
        );
    });
}

#[test]
fn prepare_resolves_external_key_by_local_lookup() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");
        unwrap_outcome(
            accounts
                .insert(
                    &cx,
                    record(json!({"id": "P1", "extId": "EXT-1", "name": "Acme"})),
                )
                .await,
        )
        .expect("seed account");

        let joint = Joint::new(config(), accounts, contacts).expect("build joint");
        let prepare = joint.prepare_transform();

        let child = record(json!({
            "id": "C1",
            "account": {"id": "P1", "name": "Acme"},
        }));
        let prepared = unwrap_outcome(prepare.prepare(&cx, child, Action::Update).await)
            .expect("prepare");
        assert_eq!(
            prepared.get(&FieldPath::new("accountId")),
            Some(&json!("EXT-1"))
        );
    });
}

#[test]
fn prepare_fails_hard_when_parent_is_missing() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");

        let joint = Joint::new(config(), accounts, contacts).expect("build joint");
        let prepare = joint.prepare_transform();

        let child = record(json!({"id": "C1", "account": {"id": "P-GONE"}}));
        let outcome = prepare.prepare(&cx, child, Action::Insert).await;
        match outcome {
            Outcome::Err(Error::ParentNotFound { entity, local_key }) => {
                assert_eq!(entity, "Account");
                assert_eq!(local_key, "P-GONE");
            }
            Outcome::Err(e) => panic!("expected ParentNotFound, got error: {e}"),
            Outcome::Ok(_) => panic!("expected ParentNotFound, got success"),
            Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
            Outcome::Panicked(p) => panic!("panicked: {p:?}"),
        }
    });
}

#[test]
fn prepare_fails_hard_when_parent_lacks_external_key() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");
        unwrap_outcome(
            accounts
                .insert(&cx, record(json!({"id": "P1", "extId": null})))
                .await,
        )
        .expect("seed account");

        let joint = Joint::new(config(), accounts, contacts).expect("build joint");
        let prepare = joint.prepare_transform();

        let child = record(json!({"id": "C1", "account": {"id": "P1"}}));
        let outcome = prepare.prepare(&cx, child, Action::Update).await;
        match outcome {
            Outcome::Err(Error::ParentNotSynced { entity, local_key }) => {
                assert_eq!(entity, "Account");
                assert_eq!(local_key, "P1");
            }
            Outcome::Err(e) => panic!("expected ParentNotSynced, got error: {e}"),
            Outcome::Ok(_) => panic!("expected ParentNotSynced, got success"),
            Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
            Outcome::Panicked(p) => panic!("panicked: {p:?}"),
        }
    });
}

#[test]
fn prepare_runs_wrapped_transform_first() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();

    rt.block_on(async {
        let accounts = MemoryCollection::new("extId", "id");
        let contacts = MemoryCollection::new("extId", "id");
        unwrap_outcome(
            accounts
                .insert(&cx, record(json!({"id": "P1", "extId": "EXT-1"})))
                .await,
        )
        .expect("seed account");

        let joint = Joint::new(config(), accounts, contacts).expect("build joint");
        let prepare = joint.enhance_prepare(StampAction);

        let child = record(json!({"id": "C1", "account": {"id": "P1"}}));
        let prepared = unwrap_outcome(prepare.prepare(&cx, child, Action::Remove).await)
            .expect("prepare");
        assert_eq!(
            prepared.get(&FieldPath::new("stamped")),
            Some(&json!("Remove"))
        );
        assert_eq!(
            prepared.get(&FieldPath::new("accountId")),
            Some(&json!("EXT-1"))
        );
    });
}
