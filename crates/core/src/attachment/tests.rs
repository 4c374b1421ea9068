use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use super::*;
use crate::owner::{Credentials, OwnerError, OwnerRecord, Profile, RecordService, WriteStep};
use crate::storage::object_key;
use crate::test_support::{MockObjectStore, MockRecordStore};

struct Fixture {
    service: AttachmentService,
    records: Arc<MockRecordStore>,
    objects: Arc<MockObjectStore>,
}

fn fixture() -> Fixture {
    let records = Arc::new(MockRecordStore::new());
    let objects = Arc::new(MockObjectStore::new());
    let service = AttachmentService::new(
        Arc::new(RecordService::new(records.clone())),
        objects.clone(),
    );
    Fixture {
        service,
        records,
        objects,
    }
}

fn owner(id: &str) -> OwnerRecord {
    let mut record = OwnerRecord::new(
        Profile {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            is_admin: false,
        },
        Credentials {
            email_address: format!("{id}@example.com"),
            password_hash: "hash".into(),
        },
    );
    record.id = id.to_string();
    record
}

fn upload(owner_id: &str, name: &str, size: u64) -> UploadInput {
    UploadInput {
        owner_id: owner_id.into(),
        proposed_name: name.into(),
        size,
        content: Bytes::from(vec![b'x'; usize::try_from(size.min(1024)).unwrap()]),
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

/// Fixture with owner `u1` holding `a.txt` and `b.txt`, blobs included.
async fn with_two_files() -> Fixture {
    let fx = fixture();
    fx.records.insert(owner("u1"));
    for name in ["a.txt", "b.txt"] {
        fx.service.upload(upload("u1", name, 10)).await.unwrap();
    }
    fx
}

// ========== Upload ==========

#[tokio::test]
async fn test_upload_decodes_name_and_stores_both_sides() {
    let fx = fixture();
    fx.records.insert(owner("u1"));

    let record = fx
        .service
        .upload(upload("u1", "a%20b.txt", 500))
        .await
        .unwrap();

    let meta = &record.attachments["a b.txt"];
    assert_eq!(meta.name, "a b.txt");
    assert!(meta.description.is_empty());
    assert_eq!(meta.created_at, meta.updated_at);
    assert!(fx.objects.contains("u1/a b.txt"));
    assert_eq!(fx.records.stored("u1").unwrap(), record);
}

#[tokio::test]
async fn test_upload_overwrites_existing_entry() {
    let fx = with_two_files().await;
    fx.service
        .update_description("u1", &names(&["a.txt"]), "first draft")
        .await
        .unwrap();

    let record = fx.service.upload(upload("u1", "a.txt", 20)).await.unwrap();

    assert!(record.attachments["a.txt"].description.is_empty());
    assert_eq!(record.attachments.len(), 2);
}

#[tokio::test]
async fn test_upload_size_boundary() {
    let fx = fixture();
    fx.records.insert(owner("u1"));

    let err = fx
        .service
        .upload(upload("u1", "big.bin", 10 * 1024 * 1024))
        .await
        .unwrap_err();
    assert!(matches!(err, AttachmentError::PayloadTooLarge { .. }));
    assert!(!fx.objects.contains("u1/big.bin"));

    fx.service
        .upload(upload("u1", "big.bin", 10 * 1024 * 1024 - 1))
        .await
        .unwrap();
    assert!(fx.objects.contains("u1/big.bin"));
}

#[tokio::test]
async fn test_upload_invalid_name() {
    let fx = fixture();
    fx.records.insert(owner("u1"));

    let err = fx
        .service
        .upload(upload("u1", "%E0%A4%A", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, AttachmentError::InvalidName { .. }));
}

#[tokio::test]
async fn test_upload_unknown_owner() {
    let fx = fixture();
    let err = fx
        .service
        .upload(upload("ghost", "a.txt", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, AttachmentError::OwnerNotFound(ref id) if id == "ghost"));
    assert!(!fx.objects.contains("ghost/a.txt"));
}

#[tokio::test]
async fn test_upload_blob_failure_leaves_record_untouched() {
    let fx = fixture();
    fx.records.insert(owner("u1"));
    fx.objects.fail("put", None);

    let err = fx
        .service
        .upload(upload("u1", "a.txt", 10))
        .await
        .unwrap_err();

    assert!(matches!(err, AttachmentError::StorageWriteFailed { .. }));
    assert!(fx.records.stored("u1").unwrap().attachments.is_empty());
}

#[tokio::test]
async fn test_upload_persist_failure_orphans_blob() {
    let fx = fixture();
    fx.records.insert(owner("u1"));
    fx.records.fail("delete");

    let err = fx
        .service
        .upload(upload("u1", "a.txt", 10))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AttachmentError::MetadataPersistFailed {
            source: OwnerError::StoreWriteFailed {
                step: WriteStep::Delete,
                ..
            },
            ..
        }
    ));
    assert!(fx.objects.contains("u1/a.txt"));
    assert!(fx.records.stored("u1").unwrap().attachments.is_empty());

    // Retrying the whole upload repairs it.
    fx.records.heal("delete");
    let record = fx.service.upload(upload("u1", "a.txt", 10)).await.unwrap();
    assert!(record.attachments.contains_key("a.txt"));
}

#[tokio::test]
async fn test_upload_timeout_is_retryable() {
    let fx = fixture();
    fx.records.insert(owner("u1"));
    fx.objects.stall(Duration::from_secs(15));

    let err = fx
        .service
        .upload(upload("u1", "a.txt", 10))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(coffer_shared::AppError::from(err).status_code(), 503);
}

// ========== Update description ==========

#[tokio::test]
async fn test_update_description_sets_text_keeps_timestamps() {
    let fx = with_two_files().await;
    let before = fx.records.stored("u1").unwrap().attachments["a.txt"].clone();

    let record = fx
        .service
        .update_description("u1", &names(&["a.txt"]), "quarterly report")
        .await
        .unwrap();

    let after = &record.attachments["a.txt"];
    assert_eq!(after.description, "quarterly report");
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.updated_at, before.updated_at);
    assert!(record.attachments["b.txt"].description.is_empty());
}

#[tokio::test]
async fn test_update_single_name_same_text_is_noop() {
    let fx = with_two_files().await;
    fx.service
        .update_description("u1", &names(&["a.txt"]), "same text")
        .await
        .unwrap();

    let err = fx
        .service
        .update_description("u1", &names(&["a.txt"]), "same text")
        .await
        .unwrap_err();
    assert!(matches!(err, AttachmentError::NoOpUpdate { ref name } if name == "a.txt"));
}

#[tokio::test]
async fn test_update_batch_skips_noop_check() {
    let fx = with_two_files().await;
    fx.service
        .update_description("u1", &names(&["a.txt", "b.txt"]), "same text")
        .await
        .unwrap();

    let record = fx
        .service
        .update_description("u1", &names(&["a.txt", "b.txt"]), "same text")
        .await
        .unwrap();
    assert_eq!(record.attachments["a.txt"].description, "same text");
    assert_eq!(record.attachments["b.txt"].description, "same text");
}

#[tokio::test]
async fn test_update_description_boundaries() {
    let fx = with_two_files().await;
    let only_a = names(&["a.txt"]);

    fx.service
        .update_description("u1", &only_a, &"d".repeat(400))
        .await
        .unwrap();
    assert!(matches!(
        fx.service
            .update_description("u1", &only_a, &"d".repeat(401))
            .await,
        Err(AttachmentError::DescriptionTooLong { .. })
    ));
    assert!(matches!(
        fx.service.update_description("u1", &only_a, "").await,
        Err(AttachmentError::EmptyDescription)
    ));
}

#[tokio::test]
async fn test_update_missing_name_writes_nothing() {
    let fx = with_two_files().await;
    fx.records.calls.lock().unwrap().clear();

    let err = fx
        .service
        .update_description("u1", &names(&["a.txt", "missing.txt"]), "text")
        .await
        .unwrap_err();

    assert!(matches!(err, AttachmentError::AttachmentNotFound { ref name, .. } if name == "missing.txt"));
    assert!(fx.records.stored("u1").unwrap().attachments["a.txt"].description.is_empty());
    assert!(
        fx.records
            .calls
            .lock()
            .unwrap()
            .iter()
            .all(|c| c.starts_with("get"))
    );
}

#[tokio::test]
async fn test_update_decodes_names() {
    let fx = fixture();
    fx.records.insert(owner("u1"));
    fx.service.upload(upload("u1", "a b.txt", 10)).await.unwrap();

    let record = fx
        .service
        .update_description("u1", &names(&["a%20b.txt"]), "spaced")
        .await
        .unwrap();
    assert_eq!(record.attachments["a b.txt"].description, "spaced");
}

#[tokio::test]
async fn test_update_rejects_bad_name_and_empty_batch() {
    let fx = with_two_files().await;
    assert!(matches!(
        fx.service
            .update_description("u1", &names(&["a.txt", "%zz"]), "text")
            .await,
        Err(AttachmentError::InvalidName { .. })
    ));
    assert!(matches!(
        fx.service.update_description("u1", &[], "text").await,
        Err(AttachmentError::EmptyBatch)
    ));
}

// ========== Download ==========

#[tokio::test]
async fn test_download_signs_owner_scoped_key() {
    let fx = with_two_files().await;

    let link = fx.service.download("u1", "a.txt").await.unwrap();

    assert!(link.presigned_url.contains("u1/a.txt"));
    assert!(link.presigned_url.contains("ttl=120"));
}

#[tokio::test]
async fn test_download_missing_name() {
    let fx = with_two_files().await;
    let err = fx.service.download("u1", "missing.txt").await.unwrap_err();
    assert!(matches!(err, AttachmentError::AttachmentNotFound { .. }));
}

#[tokio::test]
async fn test_download_trusts_metadata_over_blob() {
    let fx = fixture();
    let mut record = owner("u1");
    record
        .attachments
        .insert("gone.txt".into(), AttachmentMetadata::uploaded("gone.txt", "2024-01-01T00:00:00Z"));
    fx.records.insert(record);

    assert!(!fx.objects.contains("u1/gone.txt"));
    assert!(fx.service.download("u1", "gone.txt").await.is_ok());
}

#[tokio::test]
async fn test_download_signing_failure() {
    let fx = with_two_files().await;
    fx.objects.fail("sign", None);
    assert!(matches!(
        fx.service.download("u1", "a.txt").await,
        Err(AttachmentError::SigningFailed { .. })
    ));
}

// ========== Delete ==========

#[tokio::test]
async fn test_delete_removes_blob_and_metadata() {
    let fx = with_two_files().await;

    let record = fx.service.delete("u1", &names(&["a.txt"])).await.unwrap();

    assert!(!record.attachments.contains_key("a.txt"));
    assert!(!fx.objects.contains(&object_key("u1", "a.txt")));
    assert!(fx.objects.contains(&object_key("u1", "b.txt")));

    let err = fx.service.download("u1", "a.txt").await.unwrap_err();
    assert!(matches!(err, AttachmentError::AttachmentNotFound { .. }));
}

#[tokio::test]
async fn test_delete_spaced_name_then_download() {
    let fx = fixture();
    fx.records.insert(owner("u1"));
    fx.service
        .upload(upload("u1", "a%20b.txt", 500))
        .await
        .unwrap();

    fx.service.delete("u1", &names(&["a b.txt"])).await.unwrap();

    assert!(matches!(
        fx.service.download("u1", "a b.txt").await,
        Err(AttachmentError::AttachmentNotFound { .. })
    ));
}

#[tokio::test]
async fn test_delete_blob_failure_keeps_metadata() {
    let fx = with_two_files().await;
    fx.objects.fail("delete", None);

    let err = fx
        .service
        .delete("u1", &names(&["a.txt"]))
        .await
        .unwrap_err();

    assert!(matches!(err, AttachmentError::StorageDeleteFailed { .. }));
    assert!(
        fx.records
            .stored("u1")
            .unwrap()
            .attachments
            .contains_key("a.txt")
    );
}

#[tokio::test]
async fn test_delete_record_failure_reports_stale_metadata() {
    let fx = with_two_files().await;
    fx.records.fail("put");

    let err = fx
        .service
        .delete("u1", &names(&["a.txt"]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AttachmentError::MetadataRemoveFailed { ref name, .. } if name == "a.txt"
    ));
    assert!(!fx.objects.contains("u1/a.txt"));

    let actions = err.recommended_actions();
    assert!(actions[0].contains("already deleted"));
    assert!(actions[1].contains("Retry the delete"));
    assert!(actions.iter().all(|action| !action.contains("upload")));
    assert_eq!(coffer_shared::AppError::from(err).status_code(), 500);
}

#[tokio::test]
async fn test_delete_batch_aborts_and_reports_progress() {
    let fx = with_two_files().await;
    fx.objects.fail("delete", Some("u1/b.txt"));

    let err = fx
        .service
        .delete("u1", &names(&["a.txt", "b.txt"]))
        .await
        .unwrap_err();

    match err {
        AttachmentError::DeleteAborted {
            failed,
            completed,
            source,
        } => {
            assert_eq!(failed, "b.txt");
            assert_eq!(completed, vec!["a.txt".to_string()]);
            assert!(matches!(*source, AttachmentError::StorageDeleteFailed { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let stored = fx.records.stored("u1").unwrap();
    assert!(!stored.attachments.contains_key("a.txt"));
    assert!(stored.attachments.contains_key("b.txt"));
    assert!(!fx.objects.contains("u1/a.txt"));
    assert!(fx.objects.contains("u1/b.txt"));
}

#[tokio::test]
async fn test_delete_first_name_missing_is_plain_error() {
    let fx = with_two_files().await;
    let err = fx
        .service
        .delete("u1", &names(&["missing.txt", "a.txt"]))
        .await
        .unwrap_err();
    assert!(matches!(err, AttachmentError::AttachmentNotFound { .. }));
    assert!(fx.objects.contains("u1/a.txt"));
}

#[tokio::test]
async fn test_delete_rereads_record_after_blob_delete() {
    let fx = with_two_files().await;
    fx.records.calls.lock().unwrap().clear();

    fx.service.delete("u1", &names(&["a.txt"])).await.unwrap();

    let calls = fx.records.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["get u1", "get u1", "delete u1", "put u1"]);
}

#[tokio::test]
async fn test_delete_unknown_owner_and_empty_batch() {
    let fx = fixture();
    assert!(matches!(
        fx.service.delete("ghost", &names(&["a.txt"])).await,
        Err(AttachmentError::OwnerNotFound(_))
    ));
    assert!(matches!(
        fx.service.delete("ghost", &[]).await,
        Err(AttachmentError::EmptyBatch)
    ));
}

#[tokio::test]
async fn test_owner_record_without_id_is_not_found() {
    let fx = fixture();
    let mut blank = owner("u1");
    blank.id = String::new();
    fx.records.insert_under("u1", blank);

    assert!(matches!(
        fx.service.download("u1", "a.txt").await,
        Err(AttachmentError::OwnerNotFound(_))
    ));
}
