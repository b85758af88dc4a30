use super::*;
use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

fn cause() -> ProxyError {
    ProxyError::UpstreamBadRequest { body: "bad".into() }
}

struct FixedIssuer(Option<&'static str>, AtomicUsize);

#[async_trait]
impl EphemeralIssuer for FixedIssuer {
    async fn issue(&self) -> Result<String, ProxyError> {
        self.1.fetch_add(1, Ordering::SeqCst);
        self.0
            .map(str::to_string)
            .ok_or_else(|| ProxyError::Transport { message: "offline".into() })
    }
}

#[tokio::test]
async fn test_round_robin_rotation() {
    let pool = CredentialPool::from_tokens(["a", "b", "c"], 3);

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(pool.acquire().await.unwrap().token().to_string());
    }
    assert_eq!(seen, vec!["a", "b", "c", "a"]);
}

#[tokio::test]
async fn test_credential_excluded_after_max_failures() {
    let pool = CredentialPool::from_tokens(["a", "b"], 2);
    let a = pool.acquire().await.unwrap();
    assert_eq!(a.token(), "a");

    pool.report_failure(&a, &cause());
    pool.report_failure(&a, &cause());

    for _ in 0..4 {
        assert_eq!(pool.acquire().await.unwrap().token(), "b");
    }
    assert_eq!(pool.usable_count(), 1);
}

#[tokio::test]
async fn test_success_resets_failure_count() {
    let pool = CredentialPool::from_tokens(["a"], 2);
    let a = pool.acquire().await.unwrap();

    pool.report_failure(&a, &cause());
    pool.report_success(&a);
    pool.report_failure(&a, &cause());

    assert_eq!(pool.status()[0].failures, 1);
    assert!(pool.acquire().await.is_ok());
}

#[tokio::test]
async fn test_exhausted_pool_is_unavailable() {
    let pool = CredentialPool::from_tokens(["a"], 1);
    let a = pool.acquire().await.unwrap();
    pool.report_failure(&a, &cause());

    let err = pool.acquire().await.unwrap_err();
    assert!(matches!(err, ProxyError::CredentialExhausted { .. }));
}

#[tokio::test]
async fn test_empty_pool_is_unavailable() {
    let pool = CredentialPool::new(None, None, 3);
    assert!(pool.acquire().await.is_err());
}

#[tokio::test]
async fn test_reload_reintroduces_excluded_credentials() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "tok-1\ntok-2").unwrap();

    let pool = CredentialPool::new(Some(file.path().to_path_buf()), None, 1);
    assert_eq!(pool.reload().await.unwrap(), 2);

    let first = pool.acquire().await.unwrap();
    let second = pool.acquire().await.unwrap();
    pool.report_failure(&first, &cause());
    pool.report_failure(&second, &cause());
    assert!(pool.acquire().await.is_err());

    assert_eq!(pool.reload().await.unwrap(), 2);
    assert!(pool.acquire().await.is_ok());
}

#[tokio::test]
async fn test_reload_picks_up_file_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tokens.txt");
    std::fs::write(&path, "old\n").unwrap();

    let pool = CredentialPool::new(Some(path.clone()), None, 3);
    pool.reload().await.unwrap();
    assert_eq!(pool.acquire().await.unwrap().token(), "old");

    std::fs::write(&path, "new-1\nnew-2\n").unwrap();
    pool.reload().await.unwrap();
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.acquire().await.unwrap().token(), "new-1");
}

#[tokio::test]
async fn test_backup_token_joins_pool_once() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "shared\nother").unwrap();

    let pool = CredentialPool::new(Some(file.path().to_path_buf()), Some("shared".into()), 3);
    assert_eq!(pool.reload().await.unwrap(), 2);

    let backup_only = CredentialPool::new(None, Some("backup".into()), 3);
    assert_eq!(backup_only.reload().await.unwrap(), 1);
    assert_eq!(backup_only.acquire().await.unwrap().token(), "backup");
}

#[tokio::test]
async fn test_ephemeral_issuer_preferred() {
    let issuer = Arc::new(FixedIssuer(Some("guest"), AtomicUsize::new(0)));
    let pool = CredentialPool::from_tokens(["pooled"], 3).with_ephemeral_issuer(issuer.clone());

    let credential = pool.acquire().await.unwrap();
    assert_eq!(credential.token(), "guest");
    assert_eq!(credential.provenance(), Provenance::Ephemeral);

    // Ephemeral reports never touch pooled counters
    pool.report_failure(&credential, &cause());
    assert_eq!(pool.status()[0].failures, 0);
    assert_eq!(issuer.1.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ephemeral_failure_falls_back_to_pool() {
    let issuer = Arc::new(FixedIssuer(None, AtomicUsize::new(0)));
    let pool = CredentialPool::from_tokens(["pooled"], 3).with_ephemeral_issuer(issuer);

    let credential = pool.acquire().await.unwrap();
    assert_eq!(credential.token(), "pooled");
    assert_eq!(credential.provenance(), Provenance::Pooled);
}

#[tokio::test]
async fn test_concurrent_reports_are_serialized() {
    let pool = Arc::new(CredentialPool::from_tokens(["a"], 1000));
    let credential = pool.acquire().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..50 {
        let pool = Arc::clone(&pool);
        let credential = credential.clone();
        handles.push(tokio::spawn(async move {
            pool.report_failure(&credential, &cause());
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(pool.status()[0].failures, 50);
}
