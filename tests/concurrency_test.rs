use anyhow::Result;
use saldo::application::LedgerError;

mod common;

use common::test_service;

/// N concurrent debits of A against a starting balance of (N-1)*A + A/2:
/// exactly N-1 succeed, one fails with InsufficientFunds, and the final
/// balance is A/2 regardless of interleaving.
#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_debits_never_overdraw() -> Result<()> {
    const N: usize = 8;
    const A: i64 = 1000;

    let (service, _temp) = test_service().await?;
    service.credit("alice", (N as i64 - 1) * A + A / 2).await?;

    let mut handles = Vec::with_capacity(N);
    for _ in 0..N {
        let service = service.clone();
        handles.push(tokio::spawn(
            async move { service.debit("alice", A, None).await },
        ));
    }

    let mut succeeded = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => succeeded += 1,
            Err(LedgerError::InsufficientFunds { .. }) => rejected += 1,
            Err(other) => return Err(other.into()),
        }
    }

    assert_eq!(succeeded, N - 1);
    assert_eq!(rejected, 1);
    assert_eq!(service.balance("alice").await?, A / 2);

    let report = service.verify("alice").await?;
    assert!(report.is_consistent());

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_credits_sum_exactly() -> Result<()> {
    const N: usize = 20;

    let (service, _temp) = test_service().await?;

    let mut handles = Vec::with_capacity(N);
    for _ in 0..N {
        let service = service.clone();
        handles.push(tokio::spawn(
            async move { service.credit("alice", 250).await },
        ));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(service.balance("alice").await?, 250 * N as i64);

    let history = service.history("alice").await?;
    assert_eq!(history.len(), N);
    for pair in history.windows(2) {
        assert!(pair[0].id > pair[1].id);
    }

    let report = service.verify("alice").await?;
    assert!(report.is_consistent());

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_writers_on_different_owners() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.credit("alice", 5000).await?;
    service.credit("bob", 5000).await?;

    let mut handles = Vec::new();
    for i in 0..10 {
        let service = service.clone();
        let owner = if i % 2 == 0 { "alice" } else { "bob" };
        handles.push(tokio::spawn(async move {
            service.debit(owner, 100, None).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    assert_eq!(service.balance("alice").await?, 4500);
    assert_eq!(service.balance("bob").await?, 4500);

    for owner in ["alice", "bob"] {
        let report = service.verify(owner).await?;
        assert!(report.is_consistent());
    }

    Ok(())
}
