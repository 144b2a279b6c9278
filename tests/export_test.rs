use anyhow::Result;
use saldo::io::{Exporter, LedgerSnapshot};

mod common;

use common::test_service;

#[tokio::test]
async fn test_export_history_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.credit("alice", 10000).await?;
    service.debit("alice", 2500, Some("Food".into())).await?;

    let exporter = Exporter::new(&service);
    let mut buffer = Vec::new();
    let count = exporter.export_history_csv("alice", &mut buffer).await?;

    assert_eq!(count, 2);

    let output = String::from_utf8(buffer)?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "id,created_at,kind,amount_cents,category");
    // Most recent first: the expense row precedes the income row
    assert!(lines[1].contains("Expense"));
    assert!(lines[1].contains("2500"));
    assert!(lines[1].contains("Food"));
    assert!(lines[2].contains("Income"));
    assert!(lines[2].contains("10000"));

    Ok(())
}

#[tokio::test]
async fn test_export_full_json() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.credit("alice", 10000).await?;
    service.debit("alice", 4000, None).await?;

    let exporter = Exporter::new(&service);
    let mut buffer = Vec::new();
    let snapshot = exporter.export_full_json("alice", &mut buffer).await?;

    assert_eq!(snapshot.owner, "alice");
    assert_eq!(snapshot.balance_cents, 6000);
    assert_eq!(snapshot.transactions.len(), 2);

    // The written document round-trips through serde
    let parsed: LedgerSnapshot = serde_json::from_slice(&buffer)?;
    assert_eq!(parsed.owner, snapshot.owner);
    assert_eq!(parsed.balance_cents, snapshot.balance_cents);
    assert_eq!(parsed.transactions.len(), snapshot.transactions.len());

    Ok(())
}

#[tokio::test]
async fn test_export_empty_ledger() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let exporter = Exporter::new(&service);
    let mut buffer = Vec::new();
    let count = exporter.export_history_csv("nobody", &mut buffer).await?;

    assert_eq!(count, 0);
    let output = String::from_utf8(buffer)?;
    assert_eq!(output.lines().count(), 1); // header only

    Ok(())
}
