use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Cents, TIMESTAMP_FORMAT, Transaction};

/// Snapshot of one owner's ledger for full export/import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub owner: String,
    pub balance_cents: Cents,
    pub transactions: Vec<Transaction>,
}

/// Exporter for converting one owner's ledger data to external formats.
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export an owner's history to CSV, most recent first.
    pub async fn export_history_csv<W: Write>(&self, owner: &str, writer: W) -> Result<usize> {
        let history = self.service.history(owner).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "created_at", "kind", "amount_cents", "category"])?;

        let mut count = 0;
        for entry in &history {
            csv_writer.write_record(&[
                entry.id.to_string(),
                entry.created_at.format(TIMESTAMP_FORMAT).to_string(),
                entry.kind.to_string(),
                entry.amount_cents.to_string(),
                entry.category.clone().unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export an owner's full ledger as a JSON snapshot.
    pub async fn export_full_json<W: Write>(
        &self,
        owner: &str,
        mut writer: W,
    ) -> Result<LedgerSnapshot> {
        let balance_cents = self.service.balance(owner).await?;
        let transactions = self.service.history(owner).await?;

        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            owner: owner.to_string(),
            balance_cents,
            transactions,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
