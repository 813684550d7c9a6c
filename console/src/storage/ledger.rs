//! Deployment job ledger
//!
//! Durable mapping from node name to Salt job id, used to resume deployment
//! tracking across agent restarts. The ledger is a single JSON file holding a
//! list of `{jid, name}` records; every mutation rewrites the whole list.

use serde::{Deserialize, Serialize};

use crate::errors::ConsoleError;
use crate::filesys::file::File;

/// One tracked deployment job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job id issued by the Salt API
    pub jid: String,

    /// Node the job is deploying
    pub name: String,
}

/// Durable job ledger backed by a JSON file
#[derive(Debug, Clone)]
pub struct JobLedger {
    file: File,
}

impl JobLedger {
    /// Create a ledger over the given file
    pub fn new(file: File) -> Self {
        Self { file }
    }

    /// Load all records; a missing file reads as an empty list
    pub async fn entries(&self) -> Result<Vec<JobRecord>, ConsoleError> {
        if !self.file.exists().await {
            return Ok(Vec::new());
        }
        self.file.read_json().await
    }

    /// Append a record. No de-duplication: redeploying a node before its
    /// previous job is reaped leaves both records in place.
    pub async fn record_job(&self, jid: &str, name: &str) -> Result<(), ConsoleError> {
        let mut jobs = self.entries().await?;
        jobs.push(JobRecord {
            jid: jid.to_string(),
            name: name.to_string(),
        });
        self.file.write_json(&jobs).await
    }

    /// First job id recorded for the given node name
    pub async fn jid_for_name(&self, name: &str) -> Result<Option<String>, ConsoleError> {
        let jobs = self.entries().await?;
        Ok(jobs.into_iter().find(|job| job.name == name).map(|job| job.jid))
    }

    /// First node name recorded for the given job id
    pub async fn name_for_jid(&self, jid: &str) -> Result<Option<String>, ConsoleError> {
        let jobs = self.entries().await?;
        Ok(jobs.into_iter().find(|job| job.jid == jid).map(|job| job.name))
    }

    /// Remove all records with the given job id. When the last record is
    /// removed the file itself is deleted, never left as an empty list.
    pub async fn remove_job(&self, jid: &str) -> Result<(), ConsoleError> {
        let mut jobs = self.entries().await?;
        jobs.retain(|job| job.jid != jid);
        if jobs.is_empty() {
            self.file.delete().await
        } else {
            self.file.write_json(&jobs).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_ledger() -> JobLedger {
        let path = std::env::temp_dir()
            .join(format!("quarry-ledger-{}", uuid::Uuid::new_v4()))
            .join("jobs.json");
        JobLedger::new(File::new(path))
    }

    #[tokio::test]
    async fn test_record_and_lookup_round_trip() {
        let ledger = temp_ledger();

        ledger.record_job("20230101", "node-1").await.unwrap();
        assert_eq!(
            ledger.jid_for_name("node-1").await.unwrap(),
            Some("20230101".to_string())
        );
        assert_eq!(
            ledger.name_for_jid("20230101").await.unwrap(),
            Some("node-1".to_string())
        );

        ledger.remove_job("20230101").await.unwrap();
        assert_eq!(ledger.jid_for_name("node-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_removing_last_record_deletes_the_file() {
        let ledger = temp_ledger();

        ledger.record_job("1", "node-a").await.unwrap();
        ledger.record_job("2", "node-b").await.unwrap();

        ledger.remove_job("1").await.unwrap();
        assert!(ledger.file.exists().await);

        ledger.remove_job("2").await.unwrap();
        // The key is gone entirely, not an empty list
        assert!(!ledger.file.exists().await);
        assert!(ledger.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_records_keep_first_match() {
        let ledger = temp_ledger();

        ledger.record_job("old", "node-1").await.unwrap();
        ledger.record_job("new", "node-1").await.unwrap();

        assert_eq!(ledger.entries().await.unwrap().len(), 2);
        assert_eq!(
            ledger.jid_for_name("node-1").await.unwrap(),
            Some("old".to_string())
        );
    }

    #[tokio::test]
    async fn test_remove_job_drops_all_matching_records() {
        let ledger = temp_ledger();

        ledger.record_job("j1", "node-1").await.unwrap();
        ledger.record_job("j1", "node-1").await.unwrap();
        ledger.record_job("j2", "node-2").await.unwrap();

        ledger.remove_job("j1").await.unwrap();
        let jobs = ledger.entries().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].jid, "j2");
    }
}
