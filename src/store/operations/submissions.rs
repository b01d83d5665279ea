use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

/// A hero's answer to a manual assignment. Created in Pending state before
/// any grading runs, so a grader outage never loses the attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub assignment_id: String,
    pub hero_id: String,
    pub submission_text: Option<String>,
    pub submission_url: Option<String>,
    pub status: SubmissionStatus,
    pub feedback: Option<String>,
    pub grade_awarded: Option<u32>,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl Store {
    /// Create a submission, enforcing one per (hero, assignment) through a
    /// compare-and-swap on the uniqueness index key.
    pub fn create_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        let index_key =
            keys::submission_index_key(&submission.hero_id, &submission.assignment_id);

        let cas_result = self
            .submissions
            .compare_and_swap(
                index_key.as_bytes(),
                None::<&[u8]>,
                Some(submission.id.as_bytes().to_vec()),
            )
            .map_err(StoreError::Sled)?;

        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: "submission".to_string(),
                key: index_key,
            });
        }

        let bytes = Self::serialize(submission)?;
        if let Err(e) = self
            .submissions
            .insert(keys::submission_key(&submission.id).as_bytes(), bytes)
        {
            let _ = self.submissions.remove(index_key.as_bytes());
            return Err(StoreError::Sled(e));
        }
        Ok(())
    }

    pub fn get_submission(&self, submission_id: &str) -> Result<Option<Submission>, StoreError> {
        match self
            .submissions
            .get(keys::submission_key(submission_id).as_bytes())?
        {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn update_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        if self
            .submissions
            .get(keys::submission_key(&submission.id).as_bytes())?
            .is_none()
        {
            return Err(StoreError::NotFound {
                entity: "submission".to_string(),
                key: submission.id.clone(),
            });
        }
        let bytes = Self::serialize(submission)?;
        self.submissions
            .insert(keys::submission_key(&submission.id).as_bytes(), bytes)?;
        Ok(())
    }

    pub fn list_hero_submissions(&self, hero_id: &str) -> Result<Vec<Submission>, StoreError> {
        let prefix = keys::submission_index_prefix(hero_id);
        let mut rows = Vec::new();
        for item in self.submissions.scan_prefix(prefix.as_bytes()) {
            let (_, raw_id) = item?;
            let submission_id = String::from_utf8_lossy(&raw_id).to_string();
            if let Some(submission) = self.get_submission(&submission_id)? {
                rows.push(submission);
            }
        }
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }
}
