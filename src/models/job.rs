use serde::{Deserialize, Deserializer};
use strum::{Display, EnumString};

/// Status of a remote conversion job, as reported by the conversion service.
///
/// The remote vocabulary is wider than what the gateway cares about, so
/// several remote values collapse onto one variant.
#[derive(Debug, Clone, Copy, EnumString, Display, PartialEq, Eq)]
pub enum JobStatus {
    #[strum(to_string = "queued", serialize = "initialising")]
    Queued,
    #[strum(to_string = "processing", serialize = "converting")]
    Processing,
    #[strum(to_string = "successful")]
    Successful,
    #[strum(to_string = "failed", serialize = "cancelled")]
    Failed,
}

impl JobStatus {
    /// Map a raw remote status. Unrecognised values are treated as still in progress.
    pub fn from_remote(raw: &str) -> Self {
        raw.parse().unwrap_or(JobStatus::Processing)
    }
}

/// A unit of work submitted to the remote conversion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub id: String,
    pub status: JobStatus,
    /// Present only once the job is `Successful`.
    pub target_file_id: Option<String>,
}

impl ConversionJob {
    pub fn is_successful(&self) -> bool {
        self.status == JobStatus::Successful && self.target_file_id.is_some()
    }
}

/// Job and file ids arrive as JSON numbers from Zamzar but are opaque to us.
pub(crate) fn opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}
