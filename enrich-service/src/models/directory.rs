//! Reference data served by the directory

use crate::models::JobType;
use serde::{Deserialize, Serialize};

/// A contact that can be enriched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
}

impl Subject {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Values a successful provider search may discover for a subject
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAttributes {
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl SubjectAttributes {
    /// Value for a job, `None` when absent or empty
    pub fn get(&self, job: JobType) -> Option<&str> {
        let value = match job {
            JobType::Phone => self.phone.as_deref(),
            JobType::Email => self.email.as_deref(),
        };
        value.filter(|v| !v.is_empty())
    }
}

/// Public profile known for a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub full_name: String,
    #[serde(rename = "linkedInUrl", default, skip_serializing_if = "String::is_empty")]
    pub linkedin_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub twitter_handle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub github_username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bio: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub companies: Vec<String>,
}

/// A simulated data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
