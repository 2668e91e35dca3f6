//! Reference data directory
//!
//! Read-mostly lookups the worker and HTTP handlers depend on: subjects and
//! their discoverable attributes, third-party profiles, and the ordered
//! provider list. The only write is recording an attribute a provider
//! search discovered, so later reads of the subject reflect it.

pub mod seed;

use crate::models::{JobType, Profile, Provider, Subject, SubjectAttributes};
use enrich_common::{Error, Result};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use seed::*;

/// Lookup capability consumed by the worker and the API
pub trait Directory: Send + Sync {
    fn find_subject(&self, subject_id: &str) -> Result<Option<Subject>>;

    fn list_subjects(&self) -> Result<Vec<Subject>>;

    /// Ground-truth values a successful provider search may discover
    fn find_subject_attributes(&self, subject_id: &str) -> Result<Option<SubjectAttributes>>;

    /// Profile for a subject, matched by its full name
    fn find_profile(&self, subject_id: &str) -> Result<Option<Profile>>;

    /// Profile by full name (case-insensitive)
    fn find_profile_by_name(&self, full_name: &str) -> Result<Option<Profile>>;

    /// Providers in search order
    fn list_providers(&self) -> Result<Vec<Provider>>;

    fn find_provider(&self, provider_id: &str) -> Result<Option<Provider>>;

    /// Store a discovered value on the subject record
    fn record_resolved_attribute(&self, subject_id: &str, job: JobType, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct DirectoryData {
    subjects: HashMap<String, Subject>,
    attributes: HashMap<String, SubjectAttributes>,
    /// Keyed by lower-cased full name
    profiles: HashMap<String, Profile>,
    providers: Vec<Provider>,
}

/// In-process directory populated at startup
#[derive(Debug, Default)]
pub struct SeedDirectory {
    data: RwLock<DirectoryData>,
}

impl SeedDirectory {
    /// Directory with no entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add a subject and the values providers may discover for it
    pub fn with_subject(mut self, subject: Subject, attributes: SubjectAttributes) -> Self {
        let data = self.data_mut();
        data.attributes.insert(subject.id.clone(), attributes);
        data.subjects.insert(subject.id.clone(), subject);
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.data_mut()
            .profiles
            .insert(profile.full_name.to_lowercase(), profile);
        self
    }

    /// Replace the provider list; order is the search order
    pub fn with_providers(mut self, providers: Vec<Provider>) -> Self {
        self.data_mut().providers = providers;
        self
    }

    /// Exclusive access while building; no other handle can exist yet
    fn data_mut(&mut self) -> &mut DirectoryData {
        self.data.get_mut().unwrap_or_else(|p| p.into_inner())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, DirectoryData>> {
        self.data
            .read()
            .map_err(|_| Error::Internal("Directory lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, DirectoryData>> {
        self.data
            .write()
            .map_err(|_| Error::Internal("Directory lock poisoned".to_string()))
    }
}

impl Directory for SeedDirectory {
    fn find_subject(&self, subject_id: &str) -> Result<Option<Subject>> {
        Ok(self.read()?.subjects.get(subject_id).cloned())
    }

    fn list_subjects(&self) -> Result<Vec<Subject>> {
        let mut subjects: Vec<Subject> = self.read()?.subjects.values().cloned().collect();
        subjects.sort_by(|a, b| {
            (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
        });
        Ok(subjects)
    }

    fn find_subject_attributes(&self, subject_id: &str) -> Result<Option<SubjectAttributes>> {
        Ok(self.read()?.attributes.get(subject_id).cloned())
    }

    fn find_profile(&self, subject_id: &str) -> Result<Option<Profile>> {
        let data = self.read()?;
        let profile = data
            .subjects
            .get(subject_id)
            .and_then(|subject| data.profiles.get(&subject.full_name().to_lowercase()))
            .cloned();
        Ok(profile)
    }

    fn find_profile_by_name(&self, full_name: &str) -> Result<Option<Profile>> {
        Ok(self.read()?.profiles.get(&full_name.to_lowercase()).cloned())
    }

    fn list_providers(&self) -> Result<Vec<Provider>> {
        Ok(self.read()?.providers.clone())
    }

    fn find_provider(&self, provider_id: &str) -> Result<Option<Provider>> {
        Ok(self
            .read()?
            .providers
            .iter()
            .find(|p| p.id == provider_id)
            .cloned())
    }

    fn record_resolved_attribute(&self, subject_id: &str, job: JobType, value: &str) -> Result<()> {
        let mut data = self.write()?;
        let subject = data
            .subjects
            .get_mut(subject_id)
            .ok_or_else(|| Error::NotFound(format!("Subject {}", subject_id)))?;

        match job {
            JobType::Phone => subject.phone = value.to_string(),
            JobType::Email => subject.email = value.to_string(),
        }
        Ok(())
    }
}
