//! Built-in reference data

use super::SeedDirectory;
use crate::models::{Profile, Provider, Subject, SubjectAttributes};

pub const SUBJECT_JOHN_DOE: &str = "a1b2c3d4-e5f6-7890-abcd-ef1234567890";
pub const SUBJECT_JANE_SMITH: &str = "b2c3d4e5-f6a7-8901-bcde-f12345678901";
pub const SUBJECT_BOB_JOHNSON: &str = "c3d4e5f6-a7b8-9012-cdef-123456789012";
pub const SUBJECT_ALICE_WILLIAMS: &str = "d4e5f6a7-b8c9-0123-def1-234567890123";

pub const PROVIDER_ACME_CORP: &str = "e5f6a7b8-c9d0-1234-efab-345678901234";
pub const PROVIDER_TECHCO: &str = "f6a7b8c9-d0e1-2345-fabc-456789012345";
pub const PROVIDER_STARTUPDEV: &str = "a7b8c9d0-e1f2-3456-abcd-567890123456";
pub const PROVIDER_BIGCORP_INC: &str = "b8c9d0e1-f2a3-4567-bcde-678901234567";
pub const PROVIDER_CLOUDSYNC: &str = "c9d0e1f2-a3b4-5678-cdef-789012345678";
pub const PROVIDER_DATAFLOW_SYSTEMS: &str = "d0e1f2a3-b4c5-6789-defa-890123456789";

// (id, first, last, company, title, phone, email)
const SUBJECTS: &[(&str, &str, &str, &str, &str, &str, &str)] = &[
    (
        SUBJECT_JOHN_DOE,
        "John",
        "Doe",
        "Acme Corp",
        "Software Engineer",
        "+1-555-123-4567",
        "john.doe@example.com",
    ),
    (
        SUBJECT_JANE_SMITH,
        "Jane",
        "Smith",
        "TechCo",
        "Product Manager",
        "+1-555-987-6543",
        "jane.smith@techco.io",
    ),
    (
        SUBJECT_BOB_JOHNSON,
        "Bob",
        "Johnson",
        "StartupDev",
        "CTO",
        "+1-555-234-5678",
        "bob.johnson@startup.dev",
    ),
    (
        SUBJECT_ALICE_WILLIAMS,
        "Alice",
        "Williams",
        "BigCorp Inc",
        "Sales Director",
        "+1-555-456-7890",
        "alice.w@bigcorp.com",
    ),
];

// Search order
const PROVIDERS: &[(&str, &str, &str)] = &[
    (PROVIDER_ACME_CORP, "Acme Corp", "https://acme-corp.com/logo.png"),
    (PROVIDER_TECHCO, "TechCo", "https://techco.io/logo.png"),
    (PROVIDER_STARTUPDEV, "StartupDev", "https://startup.dev/logo.png"),
    (PROVIDER_BIGCORP_INC, "BigCorp Inc", "https://bigcorp.com/logo.png"),
    (PROVIDER_CLOUDSYNC, "CloudSync", "https://cloudsync.io/logo.png"),
    (PROVIDER_DATAFLOW_SYSTEMS, "DataFlow Systems", "https://dataflow.com/logo.png"),
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn seed_profiles() -> Vec<Profile> {
    vec![
        Profile {
            full_name: "John Doe".to_string(),
            linkedin_url: "https://linkedin.com/in/johndoe".to_string(),
            twitter_handle: "@johndoe_dev".to_string(),
            github_username: "johndoe".to_string(),
            bio: "Passionate software engineer with 10+ years of experience".to_string(),
            location: "San Francisco, CA".to_string(),
            skills: strings(&["Go", "Python", "Kubernetes", "AWS"]),
            companies: strings(&["Acme Corp", "Google", "Meta"]),
        },
        Profile {
            full_name: "Jane Smith".to_string(),
            linkedin_url: "https://linkedin.com/in/janesmith".to_string(),
            twitter_handle: "@janesmith_pm".to_string(),
            github_username: "janesmith".to_string(),
            bio: "Product leader focused on developer tools".to_string(),
            location: "New York, NY".to_string(),
            skills: strings(&["Product Management", "Agile", "User Research"]),
            companies: strings(&["TechCo", "Stripe", "Shopify"]),
        },
        Profile {
            full_name: "Bob Johnson".to_string(),
            linkedin_url: "https://linkedin.com/in/bobjohnson".to_string(),
            twitter_handle: String::new(),
            github_username: "bobjohnson".to_string(),
            bio: "Serial entrepreneur and tech leader".to_string(),
            location: "Austin, TX".to_string(),
            skills: strings(&["Leadership", "Architecture", "Fundraising"]),
            companies: strings(&["StartupDev", "Oracle"]),
        },
        Profile {
            full_name: "Alice Williams".to_string(),
            linkedin_url: "https://linkedin.com/in/alicewilliams".to_string(),
            twitter_handle: "@alice_sales".to_string(),
            github_username: String::new(),
            bio: "Enterprise sales expert with a track record of success".to_string(),
            location: "Chicago, IL".to_string(),
            skills: strings(&["Enterprise Sales", "Negotiation", "CRM"]),
            companies: strings(&["BigCorp Inc", "Salesforce", "HubSpot"]),
        },
    ]
}

/// Providers in their pinned search order
pub fn seed_providers() -> Vec<Provider> {
    PROVIDERS
        .iter()
        .map(|(id, name, image)| Provider {
            id: id.to_string(),
            name: name.to_string(),
            image_url: Some(image.to_string()),
        })
        .collect()
}

impl SeedDirectory {
    /// Directory loaded with the built-in subjects, profiles and providers
    ///
    /// Subjects start without phone or email; those are filled in as
    /// enrichments discover them.
    pub fn seeded() -> Self {
        let mut directory = SeedDirectory::empty().with_providers(seed_providers());

        for (id, first, last, company, title, phone, email) in SUBJECTS {
            let subject = Subject {
                id: id.to_string(),
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: String::new(),
                phone: String::new(),
                company: Some(company.to_string()),
                job_title: Some(title.to_string()),
            };
            let attributes = SubjectAttributes {
                phone: Some(phone.to_string()),
                email: Some(email.to_string()),
            };
            directory = directory.with_subject(subject, attributes);
        }

        for profile in seed_profiles() {
            directory = directory.with_profile(profile);
        }

        directory
    }
}
