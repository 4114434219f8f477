//! Canonical facts assembled from configuration.

use crate::config::Config;
use crate::models::{CanonicalFacts, ResumeLink};

/// Path prefix under which resume files are served.
pub const RESUMES_PREFIX: &str = "/resumes";

/// Resume label and file name pairs, in display order.
pub const RESUME_FILES: &[(&str, &str)] = &[
    ("Cloud Engineer", "Somesh-Cloud-Engineer.pdf"),
    ("Data/Analytics", "somesh-data-analytics.pdf"),
];

impl CanonicalFacts {
    /// Build the facts bundle for one request. Resume links are absolute,
    /// rooted at `server.public_url`.
    pub fn from_config(config: &Config) -> Self {
        let base = config.server.public_url.trim_end_matches('/');
        let resumes = RESUME_FILES
            .iter()
            .map(|(label, file)| ResumeLink {
                label: label.to_string(),
                url: format!("{}{}/{}", base, RESUMES_PREFIX, file),
            })
            .collect();

        Self {
            email: config.canon.email.clone(),
            phone: config.canon.phone.clone(),
            resumes,
            schedule_url: config.canon.schedule_url.clone(),
        }
    }
}
