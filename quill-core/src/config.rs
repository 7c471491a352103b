//! Site configuration carried as explicit state
//!
//! Handlers receive this through application state rather than reading
//! process-wide globals, so they stay testable in isolation.

/// Operator-facing configuration for a quill site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Shared secret gating all write workflows.
    pub admin_password: String,
    /// Key material for session cookie signing.
    pub secret_key: String,
    /// Maximum pixel width for rendered embeds.
    pub site_width: u32,
}

impl SiteConfig {
    pub fn new(admin_password: String, secret_key: String, site_width: u32) -> Self {
        Self {
            admin_password,
            secret_key,
            site_width,
        }
    }
}
