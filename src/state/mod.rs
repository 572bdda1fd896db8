//! State module for tracking indexing progress
//!
//! # Components
//!
//! - `SiteStatus`: Persisted lifecycle status of a configured site
//! - `SiteProgress`: In-memory per-site task accounting for a crawl run

mod site_progress;
mod site_status;

// Re-export main types
pub use site_progress::SiteProgress;
pub use site_status::SiteStatus;
