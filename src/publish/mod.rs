//! Publish collaborators: GitHub API, git, and the jsDelivr CDN

pub mod cdn;
pub mod coordinator;
pub mod git;
pub mod github;

pub use cdn::{Availability, WORKFLOW_TEMPLATE};
pub use coordinator::GitHubCoordinator;
pub use git::GitPublisher;
pub use github::GitHubClient;
