// ABOUTME: Rolling deployment orchestration.
// ABOUTME: Creation, process replication, route carryover, revisions and history pruning.

mod create;
mod error;
mod prune;
mod replicator;
mod revision;
mod routes;

pub use create::DeploymentCreate;
pub use error::{DeployError, DeployErrorKind};
pub use prune::{DeploymentPruner, prune_app};
pub use replicator::ProcessReplicator;
pub use revision::{RevisionCreator, SequentialRevisions};
pub use routes::RouteCarryover;
