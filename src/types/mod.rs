// ABOUTME: Type-safe guids and validated domain types.
// ABOUTME: Uses phantom types to prevent guid confusion at compile time.

mod id;
mod image_ref;
mod process_type;

pub use id::{
    AppGuid, DeploymentGuid, DropletGuid, Guid, ProcessGuid, RevisionGuid, RouteGuid,
    RouteMappingGuid,
};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use process_type::{ProcessType, ProcessTypeError, TASK, WEB};
