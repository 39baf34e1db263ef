// ABOUTME: Validated domain names and the build identifier model.
// ABOUTME: Pure value types with no I/O.

mod build_id;
mod names;

pub use build_id::{
    BuildId, BuildOrdering, ParseBuildIdError, image_reference, make_version_tag, matches_tuple,
};
pub use names::{AppName, ComponentName, NameError, TenantName};
