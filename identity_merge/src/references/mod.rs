//! Foreign keys to accounts held by other collections, and their migration

mod errors;
mod migrator;
mod registry;

pub use errors::MigrationError;
pub use migrator::{MigrationReport, ReferenceMigrator};
pub use registry::{ContentKind, DuplicatePolicy, ReferenceKind, ReferenceRegistry, TrackedReference};
