//! Identity resolution and account merging
//!
//! [`IdentityResolver`] is the entry point. Its operations are spread over
//! submodules by step:
//! - `arbiter`: decides between linking, creating, merging and escalating
//! - `reaper`: removes colliding registrations that were never confirmed
//! - `candidates`: finds accounts sharing an identity signal
//! - `merge`: folds one account into another across every collection
//! - `conflict`: the ambiguous case handed back to the caller
//! - `materialize`: creates accounts for first-time logins
//! - `link`: records provider identities on accounts
//! - `confirm`: email confirmation and the merges it triggers

mod arbiter;
mod candidates;
mod confirm;
mod conflict;
mod errors;
mod link;
mod materialize;
mod merge;
mod reaper;
mod resolver;

pub use confirm::EmailConfirmation;
pub use conflict::MergeConflict;
pub use errors::ResolutionError;
pub use merge::MergeReport;
pub use resolver::IdentityResolver;
