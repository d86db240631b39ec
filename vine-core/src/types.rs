//! Shared index aliases.

/// Identifier for a tree inside a [`crate::planter::Planter`].
///
/// This is an index into `Planter::trees`, and is only meaningful within
/// the lifetime of a given `Planter` (clearing the planter invalidates it).
pub type TreeId = usize;

/// Index of a branch within its [`crate::tree::Tree`].
pub type BranchIndex = usize;
