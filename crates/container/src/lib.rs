//! Mapping containers for docmap
//!
//! This crate implements the user-facing container:
//! - DocumentContainer: dict-like access to one logical container's rows
//! - IdentityPolicy: how keys and parent keys are derived and stamped
//! - QueryTranslator: public field names to backend query fragments
//! - ContainerConfig: declarative container configuration (TOML)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod container;
pub mod cursor;
pub mod identity;
pub mod legacy;
pub mod translator;

pub use config::{ContainerConfig, PolicyKind, DEFAULT_MAPPING_KEY_FIELD, DEFAULT_PARENT_KEY_FIELD};
pub use container::{DocumentContainer, FindOptions, RawRows};
pub use cursor::FindCursor;
pub use identity::{
    AllItemsPolicy, AttributeKeyPolicy, IdentityPolicy, KeyAssignment, ParentScope,
    StoreGeneratedKeyPolicy,
};
#[allow(deprecated)]
pub use legacy::lower_legacy_filter;
pub use translator::{QueryTranslator, SortKey};
