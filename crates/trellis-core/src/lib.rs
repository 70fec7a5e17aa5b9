//! Trellis Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Trellis layout
//! resolver. It includes:
//!
//! - **Components**: Flat component descriptors and group edit settings ([`component`] module)
//! - **Repeating groups**: Per-group row state and realized row ranges ([`repeating`] module)
//! - **Data sources**: Form data and instance metadata read by expressions ([`data_sources`] module)

pub mod component;
pub mod data_sources;
pub mod repeating;

pub use component::{ComponentDescriptor, FilterEntry, GroupEdit};
pub use data_sources::{DataSources, InstanceContext};
pub use repeating::{RepeatingGroupState, RepeatingGroups, RowRange, row_range};
