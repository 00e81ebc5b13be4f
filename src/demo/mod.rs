//! A small notes application wired through the mutation helpers
//!
//! Used by the bundled server binary and the integration tests. Notes belong
//! to users, carry optional uploaded files and are exposed through a static
//! async-graphql schema.

pub mod context;
pub mod entities;
pub mod migrations;
pub mod mutations;
pub mod queries;
pub mod schema;
pub mod types;

pub use context::DemoContext;
pub use schema::{build_schema, DemoSchema};

use crate::files::{EntityFiles, ModelFiles};

/// Models whose orphaned files are removed by the cleanup command
pub fn file_models() -> Vec<Box<dyn ModelFiles>> {
    vec![
        Box::new(EntityFiles::<entities::notes::Entity>::new()),
        Box::new(EntityFiles::<entities::users::Entity>::new()),
    ]
}
