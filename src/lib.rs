//! mcp-sync: regenerate the MCP data modules from annotated TypeScript.
//!
//! Pipeline: [`source`] parses files, [`comment`] reads their JSDoc,
//! [`extract`] builds records, [`generate`] renders modules, and
//! [`pipeline`] ties the phases together into a [`report::SyncReport`].

pub mod cli;
pub mod comment;
pub mod config;
pub mod extract;
pub mod generate;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod source;
