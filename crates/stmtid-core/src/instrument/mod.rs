pub mod classify;
pub mod filesystem;
pub mod inject;
pub mod message;
pub mod parser;
pub mod pass;
pub mod pipeline;
pub mod registry;
pub mod shape;
pub mod statement_id;
