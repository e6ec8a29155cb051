pub mod catalogs;
pub mod client;
pub mod driver;
pub mod generator;
pub mod lexer;
pub mod parser;
pub mod payload;
pub mod resolver;
pub mod types;
pub mod validator;

pub use client::{ClientError, MemoryClient, MetadataClient};
pub use driver::{run, Outcome, RunSummary};
pub use lexer::extract;
pub use parser::parse_string;
pub use resolver::{resolve, ResolvedSchema};
pub use types::*;
pub use validator::validate;
