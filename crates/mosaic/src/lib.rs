pub mod config;
pub mod error;
pub mod filesystem;
pub mod handlers;
pub mod meta;
pub mod parsing;
pub mod paths;
pub mod render;
pub mod site;
pub mod types;

#[cfg(test)]
mod test_helpers;

pub use config::*;
pub use error::*;
pub use filesystem::*;
pub use handlers::*;
pub use meta::*;
pub use parsing::*;
pub use paths::*;
pub use render::*;
pub use site::*;
pub use types::*;
