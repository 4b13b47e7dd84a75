//! Command implementations for OxiRAR CLI.

pub mod cat;
pub mod extract;
pub mod info;
pub mod list;

pub use cat::cmd_cat;
pub use extract::{ExtractOptions, cmd_extract};
pub use info::cmd_info;
pub use list::{ListOptions, cmd_list};
pub use test::cmd_test;
