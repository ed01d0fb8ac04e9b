//! File system glue around the archive core.
//!
//! This module handles:
//! - Collecting input files from a directory tree
//! - Storing and loading archive members as files in a directory
//! - Writing recovered files back out

mod member_dir;
mod sink;
mod source;

pub use member_dir::{read_members, remove_members, write_members};
pub use sink::write_files;
pub use source::collect_files;
