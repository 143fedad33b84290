pub use rolegate::prelude::*;

use include_dir::{Dir, include_dir};

pub mod services;

/// Templates and static assets, embedded at build time.
pub static DIST: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/dist");
