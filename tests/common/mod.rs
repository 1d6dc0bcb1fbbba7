#![allow(dead_code)]

pub use assetpipe_test_utils::init_tracing;
pub use assetpipe_test_utils::project::{sample_jpeg, sample_png, Project};
pub use assetpipe_test_utils::with_timeout;
