// Not every utils is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

pub use fake_s3::*;
mod fakes;
pub use fakes::*;
mod mock_line_server;
pub use mock_line_server::*;
pub use test_setup::*;
