//! End to end support: a fake of the external backend and helpers that run
//! the real server against it on random local ports.

pub mod fake_backend;

pub use fake_backend::{FakeBackend, ReceivedUpload, TimetableReply};
pub use http_test::{build_test_client, TestServer, TestStack};
