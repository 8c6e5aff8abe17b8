pub mod academy;
pub mod catalog;
pub mod certificate;
pub mod completion;
pub mod config;
pub mod error;
pub mod feedback;
pub mod ledger;
pub mod materials;
pub mod qna;
pub mod quiz;
pub mod session;
pub mod storage;
pub mod utils;

pub use academy::Academy;
pub use error::{Error, Result};
