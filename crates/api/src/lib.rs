pub mod error;
pub mod http;
pub mod service;
pub mod store;

pub use db;
pub use model;
pub use service::PollService;
pub use store::Store;
