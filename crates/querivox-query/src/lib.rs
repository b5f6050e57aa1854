pub mod rest;
pub mod runner;
pub mod service;

pub use rest::BigQueryClient;
pub use runner::QueryRunner;
pub use service::QueryService;
