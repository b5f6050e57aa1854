pub mod rest;
pub mod service;
pub mod transcriber;

pub use rest::SpeechClient;
pub use service::SpeechService;
pub use transcriber::Transcriber;
