pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, GeneralConfig, QueryConfig, SpeechConfig};
pub use error::{ConfigError, QueryError, SpeechError};
pub use types::{
    AudioEncoding, AudioSource, JobState, OperationState, QueryJob, RecognitionConfig, Row,
    RowPage, SpeechAlternative, SpeechSegment, SqlDialect, Value,
};
