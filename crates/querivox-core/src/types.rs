use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// SQL dialect the query service should use for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Legacy,
    Standard,
}

impl SqlDialect {
    pub fn use_legacy_sql(self) -> bool {
        matches!(self, SqlDialect::Legacy)
    }
}

/// One query job, identified by a client-generated token. Created per
/// invocation and never reused.
#[derive(Debug, Clone)]
pub struct QueryJob {
    pub job_id: String,
    pub sql: String,
    pub dialect: SqlDialect,
}

impl QueryJob {
    pub fn new(sql: impl Into<String>, dialect: SqlDialect) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            sql: sql.into(),
            dialect,
        }
    }
}

/// Server-side state of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Done { error: Option<String> },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done { .. })
    }
}

/// A scalar cell value decoded from the result wire format.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

/// One result row: ordered (column name, value) pairs. Printed as produced,
/// never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (_, value)) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

/// One page of a destination result set.
#[derive(Debug, Clone)]
pub struct RowPage {
    pub rows: Vec<Row>,
    pub next_page_token: Option<String>,
}

/// Where the audio to recognize lives. Remote sources are identified by the
/// object-storage URI scheme; everything else is a local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Local(PathBuf),
    Remote(String),
}

impl AudioSource {
    pub fn classify(path: &str) -> Self {
        if path.starts_with("gs://") {
            AudioSource::Remote(path.to_string())
        } else {
            AudioSource::Local(PathBuf::from(path))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    Flac,
    Linear16,
}

impl AudioEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            AudioEncoding::Flac => "FLAC",
            AudioEncoding::Linear16 => "LINEAR16",
        }
    }
}

/// Fixed per-request recognition parameters.
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    pub encoding: AudioEncoding,
    pub sample_rate_hertz: u32,
    pub language_code: String,
}

/// One candidate transcription for a segment, with its confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAlternative {
    pub transcript: String,
    pub confidence: f32,
}

/// One recognized audio segment, holding alternatives in service order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechSegment {
    pub alternatives: Vec<SpeechAlternative>,
}

/// State of a long-running recognition operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationState {
    Running,
    Done(Vec<SpeechSegment>),
}
