use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartErrorKind {
    Io,
    Json,
    Metadata,
    MalformedChart,
    InvalidLaneIndex,
}

impl ChartErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // IO
            "C1001" => Self::Io,

            // Document shape
            "C1002" => Self::Json,

            // Song metadata
            "C2001" | "C2002" | "C2003" => Self::Metadata,

            // Note arrays
            "C3001" | "C3002" | "C3003" | "C3004" => Self::MalformedChart,

            // Lanes
            "C3101" => Self::InvalidLaneIndex,

            _ => Self::MalformedChart,
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message} (section {section})")]
pub struct ChartError {
    pub code: &'static str,
    pub kind: ChartErrorKind,
    pub message: String,
    pub section: usize,

    pub note: Option<usize>,
    pub file: Option<String>,
    pub context: Option<String>,
}

impl ChartError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, section: usize) -> Self {
        Self {
            code,
            kind: ChartErrorKind::from_code(code),
            message: message.into(),
            section,

            note: None,
            file: None,
            context: None,
        }
    }

    pub fn with_note(mut self, note: usize) -> Self {
        self.note = Some(note);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Malformed documents and out-of-range lanes; the load must be aborted.
    pub fn is_chart_defect(&self) -> bool {
        matches!(
            self.kind,
            ChartErrorKind::MalformedChart | ChartErrorKind::InvalidLaneIndex | ChartErrorKind::Json
        )
    }
}
