use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Dimension error: {0}")]
    Dimension(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeneratorError {
    /// Short label used when an error is recorded in a generation report.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Csv(_) => "csv",
            Self::Dimension(_) => "dimension",
            Self::Template(_) => "template",
            Self::Workbook(_) => "workbook",
            Self::Io(_) => "io",
        }
    }
}

impl From<csv::Error> for GeneratorError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for GeneratorError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Workbook(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
