use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid month '{0}': expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Invalid date range: end month {end} is before start month {start}")]
    InvalidDateRange { start: String, end: String },

    #[error("No departments configured")]
    NoDepartments,

    #[error("Department {0} is listed more than once")]
    DuplicateDepartment(String),

    #[error("No parameter ranges configured for department {0}")]
    MissingParameterRanges(String),

    #[error("Invalid {parameter} range for {department}: [{low}, {high}] ({details})")]
    InvalidParameterRange {
        department: String,
        parameter: &'static str,
        low: f64,
        high: f64,
        details: String,
    },

    #[error("Data quality violation for {department} in {month}: budget {budget} is not positive")]
    DataQuality {
        department: String,
        month: String,
        budget: f64,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
