pub mod recorder;
pub mod repository;

pub use recorder::{RecordError, SalaryRecorder};
pub use repository::{PayrollRepository, RepositoryError};
