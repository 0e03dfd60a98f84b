pub mod calculations;
pub mod db;
pub mod models;

pub use calculations::{
    PayrollError, compute_gross_breakdown_from_net, compute_gross_from_net, compute_net,
};
pub use db::recorder::{RecordError, SalaryRecorder};
pub use db::repository::{PayrollRepository, RepositoryError};
pub use models::*;
