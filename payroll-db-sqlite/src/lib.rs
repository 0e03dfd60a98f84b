mod decimal;
mod repository;

pub use repository::SqliteRepository;
