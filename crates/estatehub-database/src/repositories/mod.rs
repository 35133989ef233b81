//! PostgreSQL implementations of the store traits.

pub mod resource;
pub mod user;

pub use resource::ResourceRepository;
pub use user::UserRepository;

use estatehub_core::error::{AppError, ErrorKind};

/// Map a sqlx error to an [`AppError`], surfacing constraint violations as
/// client errors and everything else as a database failure.
pub(crate) fn map_db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |err| {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());
        match code.as_deref() {
            Some("23505") => AppError::conflict(format!("{context}: record already exists")),
            Some("23503") => {
                AppError::validation(format!("{context}: referenced record does not exist"))
            }
            Some("23514") => AppError::validation(format!("{context}: value out of range")),
            _ => AppError::with_source(ErrorKind::Database, context, err),
        }
    }
}
