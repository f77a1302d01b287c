//! Store-level errors and their mapping onto the wire taxonomy.

use thiserror::Error;

pub type DbResult<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// A uniqueness constraint fired (duplicate email, token, wallet).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }

    /// The query matched no rows.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Sqlx(sqlx::Error::RowNotFound))
    }
}

impl From<DbError> for nairex_types::Error {
    fn from(err: DbError) -> Self {
        if err.is_not_found() {
            nairex_types::Error::not_found("resource not found")
        } else if err.is_unique_violation() {
            nairex_types::Error::entry_exists("resource already exists")
        } else {
            nairex_types::Error::fatal(err)
        }
    }
}
