//! Repository layer for database operations

pub mod books;
pub mod documents;
pub mod fines;
pub mod reading_sessions;
pub mod requests;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub documents: documents::DocumentsRepository,
    pub reading_sessions: reading_sessions::ReadingSessionsRepository,
    pub books: books::BooksRepository,
    pub requests: requests::RequestsRepository,
    pub fines: fines::FinesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            documents: documents::DocumentsRepository::new(pool.clone()),
            reading_sessions: reading_sessions::ReadingSessionsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            requests: requests::RequestsRepository::new(pool.clone()),
            fines: fines::FinesRepository::new(pool.clone()),
            pool,
        }
    }
}
