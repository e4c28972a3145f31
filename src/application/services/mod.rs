/// Application Services
///
/// - `book_service`: single-writer worker owning the book, driven through `BookHandle`
/// - `shared_book`: mutex-guarded book for direct multi-threaded use

pub mod book_service;
pub mod shared_book;

pub use book_service::{
    spawn_book_service, BookCommand, BookHandle, BookService, ServiceConfig, ServiceError,
};
pub use shared_book::SharedBook;
