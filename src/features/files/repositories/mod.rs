mod file_repository;
#[cfg(test)]
mod memory_repository;

pub use file_repository::{FileRepository, FileTransaction, PgFileRepository};
#[cfg(test)]
pub use memory_repository::MemoryFileRepository;
