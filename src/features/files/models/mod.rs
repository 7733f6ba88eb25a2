mod category;
mod file;

pub use category::FileCategory;
pub use file::{FileRecord, NewFileRecord};
