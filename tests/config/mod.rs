pub mod drive;
pub mod fs;
