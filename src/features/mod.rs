pub mod calls;
pub mod feedback;
pub mod files;
