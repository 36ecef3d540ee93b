mod note;
mod patient;

pub use note::*;
pub use patient::*;
