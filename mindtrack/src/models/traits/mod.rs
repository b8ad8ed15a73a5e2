mod authorization;
mod sanitize_description;

pub use authorization::*;
pub use sanitize_description::*;
