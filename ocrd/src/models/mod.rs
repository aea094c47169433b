mod options;
mod result;
mod source;

pub use options::*;
pub use result::*;
pub use source::*;
