pub mod user;
pub mod scan;
pub mod report;
pub mod settings;
pub mod timestamp;

pub use user::*;
pub use scan::*;
pub use report::*;
pub use settings::*;
