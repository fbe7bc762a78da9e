pub mod author;
pub mod history;
pub mod publication;
pub mod publist;

pub use author::*;
pub use history::*;
pub use publication::*;
pub use publist::*;
