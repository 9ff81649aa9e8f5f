pub mod card;
pub mod deck;
pub mod snapshot;

pub use card::*;
pub use deck::*;
pub use snapshot::*;
