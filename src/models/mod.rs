mod exam;
mod finance;
mod flashcard;
mod transaction;
mod user;
mod wallet;

pub use exam::*;
pub use finance::*;
pub use flashcard::*;
pub use transaction::*;
pub use user::*;
pub use wallet::*;
