pub mod budget;
pub mod category;
pub mod money;
pub mod transaction;
pub mod user;

pub use budget::{Budget, UpsertOutcome};
pub use category::{Category, NewCategory};
pub use money::{parse_amount, Money};
pub use transaction::{NewTransaction, Transaction, TransactionKind};
pub use user::UserId;
