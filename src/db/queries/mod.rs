pub mod analytics;
pub mod budgets;
pub mod categories;
pub mod transactions;
