pub mod budgets;
pub mod forecast;
pub mod summary;
