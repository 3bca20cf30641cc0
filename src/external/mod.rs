pub mod market_data_provider;
pub mod notifier;
pub mod telegram;
pub mod twse;
