pub mod auction;
pub mod bidding;
pub mod clock;
pub mod database;
pub mod engine;
pub mod handlers;
pub mod message_broker;
pub mod notification;
pub mod query;
pub mod scheduler;
pub mod store;
