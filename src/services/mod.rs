pub mod accounts;
pub mod cart;
pub mod checkout;
pub mod inventory;
pub mod order_builder;
pub mod order_query;
pub mod order_status;
