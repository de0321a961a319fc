pub mod accounting_transaction;
pub mod booth;
pub mod booth_stock;
pub mod brand;
pub mod ingredient;
pub mod menu_item;
pub mod menu_item_ingredient;
pub mod sale;
pub mod sale_item;
pub mod stock_movement;
pub mod user;
