pub mod customer;
pub mod product;
pub mod purchase;
pub mod purchase_item;
pub mod sale;
pub mod sale_item;
pub mod supplier;
