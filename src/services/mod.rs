// Document orchestrators
pub mod purchasing;
pub mod sales;

// Stock ledger and shared calculation helpers
pub mod inventory;
pub mod numbering;
pub mod totals;

// Catalog and party management
pub mod customers;
pub mod products;
pub mod suppliers;

// Read-only rollups
pub mod reporting;
