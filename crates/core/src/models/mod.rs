pub mod catalog;
pub mod holding;
pub mod portfolio;
pub mod price;
pub mod settings;
pub mod sort;
pub mod valuation;
