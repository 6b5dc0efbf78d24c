pub mod csv_service;
pub mod image_cache;
pub mod portfolio_service;
pub mod price_service;
pub mod search_service;
pub mod share_codec;
pub mod sort_service;
pub mod tax_model;
pub mod valuation_service;
