// src/services/mod.rs

pub mod ledger_service;
pub mod venue_service;

pub use ledger_service::LedgerService;
pub use venue_service::VenueService;
