pub mod reference;
pub mod scenarios;
pub mod startup;
pub mod valuation;
pub mod venture;
