//! opcoes-ir - Brazilian options brokerage notes and monthly income tax
//!
//! Extracts options trades from B3 brokerage notes and computes the
//! monthly IR on swing trade and day trade results, carrying losses
//! forward between months.

pub mod error;
pub mod extract;
pub mod notes;
pub mod reports;
pub mod tax;
pub mod utils;
