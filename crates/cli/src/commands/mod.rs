//! CLI Commands

pub mod rules;
pub mod scenarios;
pub mod validate;
