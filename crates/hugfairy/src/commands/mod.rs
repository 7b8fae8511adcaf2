//! Command implementations for the hugfairy CLI.
//!
//! Each submodule implements the logic for one command.

pub mod doctor;
pub mod login;
pub mod run;
