//! Entity Module

pub mod credential_record;
