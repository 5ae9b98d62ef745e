#![allow(dead_code)]

pub mod builders;
pub mod recording_client;
pub mod strategies;

pub use builders::*;
pub use recording_client::*;
