pub mod branching;
pub mod bytecode_encoders;
pub mod composer;
pub mod config;
mod constants;
pub mod encoder_builders;
pub mod flags;
pub mod frames;
pub mod offsets;
pub mod route_index;
pub mod route_validator;
pub mod utils;
