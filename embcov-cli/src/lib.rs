//! Host side of embcov: recovers `.gcda` files from what a target emitted.

pub mod cli;
pub mod inspect;
pub mod log;
pub mod output;
pub mod unhex;
pub mod unpack;

pub const GIT_REF: &str = match option_env!("GIT_REF") {
    Some(env) => env,
    None => "undefined",
};

pub const MAYBE_GIT_REF: Option<&str> = option_env!("GIT_REF");
