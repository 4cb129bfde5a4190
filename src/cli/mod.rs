pub mod bench;
pub mod cache;
pub mod commands;
pub mod env;
pub mod flows;
pub mod info;
pub mod output;
pub mod run;
pub mod runtime;
