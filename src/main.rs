use std::process::ExitCode;

mod app;
mod cli;
mod config;
mod doctor;
mod logger;
mod ops;
mod shell;
mod store;
mod task_types;

#[cfg(test)]
mod unit_tests;

fn main() -> ExitCode {
    app::main()
}
