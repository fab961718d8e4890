use std::process::ExitCode;

pub fn main() -> ExitCode {
    embcov_cli::cli::main()
}
