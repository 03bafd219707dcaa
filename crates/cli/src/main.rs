use std::process::ExitCode;

fn main() -> ExitCode {
    pazar_cli::run()
}
