use std::process::ExitCode;

fn main() -> ExitCode {
    aqibot_cli::run()
}
