use std::process::ExitCode;

fn main() -> ExitCode {
    let code = leakcheck::cli::start_cli();
    ExitCode::from(code.clamp(0, u8::MAX as i32) as u8)
}
