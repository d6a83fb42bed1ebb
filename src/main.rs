use std::process::ExitCode;

fn main() -> ExitCode {
    match vta_chat::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
