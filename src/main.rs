use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match securecheck_lib::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<securecheck_lib::Notification>() {
                Some(notification) => securecheck_lib::render::error(&notification.0),
                None => securecheck_lib::render::error(&format!("{:#}", e)),
            }
            ExitCode::FAILURE
        }
    }
}
