fn main() {
    if let Err(err) = spms_parking_api::app::run() {
        eprintln!("application startup failed: {err}");
        std::process::exit(1);
    }
}
