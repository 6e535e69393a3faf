fn main() {
    if let Err(err) = spms_parking_api::app::run_api() {
        eprintln!("api startup failed: {err}");
        std::process::exit(1);
    }
}
