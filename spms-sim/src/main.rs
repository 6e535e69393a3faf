fn main() {
    if let Err(err) = spms_parking_api::app::run_simulator() {
        eprintln!("simulator startup failed: {err}");
        std::process::exit(1);
    }
}
