fn main() {
    if let Err(e) = cocoprep::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
