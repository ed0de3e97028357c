fn main() {
    if let Err(e) = classroom_seed::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
