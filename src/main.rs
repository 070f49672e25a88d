fn main() {
    if let Err(err) = ghfs::cli::run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
