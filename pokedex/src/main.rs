fn main() {
    if let Err(e) = pokedex_lib::run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
