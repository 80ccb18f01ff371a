fn main() {
    if let Err(err) = xdsm_tikz::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
