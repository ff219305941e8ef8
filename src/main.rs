fn main() {
    if let Err(err) = ytfocus_lib::run() {
        log::error!("ytfocus failed: {err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
