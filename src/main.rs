fn main() {
    #[cfg(feature = "cli")]
    oxibrain::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("oxibrain: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
