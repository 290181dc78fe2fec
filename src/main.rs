//! Interactive RPL calculator on stdin and stdout.
//!
//! ```ignore
//! echo '1 2 +' | rplish
//! ```

fn main() {
    #[cfg(feature = "tracing-subscriber")]
    tracing_subscriber::fmt::init();

    let config = match rplish::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr().lock();

    rplish::repl(stdin, &mut stdout, &mut stderr, &config).expect("unexpected I/O error");
}
