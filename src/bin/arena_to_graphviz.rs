//! Run RPL from stdin, then render the arena as Graphviz.
//!
//! Usage:
//!
//! ```ignore
//! echo '{ 1 2 } 3 DUP' | arena_to_graphviz | dot -T png >output.png
//! ```

use std::io::{Read, Write};

fn main() {
    #[cfg(feature = "tracing-subscriber")]
    tracing_subscriber::fmt::init();

    let config = rplish::Config::from_env().expect("invalid configuration");
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .expect("could not read stdin");

    let rt = rplish::Runtime::new(&config);
    if let Err(e) = rplish::repl::execute(&rt, &input) {
        eprintln!("error: {e}");
    }
    let graph = rplish::data::render_arena(&rt);
    std::io::stdout()
        .write_all(&graph)
        .expect("could not write graph");
}
