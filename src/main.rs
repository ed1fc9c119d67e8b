//! authorage CLI binary.

use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use env_logger::{Builder, Env};

use authorage::cli::{self, CommandRouter};
use authorage::formats::{DEFAULT_FORMAT, StreamFactoryRegistry};

fn main() {
    Builder::from_env(Env::new().filter_or("AUTHORAGE_LOG", "warn"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let formats = Arc::new(StreamFactoryRegistry::with_default_formats());
    let registry = match cli::default_registry(formats) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let router = CommandRouter::new(&registry, cli::CMD, DEFAULT_FORMAT);
    let code = router.route(&argv, &mut io::stdout().lock(), &mut io::stderr().lock());

    process::exit(code);
}
