//! Subnetter binary.

fn main() -> eyre::Result<()> {
    subnetter_cli::run()
}
