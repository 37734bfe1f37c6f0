//! Regenerates `.travis.yml` in the given directory.

use clap::Parser;
use conservative_rb::ci::write_travis_yml;

use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Args {
  /// Number of test groups per compiler.
  builder_count: usize,

  #[arg(long, default_value = ".")]
  dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt::init();
  let args = Args::parse();
  let path = write_travis_yml(&args.dir, args.builder_count)?;
  println!("{}", path.display());
  Ok(())
}
