use std::env;
use std::io::Read;
use std::process;

fn main() {
  if env::args().count() != 1 {
    eprintln!("usage: wlp4scan < source.wlp4");
    process::exit(1);
  }

  let mut source = String::new();
  if let Err(err) = std::io::stdin().read_to_string(&mut source) {
    eprintln!("ERROR: cannot read standard input: {err}");
    process::exit(1);
  }

  match wlp4c::scanner::scan(&source) {
    Ok(tokens) => {
      for token in tokens {
        println!("{token}");
      }
    }
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  }
}
