use std::env;
use std::fs;
use std::io::Read;
use std::process;

fn main() {
  let args: Vec<String> = env::args().collect();
  if args.len() != 2 {
    eprintln!("usage: wlp4parse <tables-file> < tokens");
    process::exit(1);
  }

  let blob = match fs::read_to_string(&args[1]) {
    Ok(blob) => blob,
    Err(err) => {
      eprintln!("ERROR: cannot read {}: {err}", args[1]);
      process::exit(1);
    }
  };
  let (cfg, tables) = match wlp4c::grammar::load_tables(&blob) {
    Ok(loaded) => loaded,
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  };

  let mut input = String::new();
  if let Err(err) = std::io::stdin().read_to_string(&mut input) {
    eprintln!("ERROR: cannot read standard input: {err}");
    process::exit(1);
  }

  // scanner output: alternating kind and lexeme words
  let mut words = input.split_whitespace();
  let mut pairs = Vec::new();
  while let (Some(kind), Some(lexeme)) = (words.next(), words.next()) {
    pairs.push((kind.to_string(), lexeme.to_string()));
  }

  match wlp4c::parser::parse(pairs, &cfg, &tables) {
    Ok(tree) => print!("{}", tree.preorder()),
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  }
}
