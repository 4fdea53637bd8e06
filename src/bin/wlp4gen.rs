use std::env;
use std::io::Read;
use std::process;

const WLP4_CFG: &str = include_str!("../../data/wlp4.cfg");

fn main() {
  if env::args().count() != 1 {
    eprintln!("usage: wlp4gen < typed-parse-tree");
    process::exit(1);
  }

  let cfg = match wlp4c::grammar::load_cfg(WLP4_CFG) {
    Ok(cfg) => cfg,
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

  let Some(tree) = wlp4c::tree::read_tree(&input, &cfg) else {
    eprintln!("ERROR: standard input does not hold a parse tree");
    process::exit(1);
  };

  print!("{}", wlp4c::codegen::generate(&tree));
}
