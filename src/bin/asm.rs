use std::env;
use std::io::{Read, Write};
use std::process;

use wlp4c::assembler::{scan_program, words_to_bytes, Assembler};

fn main() {
  if env::args().count() != 1 {
    eprintln!("usage: asm < program.asm > program.mips");
    process::exit(1);
  }

  let mut input = String::new();
  if let Err(err) = std::io::stdin().read_to_string(&mut input) {
    eprintln!("ERROR: cannot read standard input: {err}");
    process::exit(1);
  }

  let program = match scan_program(&input) {
    Ok(program) => program,
    Err(err) => {
      eprintln!("{err}");
      process::exit(1);
    }
  };

  match Assembler::new(program).assemble() {
    Ok(words) => {
      let mut stdout = std::io::stdout();
      if let Err(err) = stdout.write_all(&words_to_bytes(&words)) {
        eprintln!("ERROR: cannot write standard output: {err}");
        process::exit(1);
      }
    }
    Err(err) => {
      eprintln!("{err}");
      process::exit(2);
    }
  }
}
