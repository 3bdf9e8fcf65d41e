use ansi_term::Style;
use regtape::Compiler;
use std::fs;
use std::path::PathBuf;

const USAGE: &str = "\
Usage: regtape [OPTIONS] <INPUT>

Options:
  -o, --output <FILE>  Write the program to FILE instead of stdout
  --listing            Print the optimized statements to stderr
  -h, --help           Print this help message

Set RUST_LOG=regtape=debug to trace the compiler stages.";

#[derive(Debug)]
struct Options {
    input: PathBuf,
    output: Option<PathBuf>,
    listing: bool,
}

impl Options {
    fn parse() -> Result<Options, String> {
        let mut args = pico_args::Arguments::from_env();
        if args.contains(["-h", "--help"]) {
            println!("{}", USAGE);
            std::process::exit(0);
        }
        let output = args
            .opt_value_from_str::<_, PathBuf>(["-o", "--output"])
            .map_err(|e| e.to_string())?;
        let listing = args.contains("--listing");
        let input = args
            .free_from_str::<PathBuf>()
            .map_err(|e| e.to_string())?;
        let rest = args.finish();
        if !rest.is_empty() {
            return Err(format!("unexpected arguments: {:?}", rest));
        }
        Ok(Options {
            input,
            output,
            listing,
        })
    }
}

pub fn main() {
    let options = match Options::parse() {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("{}\n\n{}", Style::new().bold().paint(msg), USAGE);
            std::process::exit(1);
        }
    };
    if let Err(msg) = run(&options) {
        eprintln!("{}", Style::new().bold().paint(msg));
        std::process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), String> {
    let source = fs::read_to_string(&options.input)
        .map_err(|e| format!("{}: {}", options.input.display(), e))?;
    log::info!("compiling {}", options.input.display());
    let compiler = Compiler::new(&source)
        .map_err(|e| format!("{}: {}: {}", options.input.display(), e.stage(), e))?;
    if options.listing {
        eprint!("{}", compiler.listing());
    }
    match &options.output {
        Some(path) => fs::write(path, compiler.program())
            .map_err(|e| format!("{}: {}", path.display(), e))?,
        None => println!("{}", compiler.program()),
    }
    Ok(())
}
