use biu::Biu;
use clap::Parser;

fn main() {
    let cli = Biu::parse();
    if cli.options.verbose {
        biu::system::enable_verbose();
    }
    if cli.options.quiet {
        biu::system::enable_quiet();
    }
    let result = match &cli.command {
        Some(x) => x.run(&cli),
        None => cli.build(),
    };
    if let Err(e) = result {
        e.print();
        std::process::exit(1);
    }
}
