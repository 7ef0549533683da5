use signalbox::*;

use std::path::PathBuf;
use structopt::StructOpt;

/// Signalbox -- railway signal interlocking
#[derive(StructOpt, Debug)]
#[structopt(name = "signalbox")]
struct Opt {
    /// Verbose mode (-v, -vv)
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: u8,

    /// Track layout file in the signalbox layout format
    #[structopt(parse(from_os_str))]
    layout: PathBuf,

    /// Event script in the signalbox dispatch format
    #[structopt(parse(from_os_str))]
    dispatch: PathBuf,

    /// Output JSON history file
    #[structopt(short = "j", long = "json", parse(from_os_str))]
    json: Option<PathBuf>,
}

fn run(opt: &Opt) -> AppResult<()> {
    // Layout
    let layout = get_layout(&opt.layout)?;
    if opt.verbose >= 2 {
        println!("Layout:");
        println!("  Signals:");
        for x in &layout.signals {
            println!("    * {:?}", x);
        }
        println!("  Closures:");
        for x in &layout.closures {
            println!("    * {:?}", x);
        }
    }

    let mut store = railway::store::MemoryStore::from_layout(&layout)?;

    // Dispatch
    let dispatch = get_dispatch(&opt.dispatch)?;
    if opt.verbose >= 1 {
        println!("Dispatch:");
        for x in &dispatch.actions {
            println!("  - {:?}", x);
        }
        println!();
    }

    // Eval -> history
    let history = evaluate_dispatch(&mut store, &dispatch);

    // Print
    println!("# Interlocking history:");
    for x in &history.outputs {
        println!("> {:?}", x);
    }

    if let Some(ref json) = opt.json {
        use std::fs::File;
        use std::io::BufWriter;
        let file = File::create(json)?;
        let mut writer = BufWriter::new(file);
        output::json::json_history(&history, &mut writer)?;
    }

    Ok(())
}

pub fn main() {
    let opt = Opt::from_args();
    match run(&opt) {
        Ok(()) => {}
        Err(e) => {
            println!("Error:\n{}", e.as_fail());
            std::process::exit(1);
        }
    }
}
