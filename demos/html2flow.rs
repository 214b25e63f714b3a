extern crate argparse;
extern crate html2flow;
use argparse::{ArgumentParser, StoreOption, StoreTrue};
use html2flow::config::{self, Config};
use std::io;
use std::io::Write;

fn translate<R>(input: R, conf: &Config, tree: bool) -> html2flow::Result<String>
where
    R: io::Read,
{
    if tree {
        // Dump the flow tree instead of serialising it.
        let flow = conf.flow_tree_from_read(input)?;
        Ok(format!("{:#?}", flow))
    } else {
        conf.string_from_read(input)
    }
}

fn main() {
    env_logger::init();

    let mut infile: Option<String> = None;
    let mut outfile: Option<String> = None;
    let mut fragment = false;
    let mut no_preserve = false;
    let mut tree = false;
    let mut rule: Option<String> = None;

    {
        let mut ap = ArgumentParser::new();
        ap.set_description("Convert HTML to a XAML flow document.");
        ap.refer(&mut infile).add_argument(
            "infile",
            StoreOption,
            "Input HTML file (default is standard input)",
        );
        ap.refer(&mut outfile).add_option(
            &["-o", "--output"],
            StoreOption,
            "Output file (default is standard output)",
        );
        ap.refer(&mut fragment).add_option(
            &["-f", "--fragment"],
            StoreTrue,
            "Convert as a pasted fragment instead of a whole document",
        );
        ap.refer(&mut no_preserve).add_option(
            &["--no-preserve"],
            StoreTrue,
            "Don't mark the output with xml:space=\"preserve\"",
        );
        ap.refer(&mut rule).add_option(
            &["--rule"],
            StoreOption,
            "Text to use for horizontal rules",
        );
        ap.refer(&mut tree)
            .add_option(&["--tree"], StoreTrue, "Print the flow tree for debugging");
        ap.parse_args_or_exit();
    }

    let mut conf = if fragment {
        config::fragment()
    } else {
        config::document()
    };
    conf = conf.preserve_whitespace(!no_preserve);
    if let Some(rule) = rule {
        conf = conf.horizontal_rule(rule);
    }

    let result = match infile {
        None => {
            let stdin = io::stdin();
            let result = translate(&mut stdin.lock(), &conf, tree);
            result
        }
        Some(name) => {
            let mut file = std::fs::File::open(name).expect("Tried to open file");
            translate(&mut file, &conf, tree)
        }
    };
    let data = match result {
        Ok(data) => data,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match outfile {
        None => {
            println!("{}", data);
        }
        Some(name) => {
            let mut file = std::fs::File::create(name).expect("Tried to create file");
            write!(file, "{}", data).unwrap();
        }
    };
}
