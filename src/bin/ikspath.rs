/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::fs::File;
use std::io::Read;
use std::io::stdin;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ikstream::Document;
use ikstream::ParseError;
use ikstream::StreamParser;
use ikstream::XPath;
use ikstream::constants;

/// Applies a path expression to every top level element of an XML stream.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path expression, like `message[@type='chat']/body`
    expression: String,

    /// XML file to process, standard input if not given
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Print only the text of the matched elements
    #[arg(short, long)]
    text: bool,

    /// Also apply the expression to the streaming root when it opens
    #[arg(short, long)]
    root: bool,
}

enum IkspathError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl From<std::io::Error> for IkspathError {
    fn from(err: std::io::Error) -> Self {
        IkspathError::Io(err)
    }
}

impl From<ParseError> for IkspathError {
    fn from(err: ParseError) -> Self {
        IkspathError::Parse(err)
    }
}

struct Printer<'p> {
    path: &'p XPath,
    text: bool,
    root: bool,
    nr_matches: usize,
}

impl Printer<'_> {
    fn print(&mut self, element: Document) {
        let top = element.root();
        let is_stream_root = top.name() == constants::STREAM_TAG
            && top.namespace() == constants::XMLNS_STREAM
            && top.children().next().is_none();
        if is_stream_root && !self.root {
            return;
        }
        for found in self.path.apply(element.root()) {
            self.nr_matches += 1;
            if self.text {
                println!("{}", found.text());
            } else {
                println!("{found}");
            }
        }
    }
}

fn process(args: &Args, path: &XPath, input: &mut dyn Read) -> Result<usize, IkspathError> {
    let mut parser = StreamParser::new();
    let mut printer = Printer {
        path,
        text: args.text,
        root: args.root,
        nr_matches: 0,
    };
    let mut handler = |element: Document| printer.print(element);

    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let bytes_read = input.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        parser.feed(&mut handler, &buffer[..bytes_read])?;
    }
    parser.finish()?;
    Ok(printer.nr_matches)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();

    let path = match XPath::new(&args.expression) {
        Ok(path) => path,
        Err(err) => {
            error!("{}", err);
            error!("  {}", args.expression);
            error!("  {:>width$}", "^", width = err.position + 1);
            return ExitCode::FAILURE;
        }
    };

    let result = match &args.file {
        Some(file) => match File::open(file) {
            Ok(mut f) => process(&args, &path, &mut f),
            Err(err) => Err(IkspathError::Io(err)),
        },
        None => process(&args, &path, &mut stdin()),
    };

    match result {
        Ok(nr_matches) => {
            info!(nr_matches, "done");
            ExitCode::SUCCESS
        }
        Err(IkspathError::Io(err)) => {
            error!("IO Error: {}", err);
            ExitCode::FAILURE
        }
        Err(IkspathError::Parse(ParseError::NoMemory)) => {
            error!("Error: not enough memory");
            ExitCode::FAILURE
        }
        Err(IkspathError::Parse(ParseError::BadXml {
            location,
            description,
        })) => {
            error!("Syntax error at {}: {}", location, description);
            ExitCode::FAILURE
        }
    }
}
