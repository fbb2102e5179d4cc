/*
** This file is a part of Iksemel (XML parser for Jabber/XMPP)
** Copyright (C) 2000-2025 Gurer Ozen
**
** Iksemel is free software: you can redistribute it and/or modify it
** under the terms of the GNU Lesser General Public License as
** published by the Free Software Foundation, either version 3 of
** the License, or (at your option) any later version.
*/

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::io::stdin;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing::error;
use tracing_subscriber::EnvFilter;

use ikstream::Document;
use ikstream::ParseError;
use ikstream::ParserConfig;
use ikstream::StreamHandler;
use ikstream::StreamParser;
use ikstream::constants;

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Checks the well-formedness of XML documents and streams.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files to check, standard input if none given
    files: Vec<PathBuf>,

    /// Overall statistics
    #[arg(short, long)]
    stat: bool,

    /// Tag counts
    #[arg(short, long)]
    count: bool,

    /// Expect a single document instead of a stream of elements
    #[arg(short, long)]
    document: bool,

    /// File read buffer size in bytes
    #[arg(short, long, default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer: usize,
}

#[derive(Default)]
struct Stats {
    nr_elements: usize,
    nr_tags: usize,
    nr_empty_tags: usize,
    max_depth: usize,
    text_size: usize,
    stream_opened: bool,
    stream_closed: bool,
    tag_map: BTreeMap<String, usize>,
}

impl Stats {
    fn record(&mut self, doc: &Document, depth: usize, root: bool) {
        let mut stack = vec![(doc.root(), depth + 1)];
        while let Some((element, level)) = stack.pop() {
            self.nr_tags += 1;
            self.max_depth = self.max_depth.max(level);
            if !root && element.children().next().is_none() {
                self.nr_empty_tags += 1;
            }
            *self
                .tag_map
                .entry(element.qualified_name().into_owned())
                .or_insert(0) += 1;
            self.text_size += element.text().len();
            stack.extend(element.elements().map(|child| (child, level + 1)));
        }
    }

    fn report(&self, do_stats: bool, do_tag_count: bool) {
        if do_stats {
            println!(
                "Top level elements: {}, tags: {}, empty element tags: {}, max depth: {}",
                self.nr_elements, self.nr_tags, self.nr_empty_tags, self.max_depth
            );
            println!("Total size of character data: {} bytes.", self.text_size);
            if self.stream_opened {
                println!(
                    "Stream root was opened{}.",
                    if self.stream_closed { " and closed" } else { "" }
                );
            }
        }
        if do_tag_count {
            println!("Tag counts:");
            for (tag, count) in &self.tag_map {
                println!("  {tag}: {count}");
            }
        }
    }
}

struct Handler {
    stats: Stats,
    streaming: bool,
    stream_open: bool,
}

impl Handler {
    fn is_stream_root(&self, element: &Document) -> bool {
        let root = element.root();
        self.streaming
            && !self.stream_open
            && root.name() == constants::STREAM_TAG
            && root.namespace() == constants::XMLNS_STREAM
    }
}

impl StreamHandler for Handler {
    fn handle_element(&mut self, element: Document) {
        if self.is_stream_root(&element) {
            self.stream_open = true;
            self.stats.stream_opened = true;
            self.stats.record(&element, 0, true);
            return;
        }
        self.stats.nr_elements += 1;
        self.stats.record(&element, usize::from(self.stream_open), false);
    }

    fn handle_stream_end(&mut self) {
        self.stream_open = false;
        self.stats.stream_closed = true;
    }
}

enum LintError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl From<std::io::Error> for LintError {
    fn from(err: std::io::Error) -> Self {
        LintError::Io(err)
    }
}

impl From<ParseError> for LintError {
    fn from(err: ParseError) -> Self {
        LintError::Parse(err)
    }
}

struct Linter {
    parser: StreamParser,
    streaming: bool,
    buffer_size: usize,
}

impl Linter {
    fn new(document: bool, buffer_size: usize) -> Self {
        let config = if document {
            ParserConfig::document()
        } else {
            ParserConfig::default()
        };
        Linter {
            parser: StreamParser::with_config(config),
            streaming: !document,
            buffer_size: buffer_size.max(1),
        }
    }

    fn parse(&mut self, input: &mut dyn Read, handler: &mut Handler) -> Result<(), LintError> {
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            let bytes_read = input.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            self.parser.feed(handler, &buffer[..bytes_read])?;
        }
        Ok(self.parser.finish()?)
    }

    fn lint(&mut self, name: &str, input: &mut dyn Read) -> Result<Stats, LintError> {
        self.parser.reset();
        let mut handler = Handler {
            stats: Stats::default(),
            streaming: self.streaming,
            stream_open: false,
        };
        debug!(name, "checking");
        self.parse(input, &mut handler)?;
        Ok(handler.stats)
    }
}

fn lint_one(linter: &mut Linter, args: &Args, name: &str, input: &mut dyn Read) -> bool {
    match linter.lint(name, input) {
        Ok(stats) => {
            stats.report(args.stat, args.count);
            true
        }
        Err(LintError::Io(err)) => {
            error!("Error reading '{}': {}", name, err);
            false
        }
        Err(LintError::Parse(ParseError::NoMemory)) => {
            error!("Memory allocation failed while parsing '{}'", name);
            false
        }
        Err(LintError::Parse(ParseError::BadXml {
            location,
            description,
        })) => {
            error!("Syntax error in '{}' at {}: {}", name, location, description);
            false
        }
    }
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
    let mut linter = Linter::new(args.document, args.buffer);

    if args.files.is_empty() {
        if !lint_one(&mut linter, &args, "stdin", &mut stdin()) {
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    for path in &args.files {
        let name = path.display().to_string();
        let ok = match File::open(path) {
            Ok(mut file) => lint_one(&mut linter, &args, &name, &mut file),
            Err(err) => {
                error!("Error opening '{}': {}", name, err);
                false
            }
        };
        if !ok {
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
