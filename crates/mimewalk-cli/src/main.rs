//! `mimewalk` - Inspect email messages from the command line
//!
//! Prints MIME transcripts, plain text, the displayable body, an outline of
//! the part tree, or a JSON report, and can save attachments to disk.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod tree;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use mimewalk::visitor::Attachment;
use mimewalk::{Config, DEFAULT_MAX_DEPTH, Message, walk_message};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tree::TreePrinter;

/// Walk the MIME tree of an email message.
#[derive(Debug, Parser)]
#[command(name = "mimewalk", version, about)]
struct Args {
    /// Message file; reads stdin when absent or `-`.
    file: Option<PathBuf>,

    /// What to print.
    #[arg(short, long, value_enum, default_value_t = Output::Transcript)]
    output: Output,

    /// Write every attachment into this directory.
    #[arg(long, value_name = "DIR")]
    save_attachments: Option<PathBuf>,

    /// Deepest container nesting accepted before the walk fails.
    #[arg(long, env = "MIMEWALK_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Charset for text parts that declare none.
    #[arg(long, env = "MIMEWALK_DEFAULT_CHARSET")]
    default_charset: Option<String>,

    /// Charset tried when a declared charset fails to decode.
    #[arg(long, env = "MIMEWALK_FALLBACK_CHARSET")]
    fallback_charset: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Reconstructed MIME transcript.
    Transcript,
    /// Concatenated plain-text leaves.
    Plain,
    /// Displayable body, HTML when available.
    Body,
    /// One line per attachment.
    Attachments,
    /// Indented outline of the part tree.
    Tree,
    /// Full extraction as JSON.
    Json,
}

impl Args {
    fn config(&self) -> Config {
        let mut builder = Config::builder().max_depth(self.max_depth);
        if let Some(charset) = &self.default_charset {
            builder = builder.default_charset(charset);
        }
        if let Some(charset) = &self.fallback_charset {
            builder = builder.fallback_charset(charset);
        }
        builder.build()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mimewalk=info,mimewalk_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = args.config();
    let raw = read_input(args.file.as_deref())?;
    debug!(bytes = raw.len(), ?config, "read message");

    let rendered = render(&raw, args.output, &config)?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .context("Failed to write output")?;
    if !rendered.ends_with('\n') {
        writeln!(stdout).context("Failed to write output")?;
    }

    if let Some(dir) = &args.save_attachments {
        let extraction = mimewalk::extract_parts_with(&raw, &config)?;
        let written = save_attachments(dir, &extraction.attachments)?;
        info!(count = written.len(), dir = %dir.display(), "saved attachments");
    }

    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut raw = Vec::new();
            io::stdin()
                .read_to_end(&mut raw)
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}

fn render(raw: &[u8], output: Output, config: &Config) -> Result<String> {
    let rendered = match output {
        Output::Transcript => mimewalk::extract_plain_text_with(raw, config)?.transcript,
        Output::Plain => mimewalk::extract_plain_text_with(raw, config)?.plain_text,
        Output::Body => mimewalk::extract_parts_with(raw, config)?.body,
        Output::Attachments => {
            let extraction = mimewalk::extract_parts_with(raw, config)?;
            extraction
                .attachments
                .iter()
                .enumerate()
                .map(|(index, attachment)| {
                    format!(
                        "{}\t{}\t{}\n",
                        attachment_name(index, attachment),
                        attachment.media_type(),
                        attachment.size()
                    )
                })
                .collect()
        }
        Output::Tree => {
            let message = Message::parse(raw);
            let mut tree = TreePrinter::new();
            walk_message(&message, &mut tree, config)?;
            tree.output().to_string()
        }
        Output::Json => {
            let extraction = mimewalk::extract_parts_with(raw, config)?;
            serde_json::to_string_pretty(&extraction).context("Failed to serialize extraction")?
        }
    };
    Ok(rendered)
}

/// File name for an attachment, stripped of path components.
fn attachment_name(index: usize, attachment: &Attachment) -> String {
    let sanitized = attachment
        .filename()
        .map(|name| {
            name.rsplit(['/', '\\'])
                .next()
                .unwrap_or_default()
                .chars()
                .filter(|c| !c.is_control())
                .collect::<String>()
        })
        .filter(|name| !name.is_empty() && name != "." && name != "..");
    sanitized.unwrap_or_else(|| format!("attachment-{}", index + 1))
}

fn save_attachments(dir: &Path, attachments: &[Attachment]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::with_capacity(attachments.len());
    for (index, attachment) in attachments.iter().enumerate() {
        let mut path = dir.join(attachment_name(index, attachment));
        if written.contains(&path) {
            path = dir.join(format!("{}-{}", index + 1, attachment_name(index, attachment)));
        }
        std::fs::write(&path, &attachment.data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), bytes = attachment.size(), "saved attachment");
        written.push(path);
    }
    Ok(written)
}
