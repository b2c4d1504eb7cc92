//! Line-oriented command source (stdin in the CLI).

use core_events::{AsyncEventSource, CommandEvent, Event, emit};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{debug, info, warn};

/// Map one input line to a command. Blank lines and unknown words yield `None`.
pub fn parse_command(line: &str) -> Option<CommandEvent> {
    match line.trim() {
        ":w" | "save" => Some(CommandEvent::Save),
        ":export" | "export" => Some(CommandEvent::Export),
        ":q" | "quit" => Some(CommandEvent::Quit),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExitReason {
    ChannelClosed,
    StreamEnded,
    StreamError,
}

impl ExitReason {
    fn as_str(&self) -> &'static str {
        match self {
            ExitReason::ChannelClosed => "channel_closed",
            ExitReason::StreamEnded => "stream_ended",
            ExitReason::StreamError => "stream_error",
        }
    }
}

pub struct CommandLineSource<R> {
    reader: R,
}

impl CommandLineSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> CommandLineSource<R>
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    async fn run(self, tx: Sender<Event>) {
        info!(target: "input.command", "command_source_started");
        let mut lines = LinesStream::new(self.reader.lines());
        let mut error_kind: Option<io::ErrorKind> = None;
        let reason = loop {
            let next = tokio::select! {
                biased;
                _ = tx.closed() => break ExitReason::ChannelClosed,
                next = lines.next() => next,
            };
            let line = match next {
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    error_kind = Some(err.kind());
                    break ExitReason::StreamError;
                }
                None => break ExitReason::StreamEnded,
            };
            match parse_command(&line) {
                Some(cmd) => {
                    debug!(target: "input.command", command = ?cmd, "command_parsed");
                    if !emit(&tx, Event::Command(cmd)).await {
                        break ExitReason::ChannelClosed;
                    }
                }
                None if line.trim().is_empty() => {}
                None => {
                    warn!(target: "input.command", len = line.len(), "unknown_command");
                    eprintln!("unknown command (try :w, :export, :q)");
                }
            }
        };
        if let Some(kind) = error_kind {
            warn!(target: "input.command", error_kind = ?kind, "command_source_stream_error");
        }
        info!(target: "input.command", reason = reason.as_str(), "command_source_stopped");
    }
}

impl<R> AsyncEventSource for CommandLineSource<R>
where
    R: AsyncBufRead + Send + Unpin + 'static,
{
    fn name(&self) -> &'static str {
        "command_line"
    }

    fn spawn(self: Box<Self>, tx: Sender<Event>) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }
}
