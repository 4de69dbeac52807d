//! Newline-delimited JSON sentiment feed read on a background thread.

use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

use tracing::{debug, info, warn};

use crate::error::FeedError;
use crate::sentiment::SentimentSignal;

/// Read signals from `reader` until EOF or until the receiver is gone.
/// Lines that fail to parse are logged and skipped. Returns how many
/// signals were delivered.
pub fn pump<R: BufRead>(reader: R, tx: &mpsc::Sender<SentimentSignal>) -> Result<usize, FeedError> {
    let mut delivered = 0;
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        match SentimentSignal::parse_json(text, i + 1) {
            Ok(signal) => {
                debug!(sentiment = %signal.sentiment, score = signal.score, "feed signal");
                if tx.send(signal).is_err() {
                    break;
                }
                delivered += 1;
            }
            Err(e) => warn!(error = %e, "skipping feed line"),
        }
    }
    Ok(delivered)
}

/// Spawn a detached thread pumping `reader` into a fresh channel.
pub fn spawn_reader<R>(reader: R) -> mpsc::Receiver<SentimentSignal>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("sentiment-feed".into())
        .spawn(move || match pump(reader, &tx) {
            Ok(n) => info!(signals = n, "sentiment feed closed"),
            Err(e) => warn!(error = %e, "sentiment feed stopped"),
        });
    if let Err(e) = spawned {
        warn!(error = %e, "could not start sentiment feed thread");
    }
    rx
}

pub fn spawn_stdin() -> mpsc::Receiver<SentimentSignal> {
    info!("reading sentiment signals from stdin");
    spawn_reader(std::io::BufReader::new(std::io::stdin()))
}

/// Everything queued since the last frame collapses to the newest signal.
pub fn drain_latest(rx: &mpsc::Receiver<SentimentSignal>) -> Option<SentimentSignal> {
    let mut latest = None;
    while let Ok(signal) = rx.try_recv() {
        latest = Some(signal);
    }
    latest
}
