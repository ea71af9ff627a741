use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc,
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use glass_model::OutputEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Pipe {
    Stdout,
    Stderr,
}

/// Spawn a reader that forwards every line of `reader` as a data event.
///
/// The reader stops at EOF, on a read error, when the consumer goes away, or as soon as
/// `abandon` fires, even if it is parked on a full channel.
pub(crate) fn spawn_reader<R>(
    set: &mut JoinSet<()>,
    reader: R,
    pipe: Pipe,
    tx: mpsc::Sender<OutputEvent>,
    abandon: CancellationToken,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    set.spawn(drain(reader, pipe, tx, abandon));
}

async fn drain<R>(reader: R, pipe: Pipe, tx: mpsc::Sender<OutputEvent>, abandon: CancellationToken)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            _ = abandon.cancelled() => break,
            read = reader.read_until(b'\n', &mut buf) => read,
        };
        match read {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                trace!(target: "glass.exec", ?pipe, error = %e, "pipe read failed");
                break;
            }
        }

        let line = decode_line(&buf);
        let event = match pipe {
            Pipe::Stdout => OutputEvent::stdout(line),
            Pipe::Stderr => OutputEvent::stderr(line),
        };
        tokio::select! {
            biased;
            _ = abandon.cancelled() => break,
            sent = tx.send(event) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
    trace!(target: "glass.exec", ?pipe, "reader done");
}

/// Lossy UTF-8 with the trailing `\n` or `\r\n` removed.
fn decode_line(buf: &[u8]) -> String {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}
