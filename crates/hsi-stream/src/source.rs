//! Line-oriented external source for hardware-driven mode.
//!
//! Reads newline-terminated integer records from a byte stream and maps
//! each one to a `"0"`/`"1"` label against a threshold.

use std::time::Duration;

use async_trait::async_trait;
use hsi_common::{Label, Payload, SourceError};
use hsi_config::SourceConfig;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;

use crate::producer::FrameSource;

/// Reader type produced by [`open_source`].
pub type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

#[derive(Debug, PartialEq, Eq)]
enum Record {
    Line(String),
    Oversized,
}

pub struct SerialSource<R> {
    address: String,
    reader: BufReader<R>,
    pending: Vec<u8>,
    discarding: bool,
    max_line_length: usize,
    threshold: i64,
    default_label: Label,
    read_timeout: Duration,
    poll_delay: Duration,
}

impl<R: AsyncRead + Unpin + Send> SerialSource<R> {
    pub fn new(reader: R, config: &SourceConfig) -> Self {
        Self {
            address: config.address.clone(),
            reader: BufReader::new(reader),
            pending: Vec::new(),
            discarding: false,
            max_line_length: config.max_line_length,
            threshold: config.threshold,
            default_label: config.default_label,
            read_timeout: config.read_timeout(),
            poll_delay: config.poll_delay(),
        }
    }

    /// Map one record to a label. Unparseable records get the default label.
    pub fn label_for(&self, record: &str) -> Label {
        match record.trim().parse::<i64>() {
            Ok(reading) => Label::from_reading(reading, self.threshold),
            Err(e) => {
                tracing::warn!(
                    source = %self.address,
                    record = %record,
                    error = %e,
                    label = %self.default_label,
                    "Unparseable record, using default label"
                );
                self.default_label
            }
        }
    }

    /// Read up to the next newline. `None` at end of stream.
    ///
    /// Cancel safe: bytes are moved into `pending` before the next await,
    /// so a timed-out read resumes where it stopped.
    async fn read_record(&mut self) -> std::io::Result<Option<Record>> {
        loop {
            let available = self.reader.fill_buf().await?;

            if available.is_empty() {
                if self.discarding {
                    self.discarding = false;
                    return Ok(Some(Record::Oversized));
                }
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_line()));
            }

            match available.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    if !self.discarding {
                        self.pending.extend_from_slice(&available[..end]);
                    }
                    self.reader.consume(end + 1);

                    if self.discarding || self.pending.len() > self.max_line_length {
                        self.discarding = false;
                        self.pending.clear();
                        return Ok(Some(Record::Oversized));
                    }
                    return Ok(Some(self.take_line()));
                }
                None => {
                    let len = available.len();
                    if !self.discarding {
                        self.pending.extend_from_slice(available);
                        if self.pending.len() > self.max_line_length {
                            self.discarding = true;
                            self.pending.clear();
                        }
                    }
                    self.reader.consume(len);
                }
            }
        }
    }

    fn take_line(&mut self) -> Record {
        let bytes = std::mem::take(&mut self.pending);
        Record::Line(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> FrameSource for SerialSource<R> {
    fn name(&self) -> &str {
        &self.address
    }

    async fn next_payload(&mut self) -> Result<Payload, SourceError> {
        loop {
            match tokio::time::timeout(self.read_timeout, self.read_record()).await {
                Ok(Ok(Some(Record::Line(record)))) => {
                    return Ok(Payload::Label(self.label_for(&record)))
                }
                Ok(Ok(Some(Record::Oversized))) => {
                    tracing::warn!(
                        source = %self.address,
                        max_line_length = self.max_line_length,
                        "Oversized record, using default label"
                    );
                    return Ok(Payload::Label(self.default_label));
                }
                Ok(Ok(None)) => return Err(SourceError::Closed),
                Ok(Err(e)) => return Err(SourceError::Io(e)),
                Err(_) => tokio::time::sleep(self.poll_delay).await,
            }
        }
    }
}

/// Open the configured address: `tcp://host:port` for a serial-over-TCP
/// bridge, anything else as a device or file path.
pub async fn open_source(config: &SourceConfig) -> Result<SerialSource<BoxedReader>, SourceError> {
    let address = config.address.clone();
    let open_err = |source: std::io::Error| SourceError::Open {
        address: address.clone(),
        source,
    };

    let reader: BoxedReader = match config.address.strip_prefix("tcp://") {
        Some(remote) => Box::new(TcpStream::connect(remote).await.map_err(open_err)?),
        None => Box::new(
            tokio::fs::File::open(&config.address)
                .await
                .map_err(open_err)?,
        ),
    };

    tracing::info!(
        source = %config.address,
        baud_rate = config.baud_rate,
        read_timeout_ms = config.read_timeout_ms,
        threshold = config.threshold,
        "Opened external source"
    );
    Ok(SerialSource::new(reader, config))
}
