//! Encoder sessions.
//!
//! An [`EncoderSession`] wraps one [`FrameEncoder`] for the lifetime of a
//! single conversion: configure, submit frames, flush once, assemble. The
//! encoder reports chunks and errors through a [`ChunkSink`]; the session
//! drains that channel after every call that can produce output.

use bytes::Bytes;
use frameforge_common::{Error, Result};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::assembler::{ChunkAssembler, ChunkType, EncodedChunk};
use crate::context::ConversionContext;
use crate::host::{EncoderSettings, FrameEncoder, Timestamped};

/// Something an encoder reports back to its session.
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderEvent {
    /// A compressed fragment of output.
    Chunk(EncodedChunk),
    /// The encoder failed asynchronously.
    Error(String),
}

/// Receiving half of an encoder's event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<EncoderEvent>;

/// Create a connected sink and receiver.
pub fn chunk_channel() -> (ChunkSink, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ChunkSink {
            tx,
            next_sequence: 0,
        },
        rx,
    )
}

/// Output side handed to an encoder.
///
/// Assigns sequence numbers in emission order. Events sent after the
/// session has gone away are dropped.
#[derive(Debug)]
pub struct ChunkSink {
    tx: mpsc::UnboundedSender<EncoderEvent>,
    next_sequence: u64,
}

impl ChunkSink {
    /// Emit one encoded chunk.
    pub fn emit(&mut self, timestamp_us: i64, chunk_type: ChunkType, data: impl Into<Bytes>) {
        let chunk = EncodedChunk {
            sequence: self.next_sequence,
            timestamp_us,
            chunk_type,
            data: data.into(),
        };
        self.next_sequence += 1;
        let _ = self.tx.send(EncoderEvent::Chunk(chunk));
    }

    /// Report an asynchronous encoder failure.
    pub fn error(&self, message: impl Into<String>) {
        let _ = self.tx.send(EncoderEvent::Error(message.into()));
    }

    /// Number of chunks emitted so far.
    pub fn emitted(&self) -> u64 {
        self.next_sequence
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    Flushing,
    Closed,
}

/// One configured encoder plus the assembler collecting its output.
pub struct EncoderSession<C, F>
where
    C: EncoderSettings + 'static,
    F: Timestamped + Send + 'static,
{
    id: Uuid,
    codec: String,
    encoder: Box<dyn FrameEncoder<Config = C, Frame = F>>,
    events: EventReceiver,
    assembler: ChunkAssembler,
    frames_submitted: u64,
    last_timestamp: Option<i64>,
    state: SessionState,
}

impl<C, F> EncoderSession<C, F>
where
    C: EncoderSettings + 'static,
    F: Timestamped + Send + 'static,
{
    /// Check and apply `config`, returning a session ready for frames.
    ///
    /// The encoder is closed on every failure, including cancellation while
    /// the support query is pending.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedCodec`] if the encoder rejects the configuration,
    /// [`Error::Cancelled`] if `ctx` is cancelled first.
    pub async fn open(
        mut encoder: Box<dyn FrameEncoder<Config = C, Frame = F>>,
        events: EventReceiver,
        config: &C,
        ctx: &ConversionContext,
    ) -> Result<Self> {
        let codec = config.codec().to_string();

        let supported = ctx
            .guard(async { Ok(encoder.is_config_supported(config).await) })
            .await;
        let supported = match supported {
            Ok(supported) => supported,
            Err(e) => {
                encoder.close();
                return Err(e);
            }
        };

        if !supported {
            encoder.close();
            return Err(Error::unsupported_codec(
                codec,
                "encoder does not support this configuration",
            ));
        }

        if let Err(e) = encoder.configure(config) {
            encoder.close();
            return Err(match e {
                e @ Error::UnsupportedCodec { .. } => e,
                other => Error::unsupported_codec(codec, other.to_string()),
            });
        }

        let id = Uuid::new_v4();
        debug!(session = %id, codec = %codec, "Encoder session opened");

        Ok(Self {
            id,
            codec,
            encoder,
            events,
            assembler: ChunkAssembler::new(),
            frames_submitted: 0,
            last_timestamp: None,
            state: SessionState::Open,
        })
    }

    /// Session identifier for logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Codec the session was configured with.
    pub fn codec(&self) -> &str {
        &self.codec
    }

    /// Frames accepted so far.
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    /// Chunks collected so far.
    pub fn chunk_count(&self) -> usize {
        self.assembler.chunk_count()
    }

    /// Submit one frame.
    ///
    /// Timestamps must not decrease across calls.
    pub fn submit(&mut self, frame: F) -> Result<()> {
        if self.state != SessionState::Open {
            return Err(Error::encode("frame submitted after flush"));
        }

        let ts = frame.timestamp_us();
        if let Some(last) = self.last_timestamp {
            if ts < last {
                return Err(Error::encode(format!(
                    "timestamp {ts} precedes previous frame at {last}"
                )));
            }
        }

        self.encoder.encode(frame)?;
        self.last_timestamp = Some(ts);
        self.frames_submitted += 1;
        self.drain()
    }

    /// Flush the encoder and collect everything it still had buffered.
    ///
    /// May be called once; the encoder is closed afterwards.
    ///
    /// # Errors
    ///
    /// [`Error::EncodeFailure`] if the encoder reported an error.
    pub async fn flush(&mut self) -> Result<()> {
        if self.state != SessionState::Open {
            return Err(Error::encode("encoder session already flushed"));
        }
        self.state = SessionState::Flushing;
        self.encoder.flush().await?;
        self.drain()?;

        self.encoder.close();
        self.state = SessionState::Closed;
        Ok(())
    }

    /// Concatenate everything the encoder emitted.
    ///
    /// # Errors
    ///
    /// [`Error::AssemblyFailure`] if the session has not been flushed or
    /// the encoder produced no chunks at all.
    pub fn assemble(mut self) -> Result<Bytes> {
        if self.state != SessionState::Closed {
            return Err(Error::assembly("encoder session assembled before flush"));
        }
        if self.assembler.is_empty() {
            return Err(Error::assembly("encoder produced no output"));
        }

        let assembler = std::mem::take(&mut self.assembler);
        debug!(
            session = %self.id,
            frames = self.frames_submitted,
            chunks = assembler.chunk_count(),
            bytes = assembler.byte_len(),
            "Encoder session assembled"
        );
        Ok(assembler.assemble())
    }

    /// [`flush`](Self::flush) then [`assemble`](Self::assemble).
    pub async fn finish(mut self) -> Result<Bytes> {
        self.flush().await?;
        self.assemble()
    }

    fn drain(&mut self) -> Result<()> {
        loop {
            match self.events.try_recv() {
                Ok(EncoderEvent::Chunk(chunk)) => self.assembler.push(chunk)?,
                Ok(EncoderEvent::Error(message)) => return Err(Error::encode(message)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
    }
}

impl<C, F> Drop for EncoderSession<C, F>
where
    C: EncoderSettings + 'static,
    F: Timestamped + Send + 'static,
{
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            warn!(session = %self.id, "Encoder session abandoned, closing encoder");
            self.encoder.close();
            self.assembler.discard();
            self.state = SessionState::Closed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct TestConfig(&'static str);

    impl EncoderSettings for TestConfig {
        fn codec(&self) -> &str {
            self.0
        }
    }

    struct TestFrame(i64);

    impl Timestamped for TestFrame {
        fn timestamp_us(&self) -> i64 {
            self.0
        }
    }

    #[derive(Default)]
    struct Counters {
        flushes: AtomicUsize,
        closes: AtomicUsize,
    }

    /// Echoes each frame's timestamp as a chunk, holding the last one until flush.
    struct EchoEncoder {
        sink: ChunkSink,
        pending: Option<i64>,
        supported: bool,
        fail_on: Option<i64>,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl FrameEncoder for EchoEncoder {
        type Config = TestConfig;
        type Frame = TestFrame;

        async fn is_config_supported(&self, _config: &TestConfig) -> bool {
            self.supported
        }

        fn configure(&mut self, _config: &TestConfig) -> Result<()> {
            Ok(())
        }

        fn encode(&mut self, frame: TestFrame) -> Result<()> {
            if self.fail_on == Some(frame.0) {
                self.sink.error("bitstream overflow");
                return Ok(());
            }
            if let Some(prev) = self.pending.replace(frame.0) {
                self.sink
                    .emit(prev, ChunkType::Delta, prev.to_le_bytes().to_vec());
            }
            Ok(())
        }

        async fn flush(&mut self) -> Result<()> {
            self.counters.flushes.fetch_add(1, Ordering::SeqCst);
            if let Some(prev) = self.pending.take() {
                self.sink
                    .emit(prev, ChunkType::Delta, prev.to_le_bytes().to_vec());
            }
            Ok(())
        }

        fn close(&mut self) {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn idle() -> ConversionContext {
        ConversionContext::new()
    }

    fn encoder(supported: bool, fail_on: Option<i64>) -> (EchoEncoder, EventReceiver, Arc<Counters>) {
        let (sink, rx) = chunk_channel();
        let counters = Arc::new(Counters::default());
        (
            EchoEncoder {
                sink,
                pending: None,
                supported,
                fail_on,
                counters: counters.clone(),
            },
            rx,
            counters,
        )
    }

    #[tokio::test]
    async fn test_session_assembles_all_frames() {
        let (enc, rx, counters) = encoder(true, None);
        let mut session = EncoderSession::open(Box::new(enc), rx, &TestConfig("pcm"), &idle())
            .await
            .unwrap();
        for ts in [0, 10, 10, 20] {
            session.submit(TestFrame(ts)).unwrap();
        }
        assert_eq!(session.frames_submitted(), 4);
        assert_eq!(session.codec(), "pcm");
        assert!(!session.id().is_nil());

        let out = session.finish().await.unwrap();
        assert_eq!(out.len(), 4 * 8);
        assert_eq!(&out[24..], &20i64.to_le_bytes());
        assert_eq!(counters.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsupported_config_rejected() {
        let (enc, rx, counters) = encoder(false, None);
        let err = EncoderSession::open(Box::new(enc), rx, &TestConfig("hvc1.1.6.L93.B0"), &idle())
            .await
            .err()
            .unwrap();
        match err {
            Error::UnsupportedCodec { codec, .. } => assert_eq!(codec, "hvc1.1.6.L93.B0"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_open_closes_encoder() {
        let (enc, rx, counters) = encoder(true, None);
        let ctx = ConversionContext::new();
        ctx.cancellation.cancel();
        let err = EncoderSession::open(Box::new(enc), rx, &TestConfig("pcm"), &ctx)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decreasing_timestamp_rejected() {
        let (enc, rx, _) = encoder(true, None);
        let mut session = EncoderSession::open(Box::new(enc), rx, &TestConfig("pcm"), &idle())
            .await
            .unwrap();
        session.submit(TestFrame(100)).unwrap();
        assert!(matches!(
            session.submit(TestFrame(50)),
            Err(Error::EncodeFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_error_channel_surfaces_as_encode_failure() {
        let (enc, rx, counters) = encoder(true, Some(2));
        let mut session = EncoderSession::open(Box::new(enc), rx, &TestConfig("pcm"), &idle())
            .await
            .unwrap();
        session.submit(TestFrame(1)).unwrap();
        let err = session.submit(TestFrame(2)).unwrap_err();
        assert!(matches!(err, Error::EncodeFailure(ref m) if m == "bitstream overflow"));

        drop(session);
        assert_eq!(counters.flushes.load(Ordering::SeqCst), 0);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flush_only_once() {
        let (enc, rx, counters) = encoder(true, None);
        let mut session = EncoderSession::open(Box::new(enc), rx, &TestConfig("pcm"), &idle())
            .await
            .unwrap();
        session.submit(TestFrame(0)).unwrap();
        session.flush().await.unwrap();
        assert!(matches!(session.flush().await, Err(Error::EncodeFailure(_))));
        assert!(matches!(session.submit(TestFrame(1)), Err(Error::EncodeFailure(_))));
        assert_eq!(&session.assemble().unwrap()[..], &0i64.to_le_bytes());
        assert_eq!(counters.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_assemble_before_flush_fails() {
        let (enc, rx, counters) = encoder(true, None);
        let mut session = EncoderSession::open(Box::new(enc), rx, &TestConfig("pcm"), &idle())
            .await
            .unwrap();
        session.submit(TestFrame(0)).unwrap();
        assert!(matches!(session.assemble(), Err(Error::AssemblyFailure(_))));
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_frames_is_assembly_failure() {
        let (enc, rx, counters) = encoder(true, None);
        let session = EncoderSession::open(Box::new(enc), rx, &TestConfig("pcm"), &idle())
            .await
            .unwrap();
        let err = session.finish().await.unwrap_err();
        assert!(matches!(err, Error::AssemblyFailure(_)));
        assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sink_numbers_chunks() {
        let (mut sink, mut rx) = chunk_channel();
        sink.emit(0, ChunkType::Key, vec![1u8]);
        sink.emit(5, ChunkType::Delta, vec![2u8]);
        assert_eq!(sink.emitted(), 2);

        let seqs: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| match e {
                EncoderEvent::Chunk(c) => c.sequence,
                EncoderEvent::Error(_) => u64::MAX,
            })
            .collect();
        assert_eq!(seqs, vec![0, 1]);
    }
}
