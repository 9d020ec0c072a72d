// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

mod args;

use args::{Args, OutputFormat, ProcessMode};
use clap::Parser;
use edgefirst_edge::{
    bridge::SliceFrame,
    encode::{encode_jpeg, encode_png},
    stats::{FrameRateMeter, FrameStats},
    FrameBuffer, FrameProcessor, Operation,
};
use kanal::{AsyncReceiver, Sender};
use std::{
    error::Error,
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt as _, Layer as _, Registry};

/// One RGBA frame in capture order.
struct Frame {
    index: u64,
    data: Vec<u8>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    if args.width() == 0 || args.height() == 0 {
        return Err(Box::from("frame size must be non-zero"));
    }
    let dims = args.dims()?;

    let processor = Arc::new(FrameProcessor::with_params(
        args.strategy,
        args.canny_params(),
    ));
    info!(
        "{} {}x{} mode: {:?}",
        processor.version(),
        args.width(),
        args.height(),
        args.mode
    );

    let (frame_tx, frame_rx) = kanal::bounded(2);
    let reader = spawn_reader(&args, frame_tx)?;
    let writer = match args.output {
        Some(ref dir) => Some(spawn_writer(dir, &args)?),
        None => None,
    };

    let (processed, skipped) = stream(
        processor,
        frame_rx.to_async(),
        writer.as_ref().map(|(tx, _)| tx),
        dims,
        &args,
    )
    .await?;

    if let Some((tx, handle)) = writer {
        drop(tx);
        handle
            .join()
            .map_err(|_| Box::<dyn Error>::from("writer thread panicked"))?;
    }
    reader
        .join()
        .map_err(|_| Box::<dyn Error>::from("reader thread panicked"))?;

    info!("processed {} frames, skipped {}", processed, skipped);
    Ok(())
}

fn init_logging(args: &Args) -> Result<(), Box<dyn Error>> {
    let console = args
        .tokio_console
        .then(console_subscriber::spawn::<Registry>);

    let stdout_log = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .pretty()
        .with_filter(args.rust_log);

    let journald = match tracing_journald::layer() {
        Ok(journald) => Some(journald.with_filter(args.rust_log)),
        Err(_) => None,
    };

    let tracy = args
        .tracy
        .then(|| tracing_tracy::TracyLayer::default().with_filter(args.rust_log));

    let subscriber = Registry::default()
        .with(console)
        .with(stdout_log)
        .with(journald)
        .with(tracy);
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    if args.tracy {
        tracy_client::Client::start();
    }

    Ok(())
}

/// Reads fixed-size frames from the input until it is exhausted or the
/// consumer goes away.
fn spawn_reader(args: &Args, tx: Sender<Frame>) -> io::Result<JoinHandle<()>> {
    let mut source: Box<dyn Read + Send> = if args.input.as_os_str() == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(BufReader::new(File::open(&args.input)?))
    };
    let frame_len = args.frame_len();

    Ok(thread::spawn(move || {
        for index in 0.. {
            let mut data = vec![0u8; frame_len];
            match source.read_exact(&mut data) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    debug!("input exhausted after {} frames", index);
                    return;
                }
                Err(e) => {
                    error!("frame {} read failed: {}", index, e);
                    return;
                }
            }
            if tx.send(Frame { index, data }).is_err() {
                // processing loop exited
                return;
            }
        }
    }))
}

/// Stores processed frames on a dedicated thread, since encoding can be
/// slower than the frame rate.
fn spawn_writer(dir: &Path, args: &Args) -> io::Result<(Sender<Frame>, JoinHandle<()>)> {
    fs::create_dir_all(dir)?;
    let (tx, rx) = kanal::bounded::<Frame>(4);
    let dir = dir.to_path_buf();
    let (format, quality) = (args.format, args.jpeg_quality);
    let (width, height) = (args.width(), args.height());
    let mut raw = match format {
        OutputFormat::Raw => Some(BufWriter::new(File::create(dir.join("frames.rgba"))?)),
        _ => None,
    };

    let handle = thread::spawn(move || {
        while let Ok(frame) = rx.recv() {
            let res = match raw.as_mut() {
                Some(raw) => raw
                    .write_all(&frame.data)
                    .map_err(|e| Box::new(e) as Box<dyn Error>),
                None => write_image(&dir, format, quality, width, height, &frame),
            };
            if let Err(e) = res {
                error!("frame {} not written: {}", frame.index, e);
            }
        }
        if let Some(Err(e)) = raw.as_mut().map(|raw| raw.flush()) {
            error!("flushing raw output failed: {}", e);
        }
    });
    Ok((tx, handle))
}

fn write_image(
    dir: &Path,
    format: OutputFormat,
    quality: u8,
    width: u32,
    height: u32,
    frame: &Frame,
) -> Result<(), Box<dyn Error>> {
    let (path, encoded): (PathBuf, _) = match format {
        OutputFormat::Jpeg => (
            dir.join(format!("frame_{:06}.jpg", frame.index)),
            encode_jpeg(&frame.data, width, height, quality)?,
        ),
        _ => (
            dir.join(format!("frame_{:06}.png", frame.index)),
            encode_png(&frame.data, width, height)?,
        ),
    };
    fs::write(path, encoded)?;
    Ok(())
}

/// Runs every frame through the processor. Frames that fail are skipped.
///
/// Returns the number of frames processed and skipped.
async fn stream(
    processor: Arc<FrameProcessor>,
    rx: AsyncReceiver<Frame>,
    out: Option<&Sender<Frame>>,
    (width, height): (i32, i32),
    args: &Args,
) -> Result<(u64, u64), Box<dyn Error>> {
    let op = match args.mode {
        ProcessMode::Raw => None,
        ProcessMode::Grayscale => Some(Operation::Grayscale),
        ProcessMode::Edges => Some(Operation::Edges),
    };
    let mut pacing = args
        .fps
        .filter(|&fps| fps > 0)
        .map(|fps| tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64)));
    let mut meter = FrameRateMeter::default();
    let (mut processed, mut skipped) = (0, 0);

    while let Ok(frame) = rx.recv().await {
        if let Some(interval) = pacing.as_mut() {
            interval.tick().await;
        }
        let fps = meter.tick();
        let index = frame.index;

        let (result, elapsed) = match op {
            None => (Ok(frame.data), None),
            Some(op) => {
                let processor = processor.clone();
                let data = frame.data;
                let now = Instant::now();
                let result = tokio::task::spawn_blocking(move || {
                    let mut handle = SliceFrame(&data);
                    processor.process(Some(&mut handle), width, height, op)
                })
                .await?;
                (result.map(FrameBuffer::into_vec), Some(now.elapsed()))
            }
        };

        let data = match result {
            Ok(data) => data,
            Err(e) => {
                warn!("skipping frame {}: {}", index, e);
                skipped += 1;
                continue;
            }
        };

        if args.verbose {
            info!("frame {} fps: {} processing: {:?}", index, fps, elapsed);
        }
        if args.stats {
            let stats = FrameStats::new(fps, args.width(), args.height(), elapsed);
            println!("{}", serde_json::to_string(&stats)?);
        }
        if let Some(tx) = out {
            if tx.as_async().send(Frame { index, data }).await.is_err() {
                error!("writer stopped, ending stream");
                break;
            }
        }
        processed += 1;
    }

    Ok((processed, skipped))
}
