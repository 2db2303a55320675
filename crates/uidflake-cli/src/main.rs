mod cli;
mod telemetry;

use crate::cli::{Command, DecodeArgs, GenerateArgs, CLI};
use anyhow::{anyhow, Context};
use clap::Parser;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::info;
use uidflake_core::{BitLayout, Clock, StaticWorkerIdAssigner, Uid, UidAllocator, UidCodec};

fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    telemetry::init(config.log_format);

    let layout = config.layout.to_layout()?;

    match config.command {
        Command::Generate(args) => generate(layout, args),
        Command::Decode(args) => decode(layout, args),
    }
}

fn generate(layout: BitLayout, args: GenerateArgs) -> anyhow::Result<()> {
    let assigner = StaticWorkerIdAssigner::new(args.worker_id);
    let allocator =
        UidAllocator::from_assigner(layout, &assigner).context("failed to start uid allocator")?;

    let started = Instant::now();
    let uids = allocate_parallel(&allocator, args.count, usize::from(args.threads))?;

    info!(
        count = uids.len(),
        threads = args.threads,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "generated uids"
    );

    let mut out = std::io::stdout().lock();
    for uid in uids {
        if args.json {
            let decoded = allocator.decode(uid);
            writeln!(out, "{}", serde_json::to_string(&decoded)?)?;
        } else if args.decode {
            writeln!(out, "{}", allocator.decode(uid))?;
        } else if args.base58 {
            writeln!(out, "{}", uid.to_base58())?;
        } else {
            writeln!(out, "{uid}")?;
        }
    }

    Ok(())
}

/// Allocates `count` uids from `threads` threads sharing one allocator,
/// returned in allocation order.
fn allocate_parallel<C: Clock>(
    allocator: &UidAllocator<C>,
    count: usize,
    threads: usize,
) -> anyhow::Result<Vec<Uid>> {
    let issued = &AtomicUsize::new(0);

    let batches = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                scope.spawn(move || -> uidflake_core::Result<Vec<Uid>> {
                    let mut batch = Vec::new();
                    while issued.fetch_add(1, Ordering::Relaxed) < count {
                        match allocator.allocate() {
                            Ok(uid) => batch.push(uid),
                            Err(err) => {
                                // stop the other threads too
                                issued.store(count, Ordering::Relaxed);
                                return Err(err);
                            }
                        }
                    }
                    Ok(batch)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| anyhow!("generator thread panicked")))
            .collect::<anyhow::Result<Vec<_>>>()
    })?;

    let mut uids = Vec::with_capacity(count);
    for batch in batches {
        uids.extend(batch.context("uid allocation failed")?);
    }
    uids.sort_unstable();
    Ok(uids)
}
