use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use jiff::civil::Date;
use jiff::tz::TimeZone;
use std::fmt::{Display, Formatter};
use uidflake_core::{BitLayout, LayoutSettings, TimeUnit};

pub const WORKER_ID_ENV: &str = "UIDFLAKE_WORKER_ID";
pub const EPOCH_ENV: &str = "UIDFLAKE_EPOCH";
pub const TIME_UNIT_ENV: &str = "UIDFLAKE_TIME_UNIT";
pub const TIMESTAMP_BITS_ENV: &str = "UIDFLAKE_TIMESTAMP_BITS";
pub const WORKER_ID_BITS_ENV: &str = "UIDFLAKE_WORKER_ID_BITS";
pub const SEQUENCE_BITS_ENV: &str = "UIDFLAKE_SEQUENCE_BITS";
pub const LOG_FORMAT_ENV: &str = "UIDFLAKE_LOG_FORMAT";

pub const DEFAULT_EPOCH: &str = "2016-05-20";
pub const DEFAULT_TIMESTAMP_BITS: u8 = 28;
pub const DEFAULT_WORKER_ID_BITS: u8 = 22;
pub const DEFAULT_SEQUENCE_BITS: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeUnitArg {
    #[value(name = "seconds")]
    Seconds,
    #[value(name = "milliseconds")]
    Milliseconds,
}

impl Display for TimeUnitArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeUnitArg::Seconds => write!(f, "seconds"),
            TimeUnitArg::Milliseconds => write!(f, "milliseconds"),
        }
    }
}

impl From<TimeUnitArg> for TimeUnit {
    fn from(value: TimeUnitArg) -> Self {
        match value {
            TimeUnitArg::Seconds => TimeUnit::Seconds,
            TimeUnitArg::Milliseconds => TimeUnit::Milliseconds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Text => write!(f, "text"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "uidflake", version, about = "Allocate and decode 64-bit unique ids")]
pub struct CLI {
    #[command(flatten)]
    pub layout: LayoutArgs,

    #[arg(
        long,
        global = true,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Text
    )]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

/// Bit layout shared by `generate` and `decode`; both sides must agree on it.
#[derive(Debug, Args)]
pub struct LayoutArgs {
    /// Calendar date (UTC midnight) the timestamp field counts from.
    #[arg(long, global = true, env = EPOCH_ENV, default_value = DEFAULT_EPOCH)]
    pub epoch: Date,

    #[arg(
        long,
        global = true,
        env = TIME_UNIT_ENV,
        value_enum,
        default_value_t = TimeUnitArg::Seconds
    )]
    pub time_unit: TimeUnitArg,

    #[arg(long, global = true, env = TIMESTAMP_BITS_ENV, default_value_t = DEFAULT_TIMESTAMP_BITS)]
    pub timestamp_bits: u8,

    #[arg(long, global = true, env = WORKER_ID_BITS_ENV, default_value_t = DEFAULT_WORKER_ID_BITS)]
    pub worker_id_bits: u8,

    #[arg(long, global = true, env = SEQUENCE_BITS_ENV, default_value_t = DEFAULT_SEQUENCE_BITS)]
    pub sequence_bits: u8,
}

impl LayoutArgs {
    pub fn to_layout(&self) -> anyhow::Result<BitLayout> {
        let epoch = self
            .epoch
            .to_zoned(TimeZone::UTC)
            .with_context(|| format!("epoch {} is out of range", self.epoch))?
            .timestamp();

        let settings = LayoutSettings::builder()
            .timestamp_bits(self.timestamp_bits)
            .worker_id_bits(self.worker_id_bits)
            .sequence_bits(self.sequence_bits)
            .epoch(epoch)
            .time_unit(self.time_unit.into())
            .build();

        BitLayout::new(settings).context("invalid bit layout")
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Allocate new ids and print one per line.
    Generate(GenerateArgs),
    /// Split ids back into timestamp, worker id and sequence.
    Decode(DecodeArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Worker id of this process, unique across the deployment.
    #[arg(long, env = WORKER_ID_ENV)]
    pub worker_id: u64,

    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,

    /// Threads sharing the one allocator.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    pub threads: u16,

    /// Print the decoded fields next to each id.
    #[arg(long)]
    pub decode: bool,

    /// Print base58 instead of decimal ids.
    #[arg(long, conflicts_with_all = ["decode", "json"])]
    pub base58: bool,

    /// Print one JSON object per id.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    #[arg(required = true)]
    pub uids: Vec<String>,

    /// Treat the inputs as base58 rather than decimal.
    #[arg(long)]
    pub base58: bool,

    /// Print one JSON object per id.
    #[arg(long)]
    pub json: bool,
}
