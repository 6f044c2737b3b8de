// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Field array converter (echo-fieldconv)
//!
//! Reads one multi-value field array in ASCII or binary form and writes it
//! back out in the other (or the same) form.
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use echo_field::{ByteOrder, FieldInput, FieldOutput, FieldValue, Format, MField};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FieldType {
    Float,
    Int32,
    Uint32,
    Short,
    Vec3f,
    String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Encoding {
    Ascii,
    Binary,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Order {
    Big,
    Little,
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Element type of the array
    #[clap(short = 't', long = "type", value_enum)]
    field_type: FieldType,

    /// Encoding of the input
    #[clap(long, value_enum, default_value_t = Encoding::Ascii)]
    from: Encoding,

    /// Encoding of the output
    #[clap(long, value_enum, default_value_t = Encoding::Binary)]
    to: Encoding,

    /// Byte order for binary input and output
    #[clap(long, value_enum, default_value_t = Order::Big)]
    byte_order: Order,

    /// Input file
    input: PathBuf,

    /// Output file; stdout when omitted
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Log more (repeat for more detail)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn format(encoding: Encoding, order: Order) -> Format {
    match (encoding, order) {
        (Encoding::Ascii, _) => Format::Ascii,
        (Encoding::Binary, Order::Big) => Format::Binary(ByteOrder::Big),
        (Encoding::Binary, Order::Little) => Format::Binary(ByteOrder::Little),
    }
}

fn convert_as<T: FieldValue>(data: &[u8], from: Format, to: Format) -> Result<Vec<u8>> {
    let mut field = MField::<T>::new();
    let mut input = FieldInput::new(data, from);
    field
        .read_value(&mut input)
        .with_context(|| format!("reading {}", T::TYPE_NAME))?;
    debug!(field = T::TYPE_NAME, values = field.num(), "array read");

    let mut out = FieldOutput::new(to);
    field.write_value(&mut out);
    if !to.is_binary() {
        out.write_str("\n");
    }
    Ok(out.into_bytes())
}

fn convert(field_type: FieldType, data: &[u8], from: Format, to: Format) -> Result<Vec<u8>> {
    match field_type {
        FieldType::Float => convert_as::<f32>(data, from, to),
        FieldType::Int32 => convert_as::<i32>(data, from, to),
        FieldType::Uint32 => convert_as::<u32>(data, from, to),
        FieldType::Short => convert_as::<i16>(data, from, to),
        FieldType::Vec3f => convert_as::<[f32; 3]>(data, from, to),
        FieldType::String => convert_as::<String>(data, from, to),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let data = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let from = format(args.from, args.byte_order);
    let to = format(args.to, args.byte_order);
    info!(input = %args.input.display(), ?from, ?to, "converting");

    let bytes = convert(args.field_type, &data, from, to)?;

    match &args.output {
        Some(path) => std::fs::write(path, &bytes)
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    info!(bytes = bytes.len(), "done");
    Ok(())
}
