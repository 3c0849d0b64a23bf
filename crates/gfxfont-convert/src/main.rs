// Copyright (c) 2023 the Hearth contributors.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{CommandFactory, ErrorKind, Parser};
use gfxfont::emit::{write_codepoint_dump, write_font, EmitOptions};
use gfxfont::naming::symbol_name;
use gfxfont::raster::pixels_per_em;
use gfxfont::{
    CodepointRange, FontError, FontTable, FontdueRasterizer, RangeSet, RenderMode, TableOptions,
};
use tracing::{debug, info, warn};
use yacexits::{EX_CONFIG, EX_DATAERR, EX_IOERR, EX_NOINPUT, EX_OK};

mod config;

use config::Dither;

pub struct CommandError {
    message: String,
    exit_code: u32,
}

trait ToCommandError<T, E> {
    fn to_command_error<C: Display>(self, context: C, exit_code: u32) -> Result<T, CommandError>;
}

impl<T, E> ToCommandError<T, E> for Result<T, E>
where
    E: Display,
{
    fn to_command_error<C: Display>(self, context: C, exit_code: u32) -> Result<T, CommandError> {
        match self {
            Ok(ok) => Ok(ok),
            Err(e) => Err(CommandError {
                message: format!("{}: {}", context, e),
                exit_code,
            }),
        }
    }
}

pub type CommandResult<T> = Result<T, CommandError>;

const EXAMPLES: &str = "\
EXAMPLES:
    extract Japanese Hiragana, size 12:
        fontconvert -f ../../fonts/hiragana_font.otf -s 12 12353 12447
    extract with default range, size 18:
        fontconvert -f ../../fonts/my_font.otf -s18
    extract only until 'Z', size 22:
        fontconvert -f ../../fonts/my_font.otf -s22 0x5a
    extract Korean Hangul Jamo basic consonants and vowels, size 16:
        fontconvert -f jamo_font.otf -v _Consonants_ -s 16 0x1100 0x1112
        fontconvert -f jamo_font.otf -v _Vowels_ -s 16 0x1161 0x1169 0x116d 0x116e 0x1172 0x1175";

/// Converts TrueType and OpenType fonts into Adafruit-GFX bitmap font tables.
///
/// The generated C source is written to standard output.
#[derive(Debug, Parser)]
#[clap(name = "fontconvert", version, after_help = EXAMPLES)]
pub struct Args {
    /// Font file to use (usually some .ttf or .otf file).
    #[clap(short = 'f', long = "font", value_name = "FONTFILE")]
    pub font: PathBuf,

    /// Size of the generated pixel font in points. Defaults to 12.
    #[clap(short, long, value_parser = parse_positive)]
    pub size: Option<u32>,

    /// Font variant name for the generated code (avoids name clashes).
    #[clap(short = 'v', long = "variant", value_name = "FONT_VARIANT_NAME")]
    pub variant: Option<String>,

    /// Overrides the font height.
    #[clap(short = 'r', long = "height", value_parser = parse_height)]
    pub height: Option<u8>,

    /// Grayscale rendering with dithering instead of monochromatic rendering.
    #[clap(short, long)]
    pub grayscale: bool,

    /// Dithering algorithm for grayscale rendering. Defaults to random.
    #[clap(long, value_enum)]
    pub dither: Option<Dither>,

    /// Offset applied to the first and last code points of the font.
    #[clap(short, long, value_parser = parse_number)]
    pub offset: Option<u32>,

    /// Negative offset applied to the code points; takes priority over --offset.
    #[clap(short = 'n', long, value_parser = parse_number)]
    pub negative_offset: Option<u32>,

    /// Dumps the code points of the font file and exits.
    #[clap(short, long)]
    pub dump: bool,

    /// Display resolution used to turn points into pixels. Defaults to 141.
    #[clap(long, value_parser = parse_positive)]
    pub dpi: Option<u32>,

    /// Face to use from a font collection.
    #[clap(long, default_value_t = 0)]
    pub face_index: u32,

    /// Seed for the dithering noise. Defaults to 0.
    #[clap(long)]
    pub seed: Option<u64>,

    /// A configuration file to use if not the default one.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Writes to this file instead of standard output.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Logs debug information.
    #[clap(long)]
    pub verbose: bool,

    /// Code point ranges: `last | (first last)+`. Without any, ' ' (32) to '~' (126).
    #[clap(value_name = "RANGES")]
    pub ranges: Vec<String>,
}

impl Args {
    fn render_mode(&self, config_dither: Dither) -> RenderMode {
        if self.grayscale {
            self.dither.unwrap_or(config_dither).render_mode()
        } else {
            if self.dither.is_some() {
                warn!("--dither has no effect without --grayscale");
            }
            RenderMode::Mono
        }
    }

    fn codepoint_offset(&self) -> i64 {
        match (self.negative_offset, self.offset) {
            (Some(negative), offset) => {
                if offset.is_some() {
                    warn!("Ignoring --offset in favor of --negative-offset");
                }
                -(negative as i64)
            }
            (None, Some(offset)) => offset as i64,
            (None, None) => 0,
        }
    }
}

fn parse_number(text: &str) -> Result<u32, String> {
    gfxfont::range::parse_number(text).map_err(|err| err.to_string())
}

fn parse_positive(text: &str) -> Result<u32, String> {
    match parse_number(text)? {
        0 => Err("must be greater than zero".to_string()),
        value => Ok(value),
    }
}

fn parse_height(text: &str) -> Result<u8, String> {
    let height = parse_number(text)?;
    u8::try_from(height).map_err(|_| format!("height {} doesn't fit in 8 bits", height))
}

/// Helper function to set up console logging on stderr with reasonable defaults.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let format = tracing_subscriber::fmt::format().compact();
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .event_format(format)
        .init();
}

/// Expands a leading `~/` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_owned();
    };

    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => {
            warn!("Couldn't find the home directory to expand {:?}", path);
            path.to_owned()
        }
    }
}

/// Parses the range arguments, exiting with usage text if they're malformed.
fn parse_ranges(args: &[String], default: CodepointRange) -> RangeSet {
    match RangeSet::from_args(args, default) {
        Ok(ranges) => ranges,
        Err(err) => {
            let kind = match err {
                FontError::RangeEndMissing(_) => ErrorKind::WrongNumberOfValues,
                _ => ErrorKind::ValueValidation,
            };

            Args::command().error(kind, err).exit()
        }
    }
}

fn open_output(path: Option<&Path>) -> CommandResult<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .to_command_error(format!("creating {:?}", path), EX_IOERR)?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(std::io::stdout().lock()))),
    }
}

fn run(args: Args) -> CommandResult<()> {
    let config = config::resolve(args.config.as_deref())
        .to_command_error("loading configuration", EX_CONFIG)?;

    let font_path = expand_home(&args.font);
    let size = args.size.unwrap_or(config.size);
    let dpi = args.dpi.unwrap_or(config.dpi);
    let px = pixels_per_em(size, dpi);
    debug!("Rendering {}pt at {} dpi ({} px/em)", size, dpi, px);

    let rasterizer = FontdueRasterizer::open(&font_path, args.face_index, px)
        .to_command_error("opening font", EX_NOINPUT)?;

    let mut out = open_output(args.output.as_deref())?;

    if args.dump {
        write_codepoint_dump(
            &mut out,
            &font_path.display().to_string(),
            &rasterizer.info(),
            &rasterizer.codepoints(),
        )
        .and_then(|_| out.flush())
        .to_command_error("writing code point dump", EX_IOERR)?;
        return Ok(());
    }

    let ranges = parse_ranges(&args.ranges, config.default_range());
    let options = TableOptions {
        mode: args.render_mode(config.dither),
        seed: args.seed.unwrap_or(config.seed),
        height: args.height,
        codepoint_offset: args.codepoint_offset(),
    };

    info!(
        "Converting {} code points in {} ranges from {:?}",
        ranges.requested_count(),
        ranges.len(),
        font_path
    );

    let (table, glyph_errors) = FontTable::build(&rasterizer, &ranges, &options)
        .to_command_error("building font table", EX_DATAERR)?;
    if !glyph_errors.is_empty() {
        warn!("{} code points were skipped", glyph_errors.len());
    }

    let name = symbol_name(&font_path, args.variant.as_deref(), size, ranges.last());
    let emit_options = EmitOptions {
        bytes_per_line: config.bytes_per_line,
        command_line: std::env::args().collect::<Vec<_>>().join(" "),
    };

    write_font(&mut out, &table, &name, &emit_options)
        .and_then(|_| out.flush())
        .to_command_error("writing font table", EX_IOERR)?;

    info!("Wrote {} (approx. {} bytes)", name, table.size_estimate());
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args) {
        Ok(_) => exit(EX_OK as i32),
        Err(e) => {
            eprintln!("ERROR: {}", e.message);
            exit(e.exit_code as i32)
        }
    }
}
