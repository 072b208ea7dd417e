use std::io::{self, Read, StdoutLock, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use watermark_overlay::{
    output, parse_format, Error, HorizontalAlign, ImageInput, OutputTarget, ResponseStream,
    VerticalAlign, WatermarkOptions,
};

#[derive(Parser)]
#[command(
    name = "watermark",
    about = "Overlay a watermark image onto a GIF, PNG or JPEG image",
    version,
    after_help = "Simple usage: watermark photo.jpg -w logo.png -o marked.jpg\n\n\
                  Without --output the encoded image is written to stdout.\n\
                  Flags override the keys of an --options record."
)]
struct Cli {
    /// Source image file, or - to read encoded bytes from stdin
    source: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Watermark image file
    #[arg(short, long)]
    watermark: Option<PathBuf>,

    /// Horizontal alignment
    #[arg(long, value_enum)]
    halign: Option<HorizontalAlign>,

    /// Vertical alignment
    #[arg(long, value_enum)]
    valign: Option<VerticalAlign>,

    /// Horizontal shift in pixels, applied after alignment
    #[arg(long, allow_negative_numbers = true)]
    hshift: Option<i64>,

    /// Vertical shift in pixels, applied after alignment
    #[arg(long, allow_negative_numbers = true)]
    vshift: Option<i64>,

    /// Output type: gif, png or jpeg
    #[arg(short = 't', long = "type")]
    format: Option<String>,

    /// JPEG quality (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    jpeg_quality: Option<u8>,

    /// JSON option record supplying defaults for the flags above
    #[arg(long)]
    options: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

/// Stdout as a response stream; it has no headers, so the content type is only logged.
struct StdoutResponse {
    out: StdoutLock<'static>,
    written: bool,
}

impl StdoutResponse {
    fn new() -> Self {
        Self {
            out: io::stdout().lock(),
            written: false,
        }
    }
}

impl Write for StdoutResponse {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.out.write(buf)?;
        self.written |= n > 0;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl ResponseStream for StdoutResponse {
    fn headers_sent(&self) -> bool {
        self.written
    }

    fn set_content_type(&mut self, mime: &'static str) {
        debug!("Content-Type: {mime}");
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose && cli.quiet {
        eprintln!("Error: Cannot specify both --verbose and --quiet");
        process::exit(1);
    }

    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> watermark_overlay::Result<()> {
    let opts = options_from(cli)?;

    let source = if cli.source == "-" {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .map_err(|source| Error::Unreadable {
                path: PathBuf::from("-"),
                source,
            })?;
        ImageInput::from(bytes)
    } else {
        ImageInput::from(PathBuf::from(&cli.source))
    };

    let mut stdout = StdoutResponse::new();
    let target = OutputTarget::resolve(cli.output.as_deref(), &mut stdout);
    let image = output(&source, target, &opts)?;

    if let Some(path) = &cli.output {
        if !cli.quiet {
            eprintln!(
                "[OK] {} ({}x{})",
                path.display(),
                image.width(),
                image.height()
            );
        }
    }
    Ok(())
}

/// Start from the option record, if any, then let each flag override its key.
fn options_from(cli: &Cli) -> watermark_overlay::Result<WatermarkOptions<'static>> {
    let mut opts = match &cli.options {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|source| Error::Unreadable {
                path: path.clone(),
                source,
            })?;
            WatermarkOptions::from_json(&json)?
        }
        None => WatermarkOptions::default(),
    };

    if let Some(path) = &cli.watermark {
        opts.watermark = ImageInput::from(path.clone());
    }
    if let Some(halign) = cli.halign {
        opts.halign = halign;
    }
    if let Some(valign) = cli.valign {
        opts.valign = valign;
    }
    if let Some(hshift) = cli.hshift {
        opts.hshift = hshift;
    }
    if let Some(vshift) = cli.vshift {
        opts.vshift = vshift;
    }
    if let Some(name) = &cli.format {
        opts.format = parse_format(name)?;
    }
    if let Some(quality) = cli.jpeg_quality {
        opts.jpeg_quality = quality;
    }
    Ok(opts)
}
