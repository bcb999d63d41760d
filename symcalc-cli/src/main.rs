use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
};
use symcalc::{
    expression::is_identifier, Command as SymcalcCommand, Environment, Expression, RenderError,
    Renderer, ScatterPlot,
};

#[derive(Parser, Debug)]
#[command(version, about = "Evaluate, simplify, and plot expression trees")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Run a `toDouble`, `simplify`, or `plot` command node, given as JSON.
    Run {
        /// The command node as JSON, or `-` to read it from stdin.
        input: String,
        /// Bind a variable before running, as `NAME=JSON`. May be repeated.
        #[arg(long = "let", value_name = "NAME=JSON")]
        bindings: Vec<String>,
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
        /// Height of the chart drawn for `plot`, in rows.
        #[arg(long)]
        height: Option<u32>,
        /// Also write the samples of a `plot` to this file as `x,y` rows.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Check that a command node is well formed, without running it.
    Check {
        /// The command node as JSON, or `-` to read it from stdin.
        input: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    /// The readable infix form.
    #[default]
    Text,
    /// The same JSON shape that commands are read in.
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Command::Run {
            input,
            bindings,
            format,
            height,
            csv,
        } => handle_run(&input, &bindings, format, height, csv)?,
        Command::Check { input } => handle_check(&input)?,
    };

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn handle_run(
    input: &str,
    bindings: &[String],
    format: OutputFormat,
    height: Option<u32>,
    csv: Option<PathBuf>,
) -> anyhow::Result<()> {
    let node = read_node(input)?;

    let mut renderer = AsciiRenderer::new(height);
    if let Some(path) = csv {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create CSV file {}.", path.display()))?;
        renderer = renderer.with_csv(BufWriter::new(file));
    }

    let mut environment = Environment::new(renderer);
    for binding in bindings {
        let (name, value) = parse_binding(binding)?;
        tracing::debug!(%name, %value, "bound");
        environment.bind(name, value);
    }
    tracing::debug!(%node, "running");

    let result = environment
        .execute(&node)
        .with_context(|| format!("Failed to run {node}."))?;

    match format {
        OutputFormat::Text => println!("{result}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&result).context("Failed to serialize the result.")?
        ),
    }

    Ok(())
}

fn handle_check(input: &str) -> anyhow::Result<()> {
    let node = read_node(input)?;
    let command = SymcalcCommand::try_from(&node).context("Not a command.")?;
    command
        .check_arity()
        .with_context(|| format!("Malformed operands in {command}."))?;

    println!("{command}");

    Ok(())
}

fn read_node(input: &str) -> anyhow::Result<Expression> {
    let text = if input == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read the command from stdin.")?;
        text
    } else {
        input.to_string()
    };

    serde_json::from_str(&text).context("Failed to parse an expression from the input JSON.")
}

fn parse_binding(binding: &str) -> anyhow::Result<(String, Expression)> {
    let Some((name, json)) = binding.split_once('=') else {
        bail!("Binding {binding:?} is not of the form NAME=JSON.");
    };
    let name = name.trim();
    if !is_identifier(name) {
        bail!("{name:?} is not a valid variable name.");
    }
    let value = serde_json::from_str(json)
        .with_context(|| format!("Failed to parse the value bound to {name}."))?;

    Ok((name.to_string(), value))
}

/// Draws plots as an ASCII chart on stdout, optionally also writing the samples as CSV.
struct AsciiRenderer {
    height: Option<u32>,
    csv: Option<Box<dyn Write>>,
}

impl AsciiRenderer {
    fn new(height: Option<u32>) -> Self {
        Self { height, csv: None }
    }

    fn with_csv(mut self, writer: impl Write + 'static) -> Self {
        self.csv = Some(Box::new(writer));
        self
    }

    fn write_csv(writer: &mut dyn Write, plot: &ScatterPlot) -> io::Result<()> {
        writeln!(writer, "{},{}", plot.x_axis_label, plot.y_axis_label)?;
        for (x, y) in plot.points() {
            writeln!(writer, "{x},{y}")?;
        }
        writer.flush()
    }

    /// The chart for `plot`, or `None` if there is nothing finite to draw.
    fn chart(&self, plot: &ScatterPlot) -> Option<String> {
        // The chart only has room for finite values.
        let series: Vec<f64> = plot.ys.iter().copied().filter(|y| y.is_finite()).collect();
        let (Some(first), Some(last)) = (plot.xs.first(), plot.xs.last()) else {
            return None;
        };
        if series.is_empty() {
            return None;
        }

        let mut config = rasciigraph::Config::default().with_caption(format!(
            "{}: {} from {first} to {last}",
            plot.title, plot.x_axis_label
        ));
        if let Some(height) = self.height {
            config = config.with_height(height);
        }
        Some(rasciigraph::plot(series, config))
    }
}

impl Renderer for AsciiRenderer {
    fn draw_scatter_plot(&mut self, plot: &ScatterPlot) -> Result<(), RenderError> {
        if let Some(writer) = self.csv.as_mut() {
            Self::write_csv(writer.as_mut(), plot)?;
        }

        match self.chart(plot) {
            Some(chart) => println!("{chart}"),
            None => {
                tracing::warn!("no finite samples to chart");
                println!("{plot}");
            }
        }

        Ok(())
    }
}
