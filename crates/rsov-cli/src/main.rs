use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::{Context, IntoDiagnostic};

use rsov_lower::{
    ExportedKernel, ForEachSignature, GlobalLayout, PassthroughLowering, PipelineOptions,
    StaticHost,
};

/// rsov: lower RenderScript foreach kernels to Vulkan compute SPIR-V
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input SPIR-V kernel module
    input: PathBuf,

    /// Output path for the lowered module
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exported kernel as NAME:SIGNATURE:INPUTS (signature decimal or 0x hex)
    #[arg(long = "kernel", value_parser = parse_kernel)]
    kernels: Vec<ExportedKernel>,

    /// Native member offsets of the global block, comma separated
    #[arg(long, value_delimiter = ',')]
    global_offsets: Option<Vec<u32>>,

    /// Allocation-backed global, in binding order
    #[arg(long = "allocation")]
    allocations: Vec<String>,

    /// Skip the validation pass
    #[arg(long)]
    no_validate: bool,

    /// Dump the decoded module to stderr before lowering
    #[arg(long)]
    emit_ir: bool,

    /// Decode and resolve without producing output
    #[arg(long)]
    dry_run: bool,
}

fn parse_number(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{s}': {e}"))
}

fn parse_kernel(s: &str) -> Result<ExportedKernel, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [name, signature, inputs] = parts.as_slice() else {
        return Err(format!("invalid kernel '{s}', expected NAME:SIGNATURE:INPUTS"));
    };
    if name.is_empty() {
        return Err(format!("invalid kernel '{s}', empty name"));
    }
    Ok(ExportedKernel::new(
        *name,
        ForEachSignature::from_bits(parse_number(signature)?),
        parse_number(inputs)?,
    ))
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();

    // 1. Read the kernel binary.
    let bytes = std::fs::read(&cli.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", cli.input.display()))?;
    let words = rsov_ir::words_from_bytes(&bytes)
        .into_diagnostic()
        .wrap_err("input is not a word stream")?;

    // 2. Optionally dump the decoded module to stderr.
    if cli.emit_ir || cli.dry_run {
        let module = rsov_lower::load_module(&words)
            .map_err(|e| miette::miette!("{e} (code {})", e.code()))
            .wrap_err("failed to load kernel module")?;
        if cli.emit_ir {
            eprintln!("{}", rsov_ir::dump_module(&module));
        }
    }

    // 3. Dry-run: stop here.
    if cli.dry_run {
        return Ok(());
    }

    // 4. Lower.
    let host = StaticHost {
        layout: cli
            .global_offsets
            .map(|member_offsets| GlobalLayout::Struct { member_offsets }),
        allocations: (!cli.allocations.is_empty()).then_some(cli.allocations),
    };
    let options = PipelineOptions {
        validate: !cli.no_validate,
    };
    let lowered = rsov_lower::add_compute_wrappers(
        &words,
        &cli.kernels,
        &host,
        &mut PassthroughLowering,
        &options,
    )
    .map_err(|e| miette::miette!("{e} (code {})", e.code()))
    .wrap_err("lowering failed")?;

    // 5. Write output.
    let Some(path) = &cli.output else {
        return Err(miette::miette!(
            "lowering produced binary output but no --output path was specified"
        ));
    };
    std::fs::write(path, rsov_ir::words_to_bytes(&lowered))
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
