use clap::Parser;
use parcel_cli::Args;
use parcel_tracing::TracingBuilder;

fn main() {
    let args = Args::parse();

    let mut builder = TracingBuilder::default().level(args.log_level);
    if !args.quiet {
        builder = builder.enable_progressbar();
    }

    let tracing_handle = match builder.build() {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("failed to initialize tracing: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = parcel_cli::run(&args, &mut tracing_handle.get_stdout_writer()) {
        eprintln!("parcel: {e}");
        std::process::exit(1);
    }
}
