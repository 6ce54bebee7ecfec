// reset; cargo run -- --source-dir ./datas --output ./csvs -- python csvalid.py
// reset; cargo run -- --config harness.json --label ./csvs-mirror -v

use clap::Parser;
use harness_lib::{ERRORS_LOG_FILE, ExternalValidator, Harness, utils::write_error_to_log};
use xls_harness::{
    config::{Args, Settings},
    logging::init_logging,
};

fn run(arguments: &Args) -> harness_lib::anyhow::Result<usize> {
    let settings = Settings::resolve(arguments)?;
    let harness = Harness::new(settings.loader(), settings.harness_settings());
    let validator = ExternalValidator::new(settings.program.clone(), settings.program_args.clone());
    harness.run(&validator)
}

fn main() {
    let arguments = Args::parse();
    init_logging(
        arguments.log_level.as_deref(),
        arguments.verbose,
        arguments.quiet,
    );

    match run(&arguments) {
        Ok(count) => {
            println!("✅ Validator finished over {count} converted files");
        }
        Err(e) => {
            eprintln!("❌ Harness failed with error: {e:#}");
            eprintln!("❌ Check {} for details.", ERRORS_LOG_FILE);
            write_error_to_log("Harness Error", &format!("{e:?}"));
            std::process::exit(1);
        }
    }
}
