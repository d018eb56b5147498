use clap::Parser;

use gnd::driver;

#[derive(Parser)]
#[command(name = "gnd")]
#[command(about = "Tree-walking interpreter for the gnd line-oriented scripting language")]
#[command(version)]
struct Cli {
    /// Script file to execute
    script: String,

    /// Emit the final value and exit code as JSON instead of plain text
    #[arg(long = "json")]
    json: bool,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let outcome = driver::run_script(std::path::Path::new(&cli.script)).await;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "value": outcome.value.to_string(),
                "exitCode": outcome.exit_code,
            })
        );
    } else if !matches!(outcome.value, gnd::Value::Null) {
        println!("{}", outcome.value);
    }

    std::process::exit(outcome.exit_code);
}
