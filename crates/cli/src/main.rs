use std::process::ExitCode;

mod config;
mod render;
mod telemetry;

use crate::config::Command;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let (args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    match &args.command {
        Command::Render(render_args) => render::run(&settings, render_args).await,
        Command::Templates => {
            render::list_templates();
            Ok(())
        }
    }
}
