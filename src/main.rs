use insta_recipe_import::{summarize_post, PipelineError};
use log::info;
use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    // Get the post URL from command-line arguments
    let args: Vec<String> = env::args().collect();
    let Some(url) = args.get(1) else {
        eprintln!("Usage: insta-recipe-import <instagram post URL>");
        return ExitCode::from(2);
    };

    match summarize_post(url).await {
        Ok(result) => {
            info!("Media saved in {}", result.working_directory.display());
            println!("{}", result.summary);
            ExitCode::SUCCESS
        }
        Err(e @ (PipelineError::UnsupportedDomain { .. } | PipelineError::InvalidUrlFormat(_))) => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
