use clap::Parser;
use gitlab_migration::{run, GitlabMigrationCli};
use std::process::exit;

#[tokio::main]
async fn main() {
    println!(concat!(
        env!("CARGO_PKG_NAME"),
        " ",
        env!("CARGO_PKG_VERSION")
    ));
    let args = GitlabMigrationCli::parse();
    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder()
        .filter_level(level)
        .format_target(false)
        .format_timestamp(None)
        .init();
    match run(args).await {
        Ok(_) => {
            exit(0);
        }
        Err(e) => {
            eprintln!("{e}");
            exit(1);
        }
    };
}
