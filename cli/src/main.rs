use std::io::Write as _;

use clap::Parser;
use colored::Colorize as _;
use solbench_cli::cmd::GlobalArgs;
use solbench_core::style::ColorTheme as _;

#[tokio::main]
async fn main() {
    let app = GlobalArgs::parse();

    env_logger::Builder::new()
        .filter_level(app.log_level())
        .parse_default_env()
        .format(|buf, record| {
            let level = record.level();
            writeln!(
                buf,
                "{} {}",
                format!("[{}]", level).color(level.color()).bold(),
                record.args()
            )
        })
        .init();

    app.exec_subcmd().await.unwrap_or_else(|e| {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    });
}
