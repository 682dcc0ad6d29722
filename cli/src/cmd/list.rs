use solbench_core::{
    action::{self, RunRequest},
    puzzle::PuzzleId,
    style,
};

use super::{ArgProvider, GlobalArgs, SubcmdResult};
use crate::config;

#[derive(Debug, clap::Args)]
pub struct Args {
    pub puzzle: PuzzleId,

    #[arg(long, value_enum)]
    pub only: Option<ArgProvider>,

    #[arg(short, long)]
    pub lang: Vec<String>,

    /// Print entries as a JSON array.
    #[arg(long)]
    pub json: bool,
}

pub fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load_config(&global_args.root)?;

    let mut req = RunRequest::new(args.puzzle.clone(), &global_args.root);
    req.only = args.only.map(Into::into);
    req.languages = args.lang.clone();

    let entries = action::locate_entries(&req, &cfg)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        style::print_entries(&entries);
    }
    Ok(())
}
