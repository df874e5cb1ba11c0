use std::{fs, io, process};

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use vgm_rs::{config::Config, error::Result, *};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let opt = args::Opt::parse();
    let config_path = opt.config;
    let load_config = || Config::load(config_path.as_deref());

    match opt.subcommand {
        args::Commands::Merge(o) => merge::main(o, load_config()?)?,
        args::Commands::Probe(o) => probe::main(o, load_config()?)?,
        args::Commands::Clean(o) => clean::main(o, load_config()?)?,
        args::Commands::Rename(o) => rename::main(o, load_config()?)?,
        args::Commands::ShellCompletions => install_shell_completions()?,
    }
    Ok(())
}

fn install_shell_completions() -> io::Result<()> {
    let home = dirs::home_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no home directory"))?;
    let dir = home.join(".zsh/zfunctions");
    utils::mkdir(&dir)?;
    let p_zsh = dir.join("_vgm-rs");
    let mut f_zsh = fs::File::create(&p_zsh)?;
    generate(Shell::Zsh, &mut args::Opt::command(), "vgm-rs", &mut f_zsh);
    println!("Zsh completions installed: {}", &p_zsh.display());
    Ok(())
}
