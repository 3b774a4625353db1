// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Caviard — reversible PDF redaction from the command line.
//
// Entry point. Initialises logging and dispatches to the subcommand
// handlers.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Commands::Keygen(args) => commands::keygen(args),
        cli::Commands::Apply(args) => commands::apply(args),
        cli::Commands::Restore(args) => commands::restore(args),
        cli::Commands::RestoreText(args) => commands::restore_text(args),
        cli::Commands::Protect(args) => commands::protect(args),
        cli::Commands::Unprotect(args) => commands::unprotect(args),
        cli::Commands::Audit(args) => commands::audit(args),
    }
}
