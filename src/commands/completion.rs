//! `kittycad completion`

use crate::cli::Cli;
use crate::error::Result;
use crate::iostreams::IoStreams;
use clap_complete::Shell;

/// Write the completion script for `shell` to stdout
pub fn generate(io: &mut IoStreams, shell: Shell) -> Result<()> {
    let mut command = Cli::build_command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, io.out());
    writeln!(io.out())?;
    Ok(())
}
