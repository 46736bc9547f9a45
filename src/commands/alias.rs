//! `kittycad alias set|list|delete`

use super::TablePrinter;
use crate::cli::{has_command, is_valid_command};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::iostreams::IoStreams;

/// Create or replace alias `name`
///
/// An expansion of `-` is read from stdin. Shell aliases are stored with a
/// leading `!`.
pub fn set(
    io: &mut IoStreams,
    cfg: &mut dyn Config,
    name: &str,
    expansion: &str,
    shell: bool,
) -> Result<()> {
    let given = if expansion == "-" {
        io.read_stdin()?.trim_end_matches(['\r', '\n']).to_string()
    } else {
        expansion.to_string()
    };

    let tty = io.is_stdout_tty();
    if tty {
        let (bold_name, bold_expansion) = (io.bold(name), io.bold(&given));
        writeln!(io.err_out(), "- Adding alias for {bold_name}: {bold_expansion}")?;
    }

    let mut expansion = given;
    if shell && !expansion.starts_with('!') {
        expansion.insert(0, '!');
    }
    let is_shell = expansion.starts_with('!');

    if has_command(&[name.to_string()]) {
        return Err(CliError::Alias(format!(
            "could not create alias: \"{name}\" is already a kittycad command"
        )));
    }
    if !is_shell && !is_valid_command(&expansion) {
        return Err(CliError::Alias(format!(
            "could not create alias: {expansion} does not correspond to a kittycad command"
        )));
    }

    let mut aliases = cfg.aliases()?;
    let message = match aliases.get(name) {
        Some(old) => format!(
            "{} Changed alias {} from {} to {}",
            io.success_icon(),
            io.bold(name),
            io.bold(&old),
            io.bold(&expansion)
        ),
        None => format!("{} Added alias.", io.success_icon()),
    };
    aliases
        .add(name, &expansion)
        .map_err(|e| CliError::Alias(format!("could not create alias: {e}")))?;

    if tty {
        writeln!(io.err_out(), "{message}")?;
    }
    Ok(())
}

/// Print aliases sorted by name
pub fn list(io: &mut IoStreams, cfg: &mut dyn Config) -> Result<()> {
    let aliases = cfg.aliases()?;
    if aliases.is_empty() {
        if io.is_stdout_tty() {
            writeln!(io.err_out(), "no aliases configured")?;
        }
        return Ok(());
    }

    let mut entries = aliases.list();
    entries.sort();

    let mut table = TablePrinter::new();
    for (name, expansion) in entries {
        table.add_row(format!("{name}:"), expansion);
    }
    table.render(io)?;
    Ok(())
}

/// Remove alias `name`
pub fn delete(io: &mut IoStreams, cfg: &mut dyn Config, name: &str) -> Result<()> {
    let mut aliases = cfg.aliases()?;
    let Some(expansion) = aliases.get(name) else {
        return Err(CliError::Alias(format!("no such alias {name}")));
    };

    aliases
        .delete(name)
        .map_err(|e| CliError::Alias(format!("failed to delete alias {name}: {e}")))?;

    if io.is_stdout_tty() {
        let icon = io.success_icon();
        writeln!(io.err_out(), "{icon} Deleted alias {name}; was {expansion}")?;
    }
    Ok(())
}
