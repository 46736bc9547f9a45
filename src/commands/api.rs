//! Commands that call the KittyCAD API: `file`, `meta`, plus `version`

use crate::context::Context;
use crate::error::{CliError, Result};
use crate::iostreams::IoStreams;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Upload `input` for conversion to `to` and print the API's answer
pub async fn file_convert(ctx: &mut Context, input: &Path, to: &str) -> Result<()> {
    let src_format = source_format(input)?;
    let output_format = to.trim().trim_start_matches('.').to_ascii_lowercase();
    if output_format.is_empty() {
        return Err(CliError::InvalidArgument("--to must name a format".to_string()));
    }

    let body = tokio::fs::read(input)
        .await
        .map_err(|e| CliError::Io(format!("failed to read {}: {e}", input.display())))?;
    debug!(file = %input.display(), bytes = body.len(), %src_format, %output_format, "converting");

    let client = ctx.api_client(None)?;
    let conversion = client
        .create_file_conversion(&src_format, &output_format, body)
        .await?;
    print_json(&mut ctx.io, &conversion)
}

/// Print the status of conversion `id`
pub async fn file_status(ctx: &mut Context, id: &str) -> Result<()> {
    let client = ctx.api_client(None)?;
    let status = client.file_conversion_status(id).await?;
    print_json(&mut ctx.io, &status)
}

/// Print the current API session
pub async fn meta_session(ctx: &mut Context) -> Result<()> {
    let client = ctx.api_client(None)?;
    let session = client.session().await?;
    print_json(&mut ctx.io, &session)
}

/// Print the version and where its release notes live
pub fn version(io: &mut IoStreams) -> Result<()> {
    let v = crate::VERSION;
    writeln!(io.out(), "{} {v}", crate::NAME)?;
    writeln!(
        io.out(),
        "https://github.com/{}/releases/tag/v{v}",
        crate::update::RELEASE_REPO
    )?;
    Ok(())
}

/// Lower-cased extension of `input`
fn source_format(input: &Path) -> Result<String> {
    input
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            CliError::InvalidArgument(format!(
                "cannot tell the format of {}: the file has no extension",
                input.display()
            ))
        })
}

/// Pretty JSON on stdout, through the pager when one is configured
fn print_json(io: &mut IoStreams, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    io.start_pager()?;
    let written = writeln!(io.out(), "{text}");
    io.stop_pager();
    written.map_err(CliError::from)
}
