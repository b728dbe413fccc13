use std::io::{BufRead, Write};
use std::path::Path;

use tracing::info;

use crate::state::{self, AppTokens};
use crate::util::prompt_exact_len;
use crate::Outcome;

use super::input_failed;

/// Ask for the app key and secret and store them for the other subsystems.
///
/// An existing app configuration is only replaced when `force` is set.
pub fn init<R, W>(config_dir: &Path, force: bool, input: &mut R, output: &mut W) -> Result<(), Outcome>
where
    R: BufRead,
    W: Write,
{
    let path = state::path::<AppTokens>(config_dir);
    if path.exists() && !force {
        return Err(Outcome::OverrideNoForce(path.display().to_string()));
    }

    let alphanumeric = |s: &str| s.chars().all(|c| c.is_ascii_alphanumeric());
    let key = prompt_exact_len(input, output, "App key", alphanumeric, AppTokens::KEY_LEN)
        .map_err(input_failed)?;
    let secret = prompt_exact_len(input, output, "App secret", alphanumeric, AppTokens::SECRET_LEN)
        .map_err(input_failed)?;

    state::save(config_dir, &AppTokens { key, secret })?;
    info!(path = %path.display(), "app configuration written");
    Ok(())
}
