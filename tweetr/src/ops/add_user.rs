use std::io::{BufRead, Write};
use std::path::Path;

use tracing::info;

use crate::backend::Backend;
use crate::state::{self, AppTokens, Users};
use crate::util::prompt_nonzero_len;
use crate::Outcome;

use super::{input_failed, output_failed};

/// Walk a user through PIN authorization and remember their credentials.
pub fn add_user<R, W>(
    config_dir: &Path,
    backend: &dyn Backend,
    input: &mut R,
    output: &mut W,
) -> Result<(), Outcome>
where
    R: BufRead,
    W: Write,
{
    let app = state::load_required::<AppTokens>(config_dir)?;
    let mut users = state::load::<Users>(config_dir)?.unwrap_or_default();

    let token = backend.request_token(&app)?;
    writeln!(output, "Visit {} to get a PIN.", backend.authorize_url(&token))
        .map_err(output_failed)?;
    let pin = prompt_nonzero_len(input, output, "PIN", |s| {
        s.chars().all(|c| c.is_ascii_digit())
    })
    .map_err(input_failed)?;

    let user = backend.access_token(&app, &token, &pin)?;
    writeln!(output, "Successfully authenticated user {}#{}", user.name, user.id)
        .map_err(output_failed)?;
    info!(id = user.id, name = %user.name, "user authorized");

    users.upsert(user);
    state::save(config_dir, &users)
}
