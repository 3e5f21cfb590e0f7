use std::{
    env,
    fs::File,
    io::{self, IsTerminal as _, Read},
    path::PathBuf,
};

use anyhow::{anyhow, Context, Error};

use adiv_core::Counts;

/// An input source for reading counts.
#[derive(Debug)]
pub enum Input {
    /// A path from which to read a file.
    Path(PathBuf),
    /// Stdin.
    Stdin,
}

impl Input {
    /// By default, reading an `Input` checks that either a path is provided, or that input is
    /// available via stdin, instead of hanging.
    ///
    /// In some contexts, e.g. testing, this can cause issues, and so it may be disabled by setting
    /// this environment variable.
    pub const ENV_KEY_DISABLE_CHECK: &'static str = "ADIV_ALLOW_STDIN";

    /// Creates a new input source.
    pub fn new(input: Option<PathBuf>) -> io::Result<Self> {
        let check = env::var(Self::ENV_KEY_DISABLE_CHECK).is_err();

        if input.is_some() && !io::stdin().is_terminal() && check {
            Err(io::Error::new(
                io::ErrorKind::Other,
                "received input both via file and stdin",
            ))
        } else if input.is_none() && io::stdin().is_terminal() && check {
            Err(io::Error::new(
                io::ErrorKind::Other,
                "received no input via file or stdin",
            ))
        } else {
            Ok(Self::new_unchecked(input))
        }
    }

    /// Creates a new input source without checking that any data is available.
    pub fn new_unchecked(input: Option<PathBuf>) -> Self {
        if let Some(path) = input {
            Self::Path(path)
        } else {
            Self::Stdin
        }
    }

    /// Reads counts from the input.
    pub fn read_counts(&self) -> Result<Counts, Error> {
        let mut s = String::new();
        match self {
            Input::Path(path) => File::open(path)
                .and_then(|mut f| f.read_to_string(&mut s))
                .with_context(|| format!("failed to read counts from '{}'", path.display()))?,
            Input::Stdin => io::stdin()
                .lock()
                .read_to_string(&mut s)
                .context("failed to read counts from stdin")?,
        };

        parse_counts(&s)
    }
}

/// Parses integer counts separated by whitespace and/or commas.
pub fn parse_counts(s: &str) -> Result<Counts, Error> {
    let values = s
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<i64>()
                .map_err(|e| anyhow!("failed to parse '{token}' as count: {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("Read {} counts", values.len());

    Ok(Counts::new(values)?)
}
