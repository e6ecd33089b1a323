//! A core module for command line interface.
//!
//! See [`Cli`] for more information.

use std::path::PathBuf;

use clap::builder::{PathBufValueParser, TypedValueParser};
use clap::error::ErrorKind;
use clap::Command;
pub use clap::{CommandFactory, Parser};
use dialoguer::Editor;

use crate::config::{Config, Validate, DEFAULT_CONFIG_STR};

const EDITOR_EXTENSION: &str = ".toml";

/// [`clap`] command line interface.
///
/// The config is read from a file path, from `--blog` plus the default
/// config, or — when neither is given — from a temp file the user edits
/// through [`Self::get_config_from_editor`]. In every case the config
/// is parsed with [`toml`] and then checked with [`Config::validate`].
///
/// # Example
///
/// ```no_run
/// use tumblr_dl::cli::{Cli, Parser as _};
///
/// let cli = Cli::parse();
/// ```
#[non_exhaustive]
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// The config file to use.
    ///
    /// If `None` (and no `--blog`), you can use
    /// [`Self::get_config_from_editor`] to open an editor to ask the
    /// user to write a temp config file.
    #[arg(value_name = "PATH")]
    #[arg(value_parser = PathBufValueParser::new().try_map(Self::parse_config_from_filepath))]
    pub config: Option<Config>,

    /// Crawl this blog with the default config, skipping the editor.
    #[arg(long, conflicts_with = "config")]
    pub blog: Option<String>,
}

impl Cli {
    #[inline]
    fn parse_config_from_filepath(path: PathBuf) -> anyhow::Result<Config> {
        let config = std::fs::read_to_string(path)?;
        let config = toml::from_str::<Config>(&config)?;
        config.validate()?;
        Ok(config)
    }

    /// The default config with its blog replaced by `blog`.
    ///
    /// # Errors
    ///
    /// If the resulting config is invalid (e.g. an empty blog), an
    /// error will be returned.
    pub fn config_for_blog(blog: impl Into<String>) -> anyhow::Result<Config> {
        let mut config = toml::from_str::<Config>(DEFAULT_CONFIG_STR)?;
        config.blog = blog.into();
        config.validate()?;
        Ok(config)
    }

    /// Open an editor to ask the user to write a config file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tumblr_dl::cli::{Cli, CommandFactory as _};
    ///
    /// let config = Cli::get_config_from_editor(&mut Cli::command())?;
    ///
    /// Ok::<(), clap::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// If the editor fails to write, or the content is empty, or the content is invalid,
    /// it will return an error.
    pub fn get_config_from_editor(cmd: &mut Command) -> Result<Config, clap::Error> {
        let config: Option<String> = match Editor::new()
            .extension(EDITOR_EXTENSION)
            .edit(DEFAULT_CONFIG_STR)
        {
            Ok(config) => config,
            Err(err) => {
                return Err(cmd.error(ErrorKind::Io, err));
            }
        };
        let config = match config {
            Some(config) => config,
            None => {
                return Err(cmd.error(
                    ErrorKind::ValueValidation,
                    "Empty content. Maybe you forget to save in the editor?",
                ))
            }
        };
        let config = match toml::from_str::<Config>(&config) {
            Ok(config) => config,
            Err(err) => return Err(cmd.error(ErrorKind::ValueValidation, err)),
        };

        match config.validate() {
            Ok(_) => Ok(config),
            Err(err) => Err(cmd.error(ErrorKind::ValueValidation, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_for_blog() -> anyhow::Result<()> {
        let config = Cli::config_for_blog("photography-daily")?;
        assert_eq!(config.blog, "photography-daily");
        Ok(())
    }

    #[test]
    fn test_config_for_empty_blog_errors() {
        assert!(Cli::config_for_blog("").is_err());
    }
}
