use super::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartupAction {
    #[default]
    Run,
    PrintVersion,
}

/// Command-line flags. They are consumed here and never forwarded to GTK.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StartupFlags {
    pub camera_device: Option<String>,
    pub model: Option<String>,
    pub action: StartupAction,
}

impl StartupFlags {
    pub fn from_env_args() -> ConfigResult<Self> {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse<I, S>(args: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut flags = Self::default();
        let mut args = args.into_iter().map(Into::<String>::into);

        while let Some(arg) = args.next() {
            let (flag, inline_value) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg.clone(), None),
            };
            match flag.as_str() {
                "--version" | "-V" => flags.action = StartupAction::PrintVersion,
                "--camera-device" => {
                    flags.camera_device = Some(flag_value(&flag, inline_value, &mut args)?);
                }
                "--model" => flags.model = Some(flag_value(&flag, inline_value, &mut args)?),
                other => tracing::warn!(flag = other, "ignoring unknown command-line flag"),
            }
        }

        Ok(flags)
    }
}

fn flag_value(
    flag: &str,
    inline_value: Option<String>,
    rest: &mut impl Iterator<Item = String>,
) -> ConfigResult<String> {
    inline_value
        .or_else(|| rest.next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty() && !value.starts_with("--"))
        .ok_or_else(|| ConfigError::MissingFlagValue {
            flag: flag.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_means_run_with_file_config() {
        let flags = StartupFlags::parse(Vec::<String>::new()).expect("empty args should parse");
        assert_eq!(flags, StartupFlags::default());
    }

    #[test]
    fn parses_separate_and_inline_values() {
        let flags = StartupFlags::parse(["--camera-device", "/dev/video2", "--model=image-x"])
            .expect("flags should parse");

        assert_eq!(flags.camera_device.as_deref(), Some("/dev/video2"));
        assert_eq!(flags.model.as_deref(), Some("image-x"));
        assert_eq!(flags.action, StartupAction::Run);
    }

    #[test]
    fn version_flag_requests_version_output() {
        let flags = StartupFlags::parse(["--version"]).expect("flags should parse");
        assert_eq!(flags.action, StartupAction::PrintVersion);
    }

    #[test]
    fn flag_without_value_is_rejected() {
        for args in [vec!["--model"], vec!["--camera-device", "--version"]] {
            let err = StartupFlags::parse(args).expect_err("missing value should fail");
            assert!(matches!(err, ConfigError::MissingFlagValue { .. }));
        }
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let flags = StartupFlags::parse(["--fullscreen", "--model", "m"]).expect("flags should parse");
        assert_eq!(flags.model.as_deref(), Some("m"));
    }
}
