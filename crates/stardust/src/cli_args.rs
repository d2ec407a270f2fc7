//! All the CLI arguments for Stardust

/// The default name of the main config file.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "stardust.toml";

/// Cursor-reactive stardust for your terminal
#[derive(clap::Parser, Debug, Clone, Default)]
#[command(
    version,
    about,
    long_about = "Glowing particles that follow, orbit and scatter from your mouse pointer"
)]
#[non_exhaustive]
pub struct CliArgs {
    /// Use a custom config directory. Defaults to your OS's standard config location.
    #[arg(long)]
    pub config_dir: Option<std::path::PathBuf>,

    /// The name of the main config file inside the config directory.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE_NAME)]
    pub main_config: std::path::PathBuf,

    /// Override the log level from the config.
    #[arg(long, value_enum)]
    pub log_level: Option<crate::config::main::LogLevel>,

    /// Override where the log file is written.
    #[arg(long)]
    pub log_path: Option<std::path::PathBuf>,

    /// The target number of particles.
    #[arg(short, long)]
    pub particles: Option<usize>,

    /// How particles are coloured.
    #[arg(short, long, value_enum)]
    pub colour_mode: Option<crate::particles::colour_mode::ColourMode>,

    /// Whether the pointer attracts or repels particles.
    #[arg(short, long, value_enum)]
    pub force_mode: Option<crate::particles::config::ForceMode>,
}

impl CliArgs {
    /// Apply any settings given on the command line on top of the config file's. The result is
    /// clamped just like settings from the config file are.
    pub fn override_settings(&self, settings: &mut crate::particles::config::Settings) {
        if let Some(count) = self.particles {
            settings.particle_count = count;
        }
        if let Some(colour_mode) = self.colour_mode {
            settings.colour_mode = colour_mode;
        }
        if let Some(force_mode) = self.force_mode {
            settings.force_mode = force_mode;
        }
        *settings = settings.clone().clamped();
    }
}

#[cfg(test)]
mod test {
    use clap::Parser as _;

    use super::*;
    use crate::particles::{colour_mode::ColourMode, config::ForceMode, config::Settings};

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["stardust"]).unwrap();
        assert_eq!(args.main_config, std::path::PathBuf::from("stardust.toml"));
        assert!(args.particles.is_none());
    }

    #[test]
    fn settings_overrides() {
        let args = CliArgs::try_parse_from([
            "stardust",
            "--particles",
            "300",
            "--colour-mode",
            "ocean",
            "--force-mode",
            "repel",
        ])
        .unwrap();
        let mut settings = Settings::default();
        args.override_settings(&mut settings);
        assert_eq!(settings.particle_count, 300);
        assert_eq!(settings.colour_mode, ColourMode::Ocean);
        assert_eq!(settings.force_mode, ForceMode::Repel);
        assert_eq!(settings.speed, Settings::default().speed);
    }

    #[test]
    fn particle_count_from_the_command_line_is_clamped() {
        let args = CliArgs::try_parse_from(["stardust", "-p", "5000000"]).unwrap();
        let mut settings = Settings::default();
        args.override_settings(&mut settings);
        assert_eq!(settings.particle_count, 1000);

        let args = CliArgs::try_parse_from(["stardust", "-p", "0"]).unwrap();
        args.override_settings(&mut settings);
        assert_eq!(settings.particle_count, 10);
    }
}
