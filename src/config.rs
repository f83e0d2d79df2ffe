//! Viewer configuration.

use std::path::PathBuf;

use tracing::Level;

use crate::logging::LogConfig;
use crate::settings::{SettingValue, SettingsGroup, SettingsGroups};

/// Name of the application directory under the platform config/data dirs.
pub const APP_DIR: &str = "rheedplot";

/// Settings group holding the plot options.
pub const PLOT_GROUP: &str = "plot";

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub title: String,
    /// Initial window size in points.
    pub window_size: [f32; 2],
    /// Batches the analysis worker may queue before new frames are dropped.
    pub queue_capacity: usize,
    /// Base name of the settings and log files.
    pub settings_name: String,
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: Level,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR);
        let log_dir = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR)
            .join("logs");
        Self {
            title: "RHEED Live Plots".to_string(),
            window_size: [960.0, 720.0],
            queue_capacity: 64,
            settings_name: APP_DIR.to_string(),
            config_dir,
            log_dir,
            log_level: Level::DEBUG,
        }
    }
}

impl ViewerConfig {
    pub fn log_config(&self) -> LogConfig {
        LogConfig::new(self.settings_name.clone(), self.log_dir.clone()).with_level(self.log_level)
    }
}

/// Plot options persisted in the [`PLOT_GROUP`] settings group.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSettings {
    pub show_legend: bool,
    pub line_width: f32,
    /// Seconds of region history shown; `0` shows everything.
    pub time_window: f64,
    pub profile_title: String,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            show_legend: true,
            line_width: 1.5,
            time_window: 0.0,
            profile_title: "Line Profile".to_string(),
        }
    }
}

impl PlotSettings {
    /// Read from loaded settings; missing or mistyped entries keep their default.
    pub fn from_groups(groups: &SettingsGroups) -> Self {
        let mut out = Self::default();
        let Some(g) = groups.get(PLOT_GROUP) else {
            return out;
        };
        if let Some(v) = g.get("show_legend").and_then(SettingValue::as_bool) {
            out.show_legend = v;
        }
        if let Some(v) = g.get("line_width").and_then(SettingValue::as_float) {
            out.line_width = v as f32;
        }
        if let Some(v) = g.get("time_window").and_then(SettingValue::as_float) {
            out.time_window = v.max(0.0);
        }
        if let Some(v) = g.get("profile_title").and_then(SettingValue::as_str) {
            out.profile_title = v.to_string();
        }
        out
    }

    /// Store into `groups`, replacing the previous plot group.
    pub fn store(&self, groups: &mut SettingsGroups) {
        let mut g = SettingsGroup::new();
        g.insert("show_legend".into(), self.show_legend.into());
        g.insert("line_width".into(), (self.line_width as f64).into());
        g.insert("time_window".into(), self.time_window.into());
        g.insert("profile_title".into(), self.profile_title.clone().into());
        groups.insert(PLOT_GROUP.to_string(), g);
    }

    pub fn to_groups(&self) -> SettingsGroups {
        let mut groups = SettingsGroups::new();
        self.store(&mut groups);
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_settings_survive_groups() {
        let s = PlotSettings {
            show_legend: false,
            line_width: 2.0,
            time_window: 30.0,
            profile_title: "Profile".into(),
        };
        assert_eq!(PlotSettings::from_groups(&s.to_groups()), s);
    }

    #[test]
    fn mistyped_entries_keep_defaults() {
        let mut groups = PlotSettings::default().to_groups();
        let g = groups.get_mut(PLOT_GROUP).unwrap();
        g.insert("show_legend".into(), SettingValue::Str("maybe".into()));
        g.insert("time_window".into(), SettingValue::Int(-5));
        let s = PlotSettings::from_groups(&groups);
        assert!(s.show_legend);
        assert_eq!(s.time_window, 0.0);
    }

    #[test]
    fn default_dirs_end_in_app_dir() {
        let cfg = ViewerConfig::default();
        assert!(cfg.config_dir.ends_with(APP_DIR));
        assert!(cfg.log_dir.ends_with("logs"));
        assert_eq!(cfg.log_config().file_path().file_name().unwrap(), "rheedplot.log");
    }
}
